use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl Pagination {
    pub const MAX_LIMIT: i64 = 100;

    /// `(limit, offset)` clamped to sane bounds.
    pub fn bounds(&self) -> (i64, i64) {
        (self.limit.clamp(1, Self::MAX_LIMIT), self.offset.max(0))
    }
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: Uuid,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

impl Message {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Trims and rejects blank values.
pub fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// 404 when the row is missing, 403 when it belongs to another user.
pub fn check_owner(owner: Option<Uuid>, user_id: Uuid, what: &str) -> Result<(), ApiError> {
    match owner {
        None => Err(ApiError::not_found(format!("{what} not found"))),
        Some(owner) if owner != user_id => {
            Err(ApiError::forbidden(format!("Not allowed to modify this {}", what.to_lowercase())))
        }
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        category_id: Option<Option<Uuid>>,
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.bounds(), (20, 0));
        let p = Pagination { limit: 10_000, offset: -5 };
        assert_eq!(p.bounds(), (100, 0));
        let p = Pagination { limit: 0, offset: 40 };
        assert_eq!(p.bounds(), (1, 40));
    }

    #[test]
    fn double_option_separates_missing_from_null() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.category_id, None);
        let null: Patch = serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(null.category_id, Some(None));
        let id = Uuid::new_v4();
        let set: Patch = serde_json::from_str(&format!(r#"{{"category_id": "{id}"}}"#)).unwrap();
        assert_eq!(set.category_id, Some(Some(id)));
    }

    #[test]
    fn ownership_distinguishes_missing_from_foreign() {
        let me = Uuid::new_v4();
        assert!(check_owner(Some(me), me, "Review").is_ok());
        let err = check_owner(None, me, "Review").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Review not found");
        let err = check_owner(Some(Uuid::new_v4()), me, "Shipping address").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Not allowed to modify this shipping address");
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("city", "  Bandung ").unwrap(), "Bandung");
        let err = required("city", "   ").unwrap_err();
        assert_eq!(err.to_string(), "city is required");
    }
}
