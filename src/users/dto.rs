use serde::Deserialize;

use super::repo::UserChanges;
use crate::{
    auth::{
        roles::RoleRegistry,
        services::{is_valid_email, normalize_email},
    },
    common::required,
    error::ApiError,
};

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role_id: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn validate(self, roles: &RoleRegistry) -> Result<UserChanges, ApiError> {
        let name = self.name.map(|n| required("name", &n)).transpose()?;

        let email = match self.email {
            Some(raw) => {
                let email = normalize_email(&raw);
                if !is_valid_email(&email) {
                    return Err(ApiError::validation("Invalid email"));
                }
                Some(email)
            }
            None => None,
        };

        if let Some(role_id) = self.role_id {
            if roles.get(role_id).is_none() {
                return Err(ApiError::validation("Unknown role"));
            }
        }

        Ok(UserChanges {
            name,
            email,
            phone: self.phone.map(|p| p.trim().to_string()),
            role_id: self.role_id,
            is_active: self.is_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_normalizes_email_and_checks_role() {
        let roles = RoleRegistry::fixture();
        let changes = UpdateUserRequest {
            email: Some(" Buyer@Example.com ".into()),
            role_id: Some(3),
            ..Default::default()
        }
        .validate(&roles)
        .unwrap();
        assert_eq!(changes.email.as_deref(), Some("buyer@example.com"));
        assert_eq!(changes.role_id, Some(3));
        assert_eq!(changes.name, None);

        let err = UpdateUserRequest {
            role_id: Some(9),
            ..Default::default()
        }
        .validate(&roles)
        .unwrap_err();
        assert_eq!(err.to_string(), "Unknown role");

        let err = UpdateUserRequest {
            email: Some("nope".into()),
            ..Default::default()
        }
        .validate(&roles)
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email");
    }

    #[test]
    fn empty_update_changes_nothing() {
        let changes = UpdateUserRequest::default()
            .validate(&RoleRegistry::fixture())
            .unwrap();
        assert_eq!(changes, UserChanges::default());
    }
}
