use lazy_static::lazy_static;
use regex::Regex;
use tracing::error;

use crate::{
    auth::repo_types::User,
    error::{ApiError, ApiResult},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;
/// Role assigned on self-registration.
pub const DEFAULT_ROLE: &str = "user";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Resolves the user's role and signs a token carrying its permissions.
pub(crate) fn issue_token(state: &AppState, user: &User) -> ApiResult<String> {
    let role = state.roles.get(user.role_id).ok_or_else(|| {
        ApiError::internal(
            "Failed to fetch user role",
            anyhow::anyhow!("role {} is not registered", user.role_id),
        )
    })?;
    state.jwt.issue(user.id, &user.email, role).map_err(|e| {
        error!(error = %e, user_id = %user.id, "jwt sign failed");
        ApiError::internal("Failed to generate token", e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn user(role_id: i32) -> User {
        User {
            id: Uuid::new_v4(),
            name: "John Doe".into(),
            email: "john@example.com".into(),
            phone: String::new(),
            role_id,
            password_hash: String::new(),
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("john@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.io"));
        assert!(!is_valid_email("john@example"));
        assert!(!is_valid_email("john example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  John@Example.COM "), "john@example.com");
    }

    #[tokio::test]
    async fn token_carries_resolved_role() {
        let state = AppState::fake();
        let u = user(1);
        let token = issue_token(&state, &u).expect("token");
        let claims = state.jwt.verify(&token).expect("verify");
        assert_eq!(claims.sub, u.id);
        assert_eq!(claims.role_name, "admin");
        assert!(claims.permissions.contains(&"users:manage".to_string()));
    }

    #[tokio::test]
    async fn unknown_role_is_an_internal_error() {
        let state = AppState::fake();
        let err = issue_token(&state, &user(42)).unwrap_err();
        assert!(matches!(err, ApiError::Internal { .. }));
    }
}
