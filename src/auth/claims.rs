use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload: identity plus the role and permissions resolved at issuance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,                // user ID
    pub email: String,
    pub role_id: i32,
    pub role_name: String,
    pub permissions: Vec<String>,
    pub iat: i64,                 // issued at (unix timestamp)
    pub exp: i64,                 // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}

/// Verified identity attached to a request by the auth middleware.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role_id: i32,
    pub role_name: String,
    pub permissions: Vec<String>,
}

pub const ADMIN_ROLE: &str = "admin";

impl From<Claims> for Principal {
    fn from(c: Claims) -> Self {
        Self {
            user_id: c.sub,
            email: c.email,
            role_id: c.role_id,
            role_name: c.role_name,
            permissions: c.permissions,
        }
    }
}

impl Principal {
    pub fn has_role(&self, accepted: &[&str]) -> bool {
        accepted.iter().any(|r| *r == self.role_name)
    }

    /// True when at least one of `required` was granted.
    pub fn has_any_permission(&self, required: &[&str]) -> bool {
        required
            .iter()
            .any(|req| self.permissions.iter().any(|p| p == req))
    }

    pub fn is_admin(&self) -> bool {
        self.role_name == ADMIN_ROLE
    }

    /// Admins may act on resources owned by anyone.
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: &str, perms: &[&str]) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            email: "u@example.com".into(),
            role_id: 2,
            role_name: role.into(),
            permissions: perms.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn role_membership() {
        let p = principal("user", &[]);
        assert!(p.has_role(&["user", "admin"]));
        assert!(!p.has_role(&["admin"]));
        assert!(!p.has_role(&[]));
    }

    #[test]
    fn permission_intersection() {
        let p = principal("user", &["read", "orders:create"]);
        assert!(p.has_any_permission(&["orders:create"]));
        assert!(p.has_any_permission(&["payments:write", "read"]));
        assert!(!p.has_any_permission(&["payments:write"]));
        assert!(!p.has_any_permission(&[]));
    }

    #[test]
    fn admins_can_access_foreign_resources() {
        let user = principal("user", &[]);
        let admin = principal("admin", &[]);
        let other = Uuid::new_v4();
        assert!(user.can_access(user.user_id));
        assert!(!user.can_access(other));
        assert!(admin.can_access(other));
    }

    #[test]
    fn principal_from_claims_keeps_identity() {
        let id = Uuid::new_v4();
        let claims = Claims {
            sub: id,
            email: "a@b.co".into(),
            role_id: 1,
            role_name: "admin".into(),
            permissions: vec!["users:manage".into()],
            iat: 0,
            exp: 1,
            iss: "i".into(),
            aud: "a".into(),
        };
        let p = Principal::from(claims);
        assert_eq!(p.user_id, id);
        assert_eq!(p.role_name, "admin");
        assert_eq!(p.permissions, vec!["users:manage".to_string()]);
    }
}
