use std::collections::HashMap;

use anyhow::Context;
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
}

/// Roles and their permissions, loaded once at startup and shared read-only.
#[derive(Debug, Default)]
pub struct RoleRegistry {
    roles: HashMap<i32, Role>,
}

impl RoleRegistry {
    pub async fn load(db: &PgPool) -> anyhow::Result<Self> {
        let rows = sqlx::query_as::<_, (i32, String, String)>(
            r#"
            SELECT id, name, description
              FROM roles
             ORDER BY id
            "#,
        )
        .fetch_all(db)
        .await
        .context("load roles")?;

        let grants = sqlx::query_as::<_, (i32, String)>(
            r#"
            SELECT role_id, permission
              FROM role_permissions
             ORDER BY role_id, permission
            "#,
        )
        .fetch_all(db)
        .await
        .context("load role permissions")?;

        let mut registry = Self::from_roles(rows.into_iter().map(|(id, name, description)| Role {
            id,
            name,
            description,
            permissions: Vec::new(),
        }));
        for (role_id, permission) in grants {
            if let Some(role) = registry.roles.get_mut(&role_id) {
                role.permissions.push(permission);
            }
        }
        Ok(registry)
    }

    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    pub fn get(&self, id: i32) -> Option<&Role> {
        self.roles.get(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Role> {
        self.roles.values().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Mirrors the rows created by the initial migration.
    #[cfg(test)]
    pub fn fixture() -> Self {
        let role = |id: i32, name: &str, perms: &[&str]| Role {
            id,
            name: name.into(),
            description: String::new(),
            permissions: perms.iter().map(|p| p.to_string()).collect(),
        };
        Self::from_roles([
            role(
                1,
                "admin",
                &[
                    "products:write",
                    "categories:write",
                    "orders:create",
                    "orders:read",
                    "orders:read_all",
                    "orders:write",
                    "cart:write",
                    "reviews:write",
                    "payments:create",
                    "payments:write",
                    "users:manage",
                ],
            ),
            role(
                2,
                "user",
                &[
                    "orders:create",
                    "orders:read",
                    "cart:write",
                    "reviews:write",
                    "payments:create",
                ],
            ),
            role(3, "seller", &["products:write", "categories:write", "orders:read_all"]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_id_and_name() {
        let reg = RoleRegistry::fixture();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.get(1).map(|r| r.name.as_str()), Some("admin"));
        assert_eq!(reg.by_name("user").map(|r| r.id), Some(2));
        assert!(reg.get(99).is_none());
        assert!(reg.by_name("root").is_none());
    }

    #[test]
    fn only_admin_may_confirm_payments() {
        let reg = RoleRegistry::fixture();
        let grants = |id| reg.get(id).unwrap().permissions.clone();
        assert!(grants(1).contains(&"payments:write".to_string()));
        assert!(!grants(2).contains(&"payments:write".to_string()));
        assert!(!grants(3).contains(&"orders:create".to_string()));
    }
}
