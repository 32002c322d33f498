use anyhow::Context;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Partial admin edit; `None` keeps the stored value.
#[derive(Debug, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role_id: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct UserStats {
    pub user_id: Uuid,
    pub total_orders: i64,
    /// Sum of non-canceled order totals.
    pub total_spent: Decimal,
    pub total_reviews: i64,
}

impl User {
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, phone, role_id, password_hash, is_active, created_at, updated_at
              FROM users
             ORDER BY created_at DESC
             LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list users")
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        changes: &UserChanges,
    ) -> anyhow::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name       = COALESCE($2, name),
                   email      = COALESCE($3, email),
                   phone      = COALESCE($4, phone),
                   role_id    = COALESCE($5, role_id),
                   is_active  = COALESCE($6, is_active),
                   updated_at = now()
             WHERE id = $1
            RETURNING id, name, email, phone, role_id, password_hash, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.phone.as_deref())
        .bind(changes.role_id)
        .bind(changes.is_active)
        .fetch_optional(db)
        .await
        .context("update user")
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }
}

impl UserStats {
    pub async fn for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<UserStats>> {
        sqlx::query_as::<_, UserStats>(
            r#"
            SELECT u.id AS user_id,
                   (SELECT COUNT(*) FROM orders o WHERE o.user_id = u.id) AS total_orders,
                   (SELECT COALESCE(SUM(o.total_amount), 0)
                      FROM orders o
                     WHERE o.user_id = u.id AND o.status <> 'canceled') AS total_spent,
                   (SELECT COUNT(*) FROM reviews r WHERE r.user_id = u.id) AS total_reviews
              FROM users u
             WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("user stats")
    }
}
