use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Review;

const SELECT: &str = r#"
    SELECT r.id, r.user_id, r.product_id, r.rating, r.comment, u.name AS user_name,
           r.created_at, r.updated_at
      FROM reviews r
      JOIN users u ON u.id = r.user_id
"#;

impl Review {
    pub async fn list_by_product(db: &PgPool, product_id: Uuid) -> anyhow::Result<Vec<Review>> {
        sqlx::query_as::<_, Review>(&format!(
            "{SELECT} WHERE r.product_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(product_id)
        .fetch_all(db)
        .await
        .context("list reviews by product")
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Review>> {
        sqlx::query_as::<_, Review>(&format!(
            "{SELECT} WHERE r.user_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list reviews by user")
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Review>> {
        sqlx::query_as::<_, Review>(&format!("{SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("find review")
    }

    pub async fn owner_of(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("find review owner")
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        product_id: Uuid,
        rating: i32,
        comment: &str,
    ) -> anyhow::Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO reviews (user_id, product_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(db)
        .await
        .context("insert review")
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        rating: Option<i32>,
        comment: Option<&str>,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE reviews
               SET rating     = COALESCE($2, rating),
                   comment    = COALESCE($3, comment),
                   updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(rating)
        .bind(comment)
        .execute(db)
        .await
        .context("update review")?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete review")?;
        Ok(res.rows_affected() > 0)
    }
}
