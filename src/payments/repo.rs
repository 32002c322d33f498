use anyhow::Context;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Payment, PaymentStatus};

const COLUMNS: &str =
    "p.id, p.order_id, p.payment_status, p.payment_code, p.paid_at, p.created_at, p.updated_at";

impl Payment {
    /// `user_id = None` lists every payment.
    pub async fn list(
        db: &PgPool,
        user_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Payment>> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {COLUMNS}
              FROM payments p
              JOIN orders o ON o.id = p.order_id
             WHERE ($1::uuid IS NULL OR o.user_id = $1)
             ORDER BY p.created_at DESC
             LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list payments")
    }

    /// The payment together with the owner of its order.
    pub async fn find_with_owner(
        db: &PgPool,
        id: Uuid,
    ) -> anyhow::Result<Option<(Payment, Uuid)>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            payment: Payment,
            owner_id: Uuid,
        }

        let row = sqlx::query_as::<_, Row>(&format!(
            r#"
            SELECT {COLUMNS}, o.user_id AS owner_id
              FROM payments p
              JOIN orders o ON o.id = p.order_id
             WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find payment")?;
        Ok(row.map(|r| (r.payment, r.owner_id)))
    }

    pub async fn create(db: &PgPool, order_id: Uuid, payment_code: &str) -> anyhow::Result<Payment> {
        sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (order_id, payment_status, payment_code)
            VALUES ($1, 'pending', $2)
            RETURNING id, order_id, payment_status, payment_code, paid_at, created_at, updated_at
            "#,
        )
        .bind(order_id)
        .bind(payment_code)
        .fetch_one(db)
        .await
        .context("insert payment")
    }

    pub async fn update_status(
        db: &PgPool,
        id: Uuid,
        status: PaymentStatus,
        paid_at: Option<OffsetDateTime>,
    ) -> anyhow::Result<Option<Payment>> {
        sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
               SET payment_status = $2, paid_at = $3, updated_at = now()
             WHERE id = $1
            RETURNING id, order_id, payment_status, payment_code, paid_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(paid_at)
        .fetch_optional(db)
        .await
        .context("update payment status")
    }
}
