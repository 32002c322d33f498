use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{AddressChanges, NewAddress, ShippingAddress};

const COLUMNS: &str =
    "id, user_id, address, city, province, postal_code, phone, created_at, updated_at";

impl ShippingAddress {
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {COLUMNS} FROM shipping_addresses WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list shipping addresses")
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {COLUMNS} FROM shipping_addresses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find shipping address")
    }

    /// Batch lookup used when rendering order lists.
    pub async fn find_many(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<Self>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {COLUMNS} FROM shipping_addresses WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(db)
        .await
        .context("find shipping addresses")
    }

    pub async fn owner_of(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Uuid>> {
        let owner = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM shipping_addresses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find shipping address owner")?;
        Ok(owner)
    }

    pub async fn create(db: &PgPool, new: &NewAddress<'_>) -> anyhow::Result<Self> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            INSERT INTO shipping_addresses (user_id, address, city, province, postal_code, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.address)
        .bind(new.city)
        .bind(new.province)
        .bind(new.postal_code)
        .bind(new.phone)
        .fetch_one(db)
        .await
        .context("insert shipping address")
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        changes: &AddressChanges,
    ) -> anyhow::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            UPDATE shipping_addresses
               SET address     = COALESCE($2, address),
                   city        = COALESCE($3, city),
                   province    = COALESCE($4, province),
                   postal_code = COALESCE($5, postal_code),
                   phone       = COALESCE($6, phone),
                   updated_at  = now()
             WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.address.as_deref())
        .bind(changes.city.as_deref())
        .bind(changes.province.as_deref())
        .bind(changes.postal_code.as_deref())
        .bind(changes.phone.as_deref())
        .fetch_optional(db)
        .await
        .context("update shipping address")
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM shipping_addresses WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete shipping address")?;
        Ok(res.rows_affected() > 0)
    }
}
