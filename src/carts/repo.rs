use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Cart, CartItem, NewCartItem};

const ITEM_SELECT: &str = r#"
    SELECT ci.id, ci.cart_id, ci.product_variant_id, ci.quantity, ci.custom_name, ci.custom_number,
           pv.name AS variant_name, p.id AS product_id, p.name AS product_name,
           (p.price + pv.price_adjustment) AS unit_price,
           ci.created_at, ci.updated_at
      FROM cart_items ci
      JOIN product_variants pv ON pv.id = ci.product_variant_id
      JOIN products p ON p.id = pv.product_id
"#;

impl Cart {
    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Cart>> {
        sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("find cart by user")
    }

    /// Returns the caller's cart and whether it was created by this call.
    pub async fn get_or_create(db: &PgPool, user_id: Uuid) -> anyhow::Result<(Cart, bool)> {
        let inserted = sqlx::query_as::<_, Cart>(
            r#"
            INSERT INTO carts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING id, user_id, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("insert cart")?;

        match inserted {
            Some(cart) => Ok((cart, true)),
            None => {
                let cart = Self::find_by_user(db, user_id)
                    .await?
                    .context("cart vanished after conflict")?;
                Ok((cart, false))
            }
        }
    }

    pub async fn touch(db: &PgPool, cart_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
            .bind(cart_id)
            .execute(db)
            .await
            .context("touch cart")?;
        Ok(())
    }
}

impl CartItem {
    pub async fn list(db: &PgPool, cart_id: Uuid) -> anyhow::Result<Vec<CartItem>> {
        sqlx::query_as::<_, CartItem>(&format!(
            "{ITEM_SELECT} WHERE ci.cart_id = $1 ORDER BY ci.created_at"
        ))
        .bind(cart_id)
        .fetch_all(db)
        .await
        .context("list cart items")
    }

    pub async fn add(db: &PgPool, new: &NewCartItem<'_>) -> anyhow::Result<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO cart_items (cart_id, product_variant_id, quantity, custom_name, custom_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(new.cart_id)
        .bind(new.product_variant_id)
        .bind(new.quantity)
        .bind(new.custom_name)
        .bind(new.custom_number)
        .fetch_one(db)
        .await
        .context("insert cart item")?;
        Ok(id)
    }

    /// Only touches items in `user_id`'s cart.
    pub async fn set_quantity(
        db: &PgPool,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE cart_items ci
               SET quantity = $3, updated_at = now()
              FROM carts c
             WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .bind(quantity)
        .execute(db)
        .await
        .context("update cart item")?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn remove(db: &PgPool, user_id: Uuid, item_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            DELETE FROM cart_items ci
             USING carts c
             WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete cart item")?;
        Ok(res.rows_affected() > 0)
    }
}
