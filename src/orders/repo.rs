use std::collections::HashMap;

use anyhow::Context;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Order, OrderItem, OrderStatus};
use crate::addresses::repo_types::ShippingAddress;

const ORDER_COLUMNS: &str = "id, user_id, order_number, total_amount, shipping_cost, status, \
                             payment_method, shipping_address_id, created_at, updated_at";

/// Order header with its lines and delivery address.
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<ShippingAddress>,
}

impl Order {
    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Order>> {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
              FROM orders
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list orders by user")
    }

    pub async fn list_all(
        db: &PgPool,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Order>> {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
              FROM orders
             WHERE ($1::order_status IS NULL OR status = $1)
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list orders")
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Order>> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find order")
    }

    /// Any status may follow any other.
    pub async fn update_status(
        db: &PgPool,
        id: Uuid,
        status: OrderStatus,
    ) -> anyhow::Result<Option<Order>> {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
               SET status = $2, updated_at = now()
             WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(db)
        .await
        .context("update order status")
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete order")?;
        Ok(res.rows_affected() > 0)
    }
}

impl OrderItem {
    /// Lines of every order in `order_ids`, in submission order.
    pub async fn for_orders(db: &PgPool, order_ids: &[Uuid]) -> anyhow::Result<Vec<OrderItem>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT oi.id, oi.order_id, oi.product_variant_id, oi.quantity, oi.unit_price,
                   pv.name AS variant_name, p.id AS product_id, p.name AS product_name
              FROM order_items oi
              LEFT JOIN product_variants pv ON pv.id = oi.product_variant_id
              LEFT JOIN products p ON p.id = pv.product_id
             WHERE oi.order_id = ANY($1)
             ORDER BY oi.order_id, oi.position
            "#,
        )
        .bind(order_ids)
        .fetch_all(db)
        .await
        .context("list order items")
    }
}

/// Attaches items and addresses with one query each.
pub async fn load_views(db: &PgPool, orders: Vec<Order>) -> anyhow::Result<Vec<OrderView>> {
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let address_ids: Vec<Uuid> = orders.iter().filter_map(|o| o.shipping_address_id).collect();

    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in OrderItem::for_orders(db, &ids).await? {
        items_by_order.entry(item.order_id).or_default().push(item);
    }
    let addresses: HashMap<Uuid, ShippingAddress> = ShippingAddress::find_many(db, &address_ids)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    Ok(orders
        .into_iter()
        .map(|order| OrderView {
            items: items_by_order.remove(&order.id).unwrap_or_default(),
            shipping_address: order
                .shipping_address_id
                .and_then(|id| addresses.get(&id).cloned()),
            order,
        })
        .collect())
}
