//! Unit of work used by order placement.
//!
//! An `OrderTx` stages writes that become visible only on `commit`. Dropping
//! it without committing discards everything it staged, which covers early
//! returns, failed inserts and cancelled request futures alike.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::repo_types::{NewOrder, NewOrderItem};

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn OrderTx>>;
}

#[async_trait]
pub trait OrderTx: Send {
    async fn insert_order(&mut self, order: &NewOrder) -> anyhow::Result<()>;
    async fn insert_item(&mut self, item: &NewOrderItem) -> anyhow::Result<()>;
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
}

pub struct PgOrderStore {
    db: PgPool,
}

impl PgOrderStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn begin(&self) -> anyhow::Result<Box<dyn OrderTx>> {
        let tx = self.db.begin().await.context("begin order transaction")?;
        Ok(Box::new(PgOrderTx { tx }))
    }
}

/// Rolled back by sqlx when dropped uncommitted.
struct PgOrderTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderTx for PgOrderTx {
    async fn insert_order(&mut self, order: &NewOrder) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, order_number, total_amount, shipping_cost,
                                status, payment_method, shipping_address_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(&order.order_number)
        .bind(order.total_amount)
        .bind(order.shipping_cost)
        .bind(order.status)
        .bind(order.payment_method)
        .bind(order.shipping_address_id)
        .execute(&mut *self.tx)
        .await
        .context("insert order")?;
        Ok(())
    }

    async fn insert_item(&mut self, item: &NewOrderItem) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_variant_id, position, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.id)
        .bind(item.order_id)
        .bind(item.product_variant_id)
        .bind(item.position)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *self.tx)
        .await
        .context("insert order item")?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.tx.commit().await.context("commit order transaction")
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Default)]
    struct Tables {
        orders: Vec<NewOrder>,
        items: Vec<NewOrderItem>,
    }

    /// In-process store; `failing_on_item(n)` makes the n-th item insert (1-based) of
    /// every transaction fail.
    #[derive(Debug, Default, Clone)]
    pub struct MemoryOrderStore {
        tables: Arc<Mutex<Tables>>,
        fail_on_item: Option<usize>,
    }

    impl MemoryOrderStore {
        pub fn failing_on_item(n: usize) -> Self {
            Self {
                fail_on_item: Some(n),
                ..Self::default()
            }
        }

        pub fn orders(&self) -> Vec<NewOrder> {
            self.tables.lock().unwrap().orders.clone()
        }

        pub fn items(&self) -> Vec<NewOrderItem> {
            self.tables.lock().unwrap().items.clone()
        }
    }

    #[async_trait]
    impl OrderStore for MemoryOrderStore {
        async fn begin(&self) -> anyhow::Result<Box<dyn OrderTx>> {
            Ok(Box::new(MemoryOrderTx {
                tables: self.tables.clone(),
                fail_on_item: self.fail_on_item,
                orders: Vec::new(),
                items: Vec::new(),
            }))
        }
    }

    struct MemoryOrderTx {
        tables: Arc<Mutex<Tables>>,
        fail_on_item: Option<usize>,
        orders: Vec<NewOrder>,
        items: Vec<NewOrderItem>,
    }

    #[async_trait]
    impl OrderTx for MemoryOrderTx {
        async fn insert_order(&mut self, order: &NewOrder) -> anyhow::Result<()> {
            self.orders.push(order.clone());
            Ok(())
        }

        async fn insert_item(&mut self, item: &NewOrderItem) -> anyhow::Result<()> {
            if self.fail_on_item == Some(self.items.len() + 1) {
                anyhow::bail!("injected failure on item {}", self.items.len() + 1);
            }
            anyhow::ensure!(
                self.orders.iter().any(|o| o.id == item.order_id),
                "order {} does not exist",
                item.order_id
            );
            self.items.push(item.clone());
            Ok(())
        }

        async fn commit(self: Box<Self>) -> anyhow::Result<()> {
            let this = *self;
            let mut tables = this.tables.lock().unwrap();
            tables.orders.extend(this.orders);
            tables.items.extend(this.items);
            Ok(())
        }
    }
}

/// Runs against a real database: `DATABASE_URL=... cargo test -- --ignored`.
#[cfg(test)]
mod pg_tests {
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::{
        db::{is_foreign_key_violation, violated_constraint},
        orders::{
            repo_types::PaymentMethod,
            services::{create_order, NewOrderInput, OrderLine},
        },
    };

    async fn customer(db: &PgPool) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO users (name, email, role_id, password_hash)
             VALUES ('Jane', 'jane@example.com', 2, 'x') RETURNING id",
        )
        .fetch_one(db)
        .await
        .unwrap()
    }

    async fn variant(db: &PgPool) -> Uuid {
        let product: Uuid = sqlx::query_scalar(
            "INSERT INTO products (name, price) VALUES ('Tee', 150000) RETURNING id",
        )
        .fetch_one(db)
        .await
        .unwrap();
        sqlx::query_scalar(
            "INSERT INTO product_variants (product_id, name) VALUES ($1, 'M') RETURNING id",
        )
        .bind(product)
        .fetch_one(db)
        .await
        .unwrap()
    }

    fn input(user_id: Uuid, variants: &[Uuid]) -> NewOrderInput {
        NewOrderInput {
            user_id,
            total_amount: Decimal::new(45_000_000, 2),
            shipping_cost: Decimal::new(1_500_000, 2),
            payment_method: PaymentMethod::BankTransfer,
            shipping_address_id: None,
            items: variants
                .iter()
                .map(|&product_variant_id| OrderLine {
                    product_variant_id,
                    quantity: 1,
                    unit_price: Decimal::new(15_000_000, 2),
                })
                .collect(),
        }
    }

    async fn count(db: &PgPool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn three_items_are_committed_in_order(db: PgPool) {
        let user = customer(&db).await;
        let v = variant(&db).await;
        let store = PgOrderStore::new(db.clone());

        let created = create_order(&store, input(user, &[v, v, v])).await.unwrap();

        assert_eq!(count(&db, "orders").await, 1);
        let positions: Vec<i32> = sqlx::query_scalar(
            "SELECT position FROM order_items WHERE order_id = $1 ORDER BY position",
        )
        .bind(created.id)
        .fetch_all(&db)
        .await
        .unwrap();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn unknown_second_variant_rolls_back_everything(db: PgPool) {
        let user = customer(&db).await;
        let v = variant(&db).await;
        let store = PgOrderStore::new(db.clone());

        let err = create_order(&store, input(user, &[v, Uuid::new_v4(), v]))
            .await
            .unwrap_err();

        assert!(is_foreign_key_violation(&err));
        assert_eq!(
            violated_constraint(&err),
            Some("order_items_product_variant_id_fkey")
        );
        assert_eq!(count(&db, "orders").await, 0);
        assert_eq!(count(&db, "order_items").await, 0);
    }
}
