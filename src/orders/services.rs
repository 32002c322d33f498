use anyhow::Context;
use rand::Rng;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::{
    repo_types::{NewOrder, NewOrderItem, OrderStatus, PaymentMethod},
    store::OrderStore,
};

/// Already-validated order request.
#[derive(Debug, Clone)]
pub struct NewOrderInput {
    pub user_id: Uuid,
    pub total_amount: Decimal,
    pub shipping_cost: Decimal,
    pub payment_method: PaymentMethod,
    pub shipping_address_id: Option<Uuid>,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_variant_id: Uuid,
    pub quantity: i32,
    /// Taken as submitted; not re-priced against the catalog.
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedOrder {
    pub id: Uuid,
    pub order_number: String,
}

/// `ORD-YYYYMMDD-XXXX` with a random hex suffix. Collisions are possible and
/// not checked.
pub fn generate_order_number(now: OffsetDateTime) -> String {
    let suffix: u16 = rand::thread_rng().gen();
    format!(
        "ORD-{:04}{:02}{:02}-{:04X}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        suffix
    )
}

/// Writes the order header and every line in one unit of work.
///
/// Either all rows are committed or none are: any failing insert returns early
/// and the dropped transaction discards what was staged.
pub async fn create_order(
    store: &dyn OrderStore,
    input: NewOrderInput,
) -> anyhow::Result<CreatedOrder> {
    anyhow::ensure!(!input.items.is_empty(), "order has no items");

    let order = NewOrder {
        id: Uuid::new_v4(),
        user_id: input.user_id,
        order_number: generate_order_number(OffsetDateTime::now_utc()),
        total_amount: input.total_amount,
        shipping_cost: input.shipping_cost,
        status: OrderStatus::Pending,
        payment_method: input.payment_method,
        shipping_address_id: input.shipping_address_id,
    };

    let mut tx = store.begin().await?;
    tx.insert_order(&order).await?;

    for (index, line) in input.items.iter().enumerate() {
        let item = NewOrderItem {
            id: Uuid::new_v4(),
            order_id: order.id,
            product_variant_id: line.product_variant_id,
            position: i32::try_from(index).context("too many order items")?,
            quantity: line.quantity,
            unit_price: line.unit_price,
        };
        tx.insert_item(&item)
            .await
            .with_context(|| format!("order item {}", index + 1))?;
    }

    tx.commit().await?;

    info!(
        order_id = %order.id,
        order_number = %order.order_number,
        items = input.items.len(),
        "order created"
    );
    Ok(CreatedOrder {
        id: order.id,
        order_number: order.order_number,
    })
}

#[cfg(test)]
mod tests {
    use regex::Regex;
    use time::macros::datetime;

    use super::*;
    use crate::orders::store::memory::MemoryOrderStore;

    fn input(lines: usize) -> NewOrderInput {
        NewOrderInput {
            user_id: Uuid::new_v4(),
            total_amount: Decimal::new(45_000_000, 2),
            shipping_cost: Decimal::new(1_500_000, 2),
            payment_method: PaymentMethod::Qris,
            shipping_address_id: Some(Uuid::new_v4()),
            items: (0..lines)
                .map(|i| OrderLine {
                    product_variant_id: Uuid::new_v4(),
                    quantity: i as i32 + 1,
                    unit_price: Decimal::new(15_000_000, 2),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn three_items_commit_together() {
        let store = MemoryOrderStore::default();
        let req = input(3);
        let created = create_order(&store, req.clone()).await.unwrap();

        let orders = store.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, created.id);
        assert_eq!(orders[0].order_number, created.order_number);
        assert_eq!(orders[0].status, OrderStatus::Pending);
        assert_eq!(orders[0].user_id, req.user_id);

        let items = store.items();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| i.order_id == created.id));
        let positions: Vec<i32> = items.iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        for (item, line) in items.iter().zip(&req.items) {
            assert_eq!(item.product_variant_id, line.product_variant_id);
            assert_eq!(item.quantity, line.quantity);
            assert_eq!(item.unit_price, line.unit_price);
        }
    }

    #[tokio::test]
    async fn failing_second_item_leaves_nothing() {
        let store = MemoryOrderStore::failing_on_item(2);
        let err = create_order(&store, input(3)).await.unwrap_err();
        assert!(format!("{err:#}").contains("order item 2"));
        assert!(store.orders().is_empty());
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn abandoned_transaction_is_discarded() {
        let store = MemoryOrderStore::default();
        {
            let mut tx = store.begin().await.unwrap();
            let order = NewOrder {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                order_number: "ORD-20240101-0001".into(),
                total_amount: Decimal::ONE,
                shipping_cost: Decimal::ZERO,
                status: OrderStatus::Pending,
                payment_method: PaymentMethod::Ewallet,
                shipping_address_id: None,
            };
            tx.insert_order(&order).await.unwrap();
        }
        assert!(store.orders().is_empty());
    }

    #[tokio::test]
    async fn empty_order_is_rejected_before_writing() {
        let store = MemoryOrderStore::default();
        assert!(create_order(&store, input(0)).await.is_err());
        assert!(store.orders().is_empty());
    }

    #[tokio::test]
    async fn separate_orders_get_distinct_ids() {
        let store = MemoryOrderStore::default();
        let a = create_order(&store, input(1)).await.unwrap();
        let b = create_order(&store, input(2)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.orders().len(), 2);
        assert_eq!(store.items().len(), 3);
    }

    #[test]
    fn order_number_is_date_stamped() {
        let re = Regex::new(r"^ORD-20240305-[0-9A-F]{4}$").unwrap();
        let number = generate_order_number(datetime!(2024-03-05 23:59:59 UTC));
        assert!(re.is_match(&number), "{number}");
    }
}
