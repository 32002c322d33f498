use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    repo_types::{OrderStatus, PaymentMethod},
    services::{NewOrderInput, OrderLine},
};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub total_amount: Decimal,
    pub shipping_cost: Decimal,
    pub payment_method: PaymentMethod,
    pub shipping_address_id: Uuid,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_variant_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

impl CreateOrderRequest {
    pub fn validate(self, user_id: Uuid) -> Result<NewOrderInput, ApiError> {
        if self.items.is_empty() {
            return Err(ApiError::validation("items must not be empty"));
        }
        if self.total_amount <= Decimal::ZERO {
            return Err(ApiError::validation("total_amount must be greater than 0"));
        }
        if self.shipping_cost.is_sign_negative() {
            return Err(ApiError::validation("shipping_cost must not be negative"));
        }

        let mut items = Vec::with_capacity(self.items.len());
        for (i, item) in self.items.into_iter().enumerate() {
            if item.quantity < 1 {
                return Err(ApiError::validation(format!(
                    "items[{i}].quantity must be at least 1"
                )));
            }
            if item.price <= Decimal::ZERO {
                return Err(ApiError::validation(format!(
                    "items[{i}].price must be greater than 0"
                )));
            }
            items.push(OrderLine {
                product_variant_id: item.product_variant_id,
                quantity: item.quantity,
                unit_price: item.price,
            });
        }

        Ok(NewOrderInput {
            user_id,
            total_amount: self.total_amount,
            shipping_cost: self.shipping_cost,
            payment_method: self.payment_method,
            shipping_address_id: Some(self.shipping_address_id),
            items,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedOrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusFilter {
    pub status: Option<OrderStatus>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(items: serde_json::Value) -> serde_json::Value {
        json!({
            "total_amount": 450000,
            "shipping_cost": "15000.00",
            "payment_method": "e_wallet",
            "shipping_address_id": Uuid::new_v4(),
            "items": items,
        })
    }

    fn parse(v: serde_json::Value) -> CreateOrderRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn valid_request_keeps_item_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let user = Uuid::new_v4();
        let input = parse(body(json!([
            {"product_variant_id": a, "quantity": 2, "price": 150000},
            {"product_variant_id": b, "quantity": 1, "price": "150000.50"},
        ])))
        .validate(user)
        .unwrap();

        assert_eq!(input.user_id, user);
        assert_eq!(input.payment_method, PaymentMethod::Ewallet);
        assert_eq!(input.items.len(), 2);
        assert_eq!(input.items[0].product_variant_id, a);
        assert_eq!(input.items[1].unit_price, Decimal::new(15_000_050, 2));
    }

    #[test]
    fn rejects_empty_items_and_bad_quantities() {
        let err = parse(body(json!([]))).validate(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.to_string(), "items must not be empty");

        let err = parse(body(json!([
            {"product_variant_id": Uuid::new_v4(), "quantity": 0, "price": 1}
        ])))
        .validate(Uuid::new_v4())
        .unwrap_err();
        assert_eq!(err.to_string(), "items[0].quantity must be at least 1");
    }

    #[test]
    fn unknown_payment_method_fails_to_parse() {
        let mut v = body(json!([]));
        v["payment_method"] = json!("cash");
        assert!(serde_json::from_value::<CreateOrderRequest>(v).is_err());
    }
}
