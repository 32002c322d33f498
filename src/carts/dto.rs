use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{Cart, CartItem};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    /// Defaults to the caller's cart.
    pub cart_id: Option<Uuid>,
    pub product_variant_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub custom_name: String,
    #[serde(default)]
    pub custom_number: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

pub fn check_quantity(quantity: i32) -> Result<(), ApiError> {
    if quantity < 1 {
        return Err(ApiError::validation("quantity must be at least 1"));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CartView {
    #[serde(flatten)]
    pub cart: Cart,
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
}

impl CartView {
    pub fn new(cart: Cart, items: Vec<CartItem>) -> Self {
        let subtotal = items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum();
        Self {
            cart,
            items,
            subtotal,
        }
    }
}
