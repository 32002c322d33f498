use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{check_quantity, AddToCartRequest, CartView, UpdateCartItemRequest},
    repo_types::{Cart, CartItem, NewCartItem},
};
use crate::{
    auth::claims::Principal,
    common::{Created, Message},
    db::is_foreign_key_violation,
    error::{internal, ApiError, ApiResult, AppJson, AppPath},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/carts", get(get_cart).post(create_cart))
        .route("/cart-items", post(add_to_cart))
        .route(
            "/cart-items/:item_id",
            put(update_cart_item).delete(remove_cart_item),
        )
}

#[instrument(skip(state))]
pub async fn get_cart(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<CartView>> {
    let cart = Cart::find_by_user(&state.db, principal.user_id)
        .await
        .map_err(internal("Failed to fetch cart"))?
        .ok_or_else(|| ApiError::not_found("Cart not found"))?;
    let items = CartItem::list(&state.db, cart.id)
        .await
        .map_err(internal("Failed to fetch cart items"))?;
    Ok(Json(CartView::new(cart, items)))
}

/// Idempotent: an existing cart is returned with 200.
#[instrument(skip(state))]
pub async fn create_cart(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<(StatusCode, Json<Cart>)> {
    let (cart, created) = Cart::get_or_create(&state.db, principal.user_id)
        .await
        .map_err(internal("Failed to create cart"))?;
    if created {
        info!(cart_id = %cart.id, "cart created");
        Ok((StatusCode::CREATED, Json(cart)))
    } else {
        Ok((StatusCode::OK, Json(cart)))
    }
}

#[instrument(skip(state, payload))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    principal: Principal,
    AppJson(payload): AppJson<AddToCartRequest>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    check_quantity(payload.quantity)?;

    let (cart, _) = Cart::get_or_create(&state.db, principal.user_id)
        .await
        .map_err(internal("Failed to add item to cart"))?;
    if payload.cart_id.is_some_and(|id| id != cart.id) {
        warn!(requested = ?payload.cart_id, "cart belongs to another user");
        return Err(ApiError::not_found("Cart not found"));
    }

    let new = NewCartItem {
        cart_id: cart.id,
        product_variant_id: payload.product_variant_id,
        quantity: payload.quantity,
        custom_name: payload.custom_name.trim(),
        custom_number: payload.custom_number.trim(),
    };
    let id = match CartItem::add(&state.db, &new).await {
        Ok(id) => id,
        Err(e) if is_foreign_key_violation(&e) => {
            return Err(ApiError::validation("Unknown product variant"));
        }
        Err(e) => return Err(ApiError::internal("Failed to add item to cart", e)),
    };
    Cart::touch(&state.db, cart.id)
        .await
        .map_err(internal("Failed to add item to cart"))?;

    info!(cart_id = %cart.id, item_id = %id, "item added to cart");
    Ok((
        StatusCode::CREATED,
        Json(Created {
            id,
            message: "Item added to cart",
        }),
    ))
}

#[instrument(skip(state))]
pub async fn update_cart_item(
    State(state): State<AppState>,
    principal: Principal,
    AppPath(item_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateCartItemRequest>,
) -> ApiResult<Json<Message>> {
    check_quantity(payload.quantity)?;
    let updated = CartItem::set_quantity(&state.db, principal.user_id, item_id, payload.quantity)
        .await
        .map_err(internal("Failed to update cart item"))?;
    if !updated {
        return Err(ApiError::not_found("Cart item not found"));
    }
    Ok(Json(Message::new("Cart item updated")))
}

#[instrument(skip(state))]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    principal: Principal,
    AppPath(item_id): AppPath<Uuid>,
) -> ApiResult<Json<Message>> {
    let removed = CartItem::remove(&state.db, principal.user_id, item_id)
        .await
        .map_err(internal("Failed to remove cart item"))?;
    if !removed {
        return Err(ApiError::not_found("Cart item not found"));
    }
    Ok(Json(Message::new("Item removed from cart")))
}
