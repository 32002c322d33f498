use axum::{
    extract::{Request, State},
    http::{header::LOCATION, HeaderName, StatusCode},
    middleware::{self, Next},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateOrderRequest, CreatedOrderResponse, StatusFilter, UpdateStatusRequest},
    repo::{load_views, OrderView},
    repo_types::Order,
    services,
};
use crate::{
    addresses::repo_types::ShippingAddress,
    auth::{claims::Principal, middleware::permission_gate},
    common::{Message, Pagination},
    db::{is_foreign_key_violation, violated_constraint},
    error::{internal, ApiError, ApiResult, AppJson, AppPath, AppQuery},
    state::AppState,
};

const CREATE_ORDERS: &[&str] = &["orders:create"];

const ITEM_VARIANT_FKEY: &str = "order_items_product_variant_id_fkey";
const ORDER_ADDRESS_FKEY: &str = "orders_shipping_address_id_fkey";
const ORDER_USER_FKEY: &str = "orders_user_id_fkey";

/// Names the missing row behind a foreign-key failure on order insert.
fn reference_error(constraint: Option<&str>) -> ApiError {
    match constraint {
        Some(ITEM_VARIANT_FKEY) => ApiError::validation("Unknown product variant"),
        Some(ORDER_ADDRESS_FKEY) => ApiError::not_found("Shipping address not found"),
        Some(ORDER_USER_FKEY) => ApiError::not_found("User not found"),
        _ => ApiError::validation("Order references unknown rows"),
    }
}

pub fn routes() -> Router<AppState> {
    let create = post(create_order).route_layer(middleware::from_fn(
        |req: Request, next: Next| permission_gate(CREATE_ORDERS, req, next),
    ));
    Router::new()
        .route("/orders", get(list_orders).merge(create))
        .route("/orders/:id", get(get_order))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/:id", put(update_order_status).delete(delete_order))
}

#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    principal: Principal,
    AppQuery(page): AppQuery<Pagination>,
) -> ApiResult<Json<Vec<OrderView>>> {
    let (limit, offset) = page.bounds();
    let orders = Order::list_by_user(&state.db, principal.user_id, limit, offset)
        .await
        .map_err(internal("Failed to fetch orders"))?;
    let views = load_views(&state.db, orders)
        .await
        .map_err(internal("Failed to fetch orders"))?;
    Ok(Json(views))
}

/// Other users' orders are reported as missing, except to admins.
#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    principal: Principal,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<OrderView>> {
    let order = Order::find(&state.db, id)
        .await
        .map_err(internal("Failed to fetch order"))?
        .filter(|o| principal.can_access(o.user_id))
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    let view = load_views(&state.db, vec![order])
        .await
        .map_err(internal("Failed to fetch order"))?
        .pop()
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    Ok(Json(view))
}

#[instrument(skip(state, payload), fields(user_id = %principal.user_id))]
pub async fn create_order(
    State(state): State<AppState>,
    principal: Principal,
    AppJson(payload): AppJson<CreateOrderRequest>,
) -> ApiResult<(StatusCode, [(HeaderName, String); 1], Json<CreatedOrderResponse>)> {
    let input = payload.validate(principal.user_id)?;

    if let Some(address_id) = input.shipping_address_id {
        let owner = ShippingAddress::owner_of(&state.db, address_id)
            .await
            .map_err(internal("Failed to create order"))?;
        if owner != Some(principal.user_id) {
            warn!(%address_id, "shipping address not owned by caller");
            return Err(ApiError::not_found("Shipping address not found"));
        }
    }

    let created = match services::create_order(state.orders.as_ref(), input).await {
        Ok(created) => created,
        Err(e) if is_foreign_key_violation(&e) => {
            warn!(error = %e, "order references unknown rows");
            return Err(reference_error(violated_constraint(&e)));
        }
        Err(e) => return Err(ApiError::internal("Failed to create order", e)),
    };

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/api/orders/{}", created.id))],
        Json(CreatedOrderResponse {
            id: created.id,
            order_number: created.order_number,
            message: "Order created successfully",
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_all_orders(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<Pagination>,
    AppQuery(filter): AppQuery<StatusFilter>,
) -> ApiResult<Json<Vec<OrderView>>> {
    let (limit, offset) = page.bounds();
    let orders = Order::list_all(&state.db, filter.status, limit, offset)
        .await
        .map_err(internal("Failed to fetch orders"))?;
    let views = load_views(&state.db, orders)
        .await
        .map_err(internal("Failed to fetch orders"))?;
    Ok(Json(views))
}

#[instrument(skip(state))]
pub async fn update_order_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateStatusRequest>,
) -> ApiResult<Json<Order>> {
    let order = Order::update_status(&state.db, id, payload.status)
        .await
        .map_err(internal("Failed to update order"))?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    info!(order_id = %id, status = ?order.status, "order status updated");
    Ok(Json(order))
}

#[instrument(skip(state))]
pub async fn delete_order(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Message>> {
    let deleted = Order::delete(&state.db, id)
        .await
        .map_err(internal("Failed to delete order"))?;
    if !deleted {
        return Err(ApiError::not_found("Order not found"));
    }
    info!(order_id = %id, "order deleted");
    Ok(Json(Message::new("Order deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_key_failures_name_the_missing_row() {
        let err = reference_error(Some("order_items_product_variant_id_fkey"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Unknown product variant");

        let err = reference_error(Some("orders_shipping_address_id_fkey"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Shipping address not found");

        let err = reference_error(Some("orders_user_id_fkey"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "User not found");

        let err = reference_error(None);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Order references unknown rows");
    }
}
