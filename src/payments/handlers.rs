use axum::{
    extract::{Request, State},
    http::{header::LOCATION, HeaderName, StatusCode},
    middleware::{self, Next},
    routing::{get, put},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreatePaymentRequest, UpdatePaymentRequest},
    repo_types::Payment,
    services::{generate_payment_code, paid_at_for},
};
use crate::{
    auth::{claims::Principal, middleware::permission_gate},
    common::Pagination,
    error::{internal, ApiError, ApiResult, AppJson, AppPath, AppQuery},
    orders::repo_types::Order,
    state::AppState,
};

const CONFIRM_PAYMENTS: &[&str] = &["payments:write"];

pub fn routes() -> Router<AppState> {
    let confirm = put(update_payment_status).route_layer(middleware::from_fn(
        |req: Request, next: Next| permission_gate(CONFIRM_PAYMENTS, req, next),
    ));
    Router::new()
        .route("/payments", get(list_payments).post(create_payment))
        .route("/payments/:id", get(get_payment).merge(confirm))
}

#[instrument(skip(state))]
pub async fn list_payments(
    State(state): State<AppState>,
    principal: Principal,
    AppQuery(page): AppQuery<Pagination>,
) -> ApiResult<Json<Vec<Payment>>> {
    let (limit, offset) = page.bounds();
    let scope = (!principal.is_admin()).then_some(principal.user_id);
    let payments = Payment::list(&state.db, scope, limit, offset)
        .await
        .map_err(internal("Failed to fetch payments"))?;
    Ok(Json(payments))
}

#[instrument(skip(state))]
pub async fn get_payment(
    State(state): State<AppState>,
    principal: Principal,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Payment>> {
    Payment::find_with_owner(&state.db, id)
        .await
        .map_err(internal("Failed to fetch payment"))?
        .filter(|(_, owner)| principal.can_access(*owner))
        .map(|(payment, _)| Json(payment))
        .ok_or_else(|| ApiError::not_found("Payment not found"))
}

#[instrument(skip(state, payload))]
pub async fn create_payment(
    State(state): State<AppState>,
    principal: Principal,
    AppJson(payload): AppJson<CreatePaymentRequest>,
) -> ApiResult<(StatusCode, [(HeaderName, String); 1], Json<Payment>)> {
    let order = Order::find(&state.db, payload.order_id)
        .await
        .map_err(internal("Failed to create payment"))?
        .filter(|o| o.user_id == principal.user_id)
        .ok_or_else(|| {
            warn!(order_id = %payload.order_id, "payment for unknown or foreign order");
            ApiError::not_found("Order not found")
        })?;

    let code = generate_payment_code(OffsetDateTime::now_utc());
    let payment = Payment::create(&state.db, order.id, &code)
        .await
        .map_err(internal("Failed to create payment"))?;

    info!(payment_id = %payment.id, order_id = %order.id, "payment created");
    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/api/payments/{}", payment.id))],
        Json(payment),
    ))
}

#[instrument(skip(state))]
pub async fn update_payment_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdatePaymentRequest>,
) -> ApiResult<Json<Payment>> {
    let paid_at = paid_at_for(payload.status, OffsetDateTime::now_utc());
    let payment = Payment::update_status(&state.db, id, payload.status, paid_at)
        .await
        .map_err(internal("Failed to update payment"))?
        .ok_or_else(|| ApiError::not_found("Payment not found"))?;

    info!(payment_id = %id, status = ?payment.payment_status, "payment status updated");
    Ok(Json(payment))
}
