use axum::{
    extract::State,
    http::{header::LOCATION, HeaderName, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateAddressRequest, UpdateAddressRequest},
    repo_types::{NewAddress, ShippingAddress},
};
use crate::{
    auth::claims::Principal,
    common::{check_owner, Message},
    error::{internal, ApiError, ApiResult, AppJson, AppPath},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shipping-addresses", get(list_addresses).post(create_address))
        .route(
            "/shipping-addresses/:id",
            get(get_address).put(update_address).delete(delete_address),
        )
}

#[instrument(skip(state))]
pub async fn list_addresses(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<Vec<ShippingAddress>>> {
    let rows = ShippingAddress::list_by_user(&state.db, principal.user_id)
        .await
        .map_err(internal("Failed to fetch shipping addresses"))?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_address(
    State(state): State<AppState>,
    principal: Principal,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ShippingAddress>> {
    ShippingAddress::find(&state.db, id)
        .await
        .map_err(internal("Failed to fetch shipping address"))?
        .filter(|a| a.user_id == principal.user_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Shipping address not found"))
}

#[instrument(skip(state, payload))]
pub async fn create_address(
    State(state): State<AppState>,
    principal: Principal,
    AppJson(payload): AppJson<CreateAddressRequest>,
) -> ApiResult<(StatusCode, [(HeaderName, String); 1], Json<ShippingAddress>)> {
    let fields = payload.validate()?;
    let new = NewAddress {
        user_id: principal.user_id,
        address: &fields.address,
        city: &fields.city,
        province: &fields.province,
        postal_code: &fields.postal_code,
        phone: &fields.phone,
    };
    let created = ShippingAddress::create(&state.db, &new)
        .await
        .map_err(internal("Failed to create shipping address"))?;

    info!(address_id = %created.id, user_id = %principal.user_id, "shipping address created");
    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/api/shipping-addresses/{}", created.id))],
        Json(created),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_address(
    State(state): State<AppState>,
    principal: Principal,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateAddressRequest>,
) -> ApiResult<Json<ShippingAddress>> {
    let changes = payload.validate()?;

    let owner = ShippingAddress::owner_of(&state.db, id)
        .await
        .map_err(internal("Failed to update shipping address"))?;
    check_owner(owner, principal.user_id, "Shipping address")?;

    let updated = ShippingAddress::update(&state.db, id, &changes)
        .await
        .map_err(internal("Failed to update shipping address"))?
        .ok_or_else(|| ApiError::not_found("Shipping address not found"))?;

    info!(address_id = %id, "shipping address updated");
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn delete_address(
    State(state): State<AppState>,
    principal: Principal,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Message>> {
    let owner = ShippingAddress::owner_of(&state.db, id)
        .await
        .map_err(internal("Failed to delete shipping address"))?;
    check_owner(owner, principal.user_id, "Shipping address")?;

    ShippingAddress::delete(&state.db, id)
        .await
        .map_err(internal("Failed to delete shipping address"))?;

    info!(address_id = %id, "shipping address deleted");
    Ok(Json(Message::new("Shipping address deleted")))
}
