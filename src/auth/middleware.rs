//! Request gates: bearer-token authentication, then optional role and
//! permission checks. Each gate short-circuits with a JSON error before the
//! wrapped handler runs.
//!
//! Layer them with `route_layer`, outermost last:
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/orders", get(list_all_orders))
//!     .route_layer(middleware::from_fn(|req: Request, next: Next| role_gate(ADMIN_ONLY, req, next)))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::{
    claims::Principal,
    jwt::{JwtKeys, TokenError},
};
use crate::error::ApiError;

pub const ADMIN_ONLY: &[&str] = &["admin"];

/// Splits on the first space; the scheme must be exactly `Bearer`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    (scheme == "Bearer").then_some(token)
}

pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req.headers().get(AUTHORIZATION).ok_or_else(|| {
        debug!("missing authorization header");
        ApiError::unauthorized("Authorization header required")
    })?;

    let token = header
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or_else(|| {
            warn!("malformed authorization header");
            ApiError::unauthorized("Invalid authorization format")
        })?;

    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "token rejected");
        match e {
            TokenError::Expired => ApiError::unauthorized("Token expired"),
            _ => ApiError::unauthorized("Invalid token"),
        }
    })?;

    let principal = Principal::from(claims);
    debug!(user_id = %principal.user_id, role = %principal.role_name, "request authenticated");
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Continues iff the principal's role name is one of `accepted`.
pub async fn role_gate(
    accepted: &'static [&'static str],
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| ApiError::forbidden("User role not found"))?;

    if !principal.has_role(accepted) {
        warn!(user_id = %principal.user_id, role = %principal.role_name, ?accepted, "role denied");
        return Err(ApiError::forbidden("Insufficient role permissions"));
    }
    Ok(next.run(req).await)
}

/// Continues iff the principal holds at least one of `required`.
pub async fn permission_gate(
    required: &'static [&'static str],
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| ApiError::forbidden("User permissions not found"))?;

    if !principal.has_any_permission(required) {
        warn!(user_id = %principal.user_id, ?required, "permission denied");
        return Err(ApiError::forbidden("Insufficient permissions"));
    }
    Ok(next.run(req).await)
}
