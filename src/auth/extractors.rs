use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::claims::Principal;
use crate::error::ApiError;

/// Reads the principal stored by `require_auth`; handlers outside that layer get a 401.
#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authorization header required"))
    }
}
