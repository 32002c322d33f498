use crate::state::AppState;
use axum::Router;

pub mod claims;
mod dto;
mod extractors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod roles;
pub mod services;

pub use dto::PublicUser;

pub fn public_router() -> Router<AppState> {
    handlers::auth_routes()
}

pub fn router() -> Router<AppState> {
    handlers::me_routes()
}
