//! Admin-side account management.

mod dto;
pub mod handlers;
pub mod repo;

pub use handlers::admin_routes;
