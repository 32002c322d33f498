//! Product catalog: categories, products, their images and size variants.

mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

pub use handlers::{admin_routes, routes};
