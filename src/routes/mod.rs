pub mod auth;

pub use auth::{create_auth_routes, create_protected_auth_routes};
