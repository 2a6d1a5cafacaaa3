//! Middleware del sistema
//!
//! Alcance por empresa (JWT) y CORS.

pub mod auth;
pub mod cors;

pub use auth::{business_scope_middleware, BusinessScope};
pub use cors::cors_layer;
