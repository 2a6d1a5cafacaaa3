//! Rutas HTTP
//!
//! Un router por recurso bajo `/api`, con el alcance por empresa aplicado
//! a todos ellos.

pub mod appointment_routes;
pub mod geocoding_routes;
pub mod route_routes;
pub mod technician_routes;

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::{business_scope_middleware, cors_layer};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/technicians", technician_routes::create_technician_router())
        .nest("/routes", route_routes::create_route_router())
        .nest("/appointments", appointment_routes::create_appointment_router())
        .merge(geocoding_routes::create_geocoding_router())
        .layer(from_fn_with_state(state.clone(), business_scope_middleware));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
