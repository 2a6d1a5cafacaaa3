use axum::{extract::State, routing::post, Json, Router};

use crate::controllers::geocoding_controller::GeocodingController;
use crate::services::geocoding_service::{GeocodingRequest, GeocodingResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_geocoding_router() -> Router<AppState> {
    Router::new().route("/geocode", post(geocode_address))
}

async fn geocode_address(
    State(state): State<AppState>,
    Json(request): Json<GeocodingRequest>,
) -> Result<Json<GeocodingResponse>, AppError> {
    let controller = GeocodingController::new(&state);
    let response = controller.geocode(request).await?;
    Ok(Json(response))
}
