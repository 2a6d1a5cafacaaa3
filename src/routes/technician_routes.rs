use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::technician_controller::TechnicianController;
use crate::dto::technician_dto::{LiveLocationsSnapshot, MapView, TechnicianLocation, TechnicianResponse};
use crate::dto::ApiResponse;
use crate::middleware::BusinessScope;
use crate::models::technician::CreateTechnicianRequest;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_technician_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_technician))
        .route("/locations", get(get_locations))
        .route("/locations/live", get(get_live_locations))
        .route("/map", get(get_map))
        .route("/:id", get(get_technician))
}

async fn get_locations(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
) -> Result<Json<Vec<TechnicianLocation>>, AppError> {
    let controller = TechnicianController::new(&state);
    let response = controller.locations(scope.business_id).await?;
    Ok(Json(response))
}

async fn get_live_locations(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
) -> Result<Json<LiveLocationsSnapshot>, AppError> {
    let controller = TechnicianController::new(&state);
    let response = controller.live_locations(scope.business_id).await?;
    Ok(Json(response))
}

async fn get_map(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
) -> Result<Json<MapView>, AppError> {
    let controller = TechnicianController::new(&state);
    let response = controller.map(scope.business_id).await?;
    Ok(Json(response))
}

async fn create_technician(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
    Json(request): Json<CreateTechnicianRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TechnicianResponse>>), AppError> {
    let controller = TechnicianController::new(&state);
    let response = controller.create(scope.business_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_technician(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
    Path(id): Path<Uuid>,
) -> Result<Json<TechnicianResponse>, AppError> {
    let controller = TechnicianController::new(&state);
    let response = controller.get_by_id(scope.business_id, id).await?;
    Ok(Json(response))
}
