use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::appointment_controller::AppointmentController;
use crate::dto::ApiResponse;
use crate::middleware::BusinessScope;
use crate::models::appointment::{
    Appointment, AppointmentFilters, CreateAppointmentRequest, UpdateAppointmentStatusRequest,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_appointment_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_appointments).post(create_appointment))
        .route("/:id/status", patch(update_appointment_status))
}

async fn list_appointments(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
    Query(filters): Query<AppointmentFilters>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let controller = AppointmentController::new(&state);
    let response = controller.list(scope.business_id, filters).await?;
    Ok(Json(response))
}

async fn create_appointment(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Appointment>>), AppError> {
    let controller = AppointmentController::new(&state);
    let response = controller.create(scope.business_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_appointment_status(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentStatusRequest>,
) -> Result<Json<ApiResponse<Appointment>>, AppError> {
    let controller = AppointmentController::new(&state);
    let response = controller.update_status(scope.business_id, id, request).await?;
    Ok(Json(response))
}
