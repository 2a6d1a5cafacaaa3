use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::route_controller::RouteController;
use crate::dto::route_dto::{OptimizationOutcome, RouteResponse};
use crate::dto::ApiResponse;
use crate::middleware::BusinessScope;
use crate::models::route::{AssignAppointmentRequest, CreateRouteRequest, ReorderRouteRequest, RouteFilters};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_route_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_routes).post(create_route))
        .route("/:id", get(get_route))
        .route("/:id/sequence", put(reorder_route))
        .route("/:id/optimize", post(optimize_route))
        .route("/:id/appointments", post(assign_appointment))
}

async fn list_routes(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
    Query(filters): Query<RouteFilters>,
) -> Result<Json<Vec<RouteResponse>>, AppError> {
    let controller = RouteController::new(&state);
    let response = controller.list(scope.business_id, filters).await?;
    Ok(Json(response))
}

async fn create_route(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
    Json(request): Json<CreateRouteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RouteResponse>>), AppError> {
    let controller = RouteController::new(&state);
    let response = controller.create(scope.business_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_route(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
    Path(id): Path<Uuid>,
) -> Result<Json<RouteResponse>, AppError> {
    let controller = RouteController::new(&state);
    let response = controller.get_by_id(scope.business_id, id).await?;
    Ok(Json(response))
}

async fn reorder_route(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReorderRouteRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(&state);
    let response = controller.reorder(scope.business_id, id, request).await?;
    Ok(Json(response))
}

async fn optimize_route(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OptimizationOutcome>>, AppError> {
    let controller = RouteController::new(&state);
    let response = controller.optimize(scope.business_id, id).await?;
    Ok(Json(response))
}

async fn assign_appointment(
    State(state): State<AppState>,
    Extension(scope): Extension<BusinessScope>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignAppointmentRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(&state);
    let response = controller.assign_appointment(scope.business_id, id, request).await?;
    Ok(Json(response))
}
