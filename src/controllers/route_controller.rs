use std::sync::Arc;
use uuid::Uuid;

use crate::dto::route_dto::{OptimizationOutcome, RouteResponse};
use crate::dto::ApiResponse;
use crate::models::route::{AssignAppointmentRequest, CreateRouteRequest, ReorderRouteRequest, RouteFilters};
use crate::services::RouteSequenceService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::parse_date;

pub struct RouteController {
    routes: Arc<RouteSequenceService>,
}

impl RouteController {
    pub fn new(state: &AppState) -> Self {
        Self {
            routes: state.routes.clone(),
        }
    }

    pub async fn list(&self, business_id: Uuid, filters: RouteFilters) -> Result<Vec<RouteResponse>, AppError> {
        let date = filters.date.as_deref().map(parse_date).transpose()?;
        let routes = self.routes.list_routes(business_id, date).await?;
        Ok(routes.into_iter().map(RouteResponse::from).collect())
    }

    pub async fn create(
        &self,
        business_id: Uuid,
        request: CreateRouteRequest,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        let route = self.routes.create_route(business_id, &request).await?;
        Ok(ApiResponse::success_with_message(route.into(), "Ruta creada exitosamente"))
    }

    pub async fn get_by_id(&self, business_id: Uuid, id: Uuid) -> Result<RouteResponse, AppError> {
        Ok(self.routes.get(business_id, id).await?.into())
    }

    pub async fn reorder(
        &self,
        business_id: Uuid,
        id: Uuid,
        request: ReorderRouteRequest,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        let route = self.routes.reorder(business_id, id, &request.appointment_ids).await?;
        Ok(ApiResponse::success_with_message(route.into(), "Secuencia actualizada"))
    }

    pub async fn optimize(&self, business_id: Uuid, id: Uuid) -> Result<ApiResponse<OptimizationOutcome>, AppError> {
        let outcome = self.routes.optimize(business_id, id).await?;
        Ok(ApiResponse::success_with_message(outcome, "Ruta optimizada"))
    }

    pub async fn assign_appointment(
        &self,
        business_id: Uuid,
        id: Uuid,
        request: AssignAppointmentRequest,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        let route = self
            .routes
            .assign_appointment(business_id, id, request.appointment_id)
            .await?;
        Ok(ApiResponse::success_with_message(route.into(), "Cita asignada a la ruta"))
    }
}
