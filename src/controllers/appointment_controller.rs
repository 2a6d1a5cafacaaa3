use std::sync::Arc;
use uuid::Uuid;

use crate::dto::ApiResponse;
use crate::models::appointment::{
    Appointment, AppointmentFilters, CreateAppointmentRequest, UpdateAppointmentStatusRequest,
};
use crate::services::AppointmentService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct AppointmentController {
    appointments: Arc<AppointmentService>,
}

impl AppointmentController {
    pub fn new(state: &AppState) -> Self {
        Self {
            appointments: state.appointments.clone(),
        }
    }

    pub async fn list(&self, business_id: Uuid, filters: AppointmentFilters) -> Result<Vec<Appointment>, AppError> {
        self.appointments.list(business_id, &filters).await
    }

    pub async fn create(
        &self,
        business_id: Uuid,
        request: CreateAppointmentRequest,
    ) -> Result<ApiResponse<Appointment>, AppError> {
        let appointment = self.appointments.create(business_id, &request).await?;
        Ok(ApiResponse::success_with_message(appointment, "Cita creada exitosamente"))
    }

    pub async fn update_status(
        &self,
        business_id: Uuid,
        id: Uuid,
        request: UpdateAppointmentStatusRequest,
    ) -> Result<ApiResponse<Appointment>, AppError> {
        let appointment = self
            .appointments
            .update_status(business_id, id, request.status)
            .await?;
        Ok(ApiResponse::success_with_message(
            appointment,
            format!("Estado actualizado a {}", request.status),
        ))
    }
}
