//! Ciclo de vida de citas

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::models::appointment::{Appointment, AppointmentFilters, AppointmentStatus, CreateAppointmentRequest};
use crate::repositories::FieldServiceStore;
use crate::utils::errors::{bad_request_error, not_found_error, AppResult};

pub struct AppointmentService {
    store: Arc<dyn FieldServiceStore>,
}

impl AppointmentService {
    pub fn new(store: Arc<dyn FieldServiceStore>) -> Self {
        Self { store }
    }

    /// Alta de cita: `scheduled` si ya trae técnico, si no `pending`
    pub async fn create(&self, business_id: Uuid, request: &CreateAppointmentRequest) -> AppResult<Appointment> {
        request.validate()?;

        if let Some(technician_id) = request.technician_id {
            self.store
                .find_technician(technician_id)
                .await?
                .filter(|t| t.business_id == business_id)
                .ok_or_else(|| not_found_error("Technician", &technician_id.to_string()))?;
        }

        let status = if request.technician_id.is_some() {
            AppointmentStatus::Scheduled
        } else {
            AppointmentStatus::Pending
        };

        let appointment = self.store.create_appointment(business_id, request, status).await?;
        log::info!("✅ Cita {} creada ({})", appointment.id, appointment.status);
        Ok(appointment)
    }

    pub async fn list(&self, business_id: Uuid, filters: &AppointmentFilters) -> AppResult<Vec<Appointment>> {
        self.store.list_appointments(business_id, filters).await
    }

    /// Cambia el estado respetando el ciclo de vida. Si la cita pertenece a
    /// una ruta y todas sus citas quedan terminadas, la ruta se cierra.
    pub async fn update_status(
        &self,
        business_id: Uuid,
        appointment_id: Uuid,
        next: AppointmentStatus,
    ) -> AppResult<Appointment> {
        let current = self
            .store
            .find_appointment(appointment_id)
            .await?
            .filter(|a| a.business_id == business_id)
            .ok_or_else(|| not_found_error("Appointment", &appointment_id.to_string()))?;

        if !current.status.can_transition_to(next) {
            return Err(bad_request_error(&format!(
                "Invalid status transition {} -> {}",
                current.status, next
            )));
        }

        let updated = self.store.update_appointment_status(appointment_id, next).await?;
        log::info!("🔄 Cita {}: {} -> {}", appointment_id, current.status, next);

        if next.is_terminal() {
            if let Some(route_id) = updated.route_id {
                self.close_route_if_done(route_id).await?;
            }
        }

        Ok(updated)
    }

    async fn close_route_if_done(&self, route_id: Uuid) -> AppResult<()> {
        let appointments = self.store.list_route_appointments(&[route_id]).await?;
        if !appointments.iter().all(|a| a.status.is_terminal()) {
            return Ok(());
        }

        let route = self.store.complete_route(route_id, Utc::now()).await?;
        log::info!("🏁 Ruta {} completada ({} citas)", route.id, appointments.len());
        Ok(())
    }
}
