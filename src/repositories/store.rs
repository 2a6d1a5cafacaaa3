//! Contrato de acceso a datos
//!
//! Los servicios trabajan contra `FieldServiceStore`; en producción lo
//! implementa `PgFieldServiceStore` y en tests `InMemoryStore`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::appointment::{
    Appointment, AppointmentFilters, AppointmentStatus, CreateAppointmentRequest,
};
use crate::models::route::{NewRoute, Route, RouteSequenceUpdate};
use crate::models::technician::{CreateTechnicianRequest, CreatedTechnician, Technician};
use crate::utils::errors::AppResult;

#[async_trait]
pub trait FieldServiceStore: Send + Sync {
    /// Técnicos activos de la empresa, ordenados por apellido y nombre
    async fn list_active_technicians(&self, business_id: Uuid) -> AppResult<Vec<Technician>>;

    async fn find_technician(&self, id: Uuid) -> AppResult<Option<Technician>>;

    /// Alta atómica: técnico, habilidades y disponibilidad
    async fn create_technician(
        &self,
        business_id: Uuid,
        request: &CreateTechnicianRequest,
    ) -> AppResult<CreatedTechnician>;

    /// Rutas `active` de los técnicos dados, más recientes primero
    async fn list_active_routes(&self, technician_ids: &[Uuid]) -> AppResult<Vec<Route>>;

    async fn list_routes(&self, business_id: Uuid, date: Option<NaiveDate>) -> AppResult<Vec<Route>>;

    async fn find_route(&self, id: Uuid) -> AppResult<Option<Route>>;

    /// Ruta no cancelada de un técnico para un día
    async fn find_route_for_day(&self, technician_id: Uuid, date: NaiveDate) -> AppResult<Option<Route>>;

    async fn create_route(&self, new_route: NewRoute) -> AppResult<Route>;

    async fn save_route_sequence(&self, update: RouteSequenceUpdate) -> AppResult<Route>;

    async fn complete_route(&self, id: Uuid, completed_at: DateTime<Utc>) -> AppResult<Route>;

    /// Citas de las rutas dadas, por hora programada ascendente
    async fn list_route_appointments(&self, route_ids: &[Uuid]) -> AppResult<Vec<Appointment>>;

    async fn list_appointments(
        &self,
        business_id: Uuid,
        filters: &AppointmentFilters,
    ) -> AppResult<Vec<Appointment>>;

    async fn find_appointment(&self, id: Uuid) -> AppResult<Option<Appointment>>;

    async fn create_appointment(
        &self,
        business_id: Uuid,
        request: &CreateAppointmentRequest,
        status: AppointmentStatus,
    ) -> AppResult<Appointment>;

    async fn update_appointment_status(&self, id: Uuid, status: AppointmentStatus) -> AppResult<Appointment>;

    /// Mueve una cita al final de una ruta y la quita de su ruta anterior.
    /// Lee y reescribe ambas secuencias de forma atómica.
    async fn assign_appointment(&self, appointment_id: Uuid, route_id: Uuid) -> AppResult<Route>;
}
