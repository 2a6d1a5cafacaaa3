//! Implementación PostgreSQL de `FieldServiceStore`

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::appointment_repository::AppointmentRepository;
use super::route_repository::RouteRepository;
use super::store::FieldServiceStore;
use super::technician_repository::TechnicianRepository;
use crate::models::appointment::{
    Appointment, AppointmentFilters, AppointmentStatus, CreateAppointmentRequest,
};
use crate::models::route::{NewRoute, Route, RouteSequenceUpdate};
use crate::models::technician::{CreateTechnicianRequest, CreatedTechnician, Technician};
use crate::utils::errors::AppResult;

pub struct PgFieldServiceStore {
    technicians: TechnicianRepository,
    routes: RouteRepository,
    appointments: AppointmentRepository,
}

impl PgFieldServiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            technicians: TechnicianRepository::new(pool.clone()),
            routes: RouteRepository::new(pool.clone()),
            appointments: AppointmentRepository::new(pool),
        }
    }
}

#[async_trait]
impl FieldServiceStore for PgFieldServiceStore {
    async fn list_active_technicians(&self, business_id: Uuid) -> AppResult<Vec<Technician>> {
        self.technicians.find_active_by_business(business_id).await
    }

    async fn find_technician(&self, id: Uuid) -> AppResult<Option<Technician>> {
        self.technicians.find_by_id(id).await
    }

    async fn create_technician(
        &self,
        business_id: Uuid,
        request: &CreateTechnicianRequest,
    ) -> AppResult<CreatedTechnician> {
        self.technicians.create(business_id, request).await
    }

    async fn list_active_routes(&self, technician_ids: &[Uuid]) -> AppResult<Vec<Route>> {
        if technician_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.routes.find_active_by_technicians(technician_ids).await
    }

    async fn list_routes(&self, business_id: Uuid, date: Option<NaiveDate>) -> AppResult<Vec<Route>> {
        self.routes.find_by_business(business_id, date).await
    }

    async fn find_route(&self, id: Uuid) -> AppResult<Option<Route>> {
        self.routes.find_by_id(id).await
    }

    async fn find_route_for_day(&self, technician_id: Uuid, date: NaiveDate) -> AppResult<Option<Route>> {
        self.routes.find_for_day(technician_id, date).await
    }

    async fn create_route(&self, new_route: NewRoute) -> AppResult<Route> {
        self.routes.create(new_route).await
    }

    async fn save_route_sequence(&self, update: RouteSequenceUpdate) -> AppResult<Route> {
        self.routes.save_sequence(update).await
    }

    async fn complete_route(&self, id: Uuid, completed_at: DateTime<Utc>) -> AppResult<Route> {
        self.routes.complete(id, completed_at).await
    }

    async fn list_route_appointments(&self, route_ids: &[Uuid]) -> AppResult<Vec<Appointment>> {
        if route_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.appointments.find_by_routes(route_ids).await
    }

    async fn list_appointments(
        &self,
        business_id: Uuid,
        filters: &AppointmentFilters,
    ) -> AppResult<Vec<Appointment>> {
        self.appointments.find_by_business(business_id, filters).await
    }

    async fn find_appointment(&self, id: Uuid) -> AppResult<Option<Appointment>> {
        self.appointments.find_by_id(id).await
    }

    async fn create_appointment(
        &self,
        business_id: Uuid,
        request: &CreateAppointmentRequest,
        status: AppointmentStatus,
    ) -> AppResult<Appointment> {
        self.appointments.create(business_id, request, status).await
    }

    async fn update_appointment_status(&self, id: Uuid, status: AppointmentStatus) -> AppResult<Appointment> {
        self.appointments.update_status(id, status).await
    }

    async fn assign_appointment(&self, appointment_id: Uuid, route_id: Uuid) -> AppResult<Route> {
        self.routes.assign_appointment(appointment_id, route_id).await
    }
}
