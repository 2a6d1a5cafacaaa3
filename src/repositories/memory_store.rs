//! Implementación en memoria de `FieldServiceStore`
//!
//! Respeta los mismos órdenes de lectura que las consultas SQL. Se usa en
//! tests y para levantar el servidor sin base de datos.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::store::FieldServiceStore;
use crate::models::appointment::{
    Appointment, AppointmentFilters, AppointmentStatus, CreateAppointmentRequest,
};
use crate::models::route::{
    AppointmentAssignment, NewRoute, OptimizationStatus, Route, RouteSequenceUpdate, RouteStatus,
};
use crate::models::technician::{
    CreateTechnicianRequest, CreatedTechnician, Technician, TechnicianAvailability, TechnicianSkill,
    TechnicianStatus,
};
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Default)]
struct Tables {
    technicians: Vec<Technician>,
    skills: Vec<TechnicianSkill>,
    availability: Vec<TechnicianAvailability>,
    routes: Vec<Route>,
    appointments: Vec<Appointment>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simula una caída del backend: toda operación devuelve error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn insert_technician(&self, technician: Technician) -> AppResult<()> {
        self.write()?.technicians.push(technician);
        Ok(())
    }

    pub fn insert_route(&self, route: Route) -> AppResult<()> {
        self.write()?.routes.push(route);
        Ok(())
    }

    pub fn insert_appointment(&self, appointment: Appointment) -> AppResult<()> {
        self.write()?.appointments.push(appointment);
        Ok(())
    }

    /// Número de filas de habilidades y disponibilidad guardadas
    pub fn child_row_counts(&self) -> AppResult<(usize, usize)> {
        let tables = self.read()?;
        Ok((tables.skills.len(), tables.availability.len()))
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::ServiceUnavailable("datastore unavailable".to_string()));
        }
        Ok(())
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Tables>> {
        self.check_available()?;
        self.tables
            .read()
            .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Tables>> {
        self.check_available()?;
        self.tables
            .write()
            .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
    }
}

fn apply_sequence(tables: &mut Tables, update: RouteSequenceUpdate) -> AppResult<Route> {
    let route = tables
        .routes
        .iter_mut()
        .find(|r| r.id == update.route_id)
        .ok_or_else(|| not_found_error("Route", &update.route_id.to_string()))?;

    route.waypoints.0 = update.waypoints;
    route.optimization_status = update.optimization_status;
    route.optimized_at = update.optimized_at;
    route.total_distance_miles = update.total_distance_miles;
    route.total_duration_minutes = update.total_duration_minutes;
    Ok(route.clone())
}

#[async_trait]
impl FieldServiceStore for InMemoryStore {
    async fn list_active_technicians(&self, business_id: Uuid) -> AppResult<Vec<Technician>> {
        let tables = self.read()?;
        let mut technicians: Vec<Technician> = tables
            .technicians
            .iter()
            .filter(|t| t.business_id == business_id && t.is_active)
            .cloned()
            .collect();
        technicians.sort_by(|a, b| {
            (a.last_name.as_str(), a.first_name.as_str()).cmp(&(b.last_name.as_str(), b.first_name.as_str()))
        });
        Ok(technicians)
    }

    async fn find_technician(&self, id: Uuid) -> AppResult<Option<Technician>> {
        Ok(self.read()?.technicians.iter().find(|t| t.id == id).cloned())
    }

    async fn create_technician(
        &self,
        business_id: Uuid,
        request: &CreateTechnicianRequest,
    ) -> AppResult<CreatedTechnician> {
        let mut tables = self.write()?;

        let technician = Technician {
            id: Uuid::new_v4(),
            business_id,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            photo_url: request.photo_url.clone(),
            current_latitude: None,
            current_longitude: None,
            last_location_update: None,
            status: TechnicianStatus::OffDuty,
            is_active: true,
            created_at: Utc::now(),
        };
        let skills: Vec<TechnicianSkill> = request
            .skills
            .iter()
            .map(|s| TechnicianSkill {
                id: Uuid::new_v4(),
                technician_id: technician.id,
                service_id: s.service_id,
                proficiency_level: s.proficiency_level,
            })
            .collect();
        let availability: Vec<TechnicianAvailability> = request
            .availability
            .iter()
            .map(|a| TechnicianAvailability {
                id: Uuid::new_v4(),
                technician_id: technician.id,
                day_of_week: a.day_of_week,
                start_time: a.start_time,
                end_time: a.end_time,
            })
            .collect();

        tables.technicians.push(technician.clone());
        tables.skills.extend(skills.iter().cloned());
        tables.availability.extend(availability.iter().cloned());

        Ok(CreatedTechnician {
            technician,
            skills,
            availability,
        })
    }

    async fn list_active_routes(&self, technician_ids: &[Uuid]) -> AppResult<Vec<Route>> {
        let tables = self.read()?;
        let mut routes: Vec<Route> = tables
            .routes
            .iter()
            .filter(|r| r.status == RouteStatus::Active && technician_ids.contains(&r.technician_id))
            .cloned()
            .collect();
        routes.sort_by(|a, b| (b.route_date, b.created_at).cmp(&(a.route_date, a.created_at)));
        Ok(routes)
    }

    async fn list_routes(&self, business_id: Uuid, date: Option<NaiveDate>) -> AppResult<Vec<Route>> {
        let tables = self.read()?;
        let mut routes: Vec<Route> = tables
            .routes
            .iter()
            .filter(|r| r.business_id == business_id && date.map_or(true, |d| r.route_date == d))
            .cloned()
            .collect();
        routes.sort_by(|a, b| (b.route_date, b.created_at).cmp(&(a.route_date, a.created_at)));
        Ok(routes)
    }

    async fn find_route(&self, id: Uuid) -> AppResult<Option<Route>> {
        Ok(self.read()?.routes.iter().find(|r| r.id == id).cloned())
    }

    async fn find_route_for_day(&self, technician_id: Uuid, date: NaiveDate) -> AppResult<Option<Route>> {
        Ok(self
            .read()?
            .routes
            .iter()
            .filter(|r| {
                r.technician_id == technician_id && r.route_date == date && r.status != RouteStatus::Cancelled
            })
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn create_route(&self, new_route: NewRoute) -> AppResult<Route> {
        let route = Route {
            id: Uuid::new_v4(),
            business_id: new_route.business_id,
            technician_id: new_route.technician_id,
            route_date: new_route.route_date,
            status: RouteStatus::Planned,
            waypoints: sqlx::types::Json(Vec::new()),
            total_distance_miles: None,
            total_duration_minutes: None,
            optimization_status: OptimizationStatus::Draft,
            optimized_at: None,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
        };
        self.write()?.routes.push(route.clone());
        Ok(route)
    }

    async fn save_route_sequence(&self, update: RouteSequenceUpdate) -> AppResult<Route> {
        let mut tables = self.write()?;
        apply_sequence(&mut tables, update)
    }

    async fn complete_route(&self, id: Uuid, completed_at: DateTime<Utc>) -> AppResult<Route> {
        let mut tables = self.write()?;
        let route = tables
            .routes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found_error("Route", &id.to_string()))?;
        route.status = RouteStatus::Completed;
        route.completed_at = Some(completed_at);
        Ok(route.clone())
    }

    async fn list_route_appointments(&self, route_ids: &[Uuid]) -> AppResult<Vec<Appointment>> {
        let tables = self.read()?;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .iter()
            .filter(|a| a.route_id.map_or(false, |id| route_ids.contains(&id)))
            .cloned()
            .collect();
        // sort estable: en empate se conserva el orden de inserción
        appointments.sort_by_key(|a| a.scheduled_start);
        Ok(appointments)
    }

    async fn list_appointments(
        &self,
        business_id: Uuid,
        filters: &AppointmentFilters,
    ) -> AppResult<Vec<Appointment>> {
        let tables = self.read()?;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .iter()
            .filter(|a| a.business_id == business_id)
            .filter(|a| filters.status.map_or(true, |s| a.status == s))
            .filter(|a| filters.technician_id.map_or(true, |t| a.technician_id == Some(t)))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.scheduled_start);
        if let Some(limit) = filters.limit {
            appointments.truncate(limit.max(0) as usize);
        }
        Ok(appointments)
    }

    async fn find_appointment(&self, id: Uuid) -> AppResult<Option<Appointment>> {
        Ok(self.read()?.appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn create_appointment(
        &self,
        business_id: Uuid,
        request: &CreateAppointmentRequest,
        status: AppointmentStatus,
    ) -> AppResult<Appointment> {
        let appointment = Appointment {
            id: Uuid::new_v4(),
            business_id,
            customer_id: request.customer_id,
            service_id: request.service_id,
            technician_id: request.technician_id,
            route_id: None,
            scheduled_start: request.scheduled_start,
            scheduled_end: request.scheduled_end,
            status,
            address: request.address.clone(),
            latitude: request.latitude,
            longitude: request.longitude,
            notes: request.notes.clone(),
            created_at: Utc::now(),
        };
        self.write()?.appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment_status(&self, id: Uuid, status: AppointmentStatus) -> AppResult<Appointment> {
        let mut tables = self.write()?;
        let appointment = tables
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found_error("Appointment", &id.to_string()))?;
        appointment.status = status;
        let appointment = appointment.clone();

        if let (true, Some(route_id)) = (status.starts_route(), appointment.route_id) {
            if let Some(route) = tables
                .routes
                .iter_mut()
                .find(|r| r.id == route_id && r.status == RouteStatus::Planned)
            {
                route.status = RouteStatus::Active;
                route.started_at.get_or_insert_with(Utc::now);
            }
        }
        Ok(appointment)
    }

    async fn assign_appointment(&self, appointment_id: Uuid, route_id: Uuid) -> AppResult<Route> {
        let mut tables = self.write()?;

        let current_route_id = tables
            .appointments
            .iter()
            .find(|a| a.id == appointment_id)
            .ok_or_else(|| not_found_error("Appointment", &appointment_id.to_string()))?
            .route_id;
        let target = tables
            .routes
            .iter()
            .find(|r| r.id == route_id)
            .ok_or_else(|| not_found_error("Route", &route_id.to_string()))?;

        if current_route_id == Some(route_id) {
            return Ok(target.clone());
        }

        let previous = current_route_id.and_then(|id| tables.routes.iter().find(|r| r.id == id));
        let assignment = AppointmentAssignment::plan(appointment_id, target, previous)?;

        if let Some(appointment) = tables.appointments.iter_mut().find(|a| a.id == appointment_id) {
            appointment.route_id = Some(route_id);
            appointment.technician_id = Some(assignment.technician_id);
        }
        if let Some(previous) = assignment.previous {
            apply_sequence(&mut tables, previous)?;
        }
        apply_sequence(&mut tables, assignment.target)
    }
}
