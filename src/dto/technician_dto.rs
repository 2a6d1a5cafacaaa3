use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::appointment::Appointment;
use crate::models::route::{OptimizationStatus, Route, RouteStatus, Waypoint};
use crate::models::technician::{GeoPoint, Technician, TechnicianStatus};

// Ruta activa de un técnico con sus citas
#[derive(Debug, Clone, Serialize)]
pub struct ActiveRouteView {
    pub id: Uuid,
    pub route_date: chrono::NaiveDate,
    pub status: RouteStatus,
    pub optimization_status: OptimizationStatus,
    pub waypoints: Vec<Waypoint>,
    pub total_distance_miles: Option<f64>,
    pub total_duration_minutes: Option<f64>,
    pub appointments: Vec<Appointment>,
}

impl ActiveRouteView {
    pub fn new(route: &Route, appointments: Vec<Appointment>) -> Self {
        Self {
            id: route.id,
            route_date: route.route_date,
            status: route.status,
            optimization_status: route.optimization_status,
            waypoints: route.waypoints.0.clone(),
            total_distance_miles: route.total_distance_miles,
            total_duration_minutes: route.total_duration_minutes,
            appointments,
        }
    }
}

// Vista denormalizada por técnico para el mapa
#[derive(Debug, Clone, Serialize)]
pub struct TechnicianLocation {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
    pub location: Option<GeoPoint>,
    pub last_location_update: Option<DateTime<Utc>>,
    pub status: TechnicianStatus,
    pub active_route: Option<ActiveRouteView>,
    pub current_appointment: Option<Appointment>,
    pub next_appointment: Option<Appointment>,
}

// Snapshot mantenido por el feed en vivo
#[derive(Debug, Clone, Default, Serialize)]
pub struct LiveLocationsSnapshot {
    pub technicians: Vec<TechnicianLocation>,
    pub error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub realtime_connected: bool,
    pub refresh_count: u64,
}

// Marcador de técnico en el mapa
#[derive(Debug, Clone, Serialize)]
pub struct MapMarker {
    pub technician_id: Uuid,
    pub label: String,
    pub position: GeoPoint,
    pub status: TechnicianStatus,
}

// Polilínea de una ruta activa
#[derive(Debug, Clone, Serialize)]
pub struct MapPolyline {
    pub route_id: Uuid,
    pub technician_id: Uuid,
    pub points: Vec<GeoPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub center: GeoPoint,
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
    pub polylines: Vec<MapPolyline>,
}

// Response de técnico
#[derive(Debug, Serialize)]
pub struct TechnicianResponse {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
    pub status: TechnicianStatus,
    pub is_active: bool,
    pub skills: usize,
    pub availability_slots: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&Technician> for TechnicianResponse {
    fn from(technician: &Technician) -> Self {
        Self {
            id: technician.id,
            business_id: technician.business_id,
            name: technician.full_name(),
            email: technician.email.clone(),
            phone: technician.phone.clone(),
            photo_url: technician.photo_url.clone(),
            status: technician.status,
            is_active: technician.is_active,
            skills: 0,
            availability_slots: 0,
            created_at: technician.created_at,
        }
    }
}
