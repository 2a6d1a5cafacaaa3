use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::route::{OptimizationStatus, Route, RouteStatus, Waypoint};

// Response de ruta
#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    pub id: Uuid,
    pub business_id: Uuid,
    pub technician_id: Uuid,
    pub route_date: NaiveDate,
    pub status: RouteStatus,
    pub waypoints: Vec<Waypoint>,
    pub total_distance_miles: Option<f64>,
    pub total_duration_minutes: Option<f64>,
    pub optimization_status: OptimizationStatus,
    pub optimized_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Route> for RouteResponse {
    fn from(route: Route) -> Self {
        let mut waypoints = route.waypoints.0;
        waypoints.sort_by_key(|w| w.order);
        Self {
            id: route.id,
            business_id: route.business_id,
            technician_id: route.technician_id,
            route_date: route.route_date,
            status: route.status,
            waypoints,
            total_distance_miles: route.total_distance_miles,
            total_duration_minutes: route.total_duration_minutes,
            optimization_status: route.optimization_status,
            optimized_at: route.optimized_at,
            started_at: route.started_at,
            completed_at: route.completed_at,
            created_at: route.created_at,
        }
    }
}

// Resultado de la optimización automática
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationOutcome {
    pub distance_saved: f64,
    pub time_saved: f64,
    pub new_sequence: Vec<Uuid>,
    pub route: RouteResponse,
}
