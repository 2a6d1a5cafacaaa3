//! Modelo de Route
//!
//! Una ruta es la lista ordenada de trabajo de un técnico para un día.
//! La secuencia se guarda como JSONB (`waypoints`) en la tabla routes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::utils::errors::{bad_request_error, AppResult};

/// Estado de la ruta - mapea al ENUM route_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "route_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Planned,
    Active,
    Completed,
    Cancelled,
}

/// Estado de optimización - mapea al ENUM optimization_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "optimization_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStatus {
    Draft,
    Optimized,
}

/// Entrada de la secuencia de una ruta
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Waypoint {
    pub appointment_id: Uuid,
    /// Posición 1-based, única y contigua dentro de la ruta
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Waypoint {
    pub fn bare(appointment_id: Uuid, order: i32) -> Self {
        Self {
            appointment_id,
            order,
            eta: None,
            latitude: None,
            longitude: None,
        }
    }
}

/// Route principal - mapea a la tabla routes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Route {
    pub id: Uuid,
    pub business_id: Uuid,
    pub technician_id: Uuid,
    pub route_date: NaiveDate,
    pub status: RouteStatus,
    pub waypoints: Json<Vec<Waypoint>>,
    pub total_distance_miles: Option<f64>,
    pub total_duration_minutes: Option<f64>,
    pub optimization_status: OptimizationStatus,
    pub optimized_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Route {
    pub fn is_closed(&self) -> bool {
        matches!(self.status, RouteStatus::Completed | RouteStatus::Cancelled)
    }

    /// Ids de citas en el orden de la secuencia actual
    pub fn sequence(&self) -> Vec<Uuid> {
        let mut waypoints: Vec<&Waypoint> = self.waypoints.0.iter().collect();
        waypoints.sort_by_key(|w| w.order);
        waypoints.into_iter().map(|w| w.appointment_id).collect()
    }
}

/// Escritura de una nueva secuencia para una ruta
#[derive(Debug, Clone)]
pub struct RouteSequenceUpdate {
    pub route_id: Uuid,
    pub waypoints: Vec<Waypoint>,
    pub optimization_status: OptimizationStatus,
    pub optimized_at: Option<DateTime<Utc>>,
    pub total_distance_miles: Option<f64>,
    pub total_duration_minutes: Option<f64>,
}

impl RouteSequenceUpdate {
    /// Reescritura manual: conserva totales y marca de optimización
    pub fn manual(route: &Route, waypoints: Vec<Waypoint>) -> Self {
        Self {
            route_id: route.id,
            waypoints,
            optimization_status: OptimizationStatus::Draft,
            optimized_at: route.optimized_at,
            total_distance_miles: route.total_distance_miles,
            total_duration_minutes: route.total_duration_minutes,
        }
    }
}

/// Escrituras de una asignación de cita a ruta
#[derive(Debug, Clone)]
pub struct AppointmentAssignment {
    pub appointment_id: Uuid,
    pub technician_id: Uuid,
    pub target: RouteSequenceUpdate,
    /// Ruta anterior de la cita, ya sin ella
    pub previous: Option<RouteSequenceUpdate>,
}

impl AppointmentAssignment {
    /// Calcula las dos secuencias a partir de las filas actuales de las rutas.
    /// El store lo invoca con esas filas bloqueadas.
    pub fn plan(appointment_id: Uuid, target: &Route, previous: Option<&Route>) -> AppResult<Self> {
        if target.is_closed() {
            return Err(bad_request_error(&format!("Route {} is closed", target.id)));
        }

        let previous = previous.filter(|r| r.id != target.id).map(|route| {
            let remaining: Vec<Uuid> = route
                .sequence()
                .into_iter()
                .filter(|id| *id != appointment_id)
                .collect();
            RouteSequenceUpdate::manual(route, resequence(&route.waypoints.0, &remaining))
        });

        let mut sequence: Vec<Uuid> = target
            .sequence()
            .into_iter()
            .filter(|id| *id != appointment_id)
            .collect();
        sequence.push(appointment_id);

        Ok(Self {
            appointment_id,
            technician_id: target.technician_id,
            target: RouteSequenceUpdate::manual(target, resequence(&target.waypoints.0, &sequence)),
            previous,
        })
    }
}

/// Datos para crear una ruta
#[derive(Debug, Clone)]
pub struct NewRoute {
    pub business_id: Uuid,
    pub technician_id: Uuid,
    pub route_date: NaiveDate,
}

/// Request para crear una ruta
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRouteRequest {
    pub technician_id: Uuid,
    /// YYYY-MM-DD
    pub route_date: String,
}

/// Request de reordenación manual
#[derive(Debug, Clone, Deserialize)]
pub struct ReorderRouteRequest {
    pub appointment_ids: Vec<Uuid>,
}

/// Request para asignar una cita a una ruta
#[derive(Debug, Clone, Deserialize)]
pub struct AssignAppointmentRequest {
    pub appointment_id: Uuid,
}

/// Filtros para búsqueda de rutas
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteFilters {
    /// YYYY-MM-DD
    pub date: Option<String>,
}

/// Construye la secuencia `order = posición + 1` para los ids dados,
/// reutilizando los campos de un waypoint previo de la misma cita.
pub fn resequence(existing: &[Waypoint], ordered_ids: &[Uuid]) -> Vec<Waypoint> {
    let previous: HashMap<Uuid, &Waypoint> = existing
        .iter()
        .map(|w| (w.appointment_id, w))
        .collect();

    ordered_ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let order = index as i32 + 1;
            match previous.get(id) {
                Some(waypoint) => Waypoint {
                    order,
                    ..(*waypoint).clone()
                },
                None => Waypoint::bare(*id, order),
            }
        })
        .collect()
}

/// Primer id repetido, si existe
pub fn first_duplicate(ids: &[Uuid]) -> Option<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().find(|id| !seen.insert(*id))
}

/// `true` si los `order` son una permutación de `1..=N`
pub fn is_contiguous(waypoints: &[Waypoint]) -> bool {
    let mut orders: Vec<i32> = waypoints.iter().map(|w| w.order).collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(index, order)| *order == index as i32 + 1)
}

/// `true` si la secuencia cubre exactamente las citas dadas, una vez cada
/// una, con `order` contiguo desde 1
pub fn is_sequence_of(waypoints: &[Waypoint], appointment_ids: &[Uuid]) -> bool {
    let sequenced: HashSet<Uuid> = waypoints.iter().map(|w| w.appointment_id).collect();
    let expected: HashSet<Uuid> = appointment_ids.iter().copied().collect();
    waypoints.len() == appointment_ids.len() && sequenced == expected && is_contiguous(waypoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resequence_assigns_one_based_positions() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let existing = vec![Waypoint::bare(a, 1), Waypoint::bare(b, 2), Waypoint::bare(c, 3)];

        let result = resequence(&existing, &[c, a, b]);

        let pairs: Vec<(Uuid, i32)> = result.iter().map(|w| (w.appointment_id, w.order)).collect();
        assert_eq!(pairs, vec![(c, 1), (a, 2), (b, 3)]);
        assert!(is_contiguous(&result));
    }

    #[test]
    fn test_resequence_preserves_waypoint_fields() {
        let a = Uuid::new_v4();
        let eta = Utc::now();
        let existing = vec![Waypoint {
            appointment_id: a,
            order: 4,
            eta: Some(eta),
            latitude: Some(40.7),
            longitude: Some(-74.0),
        }];
        let fresh = Uuid::new_v4();

        let result = resequence(&existing, &[fresh, a]);

        assert_eq!(result[0], Waypoint::bare(fresh, 1));
        assert_eq!(result[1].order, 2);
        assert_eq!(result[1].eta, Some(eta));
        assert_eq!(result[1].latitude, Some(40.7));
    }

    #[test]
    fn test_resequence_is_idempotent() {
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let once = resequence(&[], &ids);
        let twice = resequence(&once, &ids);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_first_duplicate() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(first_duplicate(&[a, b]), None);
        assert_eq!(first_duplicate(&[a, b, a]), Some(a));
    }

    #[test]
    fn test_is_contiguous_detects_gaps() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(is_contiguous(&[]));
        assert!(!is_contiguous(&[Waypoint::bare(a, 1), Waypoint::bare(b, 3)]));
        assert!(!is_contiguous(&[Waypoint::bare(a, 1), Waypoint::bare(b, 1)]));
    }

    #[test]
    fn test_is_sequence_of_checks_members() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let waypoints = vec![Waypoint::bare(b, 1), Waypoint::bare(a, 2)];

        assert!(is_sequence_of(&waypoints, &[a, b]));
        assert!(!is_sequence_of(&waypoints, &[a]));
        assert!(!is_sequence_of(&waypoints, &[a, Uuid::new_v4()]));
        assert!(!is_sequence_of(&[Waypoint::bare(a, 1), Waypoint::bare(a, 2)], &[a, b]));
    }

    fn route_with(ids: &[Uuid], status: RouteStatus) -> Route {
        Route {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            technician_id: Uuid::new_v4(),
            route_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            status,
            waypoints: Json(resequence(&[], ids)),
            total_distance_miles: None,
            total_duration_minutes: None,
            optimization_status: OptimizationStatus::Optimized,
            optimized_at: None,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_plan_assignment_moves_between_sequences() {
        let (a, b, moving) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let target = route_with(&[a], RouteStatus::Planned);
        let previous = route_with(&[moving, b], RouteStatus::Active);

        let plan = AppointmentAssignment::plan(moving, &target, Some(&previous)).unwrap();

        assert_eq!(plan.technician_id, target.technician_id);
        assert!(is_sequence_of(&plan.target.waypoints, &[a, moving]));
        assert_eq!(plan.target.waypoints[1], Waypoint::bare(moving, 2));
        assert_eq!(plan.target.optimization_status, OptimizationStatus::Draft);

        let previous_update = plan.previous.unwrap();
        assert_eq!(previous_update.route_id, previous.id);
        assert!(is_sequence_of(&previous_update.waypoints, &[b]));
    }

    #[test]
    fn test_plan_assignment_rejects_closed_route() {
        let target = route_with(&[], RouteStatus::Completed);
        assert!(AppointmentAssignment::plan(Uuid::new_v4(), &target, None).is_err());
    }

    #[test]
    fn test_waypoint_json_omits_empty_fields() {
        let id = Uuid::nil();
        let json = serde_json::to_value(Waypoint::bare(id, 1)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "appointment_id": id, "order": 1 })
        );
    }
}
