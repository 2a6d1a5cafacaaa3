//! Secuencia de rutas
//!
//! Reordenación manual, optimización provisional, asignación de citas y
//! alta de rutas por técnico y día.

use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::dto::route_dto::{OptimizationOutcome, RouteResponse};
use crate::models::route::{
    first_duplicate, resequence, CreateRouteRequest, NewRoute, OptimizationStatus, Route, RouteSequenceUpdate,
};
use crate::repositories::FieldServiceStore;
use crate::utils::errors::{bad_request_error, conflict_error, not_found_error, AppResult};
use crate::utils::validation::parse_date;

const DISTANCE_SAVED_MILES: (f64, f64) = (2.0, 12.0);
const TIME_SAVED_MINUTES: (f64, f64) = (10.0, 40.0);

pub struct RouteSequenceService {
    store: Arc<dyn FieldServiceStore>,
}

impl RouteSequenceService {
    pub fn new(store: Arc<dyn FieldServiceStore>) -> Self {
        Self { store }
    }

    /// Ruta de la empresa; `NotFound` si no existe o es de otra empresa
    pub async fn get(&self, business_id: Uuid, route_id: Uuid) -> AppResult<Route> {
        self.store
            .find_route(route_id)
            .await?
            .filter(|r| r.business_id == business_id)
            .ok_or_else(|| not_found_error("Route", &route_id.to_string()))
    }

    pub async fn list_routes(&self, business_id: Uuid, date: Option<NaiveDate>) -> AppResult<Vec<Route>> {
        self.store.list_routes(business_id, date).await
    }

    /// Una ruta por técnico y día; la ruta nace `planned` y en `draft`
    pub async fn create_route(&self, business_id: Uuid, request: &CreateRouteRequest) -> AppResult<Route> {
        let route_date = parse_date(&request.route_date)?;

        let technician = self
            .store
            .find_technician(request.technician_id)
            .await?
            .filter(|t| t.business_id == business_id)
            .ok_or_else(|| not_found_error("Technician", &request.technician_id.to_string()))?;

        if self.store.find_route_for_day(technician.id, route_date).await?.is_some() {
            return Err(conflict_error("Route", "route_date", &route_date.to_string()));
        }

        let route = self
            .store
            .create_route(NewRoute {
                business_id,
                technician_id: technician.id,
                route_date,
            })
            .await?;

        log::info!("✅ Ruta {} creada para {} el {}", route.id, technician.full_name(), route_date);
        Ok(route)
    }

    /// Reescribe la secuencia con el orden dado (1-based) y la deja en `draft`.
    /// Los ids deben ser exactamente las citas asignadas a la ruta.
    pub async fn reorder(&self, business_id: Uuid, route_id: Uuid, ordered_ids: &[Uuid]) -> AppResult<Route> {
        if let Some(duplicate) = first_duplicate(ordered_ids) {
            return Err(bad_request_error(&format!(
                "Appointment {} appears more than once in the sequence",
                duplicate
            )));
        }

        let route = self.get(business_id, route_id).await?;
        let assigned: HashSet<Uuid> = self
            .store
            .list_route_appointments(&[route.id])
            .await?
            .iter()
            .map(|a| a.id)
            .collect();

        if let Some(foreign) = ordered_ids.iter().find(|id| !assigned.contains(id)) {
            return Err(bad_request_error(&format!(
                "Appointment {} is not assigned to route {}",
                foreign, route_id
            )));
        }
        if ordered_ids.len() != assigned.len() {
            return Err(bad_request_error(&format!(
                "Sequence must list all {} appointments of route {}",
                assigned.len(),
                route_id
            )));
        }

        let waypoints = resequence(&route.waypoints.0, ordered_ids);
        let updated = self
            .store
            .save_route_sequence(RouteSequenceUpdate::manual(&route, waypoints))
            .await?;

        log::info!("🔄 Ruta {} reordenada ({} paradas)", route_id, ordered_ids.len());
        Ok(updated)
    }

    pub async fn optimize(&self, business_id: Uuid, route_id: Uuid) -> AppResult<OptimizationOutcome> {
        let mut rng = StdRng::from_entropy();
        self.optimize_with(business_id, route_id, &mut rng).await
    }

    /// Optimización provisional: invierte el orden actual y estima ahorros
    /// aleatorios. No calcula distancias reales.
    pub async fn optimize_with<R: Rng + Send>(
        &self,
        business_id: Uuid,
        route_id: Uuid,
        rng: &mut R,
    ) -> AppResult<OptimizationOutcome> {
        let route = self.get(business_id, route_id).await?;
        let appointments = self.store.list_route_appointments(&[route.id]).await?;

        let mut sequence: Vec<Uuid> = route
            .sequence()
            .into_iter()
            .filter(|id| appointments.iter().any(|a| a.id == *id))
            .collect();
        let unsequenced: Vec<Uuid> = appointments
            .iter()
            .map(|a| a.id)
            .filter(|id| !sequence.contains(id))
            .collect();
        sequence.extend(unsequenced);
        sequence.reverse();

        let distance_saved = round_tenth(rng.gen_range(DISTANCE_SAVED_MILES.0..=DISTANCE_SAVED_MILES.1));
        let time_saved = round_tenth(rng.gen_range(TIME_SAVED_MINUTES.0..=TIME_SAVED_MINUTES.1));

        let update = RouteSequenceUpdate {
            route_id: route.id,
            waypoints: resequence(&route.waypoints.0, &sequence),
            optimization_status: OptimizationStatus::Optimized,
            optimized_at: Some(Utc::now()),
            total_distance_miles: subtract_saving(route.total_distance_miles, distance_saved, "distance", route.id),
            total_duration_minutes: subtract_saving(route.total_duration_minutes, time_saved, "duration", route.id),
        };
        let updated = self.store.save_route_sequence(update).await?;

        log::info!(
            "🚀 Ruta {} optimizada: {} paradas, -{} mi, -{} min",
            route_id,
            sequence.len(),
            distance_saved,
            time_saved
        );

        Ok(OptimizationOutcome {
            distance_saved,
            time_saved,
            new_sequence: sequence,
            route: RouteResponse::from(updated),
        })
    }

    /// Añade la cita al final de la ruta y la quita de su ruta anterior
    pub async fn assign_appointment(&self, business_id: Uuid, route_id: Uuid, appointment_id: Uuid) -> AppResult<Route> {
        let route = self.get(business_id, route_id).await?;

        let appointment = self
            .store
            .find_appointment(appointment_id)
            .await?
            .filter(|a| a.business_id == business_id)
            .ok_or_else(|| not_found_error("Appointment", &appointment_id.to_string()))?;

        if appointment.status.is_terminal() {
            return Err(bad_request_error(&format!(
                "Appointment {} is {} and cannot be assigned",
                appointment_id, appointment.status
            )));
        }
        if appointment.route_id == Some(route.id) {
            return Ok(route);
        }

        let updated = self.store.assign_appointment(appointment_id, route.id).await?;

        log::info!(
            "📌 Cita {} asignada a la ruta {} (parada {})",
            appointment_id,
            route_id,
            updated.waypoints.0.len()
        );
        Ok(updated)
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Resta el ahorro al total guardado sin bajar de cero
fn subtract_saving(total: Option<f64>, saving: f64, metric: &str, route_id: Uuid) -> Option<f64> {
    total.map(|total| {
        let remaining = total - saving;
        if remaining < 0.0 {
            log::warn!("⚠️ Ruta {}: total de {} ({}) menor que el ahorro ({}), se fija a 0", route_id, metric, total, saving);
            0.0
        } else {
            remaining
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::appointment::{Appointment, AppointmentStatus};
    use crate::models::route::{is_sequence_of, RouteStatus, Waypoint};
    use crate::models::technician::{Technician, TechnicianStatus};
    use crate::repositories::InMemoryStore;
    use crate::utils::errors::AppError;
    use chrono::{DateTime, TimeZone};
    use sqlx::types::Json;

    struct Fixture {
        business_id: Uuid,
        store: Arc<InMemoryStore>,
        service: RouteSequenceService,
        route: Route,
        a: Uuid,
        b: Uuid,
        c: Uuid,
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    fn technician(business_id: Uuid) -> Technician {
        Technician {
            id: Uuid::new_v4(),
            business_id,
            first_name: "Ana".to_string(),
            last_name: "Ortiz".to_string(),
            email: None,
            phone: None,
            photo_url: None,
            current_latitude: None,
            current_longitude: None,
            last_location_update: None,
            status: TechnicianStatus::Available,
            is_active: true,
            created_at: at(0),
        }
    }

    fn route(business_id: Uuid, technician_id: Uuid) -> Route {
        Route {
            id: Uuid::new_v4(),
            business_id,
            technician_id,
            route_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            status: RouteStatus::Active,
            waypoints: Json(Vec::new()),
            total_distance_miles: Some(30.0),
            total_duration_minutes: Some(120.0),
            optimization_status: OptimizationStatus::Optimized,
            optimized_at: None,
            started_at: None,
            completed_at: None,
            created_at: at(0),
        }
    }

    fn appointment(route: Option<&Route>, business_id: Uuid, hour: u32) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            business_id,
            customer_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            technician_id: route.map(|r| r.technician_id),
            route_id: route.map(|r| r.id),
            scheduled_start: at(hour),
            scheduled_end: None,
            status: AppointmentStatus::Scheduled,
            address: None,
            latitude: None,
            longitude: None,
            notes: None,
            created_at: at(0),
        }
    }

    fn fixture() -> Fixture {
        let business_id = Uuid::new_v4();
        let store = Arc::new(InMemoryStore::new());
        let tech = technician(business_id);
        let mut r = route(business_id, tech.id);

        let a = appointment(Some(&r), business_id, 9);
        let b = appointment(Some(&r), business_id, 11);
        let c = appointment(Some(&r), business_id, 14);
        let mut first = Waypoint::bare(a.id, 1);
        first.latitude = Some(40.7);
        first.longitude = Some(-74.0);
        r.waypoints = Json(vec![first, Waypoint::bare(b.id, 2), Waypoint::bare(c.id, 3)]);

        store.insert_technician(tech).unwrap();
        store.insert_route(r.clone()).unwrap();
        for appt in [&a, &b, &c] {
            store.insert_appointment(appt.clone()).unwrap();
        }

        Fixture {
            business_id,
            service: RouteSequenceService::new(store.clone()),
            store,
            route: r,
            a: a.id,
            b: b.id,
            c: c.id,
        }
    }

    fn orders(route: &Route) -> Vec<(Uuid, i32)> {
        let mut pairs: Vec<(Uuid, i32)> = route.waypoints.0.iter().map(|w| (w.appointment_id, w.order)).collect();
        pairs.sort_by_key(|(_, order)| *order);
        pairs
    }

    #[tokio::test]
    async fn test_reorder_sets_positions_and_draft() {
        let f = fixture();
        let updated = f
            .service
            .reorder(f.business_id, f.route.id, &[f.c, f.a, f.b])
            .await
            .unwrap();

        assert_eq!(orders(&updated), vec![(f.c, 1), (f.a, 2), (f.b, 3)]);
        assert!(is_sequence_of(&updated.waypoints.0, &[f.a, f.b, f.c]));
        assert_eq!(updated.optimization_status, OptimizationStatus::Draft);
        assert_eq!(updated.total_distance_miles, Some(30.0));

        let moved = updated.waypoints.0.iter().find(|w| w.appointment_id == f.a).unwrap();
        assert_eq!(moved.latitude, Some(40.7));
    }

    #[tokio::test]
    async fn test_reorder_is_idempotent() {
        let f = fixture();
        let once = f.service.reorder(f.business_id, f.route.id, &[f.c, f.a, f.b]).await.unwrap();
        let twice = f.service.reorder(f.business_id, f.route.id, &[f.c, f.a, f.b]).await.unwrap();

        assert_eq!(once.waypoints.0, twice.waypoints.0);
    }

    #[tokio::test]
    async fn test_reorder_rejects_duplicates_and_missing_route() {
        let f = fixture();

        let duplicate = f.service.reorder(f.business_id, f.route.id, &[f.a, f.a]).await;
        assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

        let missing = f.service.reorder(f.business_id, Uuid::new_v4(), &[f.a]).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let foreign = f.service.reorder(Uuid::new_v4(), f.route.id, &[f.a]).await;
        assert!(matches!(foreign, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reorder_rejects_ids_outside_route() {
        let f = fixture();
        let mut other = route(f.business_id, f.route.technician_id);
        other.route_date = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let stranger = appointment(Some(&other), f.business_id, 10);
        other.waypoints = Json(vec![Waypoint::bare(stranger.id, 1)]);
        f.store.insert_route(other.clone()).unwrap();
        f.store.insert_appointment(stranger.clone()).unwrap();

        let foreign = f
            .service
            .reorder(f.business_id, f.route.id, &[f.a, f.b, f.c, stranger.id])
            .await;
        assert!(matches!(foreign, Err(AppError::BadRequest(_))));

        let partial = f.service.reorder(f.business_id, f.route.id, &[f.b, f.a]).await;
        assert!(matches!(partial, Err(AppError::BadRequest(_))));

        let unchanged = f.service.get(f.business_id, f.route.id).await.unwrap();
        assert_eq!(orders(&unchanged), vec![(f.a, 1), (f.b, 2), (f.c, 3)]);
        let untouched = f.service.get(f.business_id, other.id).await.unwrap();
        assert_eq!(orders(&untouched), vec![(stranger.id, 1)]);
    }

    #[tokio::test]
    async fn test_optimize_reverses_sequence() {
        let f = fixture();
        let mut rng = StdRng::seed_from_u64(7);

        let outcome = f.service.optimize_with(f.business_id, f.route.id, &mut rng).await.unwrap();

        assert_eq!(outcome.new_sequence, vec![f.c, f.b, f.a]);
        assert!(is_sequence_of(&outcome.route.waypoints, &[f.a, f.b, f.c]));
        assert_eq!(outcome.route.optimization_status, OptimizationStatus::Optimized);
        assert!(outcome.route.optimized_at.is_some());
        assert!((2.0..=12.0).contains(&outcome.distance_saved));
        assert!((10.0..=40.0).contains(&outcome.time_saved));

        let distance = outcome.route.total_distance_miles.unwrap();
        assert!((distance - (30.0 - outcome.distance_saved)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_optimize_includes_unsequenced_appointments() {
        let f = fixture();
        let late = appointment(Some(&f.route), f.business_id, 17);
        f.store.insert_appointment(late.clone()).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let outcome = f.service.optimize_with(f.business_id, f.route.id, &mut rng).await.unwrap();

        assert_eq!(outcome.new_sequence, vec![late.id, f.c, f.b, f.a]);
        assert!(is_sequence_of(&outcome.route.waypoints, &[f.a, f.b, f.c, late.id]));
    }

    #[tokio::test]
    async fn test_optimize_drops_waypoints_of_moved_appointments() {
        let f = fixture();
        let mut other = route(f.business_id, f.route.technician_id);
        other.route_date = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        f.store.insert_route(other.clone()).unwrap();
        let stale = appointment(Some(&other), f.business_id, 8);
        f.store.insert_appointment(stale.clone()).unwrap();
        let mut waypoints = f.route.waypoints.0.clone();
        waypoints.push(Waypoint::bare(stale.id, 4));
        f.store
            .save_route_sequence(RouteSequenceUpdate::manual(&f.route, waypoints))
            .await
            .unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let outcome = f.service.optimize_with(f.business_id, f.route.id, &mut rng).await.unwrap();

        assert_eq!(outcome.new_sequence, vec![f.c, f.b, f.a]);
        assert!(is_sequence_of(&outcome.route.waypoints, &[f.a, f.b, f.c]));
    }

    #[tokio::test]
    async fn test_optimize_floors_totals_at_zero() {
        let f = fixture();
        let mut short = route(f.business_id, f.route.technician_id);
        short.total_distance_miles = Some(1.0);
        short.total_duration_minutes = Some(5.0);
        f.store.insert_route(short.clone()).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let outcome = f.service.optimize_with(f.business_id, short.id, &mut rng).await.unwrap();

        assert_eq!(outcome.route.total_distance_miles, Some(0.0));
        assert_eq!(outcome.route.total_duration_minutes, Some(0.0));
        assert!(outcome.new_sequence.is_empty());
    }

    #[tokio::test]
    async fn test_assign_moves_appointment_between_routes() {
        let f = fixture();
        let mut other = route(f.business_id, f.route.technician_id);
        other.route_date = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        f.store.insert_route(other.clone()).unwrap();

        let updated = f.service.assign_appointment(f.business_id, other.id, f.b).await.unwrap();
        assert_eq!(orders(&updated), vec![(f.b, 1)]);

        let previous = f.service.get(f.business_id, f.route.id).await.unwrap();
        assert_eq!(orders(&previous), vec![(f.a, 1), (f.c, 2)]);
        assert!(is_sequence_of(&previous.waypoints.0, &[f.a, f.c]));

        let moved = f.store.find_appointment(f.b).await.unwrap().unwrap();
        assert_eq!(moved.route_id, Some(other.id));
    }

    #[tokio::test]
    async fn test_assign_appends_unrouted_appointment() {
        let f = fixture();
        let loose = appointment(None, f.business_id, 16);
        f.store.insert_appointment(loose.clone()).unwrap();

        let updated = f.service.assign_appointment(f.business_id, f.route.id, loose.id).await.unwrap();

        assert_eq!(orders(&updated).last(), Some(&(loose.id, 4)));
        assert!(is_sequence_of(&updated.waypoints.0, &[f.a, f.b, f.c, loose.id]));
        let stored = f.store.find_appointment(loose.id).await.unwrap().unwrap();
        assert_eq!(stored.technician_id, Some(f.route.technician_id));
    }

    #[tokio::test]
    async fn test_concurrent_assignments_keep_both_waypoints() {
        let f = fixture();
        let first = appointment(None, f.business_id, 15);
        let second = appointment(None, f.business_id, 16);
        f.store.insert_appointment(first.clone()).unwrap();
        f.store.insert_appointment(second.clone()).unwrap();

        let (left, right) = tokio::join!(
            f.service.assign_appointment(f.business_id, f.route.id, first.id),
            f.service.assign_appointment(f.business_id, f.route.id, second.id),
        );
        left.unwrap();
        right.unwrap();

        let route = f.service.get(f.business_id, f.route.id).await.unwrap();
        assert!(is_sequence_of(&route.waypoints.0, &[f.a, f.b, f.c, first.id, second.id]));
    }

    #[tokio::test]
    async fn test_assign_rejects_closed_route() {
        let f = fixture();
        let mut closed = route(f.business_id, f.route.technician_id);
        closed.status = RouteStatus::Completed;
        f.store.insert_route(closed.clone()).unwrap();

        let result = f.service.assign_appointment(f.business_id, closed.id, f.a).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let kept = f.store.find_appointment(f.a).await.unwrap().unwrap();
        assert_eq!(kept.route_id, Some(f.route.id));
    }

    #[tokio::test]
    async fn test_create_route_conflicts_on_same_day() {
        let f = fixture();
        let request = CreateRouteRequest {
            technician_id: f.route.technician_id,
            route_date: "2025-03-01".to_string(),
        };
        let conflict = f.service.create_route(f.business_id, &request).await;
        assert!(matches!(conflict, Err(AppError::Conflict(_))));

        let next_day = CreateRouteRequest {
            route_date: "2025-03-02".to_string(),
            ..request
        };
        let created = f.service.create_route(f.business_id, &next_day).await.unwrap();
        assert_eq!(created.status, RouteStatus::Planned);
        assert_eq!(created.optimization_status, OptimizationStatus::Draft);

        let listed = f
            .service
            .list_routes(f.business_id, NaiveDate::from_ymd_opt(2025, 3, 2))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_create_route_rejects_bad_date_and_unknown_technician() {
        let f = fixture();
        let bad_date = CreateRouteRequest {
            technician_id: f.route.technician_id,
            route_date: "03/01/2025".to_string(),
        };
        assert!(matches!(
            f.service.create_route(f.business_id, &bad_date).await,
            Err(AppError::BadRequest(_))
        ));

        let unknown = CreateRouteRequest {
            technician_id: Uuid::new_v4(),
            route_date: "2025-03-05".to_string(),
        };
        assert!(matches!(
            f.service.create_route(f.business_id, &unknown).await,
            Err(AppError::NotFound(_))
        ));
    }
}
