//! Agregador de ubicaciones de técnicos
//!
//! Junta técnicos activos, sus rutas `active` y las citas de esas rutas en
//! una vista por técnico con la cita actual y la siguiente.

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::dto::technician_dto::{ActiveRouteView, MapMarker, MapPolyline, MapView, TechnicianLocation};
use crate::models::appointment::{Appointment, AppointmentStatus};
use crate::models::route::Route;
use crate::models::technician::{GeoPoint, Technician};
use crate::repositories::FieldServiceStore;
use crate::utils::errors::AppResult;

const SINGLE_MARKER_ZOOM: u8 = 13;
const FLEET_ZOOM: u8 = 11;

pub struct TechnicianLocationService {
    store: Arc<dyn FieldServiceStore>,
}

impl TechnicianLocationService {
    pub fn new(store: Arc<dyn FieldServiceStore>) -> Self {
        Self { store }
    }

    /// Agregación completa; cualquier fallo de lectura aborta el ciclo entero
    pub async fn aggregate(&self, business_id: Uuid) -> AppResult<Vec<TechnicianLocation>> {
        let technicians = self.store.list_active_technicians(business_id).await?;
        let technician_ids: Vec<Uuid> = technicians.iter().map(|t| t.id).collect();

        let routes = self.store.list_active_routes(&technician_ids).await?;
        let route_ids: Vec<Uuid> = routes.iter().map(|r| r.id).collect();

        let appointments = self.store.list_route_appointments(&route_ids).await?;

        log::debug!(
            "🔄 Agregación: {} técnicos, {} rutas activas, {} citas",
            technicians.len(),
            routes.len(),
            appointments.len()
        );

        Ok(assemble(technicians, &routes, appointments))
    }

    /// Modelo para el mapa: marcadores y polilíneas de rutas activas
    pub async fn map_view(&self, business_id: Uuid, default_center: GeoPoint) -> AppResult<MapView> {
        let technicians = self.aggregate(business_id).await?;
        Ok(build_map_view(&technicians, default_center))
    }
}

/// Une las tres lecturas. Las búsquedas usan índices por id; la selección
/// de citas respeta el orden de lectura.
pub fn assemble(technicians: Vec<Technician>, routes: &[Route], appointments: Vec<Appointment>) -> Vec<TechnicianLocation> {
    // primera ruta activa por técnico en orden de lectura
    let mut route_by_technician: HashMap<Uuid, &Route> = HashMap::new();
    for route in routes {
        route_by_technician.entry(route.technician_id).or_insert(route);
    }

    let mut appointments_by_route: HashMap<Uuid, Vec<Appointment>> = HashMap::new();
    for appointment in appointments {
        if let Some(route_id) = appointment.route_id {
            appointments_by_route.entry(route_id).or_default().push(appointment);
        }
    }

    technicians
        .into_iter()
        .map(|technician| {
            let route = route_by_technician.get(&technician.id).copied();
            let route_appointments = route
                .and_then(|r| appointments_by_route.get(&r.id))
                .cloned()
                .unwrap_or_default();

            let current_appointment = current_appointment(&route_appointments).cloned();
            let next_appointment = next_appointment(&route_appointments).cloned();

            TechnicianLocation {
                id: technician.id,
                name: technician.full_name(),
                location: technician.location(),
                last_location_update: technician.last_location_update,
                status: technician.status,
                active_route: route.map(|r| ActiveRouteView::new(r, route_appointments)),
                current_appointment,
                next_appointment,
                email: technician.email,
                phone: technician.phone,
                photo_url: technician.photo_url,
            }
        })
        .collect()
}

/// Primera cita `in_progress` en orden de lectura
pub fn current_appointment(appointments: &[Appointment]) -> Option<&Appointment> {
    appointments
        .iter()
        .find(|a| a.status == AppointmentStatus::InProgress)
}

/// Cita `scheduled` más temprana; en empate gana la primera leída
pub fn next_appointment(appointments: &[Appointment]) -> Option<&Appointment> {
    appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Scheduled)
        .min_by_key(|a| a.scheduled_start)
}

pub fn build_map_view(technicians: &[TechnicianLocation], default_center: GeoPoint) -> MapView {
    let markers: Vec<MapMarker> = technicians
        .iter()
        .filter_map(|t| {
            t.location.map(|position| MapMarker {
                technician_id: t.id,
                label: t.name.clone(),
                position,
                status: t.status,
            })
        })
        .collect();

    let polylines = technicians
        .iter()
        .filter_map(|t| {
            let route = t.active_route.as_ref()?;
            let appointment_points: HashMap<Uuid, GeoPoint> = route
                .appointments
                .iter()
                .filter_map(|a| Some((a.id, point(a.latitude, a.longitude)?)))
                .collect();

            let mut waypoints = route.waypoints.clone();
            waypoints.sort_by_key(|w| w.order);

            let mut points: Vec<GeoPoint> = t.location.into_iter().collect();
            points.extend(waypoints.iter().filter_map(|w| {
                point(w.latitude, w.longitude).or_else(|| appointment_points.get(&w.appointment_id).copied())
            }));

            (points.len() >= 2).then(|| MapPolyline {
                route_id: route.id,
                technician_id: t.id,
                points,
            })
        })
        .collect();

    let (center, zoom) = match markers.len() {
        0 => (default_center, FLEET_ZOOM),
        1 => (markers[0].position, SINGLE_MARKER_ZOOM),
        n => {
            let (lat, lng) = markers.iter().fold((0.0, 0.0), |(lat, lng), m| {
                (lat + m.position.latitude, lng + m.position.longitude)
            });
            (
                GeoPoint {
                    latitude: lat / n as f64,
                    longitude: lng / n as f64,
                },
                FLEET_ZOOM,
            )
        }
    };

    MapView {
        center,
        zoom,
        markers,
        polylines,
    }
}

fn point(latitude: Option<f64>, longitude: Option<f64>) -> Option<GeoPoint> {
    Some(GeoPoint {
        latitude: latitude?,
        longitude: longitude?,
    })
}
