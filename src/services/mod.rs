//! Services module
//!
//! Lógica de negocio: agregación de ubicaciones, vista en vivo, secuencia
//! de rutas, ciclo de vida de citas, alta de técnicos y geocodificación.

pub mod appointment_service;
pub mod geocoding_service;
pub mod live_locations;
pub mod route_sequence_service;
pub mod technician_location_service;
pub mod technician_service;

pub use appointment_service::AppointmentService;
pub use geocoding_service::GeocodingService;
pub use live_locations::{LiveLocations, LiveLocationsWatcher};
pub use route_sequence_service::RouteSequenceService;
pub use technician_location_service::TechnicianLocationService;
pub use technician_service::TechnicianService;
