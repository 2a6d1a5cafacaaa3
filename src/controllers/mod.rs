//! Controllers
//!
//! Adaptan los servicios a los DTOs de respuesta de la API.

pub mod appointment_controller;
pub mod geocoding_controller;
pub mod route_controller;
pub mod technician_controller;
