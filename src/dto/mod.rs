//! DTOs de la API
//!
//! Estructuras de entrada/salida que no mapean directamente a tablas.

pub mod api_response;
pub mod route_dto;
pub mod technician_dto;

pub use api_response::ApiResponse;
