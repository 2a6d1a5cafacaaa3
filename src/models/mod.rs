//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean al schema
//! PostgreSQL (ver `migrations/`).

pub mod appointment;
pub mod route;
pub mod technician;
