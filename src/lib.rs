//! Field Service Dispatch API
//!
//! Ubicación en vivo de técnicos, secuencias de rutas y ciclo de vida de
//! citas sobre PostgreSQL, con feed de cambios por LISTEN/NOTIFY.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod realtime;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
