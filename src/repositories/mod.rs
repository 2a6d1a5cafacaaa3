//! Repositorios
//!
//! Acceso a PostgreSQL por tabla y el contrato `FieldServiceStore` que
//! consumen los servicios.

pub mod appointment_repository;
pub mod memory_store;
pub mod pg_store;
pub mod route_repository;
pub mod store;
pub mod technician_repository;

pub use memory_store::InMemoryStore;
pub use pg_store::PgFieldServiceStore;
pub use store::FieldServiceStore;
