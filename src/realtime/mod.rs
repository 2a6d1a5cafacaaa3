//! Tiempo real
//!
//! Feed de cambios de tablas (PostgreSQL LISTEN/NOTIFY) y el puente de
//! suscripciones que usan las vistas en vivo.

pub mod bridge;
pub mod change_event;
pub mod feed;

pub use bridge::{ChangeHandlers, RealtimeBridge, SubscriptionHandle, SubscriptionSpec};
pub use change_event::{ChangeEvent, ChangeKind, RowFilter};
pub use feed::{BroadcastChangeFeed, ChangeFeed, ChangeStream, PgChangeFeed};

use thiserror::Error;

/// Errores del feed y de las suscripciones
#[derive(Error, Debug)]
pub enum RealtimeError {
    #[error("Invalid filter '{0}': expected column=eq.value")]
    InvalidFilter(String),

    #[error("Invalid change payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Listener error: {0}")]
    Listener(#[from] sqlx::Error),

    #[error("Change feed error: {0}")]
    Feed(String),
}
