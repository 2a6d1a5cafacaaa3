//! Fuentes del feed de cambios
//!
//! `PgChangeFeed` escucha `LISTEN <canal>` en PostgreSQL; las filas las
//! publica el trigger `notify_change()` de las migraciones.
//! `BroadcastChangeFeed` es la variante en proceso.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::broadcast;

use super::{ChangeEvent, RealtimeError};

pub type ChangeStream = BoxStream<'static, ChangeEvent>;

#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Abre un stream nuevo con los cambios a partir de este momento
    async fn listen(&self) -> Result<ChangeStream, RealtimeError>;
}

pub struct PgChangeFeed {
    pool: PgPool,
    channel: String,
}

impl PgChangeFeed {
    pub fn new(pool: PgPool, channel: impl Into<String>) -> Self {
        Self {
            pool,
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn listen(&self) -> Result<ChangeStream, RealtimeError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(&self.channel).await?;
        log::info!("📡 LISTEN activo en canal '{}'", self.channel);

        let channel = self.channel.clone();
        let events = listener.into_stream().filter_map(move |item| {
            let channel = channel.clone();
            async move {
                match item {
                    Ok(notification) => match ChangeEvent::from_payload(notification.payload()) {
                        Ok(event) => Some(event),
                        Err(e) => {
                            log::warn!("⚠️ Payload inválido en canal '{}': {}", channel, e);
                            None
                        }
                    },
                    Err(e) => {
                        log::error!("❌ Error recibiendo notificación en '{}': {}", channel, e);
                        None
                    }
                }
            }
        });

        Ok(events.boxed())
    }
}

#[derive(Clone)]
pub struct BroadcastChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl BroadcastChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publica un evento; devuelve cuántos listeners lo recibirán
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for BroadcastChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl ChangeFeed for BroadcastChangeFeed {
    async fn listen(&self) -> Result<ChangeStream, RealtimeError> {
        let receiver = self.sender.subscribe();

        let events = stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => return Some((event, receiver)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("⚠️ Listener retrasado, {} eventos descartados", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        Ok(events.boxed())
    }
}
