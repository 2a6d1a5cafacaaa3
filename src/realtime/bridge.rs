//! Puente de suscripciones en tiempo real
//!
//! Abre un stream del feed, filtra por tabla y fila, e invoca los callbacks
//! registrados por tipo de evento. La suscripción vive lo que viva su
//! `SubscriptionHandle`.

use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::{ChangeEvent, ChangeFeed, ChangeKind, RealtimeError, RowFilter};

pub type ChangeCallback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Callbacks por tipo de evento
#[derive(Clone, Default)]
pub struct ChangeHandlers {
    on_insert: Option<ChangeCallback>,
    on_update: Option<ChangeCallback>,
    on_delete: Option<ChangeCallback>,
    on_any: Option<ChangeCallback>,
}

impl ChangeHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_insert(mut self, callback: impl Fn(&ChangeEvent) + Send + Sync + 'static) -> Self {
        self.on_insert = Some(Arc::new(callback));
        self
    }

    pub fn on_update(mut self, callback: impl Fn(&ChangeEvent) + Send + Sync + 'static) -> Self {
        self.on_update = Some(Arc::new(callback));
        self
    }

    pub fn on_delete(mut self, callback: impl Fn(&ChangeEvent) + Send + Sync + 'static) -> Self {
        self.on_delete = Some(Arc::new(callback));
        self
    }

    pub fn on_any(mut self, callback: impl Fn(&ChangeEvent) + Send + Sync + 'static) -> Self {
        self.on_any = Some(Arc::new(callback));
        self
    }

    /// Invoca el callback específico y luego `on_any`; devuelve cuántos se llamaron
    pub fn dispatch(&self, event: &ChangeEvent) -> usize {
        let specific = match event.kind {
            ChangeKind::Insert => self.on_insert.as_ref(),
            ChangeKind::Update => self.on_update.as_ref(),
            ChangeKind::Delete => self.on_delete.as_ref(),
        };

        let mut invoked = 0;
        for callback in [specific, self.on_any.as_ref()].into_iter().flatten() {
            callback(event);
            invoked += 1;
        }
        invoked
    }
}

/// Qué escuchar: canal lógico, tabla y filtro opcional
#[derive(Debug, Clone)]
pub struct SubscriptionSpec {
    pub channel: String,
    pub table: String,
    pub filter: Option<RowFilter>,
}

impl SubscriptionSpec {
    pub fn new(channel: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            table: table.into(),
            filter: None,
        }
    }

    /// Añade un filtro `columna=eq.valor`
    pub fn with_filter(mut self, expression: &str) -> Result<Self, RealtimeError> {
        self.filter = Some(RowFilter::parse(expression)?);
        Ok(self)
    }

    pub fn accepts(&self, event: &ChangeEvent) -> bool {
        event.table == self.table && self.filter.as_ref().map_or(true, |f| f.matches(event))
    }
}

/// Suscripción activa; al soltarla se cancela el listener
pub struct SubscriptionHandle {
    channel: String,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
        log::debug!("🔌 Suscripción '{}' cerrada", self.channel);
    }
}

#[derive(Clone)]
pub struct RealtimeBridge {
    feed: Arc<dyn ChangeFeed>,
}

impl RealtimeBridge {
    pub fn new(feed: Arc<dyn ChangeFeed>) -> Self {
        Self { feed }
    }

    /// Abre la suscripción. Un fallo se registra y se devuelve; no se reintenta.
    pub async fn subscribe(
        &self,
        spec: SubscriptionSpec,
        handlers: ChangeHandlers,
    ) -> Result<SubscriptionHandle, RealtimeError> {
        let mut events = self.feed.listen().await.map_err(|e| {
            log::error!("❌ No se pudo abrir la suscripción '{}': {}", spec.channel, e);
            e
        })?;

        log::info!(
            "✅ Suscripción '{}' sobre tabla '{}'{}",
            spec.channel,
            spec.table,
            spec.filter.as_ref().map(|f| format!(" ({})", f)).unwrap_or_default()
        );

        let channel = spec.channel.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if spec.accepts(&event) {
                    handlers.dispatch(&event);
                }
            }
            log::warn!("⚠️ Feed de cambios cerrado para '{}'", spec.channel);
        });

        Ok(SubscriptionHandle { channel, task })
    }
}
