//! Vista en vivo de ubicaciones
//!
//! Mantiene el último resultado del agregador y lo recalcula con cada
//! cambio en `technicians` (de la empresa) o `appointments`.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::technician_location_service::TechnicianLocationService;
use crate::dto::technician_dto::LiveLocationsSnapshot;
use crate::realtime::{ChangeHandlers, RealtimeBridge, SubscriptionHandle, SubscriptionSpec};

const TECHNICIANS_TABLE: &str = "technicians";
const APPOINTMENTS_TABLE: &str = "appointments";

#[derive(Clone)]
pub struct LiveLocations {
    business_id: Uuid,
    aggregator: Arc<TechnicianLocationService>,
    snapshot: Arc<RwLock<LiveLocationsSnapshot>>,
}

/// Suscripciones y bucle de refresco; se detienen al soltarlo
pub struct LiveLocationsWatcher {
    subscriptions: Vec<SubscriptionHandle>,
    refresher: JoinHandle<()>,
}

impl LiveLocationsWatcher {
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

impl Drop for LiveLocationsWatcher {
    fn drop(&mut self) {
        self.refresher.abort();
    }
}

impl LiveLocations {
    pub fn new(aggregator: Arc<TechnicianLocationService>, business_id: Uuid) -> Self {
        Self {
            business_id,
            aggregator,
            snapshot: Arc::new(RwLock::new(LiveLocationsSnapshot::default())),
        }
    }

    pub fn business_id(&self) -> Uuid {
        self.business_id
    }

    pub async fn snapshot(&self) -> LiveLocationsSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Reagrega y publica el resultado. Si falla se conserva la lista
    /// anterior y se informa el error.
    pub async fn refresh(&self) {
        let result = self.aggregator.aggregate(self.business_id).await;
        let mut snapshot = self.snapshot.write().await;
        snapshot.refresh_count += 1;

        match result {
            Ok(technicians) => {
                log::debug!("📍 Ubicaciones actualizadas: {} técnicos", technicians.len());
                snapshot.technicians = technicians;
                snapshot.error = None;
                snapshot.refreshed_at = Some(Utc::now());
            }
            Err(e) => {
                log::error!("❌ Error actualizando ubicaciones: {}", e);
                snapshot.error = Some(e.to_string());
            }
        }
    }

    /// Carga inicial y suscripción a cambios. Un fallo de suscripción no se
    /// reintenta; queda reflejado en `realtime_connected`.
    pub async fn start(&self, bridge: &RealtimeBridge) -> LiveLocationsWatcher {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let specs = [
            SubscriptionSpec::new(format!("technicians-{}", self.business_id), TECHNICIANS_TABLE)
                .with_filter(&format!("business_id=eq.{}", self.business_id)),
            Ok(SubscriptionSpec::new("appointments-all", APPOINTMENTS_TABLE)),
        ];

        let mut subscriptions = Vec::new();
        let mut connected = true;
        for spec in specs {
            let trigger = tx.clone();
            let handlers = ChangeHandlers::new().on_any(move |_| {
                let _ = trigger.send(());
            });

            let subscription = match spec {
                Ok(spec) => bridge.subscribe(spec, handlers).await,
                Err(e) => Err(e),
            };
            match subscription {
                Ok(handle) => subscriptions.push(handle),
                Err(e) => {
                    log::warn!("⚠️ Vista en vivo sin tiempo real: {}", e);
                    connected = false;
                }
            }
        }
        drop(tx);

        self.snapshot.write().await.realtime_connected = connected;
        self.refresh().await;

        let live = self.clone();
        let refresher = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                live.refresh().await;
            }
        });

        LiveLocationsWatcher {
            subscriptions,
            refresher,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::technician::{Technician, TechnicianStatus};
    use crate::realtime::{BroadcastChangeFeed, ChangeEvent, ChangeFeed, ChangeKind, ChangeStream, RealtimeError};
    use crate::repositories::InMemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    fn technician(business_id: Uuid, last_name: &str) -> Technician {
        Technician {
            id: Uuid::new_v4(),
            business_id,
            first_name: "Kim".to_string(),
            last_name: last_name.to_string(),
            email: None,
            phone: None,
            photo_url: None,
            current_latitude: Some(47.6),
            current_longitude: Some(-122.3),
            last_location_update: Some(Utc::now()),
            status: TechnicianStatus::Available,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn change(table: &str, business_id: Uuid) -> ChangeEvent {
        ChangeEvent::new(
            table,
            ChangeKind::Update,
            Some(json!({ "id": Uuid::new_v4(), "business_id": business_id })),
            None,
        )
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    fn live_for(store: Arc<InMemoryStore>, business_id: Uuid) -> LiveLocations {
        LiveLocations::new(Arc::new(TechnicianLocationService::new(store)), business_id)
    }

    #[tokio::test]
    async fn test_initial_load_and_refresh_on_change() {
        let business_id = Uuid::new_v4();
        let store = Arc::new(InMemoryStore::new());
        store.insert_technician(technician(business_id, "One")).unwrap();
        let feed = BroadcastChangeFeed::default();
        let bridge = RealtimeBridge::new(Arc::new(feed.clone()));
        let live = live_for(store.clone(), business_id);

        let watcher = live.start(&bridge).await;
        let initial = live.snapshot().await;
        assert_eq!(watcher.subscription_count(), 2);
        assert!(initial.realtime_connected);
        assert_eq!(initial.technicians.len(), 1);
        assert_eq!(initial.refresh_count, 1);

        store.insert_technician(technician(business_id, "Two")).unwrap();
        feed.publish(change("technicians", business_id));
        settle().await;

        let refreshed = live.snapshot().await;
        assert_eq!(refreshed.technicians.len(), 2);
        assert_eq!(refreshed.refresh_count, 2);
    }

    #[tokio::test]
    async fn test_other_business_changes_are_ignored() {
        let business_id = Uuid::new_v4();
        let store = Arc::new(InMemoryStore::new());
        let feed = BroadcastChangeFeed::default();
        let bridge = RealtimeBridge::new(Arc::new(feed.clone()));
        let live = live_for(store, business_id);

        let _watcher = live.start(&bridge).await;
        feed.publish(change("technicians", Uuid::new_v4()));
        feed.publish(change("routes", business_id));
        settle().await;

        assert_eq!(live.snapshot().await.refresh_count, 1);
    }

    #[tokio::test]
    async fn test_each_event_triggers_one_refresh() {
        let business_id = Uuid::new_v4();
        let store = Arc::new(InMemoryStore::new());
        let feed = BroadcastChangeFeed::default();
        let bridge = RealtimeBridge::new(Arc::new(feed.clone()));
        let live = live_for(store, business_id);

        let _watcher = live.start(&bridge).await;
        for _ in 0..5 {
            feed.publish(change("appointments", Uuid::new_v4()));
        }
        settle().await;

        assert_eq!(live.snapshot().await.refresh_count, 6);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_list() {
        let business_id = Uuid::new_v4();
        let store = Arc::new(InMemoryStore::new());
        store.insert_technician(technician(business_id, "One")).unwrap();
        let live = live_for(store.clone(), business_id);

        live.refresh().await;
        store.set_unavailable(true);
        live.refresh().await;

        let failed = live.snapshot().await;
        assert_eq!(failed.technicians.len(), 1);
        assert!(failed.error.is_some());

        store.set_unavailable(false);
        live.refresh().await;
        assert!(live.snapshot().await.error.is_none());
    }

    struct BrokenFeed;

    #[async_trait]
    impl ChangeFeed for BrokenFeed {
        async fn listen(&self) -> Result<ChangeStream, RealtimeError> {
            Err(RealtimeError::Feed("listener refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_subscription_failure_reports_disconnected() {
        let business_id = Uuid::new_v4();
        let store = Arc::new(InMemoryStore::new());
        store.insert_technician(technician(business_id, "One")).unwrap();
        let live = live_for(store, business_id);

        let watcher = live.start(&RealtimeBridge::new(Arc::new(BrokenFeed))).await;
        let snapshot = live.snapshot().await;

        assert_eq!(watcher.subscription_count(), 0);
        assert!(!snapshot.realtime_connected);
        assert_eq!(snapshot.technicians.len(), 1);
    }
}
