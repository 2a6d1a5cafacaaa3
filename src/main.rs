use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use field_service::config::{DatabaseConfig, EnvironmentConfig};
use field_service::database::DatabaseConnection;
use field_service::realtime::{BroadcastChangeFeed, ChangeFeed, PgChangeFeed, RealtimeBridge};
use field_service::repositories::{FieldServiceStore, InMemoryStore, PgFieldServiceStore};
use field_service::routes::create_app;
use field_service::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🛠️ Field Service Dispatch API");
    info!("================================================");

    let config = EnvironmentConfig::from_env()?;

    let (store, feed) = match DatabaseConfig::from_env() {
        Ok(db_config) => {
            let db = DatabaseConnection::connect(&db_config).await.map_err(|e| {
                error!("❌ Error conectando a la base de datos: {:#}", e);
                e
            })?;
            db.run_migrations().await?;

            let pool = db.pool().clone();
            let store: Arc<dyn FieldServiceStore> = Arc::new(PgFieldServiceStore::new(pool.clone()));
            let feed: Arc<dyn ChangeFeed> = Arc::new(PgChangeFeed::new(pool, config.change_feed_channel.clone()));
            (store, feed)
        }
        Err(e) if !config.allows_in_memory_store() => {
            error!("❌ {} (entorno {})", e, config.environment);
            return Err(e.context("DATABASE_URL is required outside development"));
        }
        Err(e) => {
            warn!("⚠️ {} - usando almacenamiento en memoria (solo desarrollo)", e);
            let store: Arc<dyn FieldServiceStore> = Arc::new(InMemoryStore::new());
            let feed: Arc<dyn ChangeFeed> = Arc::new(BroadcastChangeFeed::default());
            (store, feed)
        }
    };

    let state = AppState::new(store, config.clone())?;

    // Vista en vivo de la empresa por defecto
    let bridge = RealtimeBridge::new(feed);
    let watcher = state.live_locations.start(&bridge).await;
    info!(
        "📡 Vista en vivo para empresa {} ({} suscripciones)",
        config.default_business_id,
        watcher.subscription_count()
    );

    let app = create_app(state);

    let addr: SocketAddr = config.server_url().parse()?;
    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET   /health");
    info!("   GET   /api/technicians/locations | /locations/live | /map");
    info!("   POST  /api/technicians  GET /api/technicians/:id");
    info!("   GET   /api/routes?date=YYYY-MM-DD  POST /api/routes  GET /api/routes/:id");
    info!("   PUT   /api/routes/:id/sequence  POST /api/routes/:id/optimize  POST /api/routes/:id/appointments");
    info!("   GET   /api/appointments  POST /api/appointments  PATCH /api/appointments/:id/status");
    info!("   POST  /api/geocode");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    drop(watcher);
    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
