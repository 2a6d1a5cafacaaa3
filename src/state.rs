//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::FieldServiceStore;
use crate::services::{
    AppointmentService, GeocodingService, LiveLocations, RouteSequenceService, TechnicianLocationService,
    TechnicianService,
};
use crate::utils::errors::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub locations: Arc<TechnicianLocationService>,
    pub live_locations: LiveLocations,
    pub routes: Arc<RouteSequenceService>,
    pub appointments: Arc<AppointmentService>,
    pub technicians: Arc<TechnicianService>,
    /// Sólo si hay `MAPBOX_TOKEN`
    pub geocoder: Option<Arc<GeocodingService>>,
}

impl AppState {
    pub fn new(store: Arc<dyn FieldServiceStore>, config: EnvironmentConfig) -> AppResult<Self> {
        let locations = Arc::new(TechnicianLocationService::new(store.clone()));
        let live_locations = LiveLocations::new(locations.clone(), config.default_business_id);

        let geocoder = match &config.mapbox_token {
            Some(token) => Some(Arc::new(GeocodingService::new(token.clone())?)),
            None => {
                log::warn!("⚠️ MAPBOX_TOKEN no configurado, geocodificación deshabilitada");
                None
            }
        };

        Ok(Self {
            locations,
            live_locations,
            routes: Arc::new(RouteSequenceService::new(store.clone())),
            appointments: Arc::new(AppointmentService::new(store.clone())),
            technicians: Arc::new(TechnicianService::new(store)),
            geocoder,
            config,
        })
    }
}
