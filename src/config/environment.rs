//! Configuración de variables de entorno
//!
//! Valores por defecto de desarrollo; en producción se leen del entorno
//! (`.env` cargado con dotenvy en `main`).

use anyhow::{Context, Result};
use std::env;
use uuid::Uuid;

use crate::models::technician::GeoPoint;

pub const DEFAULT_CHANGE_FEED_CHANNEL: &str = "field_service_changes";

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    /// Empresa usada cuando la petición no trae token
    pub default_business_id: Uuid,
    pub jwt_secret: Option<String>,
    pub cors_origins: Vec<String>,
    pub mapbox_token: Option<String>,
    pub change_feed_channel: String,
    pub map_default_center: GeoPoint,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            default_business_id: Uuid::nil(),
            jwt_secret: None,
            cors_origins: vec!["http://localhost:5173".to_string()],
            mapbox_token: None,
            change_feed_channel: DEFAULT_CHANGE_FEED_CHANNEL.to_string(),
            map_default_center: GeoPoint {
                latitude: 39.8283,
                longitude: -98.5795,
            },
        }
    }
}

impl EnvironmentConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(value) => value.parse().context("PORT must be a valid number")?,
            Err(_) => defaults.port,
        };
        let default_business_id = match env::var("DEFAULT_BUSINESS_ID") {
            Ok(value) => Uuid::parse_str(value.trim()).context("DEFAULT_BUSINESS_ID must be a UUID")?,
            Err(_) => defaults.default_business_id,
        };
        let latitude = match env::var("MAP_DEFAULT_LAT") {
            Ok(value) => value.parse().context("MAP_DEFAULT_LAT must be a number")?,
            Err(_) => defaults.map_default_center.latitude,
        };
        let longitude = match env::var("MAP_DEFAULT_LNG") {
            Ok(value) => value.parse().context("MAP_DEFAULT_LNG must be a number")?,
            Err(_) => defaults.map_default_center.longitude,
        };

        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port,
            host: env::var("HOST").unwrap_or(defaults.host),
            default_business_id,
            jwt_secret: non_empty_var("JWT_SECRET"),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|value| parse_origins(&value))
                .unwrap_or(defaults.cors_origins),
            mapbox_token: non_empty_var("MAPBOX_TOKEN"),
            change_feed_channel: env::var("CHANGE_FEED_CHANNEL").unwrap_or(defaults.change_feed_channel),
            map_default_center: GeoPoint { latitude, longitude },
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Sin DATABASE_URL solo se arranca en memoria fuera de producción
    pub fn allows_in_memory_store(&self) -> bool {
        self.is_development()
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
