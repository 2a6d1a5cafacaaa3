//! Geocodificación de direcciones con la API de Mapbox

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::utils::errors::{bad_request_error, AppError, AppResult};

const MAPBOX_FORWARD_URL: &str = "https://api.mapbox.com/search/geocode/v6/forward";

#[derive(Debug, Serialize, Deserialize)]
pub struct GeocodingRequest {
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeocodingResponse {
    pub success: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub formatted_address: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl GeocodingResponse {
    fn failure(message: Option<String>, error: Option<String>) -> Self {
        Self {
            success: false,
            latitude: None,
            longitude: None,
            formatted_address: None,
            message,
            error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MapboxGeocodingResponse {
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    geometry: MapboxGeometry,
    properties: MapboxProperties,
}

#[derive(Debug, Deserialize)]
struct MapboxGeometry {
    coordinates: Vec<f64>, // [longitude, latitude]
}

#[derive(Debug, Deserialize)]
struct MapboxProperties {
    full_address: Option<String>,
    name: Option<String>,
    place_name: Option<String>,
}

pub struct GeocodingService {
    mapbox_token: String,
    client: reqwest::Client,
}

impl GeocodingService {
    pub fn new(mapbox_token: String) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            mapbox_token,
            client,
        })
    }

    pub async fn geocode_address(&self, address: &str) -> AppResult<GeocodingResponse> {
        let address = address.trim();
        if address.is_empty() {
            return Err(bad_request_error("Address cannot be empty"));
        }

        log::info!("🗺️ Geocoding address: {}", address);

        let url = format!(
            "{}?q={}&access_token={}&limit=1",
            MAPBOX_FORWARD_URL,
            urlencoding::encode(address),
            self.mapbox_token
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "FieldServiceDispatch/1.0")
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Geocoding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ Geocoding failed with status {}: {}", status, error_text);
            return Ok(GeocodingResponse::failure(None, Some(format!("Geocoding failed: {}", status))));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Failed to read geocoding response: {}", e)))?;

        parse_geocoding_body(&body, address)
    }
}

/// Primera feature de la respuesta; sin coordenadas devuelve `success: false`
pub fn parse_geocoding_body(body: &str, address: &str) -> AppResult<GeocodingResponse> {
    let parsed: MapboxGeocodingResponse = serde_json::from_str(body)
        .map_err(|e| AppError::ExternalApi(format!("Failed to parse geocoding response: {}", e)))?;

    if let Some(feature) = parsed.features.into_iter().next() {
        if let &[longitude, latitude, ..] = &feature.geometry.coordinates[..] {
            let formatted_address = feature
                .properties
                .full_address
                .or(feature.properties.place_name)
                .or(feature.properties.name);

            log::info!("✅ Geocoding successful: {} -> ({}, {})", address, latitude, longitude);

            return Ok(GeocodingResponse {
                success: true,
                latitude: Some(latitude),
                longitude: Some(longitude),
                formatted_address,
                message: Some("Geocoding successful".to_string()),
                error: None,
            });
        }
    }

    log::warn!("⚠️ No coordinates found for address: {}", address);
    Ok(GeocodingResponse::failure(
        Some("No coordinates found for this address".to_string()),
        None,
    ))
}
