use std::sync::Arc;

use crate::services::geocoding_service::{GeocodingRequest, GeocodingResponse};
use crate::services::GeocodingService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct GeocodingController {
    geocoder: Option<Arc<GeocodingService>>,
}

impl GeocodingController {
    pub fn new(state: &AppState) -> Self {
        Self {
            geocoder: state.geocoder.clone(),
        }
    }

    pub async fn geocode(&self, request: GeocodingRequest) -> Result<GeocodingResponse, AppError> {
        let geocoder = self
            .geocoder
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable("Geocoding is not configured".to_string()))?;
        geocoder.geocode_address(&request.address).await
    }
}
