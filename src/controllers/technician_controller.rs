use std::sync::Arc;
use uuid::Uuid;

use crate::dto::technician_dto::{LiveLocationsSnapshot, MapView, TechnicianLocation, TechnicianResponse};
use crate::dto::ApiResponse;
use crate::models::technician::{CreateTechnicianRequest, GeoPoint};
use crate::services::{LiveLocations, TechnicianLocationService, TechnicianService};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct TechnicianController {
    locations: Arc<TechnicianLocationService>,
    live_locations: LiveLocations,
    technicians: Arc<TechnicianService>,
    map_default_center: GeoPoint,
}

impl TechnicianController {
    pub fn new(state: &AppState) -> Self {
        Self {
            locations: state.locations.clone(),
            live_locations: state.live_locations.clone(),
            technicians: state.technicians.clone(),
            map_default_center: state.config.map_default_center,
        }
    }

    pub async fn locations(&self, business_id: Uuid) -> Result<Vec<TechnicianLocation>, AppError> {
        self.locations.aggregate(business_id).await
    }

    /// Snapshot en vivo; la vista en vivo sigue a una sola empresa, para
    /// las demás se agrega en el momento
    pub async fn live_locations(&self, business_id: Uuid) -> Result<LiveLocationsSnapshot, AppError> {
        if business_id == self.live_locations.business_id() {
            return Ok(self.live_locations.snapshot().await);
        }

        let technicians = self.locations.aggregate(business_id).await?;
        Ok(LiveLocationsSnapshot {
            technicians,
            refreshed_at: Some(chrono::Utc::now()),
            refresh_count: 1,
            ..Default::default()
        })
    }

    pub async fn map(&self, business_id: Uuid) -> Result<MapView, AppError> {
        self.locations.map_view(business_id, self.map_default_center).await
    }

    pub async fn create(
        &self,
        business_id: Uuid,
        request: CreateTechnicianRequest,
    ) -> Result<ApiResponse<TechnicianResponse>, AppError> {
        let created = self.technicians.create(business_id, &request).await?;

        let mut response = TechnicianResponse::from(&created.technician);
        response.skills = created.skills.len();
        response.availability_slots = created.availability.len();

        Ok(ApiResponse::success_with_message(response, "Técnico creado exitosamente"))
    }

    pub async fn get_by_id(&self, business_id: Uuid, id: Uuid) -> Result<TechnicianResponse, AppError> {
        let technician = self.technicians.get(business_id, id).await?;
        Ok(TechnicianResponse::from(&technician))
    }
}
