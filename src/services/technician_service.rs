//! Alta y consulta de técnicos

use std::sync::Arc;
use uuid::Uuid;

use crate::models::technician::{CreateTechnicianRequest, CreatedTechnician, Technician};
use crate::repositories::FieldServiceStore;
use crate::utils::errors::{not_found_error, AppResult};

pub struct TechnicianService {
    store: Arc<dyn FieldServiceStore>,
}

impl TechnicianService {
    pub fn new(store: Arc<dyn FieldServiceStore>) -> Self {
        Self { store }
    }

    /// Valida el formulario y crea técnico, habilidades y disponibilidad
    /// en una sola transacción
    pub async fn create(&self, business_id: Uuid, request: &CreateTechnicianRequest) -> AppResult<CreatedTechnician> {
        request.validate_all()?;

        let created = self.store.create_technician(business_id, request).await?;
        log::info!(
            "✅ Técnico {} creado: {} habilidades, {} franjas",
            created.technician.full_name(),
            created.skills.len(),
            created.availability.len()
        );
        Ok(created)
    }

    pub async fn get(&self, business_id: Uuid, technician_id: Uuid) -> AppResult<Technician> {
        self.store
            .find_technician(technician_id)
            .await?
            .filter(|t| t.business_id == business_id)
            .ok_or_else(|| not_found_error("Technician", &technician_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::technician::{AvailabilityInput, SkillInput, TechnicianStatus};
    use crate::repositories::InMemoryStore;
    use crate::utils::errors::AppError;
    use chrono::NaiveTime;

    fn request() -> CreateTechnicianRequest {
        CreateTechnicianRequest {
            first_name: "Lena".to_string(),
            last_name: "Park".to_string(),
            email: Some("lena.park@example.com".to_string()),
            phone: Some("+1 (555) 010-2030".to_string()),
            photo_url: None,
            skills: vec![SkillInput {
                service_id: Uuid::new_v4(),
                proficiency_level: 4,
            }],
            availability: vec![AvailabilityInput {
                day_of_week: 1,
                start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            }],
        }
    }

    #[tokio::test]
    async fn test_create_writes_children() {
        let store = Arc::new(InMemoryStore::new());
        let service = TechnicianService::new(store.clone());
        let business_id = Uuid::new_v4();

        let created = service.create(business_id, &request()).await.unwrap();

        assert_eq!(created.technician.status, TechnicianStatus::OffDuty);
        assert!(created.technician.is_active);
        assert_eq!(store.child_row_counts().unwrap(), (1, 1));

        let fetched = service.get(business_id, created.technician.id).await.unwrap();
        assert_eq!(fetched.full_name(), "Lena Park");
    }

    #[tokio::test]
    async fn test_invalid_availability_writes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let service = TechnicianService::new(store.clone());

        let mut invalid = request();
        invalid.availability[0].end_time = NaiveTime::from_hms_opt(7, 0, 0).unwrap();

        let result = service.create(Uuid::new_v4(), &invalid).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.child_row_counts().unwrap(), (0, 0));
    }

    #[tokio::test]
    async fn test_invalid_phone_is_rejected() {
        let service = TechnicianService::new(Arc::new(InMemoryStore::new()));
        let mut invalid = request();
        invalid.phone = Some("call me".to_string());

        assert!(matches!(
            service.create(Uuid::new_v4(), &invalid).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_get_is_scoped_to_business() {
        let service = TechnicianService::new(Arc::new(InMemoryStore::new()));
        let created = service.create(Uuid::new_v4(), &request()).await.unwrap();

        let result = service.get(Uuid::new_v4(), created.technician.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
