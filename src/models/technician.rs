//! Modelo de Technician
//!
//! Este módulo contiene el struct Technician y sus variantes para CRUD operations.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::utils::validation::{validate_not_empty, validate_phone};

/// Estado del técnico - mapea al ENUM technician_status
///
/// Lo escribe la aplicación de campo; aquí sólo se lee.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "technician_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TechnicianStatus {
    Available,
    OnRoute,
    Busy,
    OffDuty,
}

/// Posición geográfica
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Technician principal - mapea a la tabla technicians
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Technician {
    pub id: Uuid,
    pub business_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub last_location_update: Option<DateTime<Utc>>,
    pub status: TechnicianStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Technician {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Ubicación actual; `None` si el técnico está desconectado
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.current_latitude, self.current_longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        }
    }
}

/// Habilidad de un técnico - tabla technician_skills
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TechnicianSkill {
    pub id: Uuid,
    pub technician_id: Uuid,
    pub service_id: Uuid,
    pub proficiency_level: i16,
}

/// Franja de disponibilidad semanal - tabla technician_availability
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TechnicianAvailability {
    pub id: Uuid,
    pub technician_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Técnico recién creado con sus filas hijas
#[derive(Debug, Clone, Serialize)]
pub struct CreatedTechnician {
    pub technician: Technician,
    pub skills: Vec<TechnicianSkill>,
    pub availability: Vec<TechnicianAvailability>,
}

/// Habilidad en el formulario de alta
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SkillInput {
    pub service_id: Uuid,

    #[validate(range(min = 1, max = 5))]
    pub proficiency_level: i16,
}

/// Disponibilidad en el formulario de alta
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_availability_window"))]
pub struct AvailabilityInput {
    /// 0 = domingo ... 6 = sábado
    #[validate(range(min = 0, max = 6))]
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

fn validate_availability_window(input: &AvailabilityInput) -> Result<(), ValidationError> {
    if input.start_time >= input.end_time {
        let mut error = ValidationError::new("availability_window");
        error.add_param("start_time".into(), &input.start_time.to_string());
        error.add_param("end_time".into(), &input.end_time.to_string());
        return Err(error);
    }
    Ok(())
}

/// Request para crear un nuevo técnico
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTechnicianRequest {
    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub first_name: String,

    #[validate(length(min = 1, max = 100), custom = "validate_not_empty")]
    pub last_name: String,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    #[validate(url)]
    pub photo_url: Option<String>,

    #[serde(default)]
    pub skills: Vec<SkillInput>,

    #[serde(default)]
    pub availability: Vec<AvailabilityInput>,
}

impl CreateTechnicianRequest {
    /// Valida el formulario completo, incluidas las filas hijas
    pub fn validate_all(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;
        for skill in &self.skills {
            skill.validate()?;
        }
        for slot in &self.availability {
            slot.validate()?;
        }
        Ok(())
    }
}
