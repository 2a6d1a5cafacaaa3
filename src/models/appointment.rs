//! Modelo de Appointment (ticket)
//!
//! Una cita es la unidad de trabajo programada: cliente, servicio, técnico
//! opcional, ventana horaria y estado del ciclo de vida.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Estado de la cita - mapea al ENUM appointment_status
///
/// `pending → scheduled → en_route → in_progress → completed`, con
/// `cancelled` alcanzable desde cualquier estado no terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Scheduled,
    EnRoute,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    /// El técnico sale hacia la cita o empieza el trabajo: su ruta pasa a `active`
    pub fn starts_route(self) -> bool {
        matches!(self, AppointmentStatus::EnRoute | AppointmentStatus::InProgress)
    }

    /// Transiciones permitidas del ciclo de vida
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;

        if self.is_terminal() {
            return false;
        }
        if next == Cancelled {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Scheduled) | (Scheduled, EnRoute) | (EnRoute, InProgress) | (InProgress, Completed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::EnRoute => "en_route",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appointment principal - mapea a la tabla appointments
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub business_id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub route_id: Option<Uuid>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub status: AppointmentStatus,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request para crear una cita
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_time_window"))]
pub struct CreateAppointmentRequest {
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: Option<DateTime<Utc>>,

    #[validate(length(min = 5, max = 500))]
    pub address: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

fn validate_time_window(request: &CreateAppointmentRequest) -> Result<(), ValidationError> {
    if let Some(end) = request.scheduled_end {
        if end <= request.scheduled_start {
            return Err(ValidationError::new("scheduled_end_before_start"));
        }
    }
    if request.latitude.is_some() != request.longitude.is_some() {
        return Err(ValidationError::new("incomplete_coordinates"));
    }
    Ok(())
}

/// Request para cambiar el estado de una cita
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

/// Filtros para búsqueda de citas
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentFilters {
    pub status: Option<AppointmentStatus>,
    pub technician_id: Option<Uuid>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    #[test]
    fn test_forward_transitions() {
        assert!(Pending.can_transition_to(Scheduled));
        assert!(Scheduled.can_transition_to(EnRoute));
        assert!(EnRoute.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
    }

    #[test]
    fn test_skipping_states_is_rejected() {
        assert!(!Pending.can_transition_to(InProgress));
        assert!(!Scheduled.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Scheduled));
    }

    #[test]
    fn test_cancel_from_non_terminal_only() {
        for status in [Pending, Scheduled, EnRoute, InProgress] {
            assert!(status.can_transition_to(Cancelled), "{} -> cancelled", status);
        }
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(serde_json::to_string(&EnRoute).unwrap(), "\"en_route\"");
        let parsed: AppointmentStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(parsed, InProgress);
    }

    #[test]
    fn test_time_window_validation() {
        let start = Utc::now();
        let request = CreateAppointmentRequest {
            customer_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            technician_id: None,
            scheduled_start: start,
            scheduled_end: Some(start - chrono::Duration::minutes(30)),
            address: None,
            latitude: None,
            longitude: None,
            notes: None,
        };
        assert!(request.validate().is_err());

        let fixed = CreateAppointmentRequest {
            scheduled_end: Some(start + chrono::Duration::hours(1)),
            ..request
        };
        assert!(fixed.validate().is_ok());
    }
}
