//! Utilidades de validación
//!
//! Funciones helper para validación de formularios y conversión de tipos.
//! Se usan desde los `#[validate(custom = ...)]` de los requests.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

use crate::utils::errors::{AppError, AppResult};

lazy_static! {
    /// Teléfono: dígitos con separadores opcionales y prefijo internacional
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9][0-9 ().-]{6,20}[0-9]$")
        .expect("valid phone regex");
}

/// Validar y convertir string a fecha (YYYY-MM-DD)
pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", value)))
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de teléfono
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    if !PHONE_RE.is_match(value) || !(7..=15).contains(&digits) {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2024-01-15").is_ok());
        assert!(parse_date("2024/01/15").is_err());
    }

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("Ana").is_ok());
        assert!(validate_not_empty("   ").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+1 (555) 010-2030").is_ok());
        assert!(validate_phone("5550102030").is_ok());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("call me maybe").is_err());
        assert!(validate_phone("1234567890123456789").is_err());
    }
}
