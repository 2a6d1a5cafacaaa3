//! Eventos del feed de cambios y filtros por fila

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RealtimeError;

/// Tipo de cambio sobre una fila
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Cambio de una fila tal como lo publica el trigger `notify_change()`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub record: Option<Value>,
    #[serde(default)]
    pub old_record: Option<Value>,
    pub commit_timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(table: impl Into<String>, kind: ChangeKind, record: Option<Value>, old_record: Option<Value>) -> Self {
        Self {
            table: table.into(),
            kind,
            record,
            old_record,
            commit_timestamp: Utc::now(),
        }
    }

    /// Parsear el payload JSON de una notificación
    pub fn from_payload(payload: &str) -> Result<Self, RealtimeError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Fila de referencia para filtros: la nueva, o la anterior en un DELETE
    pub fn row(&self) -> Option<&Value> {
        match self.kind {
            ChangeKind::Delete => self.old_record.as_ref(),
            _ => self.record.as_ref().or(self.old_record.as_ref()),
        }
    }
}

/// Filtro de igualdad `columna=eq.valor`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    pub column: String,
    pub value: String,
}

impl RowFilter {
    pub fn equals(column: impl Into<String>, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }

    pub fn parse(expression: &str) -> Result<Self, RealtimeError> {
        let invalid = || RealtimeError::InvalidFilter(expression.to_string());

        let (column, rest) = expression.split_once('=').ok_or_else(invalid)?;
        let value = rest.strip_prefix("eq.").ok_or_else(invalid)?;
        let column = column.trim();
        if column.is_empty() || value.is_empty() {
            return Err(invalid());
        }

        Ok(Self::equals(column, value))
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        let Some(cell) = event.row().and_then(|row| row.get(&self.column)) else {
            return false;
        };
        match cell {
            Value::String(s) => *s == self.value,
            Value::Null => false,
            other => other.to_string() == self.value,
        }
    }
}

impl std::fmt::Display for RowFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}=eq.{}", self.column, self.value)
    }
}
