//! Domain Layer - Validation Errors

use thiserror::Error;

/// Rejected project input. Field names are the stored (camelCase) names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    BlankField(&'static str),
    #[error("{field} must be a YYYY-MM-DD date, got {value:?}")]
    InvalidDate { field: &'static str, value: String },
}
