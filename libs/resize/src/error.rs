//! Error types for resize request validation.

use thiserror::Error;

/// Errors that can occur when validating a resize request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A required field is empty.
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    /// The target machine type does not match the provider's naming grammar.
    #[error("invalid machine type '{value}': expected lowercase segments separated by '-', like 'e2-micro'")]
    InvalidMachineType { value: String },
}

impl RequestError {
    /// Returns true if this error indicates an empty field.
    pub fn is_empty_field(&self) -> bool {
        matches!(self, RequestError::EmptyField { .. })
    }
}
