//! Error types for the CME calculator.

use std::time::Duration;

use serde::Serialize;

use crate::form::FieldId;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Postal-code lookup failures. Never fatal: the address fields simply
/// stay as the user left them.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Postal code {cep} must have 8 digits")]
    InvalidCep { cep: String },

    #[error("Postal code {cep} not found")]
    NotFound { cep: String },

    #[error("Lookup request for {cep} failed: {reason}")]
    RequestFailed { cep: String, reason: String },

    #[error("Lookup for {cep} timed out after {timeout:?}")]
    Timeout { cep: String, timeout: Duration },

    #[error("Invalid lookup response for {cep}: {reason}")]
    InvalidResponse { cep: String, reason: String },
}

/// Lead backend failures, already classified by the operation that hit them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("Duplicate check failed: {reason}")]
    DuplicateCheck { reason: String },

    #[error("Lead submission failed: {reason}")]
    Submission {
        reason: String,
        status: Option<u16>,
    },

    #[error("Recommendation fetch for lead {lead_id} failed: {reason}")]
    RecommendationFetch { lead_id: String, reason: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Why a wizard transition was refused.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WizardError {
    #[error("Step {step} has {} invalid field(s)", errors.len())]
    Invalid {
        step: usize,
        errors: Vec<ValidationError>,
    },

    #[error("Consent must be accepted before submitting")]
    ConsentRequired,

    #[error("E-mail {email} already has a report on file")]
    DuplicateEmail { email: String },

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("The wizard has already been submitted")]
    AlreadySubmitted,

    #[error("The session was reset while this action was pending")]
    SessionReset,

    #[error("{0}")]
    Backend(#[from] BackendError),
}

/// What kind of rule a field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    Required,
    TooShort,
    FormatInvalid,
}

/// A per-field validation failure, shown inline next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: FieldId,
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: FieldId, kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result type alias for the calculator.
pub type Result<T> = std::result::Result<T, Error>;
