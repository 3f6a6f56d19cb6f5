use chrono::NaiveDate;
use thiserror::Error;

use crate::store::StoreError;

/// Main error type for itinerary planning
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Validation error: `{field}` {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Invalid date range: end date {end} must be after start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Generator returned no plan text: {0}")]
    GenerationEmpty(String),

    #[error("Generator returned text that is not valid JSON: {reason}")]
    GenerationParse { reason: String, raw: String },

    #[error("Generated plan has an invalid shape: {0}")]
    GenerationInvalidShape(String),

    #[error("Plan store error: {0}")]
    Store(#[from] StoreError),

    #[error("No itinerary stored for owner `{owner_id}` and trip `{trip_id}`")]
    PlanNotFound { owner_id: String, trip_id: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generator request failed: {0}")]
    Generator(String),

    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        PlannerError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Whether a caller may reasonably retry the same request.
    ///
    /// The planner never retries on its own; this only informs the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlannerError::GenerationEmpty(_)
                | PlannerError::GenerationParse { .. }
                | PlannerError::GenerationInvalidShape(_)
                | PlannerError::Generator(_)
                | PlannerError::RateLimit { .. }
                | PlannerError::Timeout(_)
        )
    }

    /// "Could not generate a plan"
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            PlannerError::GenerationEmpty(_)
                | PlannerError::GenerationParse { .. }
                | PlannerError::GenerationInvalidShape(_)
                | PlannerError::Generator(_)
                | PlannerError::RateLimit { .. }
                | PlannerError::Timeout(_)
        )
    }

    /// "Could not save/load a plan"
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            PlannerError::Store(_) | PlannerError::PlanNotFound { .. }
        )
    }

    /// Raw generator text attached to parse failures.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            PlannerError::GenerationParse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            PlannerError::Validation { .. } => "VALIDATION_ERROR",
            PlannerError::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            PlannerError::GenerationEmpty(_) => "GENERATION_EMPTY",
            PlannerError::GenerationParse { .. } => "GENERATION_PARSE_ERROR",
            PlannerError::GenerationInvalidShape(_) => "GENERATION_INVALID_SHAPE",
            PlannerError::Store(_) => "STORE_ERROR",
            PlannerError::PlanNotFound { .. } => "PLAN_NOT_FOUND",
            PlannerError::Config(_) => "CONFIG_ERROR",
            PlannerError::Generator(_) => "GENERATOR_ERROR",
            PlannerError::RateLimit { .. } => "RATE_LIMIT_ERROR",
            PlannerError::Timeout(_) => "TIMEOUT_ERROR",
            PlannerError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "retryable": self.is_retryable()
            }
        })
    }
}
