//! Error types for projection compilation

use crate::field_path::FieldPathError;
use crate::logging::codes;
use thiserror::Error;

/// Result type for projection compilation
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Projection compilation errors.
///
/// `ContractViolation` and `InvalidFieldPath` mean the specification reached the
/// compiler without passing upstream validation. They abort compilation and are
/// never produced by applying an already compiled projection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// Specification shape the exclusion compiler must never see
    #[error("Exclusion projection contract violated at '{field}': {message}")]
    ContractViolation { field: String, message: String },

    /// Malformed dotted field name
    #[error("Invalid field path in projection: {0}")]
    InvalidFieldPath(#[from] FieldPathError),

    /// Compile-time configured limit exceeded
    #[error("Projection limit exceeded: {limit_type} is {actual_value}, maximum allowed is {limit_value}")]
    LimitExceeded {
        limit_type: String,
        actual_value: usize,
        limit_value: usize,
    },
}

impl ProjectionError {
    pub fn contract_violation(field: &str, message: impl Into<String>) -> Self {
        Self::ContractViolation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn limit_exceeded(limit_type: &str, actual_value: usize, limit_value: usize) -> Self {
        Self::LimitExceeded {
            limit_type: limit_type.to_string(),
            actual_value,
            limit_value,
        }
    }

    /// True for errors that mean upstream validation was skipped
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::ContractViolation { .. } | Self::InvalidFieldPath(_)
        )
    }

    /// Get appropriate error code for logging system
    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::ContractViolation { .. } => codes::compile::CONTRACT_VIOLATION,
            Self::InvalidFieldPath(e) => e.error_code(),
            Self::LimitExceeded { limit_type, .. } if limit_type == "spec_depth" => {
                codes::compile::SPEC_TOO_DEEP
            }
            Self::LimitExceeded { .. } => codes::compile::SPEC_TOO_LARGE,
        }
    }

    /// Every compile error aborts compilation
    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Self::ContractViolation { .. } => "ContractViolation",
            Self::InvalidFieldPath(_) => "InvalidFieldPath",
            Self::LimitExceeded { .. } => "LimitExceeded",
        }
    }
}
