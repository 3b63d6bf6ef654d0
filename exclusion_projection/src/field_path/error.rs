//! Error types for field path construction

use crate::logging::codes;
use thiserror::Error;

/// Field path construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldPathError {
    /// The path string was empty
    #[error("Field path cannot be empty")]
    EmptyPath,

    /// A dotted path had an empty component, e.g. `a..b` or `.a`
    #[error("Field path '{path}' has an empty component at position {position}")]
    EmptyComponent { path: String, position: usize },

    /// A single field name contained the path separator
    #[error("Field name '{field}' cannot contain '.'")]
    SeparatorInFieldName { field: String },
}

impl FieldPathError {
    pub fn empty_component(path: &str, position: usize) -> Self {
        Self::EmptyComponent {
            path: path.to_string(),
            position,
        }
    }

    pub fn separator_in_field_name(field: &str) -> Self {
        Self::SeparatorInFieldName {
            field: field.to_string(),
        }
    }

    /// Get appropriate error code for logging system
    pub fn error_code(&self) -> codes::Code {
        codes::compile::INVALID_FIELD_PATH
    }
}
