//! Consolidated log codes and classification system
//!
//! Single source of truth for every code the library emits, together with its
//! behavioral metadata.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Specification compile error codes
pub mod compile {
    use super::Code;

    pub const CONTRACT_VIOLATION: Code = Code::new("P001");
    pub const INVALID_FIELD_PATH: Code = Code::new("P002");
    pub const SPEC_TOO_DEEP: Code = Code::new("P003");
    pub const SPEC_TOO_LARGE: Code = Code::new("P004");
}

/// Batch application error codes
pub mod batch {
    use super::Code;

    pub const TOO_MANY_DOCUMENTS: Code = Code::new("B001");
    pub const WORKER_FAILURE: Code = Code::new("B002");
    pub const INVALID_DOCUMENT: Code = Code::new("B003");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I001");
    pub const PROJECTION_COMPILED: Code = Code::new("I010");
    pub const BATCH_COMPLETED: Code = Code::new("I020");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let entries = [
            ErrorMetadata::new(
                "ERR002",
                "System",
                Severity::Critical,
                false,
                true,
                "Logging or configuration initialization failure",
                "Check environment configuration",
            ),
            ErrorMetadata::new(
                "P001",
                "Compile",
                Severity::Critical,
                false,
                true,
                "Projection specification violates the exclusion-only contract",
                "Validate the specification before compiling it",
            ),
            ErrorMetadata::new(
                "P002",
                "Compile",
                Severity::High,
                false,
                true,
                "Specification contains a malformed dotted field path",
                "Remove empty path components from the specification",
            ),
            ErrorMetadata::new(
                "P003",
                "Compile",
                Severity::High,
                false,
                true,
                "Specification nesting exceeds the configured depth limit",
                "Flatten the specification or raise compile.max_spec_depth",
            ),
            ErrorMetadata::new(
                "P004",
                "Compile",
                Severity::High,
                false,
                true,
                "Specification has more fields than the configured limit",
                "Reduce the specification or raise compile.max_spec_fields",
            ),
            ErrorMetadata::new(
                "B001",
                "Batch",
                Severity::Medium,
                true,
                false,
                "Batch exceeds the configured document limit",
                "Split the input into smaller batches",
            ),
            ErrorMetadata::new(
                "B002",
                "Batch",
                Severity::Critical,
                false,
                true,
                "A batch worker thread terminated abnormally",
                "File a bug report with the failing input",
            ),
            ErrorMetadata::new(
                "B003",
                "Batch",
                Severity::Low,
                true,
                false,
                "Input line is not a JSON object document",
                "Fix or drop the offending input line",
            ),
            ErrorMetadata::new(
                "I001",
                "System",
                Severity::Low,
                true,
                false,
                "Logging system initialized",
                "None",
            ),
            ErrorMetadata::new(
                "I010",
                "Compile",
                Severity::Low,
                true,
                false,
                "Projection specification compiled",
                "None",
            ),
            ErrorMetadata::new(
                "I020",
                "Batch",
                Severity::Low,
                true,
                false,
                "Batch application completed",
                "None",
            ),
        ];

        entries.into_iter().map(|meta| (meta.code, meta)).collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get metadata for a specific code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get severity from code
pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Check if error requires immediate halt
pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for code
pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for code
pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get category from code
pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violation_metadata() {
        let code = compile::CONTRACT_VIOLATION.as_str();
        assert_eq!(get_category(code), "Compile");
        assert_eq!(get_severity(code), Severity::Critical);
        assert!(requires_halt(code));
        assert!(!is_recoverable(code));
    }

    #[test]
    fn test_unknown_code_defaults() {
        assert_eq!(get_description("Z999"), "Unknown error");
        assert_eq!(get_category("Z999"), "Unknown");
        assert!(is_recoverable("Z999"));
        assert!(!requires_halt("Z999"));
    }

    #[test]
    fn test_every_constant_is_registered() {
        let all = [
            system::INITIALIZATION_FAILURE,
            compile::CONTRACT_VIOLATION,
            compile::INVALID_FIELD_PATH,
            compile::SPEC_TOO_DEEP,
            compile::SPEC_TOO_LARGE,
            batch::TOO_MANY_DOCUMENTS,
            batch::WORKER_FAILURE,
            batch::INVALID_DOCUMENT,
            success::SYSTEM_INITIALIZATION_COMPLETED,
            success::PROJECTION_COMPILED,
            success::BATCH_COMPLETED,
        ];
        for code in all {
            assert!(get_error_metadata(code.as_str()).is_some(), "{}", code);
        }
    }
}
