// RUNTIME PREFERENCES (User Experience)

use crate::config::compile_time::batch::MAX_WORKER_THREADS;
use crate::logging::LogLevel;
use crate::projection::{ArrayRecursionPolicy, DefaultIdPolicy};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionPreferences {
    /// What happens to `_id` when a specification never mentions it
    pub default_id_policy: DefaultIdPolicy,

    /// Whether arrays nested inside arrays are projected into
    pub array_recursion_policy: ArrayRecursionPolicy,

    /// Whether to log tree statistics after each successful compile
    pub log_compile_details: bool,
}

impl Default for ProjectionPreferences {
    fn default() -> Self {
        Self {
            default_id_policy: env::var(env_vars::DEFAULT_ID_POLICY)
                .ok()
                .and_then(|v| parse_default_id_policy(&v))
                .unwrap_or(DefaultIdPolicy::IncludeId),
            array_recursion_policy: env::var(env_vars::ARRAY_RECURSION)
                .ok()
                .and_then(|v| parse_array_recursion_policy(&v))
                .unwrap_or(ArrayRecursionPolicy::RecurseNestedArrays),
            log_compile_details: env::var(env_vars::LOG_COMPILE_DETAILS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPreferences {
    /// Worker threads used for parallel application (clamped to the compile-time ceiling)
    pub worker_threads: usize,

    /// Documents below this count are always projected on the calling thread
    pub parallel_threshold: usize,
}

impl Default for BatchPreferences {
    fn default() -> Self {
        let detected = std::thread::available_parallelism()
            .map(|n| n.get().min(8))
            .unwrap_or(4);

        Self {
            worker_threads: env::var(env_vars::BATCH_THREADS)
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(detected)
                .min(MAX_WORKER_THREADS),
            parallel_threshold: env::var(env_vars::BATCH_PARALLEL_THRESHOLD)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Minimum level that reaches the configured logger
    pub min_log_level: LogLevel,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOG_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var(env_vars::LOG_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Warning),
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

pub fn parse_default_id_policy(value: &str) -> Option<DefaultIdPolicy> {
    match value.to_lowercase().as_str() {
        "include" | "include_id" => Some(DefaultIdPolicy::IncludeId),
        "exclude" | "exclude_id" => Some(DefaultIdPolicy::ExcludeId),
        _ => None,
    }
}

pub fn parse_array_recursion_policy(value: &str) -> Option<ArrayRecursionPolicy> {
    match value.to_lowercase().as_str() {
        "recurse" | "true" => Some(ArrayRecursionPolicy::RecurseNestedArrays),
        "skip" | "none" | "false" => Some(ArrayRecursionPolicy::DoNotRecurseNestedArrays),
        _ => None,
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub projection: ProjectionPreferences,
    pub batch: BatchPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Load all preferences from the environment
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // Projection
    pub const DEFAULT_ID_POLICY: &str = "PROJECTION_DEFAULT_ID_POLICY";
    pub const ARRAY_RECURSION: &str = "PROJECTION_ARRAY_RECURSION";
    pub const LOG_COMPILE_DETAILS: &str = "PROJECTION_LOG_COMPILE_DETAILS";

    // Batch
    pub const BATCH_THREADS: &str = "PROJECTION_BATCH_THREADS";
    pub const BATCH_PARALLEL_THRESHOLD: &str = "PROJECTION_BATCH_PARALLEL_THRESHOLD";

    // Logging
    pub const LOG_STRUCTURED: &str = "PROJECTION_LOG_STRUCTURED";
    pub const LOG_MIN_LEVEL: &str = "PROJECTION_LOG_MIN_LEVEL";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("WARN"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("3"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_parse_policies() {
        assert_eq!(
            parse_default_id_policy("Exclude"),
            Some(DefaultIdPolicy::ExcludeId)
        );
        assert_eq!(
            parse_default_id_policy("include_id"),
            Some(DefaultIdPolicy::IncludeId)
        );
        assert_eq!(parse_default_id_policy("maybe"), None);

        assert_eq!(
            parse_array_recursion_policy("skip"),
            Some(ArrayRecursionPolicy::DoNotRecurseNestedArrays)
        );
        assert_eq!(
            parse_array_recursion_policy("recurse"),
            Some(ArrayRecursionPolicy::RecurseNestedArrays)
        );
    }

    #[test]
    fn test_batch_preferences_respect_ceiling() {
        let prefs = BatchPreferences::default();
        assert!(prefs.worker_threads >= 1);
        assert!(prefs.worker_threads <= MAX_WORKER_THREADS);
    }

    #[test]
    fn test_runtime_config_serializes() {
        let config = RuntimeConfig::from_env();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("projection").is_some());
        assert!(json.get("batch").is_some());
        assert!(json.get("logging").is_some());
    }
}
