//! Global logging module for the exclusion projection library
//!
//! Provides thread-safe global logging with coded events and a clean macro interface.
//! Logging is optional: until `init_global_logging` runs, every macro is a no-op.

pub mod codes;
pub mod events;
pub mod macros;
pub mod service;

use crate::config::LoggingPreferences;
use std::sync::{Arc, OnceLock};

// Re-export main types
pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

// ============================================================================
// GLOBAL STATE
// ============================================================================

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging from environment preferences
pub fn init_global_logging() -> Result<(), String> {
    init_global_logging_with_preferences(&LoggingPreferences::default())
}

/// Initialize global logging from explicit preferences
pub fn init_global_logging_with_preferences(
    preferences: &LoggingPreferences,
) -> Result<(), String> {
    let logging_service = Arc::new(LoggingService::with_preferences(preferences));

    GLOBAL_LOGGER
        .set(logging_service.clone())
        .map_err(|_| "Global logger already initialized")?;

    logging_service.log_success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    );

    Ok(())
}

/// Initialize with custom service (primarily for testing)
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())
}

/// Check if global logging is initialized
pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

/// Safe access to global logger
pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

// ============================================================================
// MACRO SUPPORT FUNCTIONS
// ============================================================================

/// Attach context pairs and forward to the global logger (used by the log_* macros)
pub fn log_with_context(event: LogEvent, context: Vec<(&str, String)>) {
    let Some(logger) = try_get_global_logger() else {
        return;
    };

    if !logger.should_log(event.level) {
        return;
    }

    let event = context
        .into_iter()
        .fold(event, |event, (key, value)| event.with_context(key, &value));

    logger.log_event(event);
}

// ============================================================================
// SAFE FALLBACK LOGGING
// ============================================================================

/// Critical error logging, always mirrored to stderr
pub fn safe_log_critical(code: Code, message: &str) {
    if let Some(logger) = try_get_global_logger() {
        logger.log_error(code, message);
    }
    eprintln!("CRITICAL ERROR [{}]: {}", code.as_str(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_logging_initialization() {
        // Another test may have initialized it first
        if is_initialized() {
            return;
        }

        let memory = Arc::new(MemoryLogger::new());
        let service = Arc::new(LoggingService::new(memory.clone(), LogLevel::Debug));
        if init_global_logging_with_service(service).is_ok() {
            crate::log_info!("hello", "key" => "value");
            // Concurrent tests may log into the same service
            let hello = memory
                .get_events()
                .into_iter()
                .find(|e| e.message == "hello")
                .expect("hello event recorded");
            assert_eq!(hello.context.get("key").map(String::as_str), Some("value"));
        }
        assert!(is_initialized());
        assert!(init_global_logging().is_err());
    }

    #[test]
    fn test_safe_critical_logging() {
        safe_log_critical(codes::system::INITIALIZATION_FAILURE, "Test critical error");
    }
}
