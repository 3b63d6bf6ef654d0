//! Type-safe logging macros using Code types with Display support

/// Log error with Code type - accepts Display types for context values
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr) => {
        $crate::logging::log_with_context(
            $crate::logging::LogEvent::error($code, $message),
            vec![],
        )
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let context_strings: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_with_context(
                $crate::logging::LogEvent::error($code, $message),
                context_strings,
            )
        }
    };
}

/// Log success with Code type - accepts Display types for context values
#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr) => {
        $crate::logging::log_with_context(
            $crate::logging::LogEvent::success($code, $message),
            vec![],
        )
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let context_strings: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_with_context(
                $crate::logging::LogEvent::success($code, $message),
                context_strings,
            )
        }
    };
}

/// Log informational message
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        $crate::logging::log_with_context($crate::logging::LogEvent::info($message), vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let context_strings: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_with_context(
                $crate::logging::LogEvent::info($message),
                context_strings,
            )
        }
    };
}

/// Log warning message
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        $crate::logging::log_with_context($crate::logging::LogEvent::warning($message), vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let context_strings: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_with_context(
                $crate::logging::LogEvent::warning($message),
                context_strings,
            )
        }
    };
}

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        $crate::logging::log_with_context($crate::logging::LogEvent::debug($message), vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let context_strings: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            $crate::logging::log_with_context(
                $crate::logging::LogEvent::debug($message),
                context_strings,
            )
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::logging::codes;

    #[test]
    fn test_macros_do_not_panic_without_logger() {
        crate::log_info!("info without logger");
        crate::log_info!("info with context", "fields" => 3, "depth" => "1");
        crate::log_warning!("warning", "reason" => "test");
        crate::log_debug!("debug");
        crate::log_success!(codes::success::PROJECTION_COMPILED, "compiled", "nodes" => 2);
        crate::log_error!(codes::compile::CONTRACT_VIOLATION, "error", "field" => "a.b");
    }
}
