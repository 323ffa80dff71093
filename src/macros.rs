//! Logging macros
//!
//! Each macro checks the logger's level before formatting and records the
//! calling module, function, file and line.

/// Capture the current source location as a [`LocationInfo`](crate::core::LocationInfo).
///
/// # Examples
///
/// ```
/// use rust_logger_hierarchy::location;
///
/// fn handler() -> rust_logger_hierarchy::core::LocationInfo {
///     location!()
/// }
///
/// let loc = handler();
/// assert_eq!(loc.method_name, "handler");
/// assert!(loc.line > 0);
/// ```
#[macro_export]
macro_rules! location {
    () => {{
        fn __location() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::core::LocationInfo::from_parts(
            module_path!(),
            __type_name_of(__location),
            file!(),
            line!(),
        )
    }};
}

/// Log a message at the specified level.
///
/// # Examples
///
/// ```
/// # use rust_logger_hierarchy::prelude::*;
/// # let logger = Hierarchy::new().get_logger("app");
/// use rust_logger_hierarchy::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled_for(level) {
            logger.log_at(level, format!($($arg)+), $crate::location!());
        }
    }};
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_logger_hierarchy::prelude::*;
/// # let logger = Hierarchy::new().get_logger("app");
/// # logger.set_level(Some(LogLevel::Trace));
/// use rust_logger_hierarchy::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_logger_hierarchy::prelude::*;
/// # let logger = Hierarchy::new().get_logger("app");
/// use rust_logger_hierarchy::info;
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
///
/// # Examples
///
/// ```
/// # use rust_logger_hierarchy::prelude::*;
/// # let logger = Hierarchy::new().get_logger("app");
/// use rust_logger_hierarchy::fatal;
/// fatal!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::appenders::{SharedBuffer, WriterAppender};
    use crate::core::{AppenderHandle, Hierarchy, LogLevel, Logger};
    use crate::layout::PatternLayout;

    fn capture(pattern: &str) -> (Logger, SharedBuffer) {
        let hierarchy = Hierarchy::new();
        let (writer, out) = WriterAppender::shared_buffer();
        hierarchy
            .root_logger()
            .add_appender(AppenderHandle::with_layout("mem", writer, PatternLayout::new(pattern)));
        (hierarchy.get_logger("macros"), out)
    }

    #[test]
    fn test_level_macros() {
        let (logger, out) = capture("%p:%m;");
        trace!(logger, "hidden");
        debug!(logger, "Count: {}", 5);
        info!(logger, "Items: {}", 100);
        warn!(logger, "Retry {} of {}", 1, 3);
        error!(logger, "Code: {}", 500);
        fatal!(logger, "Critical failure: {}", "system");
        assert_eq!(
            out.contents(),
            "DEBUG:Count: 5;INFO:Items: 100;WARN:Retry 1 of 3;ERROR:Code: 500;FATAL:Critical failure: system;"
        );
    }

    #[test]
    fn test_log_macro_records_location() {
        let (logger, out) = capture("%C.%M:%F");
        log!(logger, LogLevel::Info, "located");
        assert_eq!(
            out.contents(),
            "rust_logger_hierarchy.macros.tests.test_log_macro_records_location:src/macros.rs"
        );
    }

    #[test]
    fn test_disabled_level_skips_formatting() {
        let (logger, out) = capture("%m");
        logger.set_level(Some(LogLevel::Error));
        let mut evaluated = false;
        info!(logger, "{}", {
            evaluated = true;
            "never"
        });
        assert!(!evaluated);
        assert!(out.is_empty());
    }
}
