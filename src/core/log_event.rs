//! Log event structure

use super::log_context::{LogContext, Mdc, Ndc};
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::sync::OnceLock;

// Thread-local cache for the thread label to avoid repeated allocations
thread_local! {
    static THREAD_NAME_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static START_TIME: OnceLock<DateTime<Utc>> = OnceLock::new();

/// Instant the logging runtime started, used by relative-time output
pub fn start_time() -> DateTime<Utc> {
    *START_TIME.get_or_init(Utc::now)
}

/// Name of the current thread, falling back to its id
fn get_thread_name() -> String {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                let current = std::thread::current();
                match current.name() {
                    Some(name) => name.to_string(),
                    None => format!("{:?}", current.id()),
                }
            })
            .clone()
    })
}

/// Source location of a logging call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationInfo {
    /// Module path in dotted form, e.g. `app.net.server`
    pub class_name: String,
    pub method_name: String,
    pub file_name: String,
    pub line: u32,
}

impl LocationInfo {
    pub fn new(
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        file_name: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            file_name: file_name.into(),
            line,
        }
    }

    /// Build from `module_path!()`, a function type name, `file!()` and
    /// `line!()`. Used by the [`location!`](crate::location) macro.
    pub fn from_parts(module_path: &str, function_path: &str, file: &str, line: u32) -> Self {
        let mut function_path = function_path.strip_suffix("::__location").unwrap_or(function_path);
        while let Some(stripped) = function_path.strip_suffix("::{{closure}}") {
            function_path = stripped;
        }
        let method_name = function_path
            .rsplit("::")
            .next()
            .unwrap_or(function_path)
            .to_string();

        Self {
            class_name: module_path.replace("::", "."),
            method_name,
            file_name: file.to_string(),
            line,
        }
    }

    /// `class.method(file:line)`
    pub fn full_info(&self) -> String {
        format!(
            "{}.{}({}:{})",
            self.class_name, self.method_name, self.file_name, self.line
        )
    }
}

/// Immutable snapshot of one logging call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub logger_name: String,
    pub level: LogLevel,
    pub message: String,
    pub thread_name: String,
    pub context: LogContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationInfo>,
}

impl LogEvent {
    /// Capture an event on the current thread, including its MDC and NDC
    pub fn new(logger_name: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        // make sure relative time has a reference point no later than the
        // first event
        start_time();
        Self {
            timestamp: Utc::now(),
            logger_name: logger_name.into(),
            level,
            message: message.into(),
            thread_name: get_thread_name(),
            context: Mdc::snapshot(),
            ndc: Ndc::get(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: LocationInfo) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// Milliseconds between the runtime start and this event
    pub fn relative_millis(&self) -> i64 {
        (self.timestamp - start_time()).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_parts() {
        let loc = LocationInfo::from_parts(
            "app::net::server",
            "app::net::server::accept::{{closure}}::__location",
            "src/net/server.rs",
            42,
        );
        assert_eq!(loc.class_name, "app.net.server");
        assert_eq!(loc.method_name, "accept");
        assert_eq!(loc.full_info(), "app.net.server.accept(src/net/server.rs:42)");
    }

    #[test]
    fn test_event_captures_ndc() {
        Ndc::clear();
        Ndc::push("req-1");
        let event = LogEvent::new("a.b", LogLevel::Info, "hello");
        Ndc::clear();

        assert_eq!(event.ndc.as_deref(), Some("req-1"));
        assert_eq!(event.logger_name, "a.b");
        assert!(event.location.is_none());
        assert!(event.relative_millis() >= 0);
    }

    #[test]
    fn test_named_thread() {
        let name = std::thread::Builder::new()
            .name("worker-7".into())
            .spawn(|| LogEvent::new("x", LogLevel::Info, "m").thread_name)
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(name, "worker-7");
    }
}
