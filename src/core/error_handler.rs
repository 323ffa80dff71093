//! Error handlers receiving appender failures

use super::appender::AppenderRef;
use super::diagnostics;
use super::error::LoggerError;
use super::log_event::LogEvent;
use std::sync::atomic::{AtomicBool, Ordering};

/// Receives failures an appender could not handle itself.
///
/// Implementations must not panic and must not log back into the appender
/// that reported the error.
pub trait ErrorHandler: Send + Sync {
    fn error(&self, message: &str, error: Option<&LoggerError>, event: Option<&LogEvent>);

    /// Appender to fall back to. Ignored by handlers without fallback.
    fn set_backup_appender(&mut self, _backup: AppenderRef) {}
}

/// Reports the first error to the diagnostics channel and ignores the rest.
#[derive(Debug, Default)]
pub struct OnlyOnceErrorHandler {
    first_reported: AtomicBool,
}

impl OnlyOnceErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_reported(&self) -> bool {
        self.first_reported.load(Ordering::Relaxed)
    }
}

impl ErrorHandler for OnlyOnceErrorHandler {
    fn error(&self, message: &str, error: Option<&LoggerError>, _event: Option<&LogEvent>) {
        if self.first_reported.swap(true, Ordering::Relaxed) {
            return;
        }
        match error {
            Some(err) => diagnostics::error_with(message, err),
            None => diagnostics::error(message),
        }
    }
}

/// Reports every error and re-routes the failed event to a backup appender.
#[derive(Debug, Default)]
pub struct FallbackErrorHandler {
    backup: Option<AppenderRef>,
}

impl FallbackErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backup(backup: AppenderRef) -> Self {
        Self {
            backup: Some(backup),
        }
    }

    pub fn backup(&self) -> Option<&AppenderRef> {
        self.backup.as_ref()
    }
}

impl ErrorHandler for FallbackErrorHandler {
    fn error(&self, message: &str, error: Option<&LoggerError>, event: Option<&LogEvent>) {
        match error {
            Some(err) => diagnostics::warn(format!("Fallback on error: {}: {}", message, err)),
            None => diagnostics::warn(format!("Fallback on error: {}", message)),
        }
        if let (Some(backup), Some(event)) = (&self.backup, event) {
            backup.do_append(event);
        }
    }

    fn set_backup_appender(&mut self, backup: AppenderRef) {
        diagnostics::debug(format!("FallbackErrorHandler: setting backup appender to [{}]", backup.name()));
        self.backup = Some(backup);
    }
}
