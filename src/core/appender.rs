//! Appender trait and the shared handle loggers attach
//!
//! An [`Appender`] is the output discipline (console, file, rolling file).
//! It is wrapped in an [`AppenderHandle`] which owns everything common to
//! all appenders: the name, layout, filter chain, error handler, threshold
//! and the mutex that serializes "render, check, write" per appender.
//! Loggers hold [`AppenderRef`]s, so one appender can be shared by many
//! loggers and is identified by pointer identity.

use super::diagnostics;
use super::error::{LoggerError, Result};
use super::error_handler::{ErrorHandler, OnlyOnceErrorHandler};
use super::filter::{evaluate_chain, Filter};
use super::log_event::LogEvent;
use super::log_level::LogLevel;
use crate::layout::{FormatBuffer, PatternLayout};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait Appender: Send {
    /// Emit one event. `formatted` is the layout output when the handle has a
    /// layout. Problems that must not stop the write (a failed rollover, for
    /// instance) go to `errors`; a returned error means the event was lost.
    fn append(
        &mut self,
        event: &LogEvent,
        formatted: Option<&str>,
        errors: &dyn ErrorHandler,
    ) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release underlying resources. Called at most once by the handle.
    fn close(&mut self) -> Result<()> {
        self.flush()
    }

    fn requires_layout(&self) -> bool {
        true
    }

    /// Appenders that forward to other appenders; these are closed before
    /// regular appenders at shutdown.
    fn is_attachable(&self) -> bool {
        false
    }
}

pub type AppenderRef = Arc<AppenderHandle>;

struct SinkState {
    sink: Box<dyn Appender>,
    buffer: FormatBuffer,
}

pub struct AppenderHandle {
    name: String,
    state: Mutex<SinkState>,
    layout: RwLock<Option<Arc<PatternLayout>>>,
    filters: RwLock<Vec<Box<dyn Filter>>>,
    error_handler: RwLock<Box<dyn ErrorHandler>>,
    threshold: RwLock<LogLevel>,
    requires_layout: bool,
    attachable: bool,
    closed: AtomicBool,
    closed_warning_emitted: AtomicBool,
}

impl AppenderHandle {
    pub fn new<A: Appender + 'static>(name: impl Into<String>, sink: A) -> AppenderRef {
        let requires_layout = sink.requires_layout();
        let attachable = sink.is_attachable();
        Arc::new(Self {
            name: name.into(),
            state: Mutex::new(SinkState {
                sink: Box::new(sink),
                buffer: FormatBuffer::new(),
            }),
            layout: RwLock::new(None),
            filters: RwLock::new(Vec::new()),
            error_handler: RwLock::new(Box::new(OnlyOnceErrorHandler::new())),
            threshold: RwLock::new(LogLevel::All),
            requires_layout,
            attachable,
            closed: AtomicBool::new(false),
            closed_warning_emitted: AtomicBool::new(false),
        })
    }

    /// Create a handle with a layout already installed
    pub fn with_layout<A: Appender + 'static>(
        name: impl Into<String>,
        sink: A,
        layout: PatternLayout,
    ) -> AppenderRef {
        let handle = Self::new(name, sink);
        handle.set_layout(layout);
        handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requires_layout(&self) -> bool {
        self.requires_layout
    }

    pub fn is_attachable(&self) -> bool {
        self.attachable
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn set_layout(&self, layout: PatternLayout) {
        *self.layout.write() = Some(Arc::new(layout));
    }

    pub fn layout(&self) -> Option<Arc<PatternLayout>> {
        self.layout.read().clone()
    }

    pub fn add_filter<F: Filter + 'static>(&self, filter: F) {
        self.filters.write().push(Box::new(filter));
    }

    pub fn add_boxed_filter(&self, filter: Box<dyn Filter>) {
        self.filters.write().push(filter);
    }

    pub fn clear_filters(&self) {
        self.filters.write().clear();
    }

    pub fn set_error_handler(&self, handler: Box<dyn ErrorHandler>) {
        *self.error_handler.write() = handler;
    }

    pub fn set_threshold(&self, level: LogLevel) {
        *self.threshold.write() = level;
    }

    pub fn threshold(&self) -> LogLevel {
        *self.threshold.read()
    }

    /// Run the threshold and filter chain, render, and hand the event to the
    /// sink. Never returns an error and never panics into the caller.
    pub fn do_append(&self, event: &LogEvent) {
        if self.is_closed() {
            if !self.closed_warning_emitted.swap(true, Ordering::Relaxed) {
                diagnostics::error(LoggerError::appender_closed(&self.name).to_string());
            }
            return;
        }

        if !event.level.is_greater_or_equal(self.threshold()) {
            return;
        }

        if !evaluate_chain(&self.filters.read(), event) {
            return;
        }

        let layout = self.layout();
        let handler = self.error_handler.read();
        let mut state = self.state.lock();
        let SinkState { sink, buffer } = &mut *state;

        let formatted = match layout.as_deref() {
            Some(layout) => Some(layout.format_into(event, buffer)),
            None if self.requires_layout => {
                handler.error(
                    &format!("No layout set for the appender named [{}].", self.name),
                    None,
                    Some(event),
                );
                return;
            }
            None => None,
        };

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            sink.append(event, formatted, handler.as_ref())
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => handler.error(
                &format!("Failed to append to appender [{}]", self.name),
                Some(&e),
                Some(event),
            ),
            Err(panic_info) => {
                diagnostics::error(format!(
                    "Appender [{}] panicked: {}. Other appenders continue to function.",
                    self.name,
                    panic_message(panic_info.as_ref())
                ));
            }
        }
    }

    pub fn flush(&self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.state.lock().sink.flush()
    }

    /// Close the underlying sink. Later calls are no-ops.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut state = self.state.lock();
        if let Err(e) = state.sink.close() {
            diagnostics::error_with(format!("Could not close appender [{}]", self.name), &e);
        }
    }
}

impl fmt::Debug for AppenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppenderHandle")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

pub(crate) fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
