//! Core logger types and traits

pub mod appender;
pub mod diagnostics;
pub mod error;
pub mod error_handler;
pub mod filter;
pub mod hierarchy;
pub mod log_context;
pub mod log_event;
pub mod log_level;
pub mod logger;

pub use appender::{Appender, AppenderHandle, AppenderRef};
pub use error::{LoggerError, Result};
pub use error_handler::{ErrorHandler, FallbackErrorHandler, OnlyOnceErrorHandler};
pub use filter::{
    DenyAllFilter, Filter, FilterDecision, LevelMatchFilter, LevelRangeFilter, StringMatchFilter,
};
pub use hierarchy::{Hierarchy, NodeId, ROOT_LOGGER_NAME};
pub use log_context::{FieldValue, LogContext, Mdc, MdcGuard, Ndc};
pub use log_event::{LocationInfo, LogEvent};
pub use log_level::{LevelSpec, LogLevel};
pub use logger::{DefaultLoggerFactory, Logger, LoggerFactory, LoggerNode};
