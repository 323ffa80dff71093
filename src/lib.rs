//! # Rust Logger Hierarchy
//!
//! A hierarchical logging runtime: named loggers arranged by dotted names,
//! appenders rendered through compiled conversion patterns, and file output
//! that rolls over on date boundaries.
//!
//! ## Features
//!
//! - **Logger Tree**: Parents are found by dot-segment prefix in any creation order
//! - **Inheritance**: Levels and appenders flow down the tree unless additivity is off
//! - **Pattern Layouts**: `%d [%t] %-5p %c{2} - %m%n` style formats compiled once
//! - **Rolling Files**: Date-pattern rollover with retention pruning
//! - **Thread Safe**: Loggers may be created and used from any thread
//!
//! ## Example
//!
//! ```
//! use rust_logger_hierarchy::prelude::*;
//!
//! let hierarchy = Hierarchy::new();
//! let (writer, out) = WriterAppender::shared_buffer();
//! hierarchy
//!     .root_logger()
//!     .add_appender(AppenderHandle::with_layout("mem", writer, PatternLayout::new("%-5p %c - %m%n")));
//!
//! let logger = hierarchy.get_logger("app.db");
//! logger.info("connected");
//! assert_eq!(out.contents(), "INFO  app.db - connected\n");
//! ```

pub mod appenders;
pub mod config;
pub mod core;
pub mod layout;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{
        ConsoleAppender, ConsoleTarget, DailyRollingFileAppender, FileAppender, FileOptions,
        ForwardingAppender, RollingPolicy, SharedBuffer, WriterAppender,
    };
    pub use crate::config::Configurator;
    pub use crate::core::{
        Appender, AppenderHandle, AppenderRef, FieldValue, Filter, FilterDecision, Hierarchy,
        LogContext, LogEvent, LogLevel, Logger, LoggerError, Mdc, Ndc, Result,
    };
    pub use crate::layout::PatternLayout;
}

pub use crate::appenders::{ConsoleAppender, DailyRollingFileAppender, FileAppender};
pub use crate::config::Configurator;
pub use crate::core::{
    Appender, AppenderHandle, AppenderRef, Hierarchy, LogEvent, LogLevel, Logger, LoggerError,
    Mdc, Ndc, Result,
};
pub use crate::layout::PatternLayout;
