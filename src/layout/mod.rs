//! Pattern layout: compiles a conversion pattern once and renders events
//! through the resulting converter chain.

pub mod converter;
pub mod date_format;
pub mod formatting_info;
pub mod parser;

pub use converter::{abbreviate, ConverterKind, LocationField, PatternConverter};
pub use date_format::{DateFormat, DatePattern};
pub use formatting_info::FormattingInfo;
pub use parser::{ParseOutput, PatternParser};

use crate::core::diagnostics;
use crate::core::log_event::LogEvent;
use std::fmt;

#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

pub const DEFAULT_CONVERSION_PATTERN: &str = "%m%n";
pub const TTCC_CONVERSION_PATTERN: &str = "%r [%t] %p %c %x - %m%n";

const BUF_SIZE: usize = 256;
const MAX_CAPACITY: usize = 1024;

/// Reusable render buffer.
///
/// Cleared between events; once it has grown past 1 KiB it is replaced by a
/// fresh 256-byte buffer so one huge message does not pin memory.
#[derive(Debug)]
pub struct FormatBuffer {
    buf: String,
}

impl Default for FormatBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatBuffer {
    pub fn new() -> Self {
        Self {
            buf: String::with_capacity(BUF_SIZE),
        }
    }

    pub fn reset(&mut self) {
        if self.buf.capacity() > MAX_CAPACITY {
            self.buf = String::with_capacity(BUF_SIZE);
        } else {
            self.buf.clear();
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}

/// Layout driven by a conversion pattern such as `%d [%t] %-5p %c - %m%n`
#[derive(Clone, PartialEq, Eq)]
pub struct PatternLayout {
    pattern: String,
    converters: Vec<PatternConverter>,
}

impl PatternLayout {
    /// Compile `pattern`. Problems in the pattern are reported to the
    /// diagnostics channel and the affected text is rendered literally.
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let ParseOutput { converters, errors } = PatternParser::new(&pattern).parse();
        for error in &errors {
            diagnostics::error_with(format!("Problem in conversion pattern \"{}\"", pattern), error);
        }
        Self {
            pattern,
            converters,
        }
    }

    pub fn conversion_pattern(&self) -> &str {
        &self.pattern
    }

    pub fn converters(&self) -> &[PatternConverter] {
        &self.converters
    }

    /// Render into `buffer`, returning the rendered text
    pub fn format_into<'b>(&self, event: &LogEvent, buffer: &'b mut FormatBuffer) -> &'b str {
        buffer.reset();
        for converter in &self.converters {
            converter.format(&mut buffer.buf, event);
        }
        buffer.as_str()
    }

    pub fn format(&self, event: &LogEvent) -> String {
        let mut buffer = FormatBuffer::new();
        self.format_into(event, &mut buffer);
        buffer.buf
    }
}

impl Default for PatternLayout {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERSION_PATTERN)
    }
}

impl fmt::Debug for PatternLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternLayout")
            .field("pattern", &self.pattern)
            .field("converters", &self.converters.len())
            .finish()
    }
}
