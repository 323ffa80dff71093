//! Console appender implementation

use crate::core::{Appender, ErrorHandler, LogEvent, LoggerError, Result};
#[cfg(feature = "console")]
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

/// Console stream an appender writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

impl FromStr for ConsoleTarget {
    type Err = LoggerError;

    /// Accepts `System.out` / `System.err` as well as `stdout` / `stderr`
    fn from_str(s: &str) -> Result<Self> {
        let target = s.trim();
        if target.eq_ignore_ascii_case("System.out") || target.eq_ignore_ascii_case("stdout") {
            Ok(ConsoleTarget::Stdout)
        } else if target.eq_ignore_ascii_case("System.err") || target.eq_ignore_ascii_case("stderr") {
            Ok(ConsoleTarget::Stderr)
        } else {
            Err(LoggerError::config(
                "ConsoleAppender",
                format!("[{}] should be System.out or System.err", s),
            ))
        }
    }
}

impl fmt::Display for ConsoleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleTarget::Stdout => f.write_str("System.out"),
            ConsoleTarget::Stderr => f.write_str("System.err"),
        }
    }
}

pub struct ConsoleAppender {
    target: ConsoleTarget,
    use_colors: bool,
    immediate_flush: bool,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            target: ConsoleTarget::Stdout,
            use_colors: false,
            immediate_flush: true,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: ConsoleTarget) -> Self {
        self.target = target;
        self
    }

    /// Color each line by level. Has no effect without the `console` feature.
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    #[must_use]
    pub fn with_immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.immediate_flush = immediate_flush;
        self
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }

    fn write_text(&self, text: &str) -> io::Result<()> {
        match self.target {
            ConsoleTarget::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(text.as_bytes())?;
                if self.immediate_flush {
                    out.flush()?;
                }
            }
            ConsoleTarget::Stderr => {
                let mut out = io::stderr().lock();
                out.write_all(text.as_bytes())?;
                if self.immediate_flush {
                    out.flush()?;
                }
            }
        }
        Ok(())
    }
}

impl ConsoleAppender {
    #[cfg(feature = "console")]
    fn colorize<'t>(&self, event: &LogEvent, text: &'t str) -> Cow<'t, str> {
        if !self.use_colors {
            return Cow::Borrowed(text);
        }
        // keep the line terminator outside the escape codes
        let body = text.trim_end_matches(['\r', '\n']);
        Cow::Owned(format!(
            "{}{}",
            body.color(event.level.color_code()),
            &text[body.len()..]
        ))
    }

    #[cfg(not(feature = "console"))]
    fn colorize<'t>(&self, _event: &LogEvent, text: &'t str) -> Cow<'t, str> {
        Cow::Borrowed(text)
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, event: &LogEvent, formatted: Option<&str>, _errors: &dyn ErrorHandler) -> Result<()> {
        let text = formatted.unwrap_or(event.message.as_str());
        let text = self.colorize(event, text);
        self.write_text(&text)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.target {
            ConsoleTarget::Stdout => io::stdout().flush()?,
            ConsoleTarget::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }

    /// The process streams stay open; closing only flushes.
    fn close(&mut self) -> Result<()> {
        self.flush()
    }
}
