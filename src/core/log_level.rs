//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Totally ordered logging level.
///
/// Declaration order matches [`LogLevel::rank`], so the derived `Ord` and a
/// rank comparison always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Default)]
pub enum LogLevel {
    All,
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Off,
}

impl LogLevel {
    pub const ALL_LEVELS: [LogLevel; 8] = [
        LogLevel::All,
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
        LogLevel::Off,
    ];

    /// Integer rank used for threshold comparisons
    #[must_use]
    pub const fn rank(&self) -> i32 {
        match self {
            LogLevel::All => i32::MIN,
            LogLevel::Trace => 5_000,
            LogLevel::Debug => 10_000,
            LogLevel::Info => 20_000,
            LogLevel::Warn => 30_000,
            LogLevel::Error => 40_000,
            LogLevel::Fatal => 50_000,
            LogLevel::Off => i32::MAX,
        }
    }

    /// `true` when an event at `self` passes a floor of `floor`
    #[inline]
    #[must_use]
    pub fn is_greater_or_equal(&self, floor: LogLevel) -> bool {
        self.rank() >= floor.rank()
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::All => "ALL",
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
            LogLevel::Off => "OFF",
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::All | LogLevel::Trace => BrightBlack,
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Fatal | LogLevel::Off => BrightRed,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Ok(LogLevel::All),
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            "OFF" => Ok(LogLevel::Off),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// A level token as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelSpec {
    /// Revert to the inherited level (`INHERITED` or `NULL`)
    Inherited,
    Level(LogLevel),
    /// `<level>#<class>`; custom level classes cannot be loaded, so only
    /// the level part is honored
    Custom { level: LogLevel, class_name: String },
}

impl LevelSpec {
    /// The level to assign, `None` meaning inherited
    #[must_use]
    pub fn level(&self) -> Option<LogLevel> {
        match self {
            LevelSpec::Inherited => None,
            LevelSpec::Level(level) | LevelSpec::Custom { level, .. } => Some(*level),
        }
    }
}

impl FromStr for LevelSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.eq_ignore_ascii_case("INHERITED") || token.eq_ignore_ascii_case("NULL") {
            return Ok(LevelSpec::Inherited);
        }
        match token.split_once('#') {
            Some((level, class_name)) => Ok(LevelSpec::Custom {
                level: level.parse()?,
                class_name: class_name.trim().to_string(),
            }),
            None => token.parse().map(LevelSpec::Level),
        }
    }
}
