//! Date-based rolling file appender
//!
//! Writes to a fixed base file and, once the configured date pattern would
//! render differently, renames it to `base + pattern(previous period)` and
//! starts a fresh base file. Rolled files beyond the retention count are
//! deleted oldest first.

use super::file::{FileOptions, LogFile};
use super::rolling_calendar::{Periodicity, RollingCalendar};
use crate::core::{diagnostics, Appender, ErrorHandler, LogEvent, LoggerError, Result};
use crate::layout::DatePattern;
use chrono::{DateTime, Duration, Local, NaiveDateTime, Weekday};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_DATE_PATTERN: &str = "'.'yyyy-MM-dd";
pub const DEFAULT_MAX_BACKUP_COUNT: usize = 60;

/// Source of the current time for rollover decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to; clones share the same time
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}

/// Rollover and retention settings
///
/// # Examples
///
/// ```
/// use rust_logger_hierarchy::appenders::RollingPolicy;
///
/// // Roll every hour, keep one day of history
/// let policy = RollingPolicy::new()
///     .with_date_pattern("'.'yyyy-MM-dd-HH")
///     .with_max_backup_count(24);
/// assert_eq!(policy.max_backup_count, 24);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingPolicy {
    /// Suffix appended to the base path of rolled files
    pub date_pattern: String,
    /// Number of rolled files kept
    pub max_backup_count: usize,
    /// Start of week for weekly patterns
    pub first_day_of_week: Weekday,
    pub append: bool,
    pub immediate_flush: bool,
    pub buffered_io: bool,
}

impl Default for RollingPolicy {
    fn default() -> Self {
        Self {
            date_pattern: DEFAULT_DATE_PATTERN.to_string(),
            max_backup_count: DEFAULT_MAX_BACKUP_COUNT,
            first_day_of_week: Weekday::Mon,
            append: true,
            immediate_flush: true,
            buffered_io: false,
        }
    }
}

impl RollingPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_date_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.date_pattern = pattern.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backup_count(mut self, count: usize) -> Self {
        self.max_backup_count = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_first_day_of_week(mut self, day: Weekday) -> Self {
        self.first_day_of_week = day;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.immediate_flush = immediate_flush;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_buffered_io(mut self, buffered_io: bool) -> Self {
        self.buffered_io = buffered_io;
        self
    }

    fn file_options(&self) -> FileOptions {
        FileOptions::new()
            .with_append(self.append)
            .with_immediate_flush(self.immediate_flush)
            .with_buffered_io(self.buffered_io)
    }
}

/// File appender that rolls over on date boundaries
///
/// # Examples
///
/// ```no_run
/// use rust_logger_hierarchy::appenders::{DailyRollingFileAppender, RollingPolicy};
/// use rust_logger_hierarchy::core::AppenderHandle;
/// use rust_logger_hierarchy::layout::PatternLayout;
///
/// let policy = RollingPolicy::new().with_max_backup_count(7);
/// let appender = DailyRollingFileAppender::with_policy("/var/log/app.log", policy).unwrap();
/// let handle = AppenderHandle::with_layout("daily", appender, PatternLayout::new("%d %p %c - %m%n"));
/// ```
pub struct DailyRollingFileAppender {
    base_path: PathBuf,
    base_file_name: String,
    date_pattern: DatePattern,
    calendar: RollingCalendar,
    max_backup_count: usize,
    file: LogFile,
    scheduled_path: PathBuf,
    next_check: DateTime<Local>,
    clock: Box<dyn Clock>,
}

impl DailyRollingFileAppender {
    /// Roll daily, keeping the default number of backups
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_policy(path, RollingPolicy::default())
    }

    pub fn with_policy(path: impl AsRef<Path>, policy: RollingPolicy) -> Result<Self> {
        Self::with_policy_and_clock(path, policy, SystemClock)
    }

    /// Create with an explicit clock
    ///
    /// # Errors
    ///
    /// Returns an error if the date pattern does not compile, the path has no
    /// file name, or the file cannot be opened.
    pub fn with_policy_and_clock<C: Clock + 'static>(
        path: impl AsRef<Path>,
        policy: RollingPolicy,
        clock: C,
    ) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        let base_file_name = base_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                LoggerError::config(
                    "DailyRollingFileAppender",
                    format!("'{}' has no usable file name", base_path.display()),
                )
            })?
            .to_string();

        let date_pattern = DatePattern::compile(&policy.date_pattern)?;
        let periodicity = match Periodicity::infer(&date_pattern, policy.first_day_of_week) {
            Some(periodicity) => periodicity,
            None => {
                diagnostics::warn(format!(
                    "Date pattern \"{}\" does not change over time; rolling over at midnight",
                    date_pattern
                ));
                Periodicity::TopOfDay
            }
        };
        diagnostics::debug(format!(
            "Appender for [{}] set to roll over {}.",
            base_path.display(),
            periodicity
        ));

        let existed = base_path.exists();
        let file = LogFile::open(&base_path, policy.file_options())?;

        let now = clock.now();
        let last_modified = if existed {
            fs::metadata(&base_path)
                .and_then(|m| m.modified())
                .map(DateTime::<Local>::from)
                .unwrap_or(now)
        } else {
            now
        };

        let mut appender = Self {
            base_path,
            base_file_name,
            date_pattern,
            calendar: RollingCalendar::new(periodicity, policy.first_day_of_week),
            max_backup_count: policy.max_backup_count,
            file,
            scheduled_path: PathBuf::new(),
            next_check: now - Duration::milliseconds(1),
            clock: Box::new(clock),
        };
        appender.scheduled_path = appender.dated_path(&last_modified);
        Ok(appender)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Name the current file will receive at the next rollover
    pub fn scheduled_path(&self) -> &Path {
        &self.scheduled_path
    }

    pub fn next_check(&self) -> DateTime<Local> {
        self.next_check
    }

    pub fn periodicity(&self) -> Periodicity {
        self.calendar.periodicity()
    }

    fn dated_path(&self, at: &DateTime<Local>) -> PathBuf {
        let mut path = OsString::from(self.base_path.as_os_str());
        path.push(self.date_pattern.format(at));
        PathBuf::from(path)
    }

    /// Move the base file to its scheduled name and start a new one.
    /// Individual failures go to `errors`; only a failure to reopen the base
    /// file is returned.
    fn roll_over(&mut self, now: &DateTime<Local>, errors: &dyn ErrorHandler) -> Result<()> {
        let dated = self.dated_path(now);
        if dated == self.scheduled_path {
            return Ok(());
        }

        if let Err(e) = self.file.close() {
            errors.error("Failed to close log file before rollover", Some(&e), None);
        }

        let target = std::mem::replace(&mut self.scheduled_path, dated);
        if target.exists() {
            if let Err(e) = fs::remove_file(&target) {
                let err = LoggerError::file_rotation(
                    target.display().to_string(),
                    format!("Failed to delete existing file: {}", e),
                );
                errors.error("Rollover could not clear its target", Some(&err), None);
            }
        }

        match fs::rename(&self.base_path, &target) {
            Ok(()) => diagnostics::debug(format!(
                "{} -> {}",
                self.base_path.display(),
                target.display()
            )),
            Err(e) => {
                let err = LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to rename to '{}': {}", target.display(), e),
                );
                errors.error("Rollover failed", Some(&err), None);
            }
        }

        self.prune_backups(errors);

        // append so a failed rename never truncates what was written
        self.file.reopen(true)
    }

    /// Delete rolled files beyond the retention count, oldest first.
    /// Files whose suffix does not parse with the date pattern are left alone.
    fn prune_backups(&self, errors: &dyn ErrorHandler) {
        let dir = match self.base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                let err = LoggerError::io_operation(
                    "list rolled files",
                    format!("Failed to read '{}'", dir.display()),
                    e,
                );
                errors.error("Retention scan failed", Some(&err), None);
                return;
            }
        };

        let mut backups: Vec<(NaiveDateTime, PathBuf)> = Vec::new();
        for entry in entries.flatten() {
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            let Some(suffix) = name
                .to_str()
                .and_then(|name| name.strip_prefix(self.base_file_name.as_str()))
            else {
                continue;
            };
            if suffix.is_empty() {
                continue;
            }
            match self.date_pattern.parse(suffix) {
                Ok(date) => backups.push((date, entry.path())),
                Err(e) => diagnostics::debug(format!("Skipping {:?}: {}", name, e)),
            }
        }

        if backups.len() <= self.max_backup_count {
            return;
        }
        backups.sort();
        let excess = backups.len() - self.max_backup_count;
        for (_, path) in backups.into_iter().take(excess) {
            if let Err(e) = fs::remove_file(&path) {
                let err = LoggerError::file_rotation(
                    path.display().to_string(),
                    format!("Failed to delete old backup: {}", e),
                );
                errors.error("Retention could not delete a file", Some(&err), None);
            }
        }
    }
}

impl Appender for DailyRollingFileAppender {
    fn append(&mut self, event: &LogEvent, formatted: Option<&str>, errors: &dyn ErrorHandler) -> Result<()> {
        let now = self.clock.now();
        if now >= self.next_check {
            self.next_check = self.calendar.next_boundary(&now);
            if let Err(e) = self.roll_over(&now, errors) {
                errors.error("rollOver() failed.", Some(&e), Some(event));
            }
        }
        self.file.write(formatted.unwrap_or(event.message.as_str()))
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush()
    }

    fn close(&mut self) -> Result<()> {
        self.file.close()
    }
}
