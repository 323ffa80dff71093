//! File appender implementation

use crate::core::{Appender, ErrorHandler, LogEvent, LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// How a log file is opened and written
///
/// # Examples
///
/// ```
/// use rust_logger_hierarchy::appenders::FileOptions;
///
/// let options = FileOptions::new()
///     .with_append(false)
///     .with_buffered_io(true);
/// assert!(!options.flushes_every_write());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOptions {
    /// Append to an existing file instead of truncating it
    pub append: bool,
    /// Flush after every event; ignored when `buffered_io` is set
    pub immediate_flush: bool,
    pub buffered_io: bool,
    pub buffer_size: usize,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            append: true,
            immediate_flush: true,
            buffered_io: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl FileOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
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

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn flushes_every_write(&self) -> bool {
        self.immediate_flush && !self.buffered_io
    }
}

/// An open log file. Shared by the plain and the rolling file appenders.
pub(crate) struct LogFile {
    path: PathBuf,
    options: FileOptions,
    writer: Option<BufWriter<File>>,
}

impl LogFile {
    pub(crate) fn open(path: &Path, options: FileOptions) -> Result<Self> {
        let writer = Self::open_writer(path, options.append, &options)?;
        Ok(Self {
            path: path.to_path_buf(),
            options,
            writer: Some(writer),
        })
    }

    fn open_writer(path: &Path, append: bool, options: &FileOptions) -> Result<BufWriter<File>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let mut open = OpenOptions::new();
        if append {
            open.create(true).append(true);
        } else {
            open.create(true).write(true).truncate(true);
        }
        let file = open.open(path).map_err(|e| {
            LoggerError::file_appender(path.display().to_string(), format!("Failed to open: {}", e))
        })?;

        let capacity = if options.buffered_io {
            options.buffer_size.max(1)
        } else {
            DEFAULT_BUFFER_SIZE
        };
        Ok(BufWriter::with_capacity(capacity, file))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Write `text`, reopening in append mode if an earlier reopen failed
    pub(crate) fn write(&mut self, text: &str) -> Result<()> {
        if self.writer.is_none() {
            self.reopen(true)?;
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))?;
        writer.write_all(text.as_bytes())?;
        if self.options.flushes_every_write() {
            writer.flush()?;
        }
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    /// Flush and release the file handle
    pub(crate) fn close(&mut self) -> Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.flush().map_err(|e| {
                LoggerError::io_operation(
                    "close log file",
                    format!("Failed to flush '{}'", self.path.display()),
                    e,
                )
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn reopen(&mut self, append: bool) -> Result<()> {
        self.close()?;
        self.writer = Some(Self::open_writer(&self.path, append, &self.options)?);
        Ok(())
    }
}

impl Drop for LogFile {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}

pub struct FileAppender {
    file: LogFile,
}

impl FileAppender {
    /// Open `path` for appending with immediate flush
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_options(path, FileOptions::default())
    }

    pub fn with_options(path: impl Into<PathBuf>, options: FileOptions) -> Result<Self> {
        let path = path.into();
        Ok(Self {
            file: LogFile::open(&path, options)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Appender for FileAppender {
    fn append(&mut self, event: &LogEvent, formatted: Option<&str>, _errors: &dyn ErrorHandler) -> Result<()> {
        self.file.write(formatted.unwrap_or(event.message.as_str()))
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush()
    }

    fn close(&mut self) -> Result<()> {
        self.file.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AppenderHandle, LogLevel};
    use crate::layout::PatternLayout;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_truncate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "old\n").unwrap();

        let appended = AppenderHandle::with_layout(
            "f",
            FileAppender::new(&path).unwrap(),
            PatternLayout::new("%m\n"),
        );
        appended.do_append(&LogEvent::new("f", LogLevel::Info, "new"));
        appended.close();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");

        let truncating = FileAppender::with_options(&path, FileOptions::new().with_append(false)).unwrap();
        drop(truncating);
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/app.log");
        let appender = FileAppender::new(&path).unwrap();
        assert_eq!(appender.path(), path.as_path());
        assert!(path.exists());
    }

    #[test]
    fn test_buffered_io_defers_writes_until_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("buffered.log");
        let handle = AppenderHandle::with_layout(
            "buffered",
            FileAppender::with_options(&path, FileOptions::new().with_buffered_io(true)).unwrap(),
            PatternLayout::new("%m\n"),
        );

        handle.do_append(&LogEvent::new("f", LogLevel::Info, "pending"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        handle.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "pending\n");
    }

    #[test]
    fn test_write_after_close_reopens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reopen.log");
        let mut file = LogFile::open(&path, FileOptions::default()).unwrap();
        file.write("a").unwrap();
        file.close().unwrap();
        assert!(!file.is_open());
        file.write("b").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "ab");
    }
}
