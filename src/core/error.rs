//! Error types for the logger hierarchy

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File appender error with path
    #[error("File appender error for '{path}': {message}")]
    FileAppenderError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Conversion pattern could not be compiled as written
    #[error("Invalid conversion pattern at position {position}: {message}")]
    PatternError { position: usize, message: String },

    /// Date pattern could not be compiled or applied
    #[error("Invalid date pattern '{pattern}': {message}")]
    DatePatternError { pattern: String, message: String },

    /// Appender used after close
    #[error("Attempted to append to closed appender named [{name}]")]
    AppenderClosed { name: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file appender error
    pub fn file_appender(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileAppenderError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a conversion pattern error
    pub fn pattern(position: usize, message: impl Into<String>) -> Self {
        LoggerError::PatternError {
            position,
            message: message.into(),
        }
    }

    /// Create a date pattern error
    pub fn date_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::DatePatternError {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn appender_closed(name: impl Into<String>) -> Self {
        LoggerError::AppenderClosed { name: name.into() }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("DailyRollingFileAppender", "Missing file option");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::file_appender("/var/log/app.log", "Permission denied");
        assert!(matches!(err, LoggerError::FileAppenderError { .. }));

        let err = LoggerError::pattern(4, "Unexpected char [q]");
        assert!(matches!(err, LoggerError::PatternError { position: 4, .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::file_rotation("/var/log/app.log", "Disk full");
        assert_eq!(
            err.to_string(),
            "File rotation failed for '/var/log/app.log': Disk full"
        );

        let err = LoggerError::date_pattern("yyyy-qq", "Illegal pattern character 'q'");
        assert_eq!(
            err.to_string(),
            "Invalid date pattern 'yyyy-qq': Illegal pattern character 'q'"
        );

        let err = LoggerError::appender_closed("file");
        assert_eq!(
            err.to_string(),
            "Attempted to append to closed appender named [file]"
        );
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("renaming log file", "cannot rename", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("renaming log file"));
        assert!(err.to_string().contains("cannot rename"));
    }
}
