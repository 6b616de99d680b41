/// Centralized error types for the session clock
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClockError {
    // Session Definition Errors
    #[error("Invalid session '{name}': {reason}")]
    InvalidSession { name: String, reason: String },

    #[error("Duplicate session: {0}")]
    DuplicateSession(String),

    #[error("Invalid closure window: {0}")]
    InvalidClosureWindow(String),

    #[error("Invalid local time: {0}")]
    InvalidLocalTime(String),

    // Configuration Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Config parse failed: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // File I/O Errors
    #[error("File I/O error: {0}")]
    FileError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClockError>;

impl ClockError {
    /// Configuration problems are caught at startup and never during evaluation
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClockError::InvalidSession { .. }
                | ClockError::DuplicateSession(_)
                | ClockError::InvalidClosureWindow(_)
                | ClockError::ConfigError(_)
                | ClockError::UnknownTimezone(_)
                | ClockError::ConfigParse(_)
        )
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &str {
        match self {
            ClockError::InvalidSession { .. } => "SESS_001",
            ClockError::DuplicateSession(_) => "SESS_002",
            ClockError::InvalidClosureWindow(_) => "SESS_003",
            ClockError::InvalidLocalTime(_) => "TIME_001",
            ClockError::ConfigError(_) => "CFG_001",
            ClockError::UnknownTimezone(_) => "CFG_002",
            ClockError::ConfigParse(_) => "CFG_003",
            ClockError::FileError(_) => "FILE_001",
        }
    }
}
