use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KitzurError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database not found at: {0}")]
    DatabaseNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid shortcut: {0}")]
    InvalidShortcut(String),
    #[error("You've reached your limit of {max} personal shortcuts")]
    QuotaExceeded { max: u32 },
    #[error("Not authenticated")]
    Unauthorized,
    #[error("Shortcut '{0}' not found")]
    NotFound(String),
    #[error("Shortcut '{0}' is a system shortcut and cannot be modified")]
    SystemShortcut(String),
    #[error("Shortcut '{0}' already exists")]
    DuplicateShortcut(String),
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Error: {0}")]
    Other(String),
}

impl KitzurError {
    /// Stable machine-readable code, used by the HTTP API envelope
    pub fn code(&self) -> &'static str {
        match self {
            KitzurError::Io(_) => "IO_ERROR",
            KitzurError::Json(_) => "JSON_ERROR",
            KitzurError::DatabaseNotFound(_) => "DATABASE_NOT_FOUND",
            KitzurError::InvalidConfig(_) => "INVALID_CONFIG",
            KitzurError::InvalidShortcut(_) => "INVALID_SHORTCUT",
            KitzurError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            KitzurError::Unauthorized => "UNAUTHORIZED",
            KitzurError::NotFound(_) => "NOT_FOUND",
            KitzurError::SystemShortcut(_) => "SYSTEM_SHORTCUT",
            KitzurError::DuplicateShortcut(_) => "DUPLICATE_SHORTCUT",
            KitzurError::Backend(_) => "BACKEND_ERROR",
            KitzurError::Other(_) => "ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, KitzurError>;
