use thiserror::Error;

use crate::config::Level;

/// Broad error categories, used by front ends to pick exit codes and
/// HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown template, unsupported level, unusable configuration file.
    Configuration,
    /// Malformed caller input (score, level, missing field).
    Validation,
    /// A referenced session does not exist.
    NotFound,
    /// Filesystem, serialization or rendering failure.
    Internal,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("unsupported level '{level}' for template '{template}'")]
    UnsupportedLevel { template: String, level: Level },

    #[error("invalid level '{0}', expected one of: junior, middle, senior")]
    InvalidLevel(String),

    #[error("invalid mode '{0}', expected one of: simulation, direct")]
    InvalidMode(String),

    #[error("invalid score {0}: must be a finite number between 0 and 10")]
    InvalidScore(f64),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("prompt error: {0}")]
    Prompt(#[from] mockprep_pm::PmError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTemplate(_) | Self::UnsupportedLevel { .. } | Self::Config(_) => {
                ErrorKind::Configuration
            }
            Self::InvalidLevel(_)
            | Self::InvalidMode(_)
            | Self::InvalidScore(_)
            | Self::Validation(_) => ErrorKind::Validation,
            Self::SessionNotFound(_) => ErrorKind::NotFound,
            Self::Prompt(_) | Self::Io(_) | Self::Json(_) => ErrorKind::Internal,
        }
    }
}
