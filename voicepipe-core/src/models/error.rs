use thiserror::Error;

/// Errors that can occur while opening or running an audio session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("file I/O error: {0}")]
    FileIo(String),

    #[error("{0} session already active")]
    Busy(&'static str),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("internal error: {0}")]
    Internal(String),
}
