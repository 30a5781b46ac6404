use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::format::PcmFormat;

/// Result returned when a capture session's loop exits cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureOutcome {
    pub path: PathBuf,
    pub bytes_written: u64,
    /// Recorded duration, derived from the byte count and format.
    pub duration_secs: f64,
    pub format: PcmFormat,
    /// RFC 3339 timestamp of when the recording finished.
    pub created_at: String,
}

impl CaptureOutcome {
    pub fn new(path: PathBuf, bytes_written: u64, format: PcmFormat) -> Self {
        Self {
            path,
            bytes_written,
            duration_secs: format.duration_secs(bytes_written),
            format,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Result returned when a playback session's loop exits cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackOutcome {
    pub path: PathBuf,
    pub bytes_played: u64,
    pub duration_secs: f64,
    pub format: PcmFormat,
    /// True when playback reached end-of-file, false when it was cancelled.
    pub completed: bool,
}

impl PlaybackOutcome {
    pub fn new(path: PathBuf, bytes_played: u64, format: PcmFormat, completed: bool) -> Self {
        Self {
            path,
            bytes_played,
            duration_secs: format.duration_secs(bytes_played),
            format,
            completed,
        }
    }
}
