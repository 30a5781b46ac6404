use crate::models::error::AudioError;
use crate::models::outcome::{CaptureOutcome, PlaybackOutcome};

/// Event delegate for session completion notifications.
///
/// All methods are called from a session worker thread, not the thread that
/// started the session. Implementations should marshal to the UI thread if
/// needed.
pub trait SessionDelegate: Send + Sync {
    /// Called when a capture loop exits cleanly and the file is closed.
    fn on_capture_finished(&self, outcome: &CaptureOutcome);

    /// Called when a playback loop exits cleanly, whether it reached
    /// end-of-file or was cancelled. Lets a UI clear its "playing" state
    /// without polling.
    fn on_playback_finished(&self, outcome: &PlaybackOutcome);

    /// Called when a running session fails mid-stream. The controller has
    /// already returned to idle, so a retry is possible immediately.
    fn on_error(&self, error: &AudioError);
}
