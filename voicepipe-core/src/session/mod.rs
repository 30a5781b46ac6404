pub mod capture;
pub mod playback;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cross-thread stop/cancel signal for a session loop.
///
/// Cloneable and idempotent: requesting stop twice, or after the loop has
/// already exited, is a no-op. The loop observes the flag at the top of each
/// iteration, so stop latency is bounded by one buffer's worth of audio, not
/// instant.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
