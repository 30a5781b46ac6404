use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::AudioError;
use crate::models::format::PcmFormat;
use crate::models::outcome::PlaybackOutcome;
use crate::models::state::PlaybackState;
use crate::session::StopHandle;
use crate::traits::device::OutputDevice;

/// Consumer half of the pipeline: reads a PCM file in fixed-size chunks and
/// feeds them to an output device.
///
/// The device write is the suspension point; it blocks until the device has
/// queued the data, which paces the loop to real-time playback rate. A
/// zero-byte file read is end-of-file and ends the loop normally. The
/// session may also be cancelled from another thread via its `StopHandle`.
pub struct PlaybackSession<D: OutputDevice> {
    device: D,
    file: File,
    path: PathBuf,
    format: PcmFormat,
    buffer: Vec<u8>,
    cancel: StopHandle,
    state: Arc<Mutex<PlaybackState>>,
}

impl<D: OutputDevice> PlaybackSession<D> {
    /// Open a playback session reading from `path`.
    ///
    /// The file must contain raw s16le PCM in the same format it was
    /// recorded with; there is no header to check against.
    pub fn open(device: D, format: PcmFormat, path: &Path) -> Result<Self, AudioError> {
        format.validate()?;

        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AudioError::FileNotFound(path.display().to_string()),
            _ => AudioError::FileIo(format!("failed to open {}: {}", path.display(), e)),
        })?;

        let buffer = vec![0u8; device.buffer_size()];

        Ok(Self {
            device,
            file,
            path: path.to_path_buf(),
            format,
            buffer,
            cancel: StopHandle::new(),
            state: Arc::new(Mutex::new(PlaybackState::Idle)),
        })
    }

    /// Handle for cancelling playback from another thread. Same idempotency
    /// contract as a capture stop request.
    pub fn cancel_handle(&self) -> StopHandle {
        self.cancel.clone()
    }

    /// Shared view of the session state, readable from any thread.
    pub fn state_handle(&self) -> Arc<Mutex<PlaybackState>> {
        Arc::clone(&self.state)
    }

    /// Run the consumer loop to end-of-file or cancellation.
    ///
    /// On every exit path, including a mid-stream read or write failure, the
    /// device is stopped and released and the file closed exactly once.
    pub fn run(mut self) -> Result<PlaybackOutcome, AudioError> {
        log::info!("playback started: {}", self.path.display());
        *self.state.lock() = PlaybackState::Playing;

        let pumped = self.device.start().and_then(|()| self.pump());

        self.device.stop();
        *self.state.lock() = PlaybackState::Stopped;

        let (bytes_played, completed) = pumped?;
        log::info!(
            "playback {}: {} bytes from {}",
            if completed { "finished" } else { "cancelled" },
            bytes_played,
            self.path.display()
        );
        Ok(PlaybackOutcome::new(self.path.clone(), bytes_played, self.format, completed))
    }

    fn pump(&mut self) -> Result<(u64, bool), AudioError> {
        let mut total = 0u64;
        loop {
            if self.cancel.is_requested() {
                return Ok((total, false));
            }
            let n = self
                .file
                .read(&mut self.buffer)
                .map_err(|e| AudioError::FileIo(format!("read failed: {}", e)))?;
            if n == 0 {
                // End of file.
                return Ok((total, true));
            }
            // A short final read is written in full, never padded.
            self.device.write(&self.buffer[..n])?;
            total += n as u64;
        }
    }
}
