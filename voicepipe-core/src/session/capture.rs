use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::AudioError;
use crate::models::format::PcmFormat;
use crate::models::outcome::CaptureOutcome;
use crate::models::state::CaptureState;
use crate::session::StopHandle;
use crate::traits::device::CaptureDevice;

/// Producer half of the pipeline: pulls fixed-size frames from a capture
/// device and appends them to a growing PCM file.
///
/// `open` acquires both resources up front (so failures are synchronous);
/// `run` consumes the session on a worker thread and guarantees the device
/// is released and the file flushed and closed exactly once, on every exit
/// path.
pub struct CaptureSession<D: CaptureDevice> {
    device: D,
    file: File,
    path: PathBuf,
    format: PcmFormat,
    buffer: Vec<u8>,
    stop: StopHandle,
    state: Arc<Mutex<CaptureState>>,
}

impl<D: CaptureDevice> CaptureSession<D> {
    /// Open a capture session writing to `path`.
    ///
    /// The destination is truncate-created here, before any hardware starts:
    /// a stale file from a previous recording is replaced, never appended to.
    pub fn open(device: D, format: PcmFormat, path: &Path) -> Result<Self, AudioError> {
        format.validate()?;

        let file = File::create(path)
            .map_err(|e| AudioError::FileIo(format!("failed to create {}: {}", path.display(), e)))?;

        let buffer = vec![0u8; device.buffer_size()];

        Ok(Self {
            device,
            file,
            path: path.to_path_buf(),
            format,
            buffer,
            stop: StopHandle::new(),
            state: Arc::new(Mutex::new(CaptureState::Idle)),
        })
    }

    /// Handle for requesting stop from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Shared view of the session state, readable from any thread.
    pub fn state_handle(&self) -> Arc<Mutex<CaptureState>> {
        Arc::clone(&self.state)
    }

    /// Run the producer loop to completion.
    ///
    /// Intended to execute on a dedicated worker so it never blocks the
    /// caller's control thread. Returns once a stop has been requested or a
    /// device read has failed; in both cases the file is flushed and closed
    /// and the device stopped before returning.
    pub fn run(mut self) -> Result<CaptureOutcome, AudioError> {
        log::info!("capture started: {} @ {} Hz", self.path.display(), self.format.sample_rate_hz);
        *self.state.lock() = CaptureState::Recording;

        let pumped = self.device.start().and_then(|()| self.pump());

        *self.state.lock() = CaptureState::Stopping;
        let flushed = self.file.flush();
        self.device.stop();
        *self.state.lock() = CaptureState::Stopped;

        let bytes_written = pumped?;
        flushed.map_err(|e| AudioError::FileIo(format!("flush failed: {}", e)))?;

        log::info!("capture stopped: {} bytes to {}", bytes_written, self.path.display());
        Ok(CaptureOutcome::new(self.path.clone(), bytes_written, self.format))
    }

    fn pump(&mut self) -> Result<u64, AudioError> {
        let mut total = 0u64;
        while !self.stop.is_requested() {
            let n = self.device.read(&mut self.buffer)?;
            if n == 0 {
                // Transient underrun, nothing to write.
                continue;
            }
            self.file
                .write_all(&self.buffer[..n])
                .map_err(|e| AudioError::FileIo(format!("write failed: {}", e)))?;
            total += n as u64;
        }
        Ok(total)
    }
}
