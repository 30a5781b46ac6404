use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::models::error::AudioError;
use crate::models::format::PcmFormat;
use crate::models::outcome::{CaptureOutcome, PlaybackOutcome};
use crate::session::capture::CaptureSession;
use crate::session::playback::PlaybackSession;
use crate::session::StopHandle;
use crate::traits::delegate::SessionDelegate;
use crate::traits::device::DeviceProvider;

/// An active session worker: the stop signal plus the thread running the
/// loop. The handle is the proof of teardown — joining it means the device
/// and file are released.
struct Worker<T> {
    stop: StopHandle,
    handle: JoinHandle<Result<T, AudioError>>,
}

impl<T> Worker<T> {
    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    fn join(self) -> Result<T, AudioError> {
        self.handle
            .join()
            .unwrap_or_else(|_| Err(AudioError::Internal("session worker panicked".into())))
    }
}

/// Serializes start/stop/play requests against the capture and playback
/// session lifecycles.
///
/// At most one capture and one playback session are active at a time; a
/// conflicting request fails with `Busy` and leaves the running session
/// untouched. A worker that has already exited (normal stop or mid-stream
/// failure) is reaped on the next start, so the slot returns to idle and a
/// retry is always possible.
///
/// Completion is signaled through the optional `SessionDelegate`, called
/// from the worker thread when a loop exits.
pub struct SessionController<P: DeviceProvider> {
    provider: P,
    delegate: Mutex<Option<Arc<dyn SessionDelegate>>>,
    capture: Mutex<Option<Worker<CaptureOutcome>>>,
    playback: Mutex<Option<Worker<PlaybackOutcome>>>,
}

impl<P: DeviceProvider> SessionController<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            delegate: Mutex::new(None),
            capture: Mutex::new(None),
            playback: Mutex::new(None),
        }
    }

    pub fn set_delegate(&self, delegate: Arc<dyn SessionDelegate>) {
        *self.delegate.lock() = Some(delegate);
    }

    /// Open a capture session to `path` and schedule its loop on a worker
    /// thread, returning immediately.
    ///
    /// Fails with `Busy` if a capture is already running; device and file
    /// open failures are returned synchronously.
    pub fn start_capture(&self, format: PcmFormat, path: &Path) -> Result<(), AudioError> {
        let mut slot = self.capture.lock();
        if let Some(active) = slot.as_ref() {
            if !active.is_finished() {
                return Err(AudioError::Busy("capture"));
            }
        }
        // Reap a worker that already exited so the slot is reusable.
        if let Some(done) = slot.take() {
            if let Err(e) = done.join() {
                log::debug!("reaped failed capture worker: {}", e);
            }
        }

        let device = self.provider.open_capture(format)?;
        let session = CaptureSession::open(device, format, path)?;
        let stop = session.stop_handle();
        let delegate = self.delegate.lock().clone();

        let handle = thread::Builder::new()
            .name("voicepipe-capture".into())
            .spawn(move || {
                let result = session.run();
                match &result {
                    Ok(outcome) => {
                        if let Some(d) = &delegate {
                            d.on_capture_finished(outcome);
                        }
                    }
                    Err(e) => {
                        log::error!("capture session failed: {}", e);
                        if let Some(d) = &delegate {
                            d.on_error(e);
                        }
                    }
                }
                result
            })
            .map_err(|e| AudioError::Internal(format!("failed to spawn capture worker: {}", e)))?;

        *slot = Some(Worker { stop, handle });
        Ok(())
    }

    /// Request stop and block until the capture worker has exited and its
    /// device and file are released.
    ///
    /// `Ok(None)` when no capture is active; a mid-stream failure the worker
    /// already hit is returned here as well as through the delegate.
    pub fn stop_capture(&self) -> Result<Option<CaptureOutcome>, AudioError> {
        let worker = self.capture.lock().take();
        let Some(worker) = worker else {
            return Ok(None);
        };
        worker.stop.request_stop();
        worker.join().map(Some)
    }

    /// Open a playback session on `path` and schedule its loop, returning
    /// immediately. Completion (end-of-file, cancellation, or failure) is
    /// delivered through the delegate.
    pub fn play(&self, format: PcmFormat, path: &Path) -> Result<(), AudioError> {
        let mut slot = self.playback.lock();
        if let Some(active) = slot.as_ref() {
            if !active.is_finished() {
                return Err(AudioError::Busy("playback"));
            }
        }
        if let Some(done) = slot.take() {
            if let Err(e) = done.join() {
                log::debug!("reaped failed playback worker: {}", e);
            }
        }

        let device = self.provider.open_output(format)?;
        let session = PlaybackSession::open(device, format, path)?;
        let stop = session.cancel_handle();
        let delegate = self.delegate.lock().clone();

        let handle = thread::Builder::new()
            .name("voicepipe-playback".into())
            .spawn(move || {
                let result = session.run();
                match &result {
                    Ok(outcome) => {
                        if let Some(d) = &delegate {
                            d.on_playback_finished(outcome);
                        }
                    }
                    Err(e) => {
                        log::error!("playback session failed: {}", e);
                        if let Some(d) = &delegate {
                            d.on_error(e);
                        }
                    }
                }
                result
            })
            .map_err(|e| AudioError::Internal(format!("failed to spawn playback worker: {}", e)))?;

        *slot = Some(Worker { stop, handle });
        Ok(())
    }

    /// Cancel an in-progress playback and block until the worker has exited.
    /// `Ok(None)` when no playback is active.
    pub fn cancel_playback(&self) -> Result<Option<PlaybackOutcome>, AudioError> {
        let worker = self.playback.lock().take();
        let Some(worker) = worker else {
            return Ok(None);
        };
        worker.stop.request_stop();
        worker.join().map(Some)
    }

    pub fn is_recording(&self) -> bool {
        self.capture.lock().as_ref().is_some_and(|w| !w.is_finished())
    }

    pub fn is_playing(&self) -> bool {
        self.playback.lock().as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Force-stop any active session and wait for its worker to exit.
    ///
    /// Safe to call at any time, including while a start request is in
    /// flight on another thread: starts hold the slot lock across open and
    /// spawn, so shutdown either runs before the session exists or sees the
    /// fully registered worker and joins it.
    pub fn shutdown(&self) {
        if let Err(e) = self.stop_capture() {
            log::warn!("capture teardown reported: {}", e);
        }
        if let Err(e) = self.cancel_playback() {
            log::warn!("playback teardown reported: {}", e);
        }
    }
}
