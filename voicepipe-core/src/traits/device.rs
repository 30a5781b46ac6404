use crate::models::error::AudioError;
use crate::models::format::PcmFormat;

/// Interface for a platform microphone input stream.
///
/// Implemented by `CpalCaptureDevice` in `voicepipe-cpal`; test code supplies
/// scripted fakes. The device is exclusively owned by the capture loop for
/// the session's lifetime.
pub trait CaptureDevice: Send {
    /// Byte size of one device read, queried at open time. Session buffers
    /// are sized to this and reused across iterations.
    fn buffer_size(&self) -> usize;

    /// Start delivering audio. Called once, before the first `read`.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Blocking read of up to `buf.len()` bytes of interleaved s16le PCM.
    ///
    /// Returns the number of bytes read. `Ok(0)` is a transient underrun and
    /// the caller retries; `Err` means the device is gone and the loop must
    /// end. Implementations should return within roughly one buffer's worth
    /// of time so a stop request is observed promptly.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, AudioError>;

    /// Stop the stream and release the device. Idempotent; called on every
    /// loop exit path.
    fn stop(&mut self);
}

/// Interface for a platform audio output stream.
///
/// `write` provides the pacing for playback: it blocks until the device has
/// queued the data, so the consumer loop naturally runs at real-time rate.
pub trait OutputDevice: Send {
    /// Byte size of one device write, queried at open time.
    fn buffer_size(&self) -> usize;

    /// Start the output stream. Called once, before the first `write`.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Blocking write of interleaved s16le PCM. A short final chunk is
    /// written in full, never padded.
    fn write(&mut self, data: &[u8]) -> Result<(), AudioError>;

    /// Stop the stream and release the device. Idempotent.
    fn stop(&mut self);
}

/// Factory for platform devices at a given format.
///
/// Open failures surface as `DeviceUnavailable` (including a platform-level
/// permission refusal, which callers are expected to have cleared before
/// starting a capture) or `InvalidFormat` when the hardware cannot run at
/// the requested rate/channel combination.
pub trait DeviceProvider: Send + Sync + 'static {
    type Capture: CaptureDevice + 'static;
    type Output: OutputDevice + 'static;

    fn open_capture(&self, format: PcmFormat) -> Result<Self::Capture, AudioError>;

    fn open_output(&self, format: PcmFormat) -> Result<Self::Output, AudioError>;
}
