//! # voicepipe-core
//!
//! Platform-agnostic PCM capture/playback core.
//!
//! Captures microphone audio into a headerless raw PCM file and plays such a
//! file back through an output device. Platform backends (cpal via
//! `voicepipe-cpal`, or anything else) implement the `CaptureDevice` /
//! `OutputDevice` traits and plug in through a `DeviceProvider`.
//!
//! ## Architecture
//!
//! ```text
//! voicepipe-core (this crate)
//! ├── traits/      ← CaptureDevice, OutputDevice, DeviceProvider, SessionDelegate
//! ├── models/      ← AudioError, PcmFormat, session states, outcomes
//! ├── session/     ← CaptureSession (producer loop), PlaybackSession (consumer loop)
//! ├── controller   ← SessionController (one active session per kind, Busy on conflict)
//! └── recorder     ← VoiceRecorder (UI-facing toggle/play facade)
//! ```
//!
//! Each running session owns its device and file exclusively and executes on
//! a dedicated worker thread; the only shared state is a stop flag and the
//! controller's session slot. The recorded file carries no header, so the
//! same `PcmFormat` must be passed to capture and to playback.

pub mod controller;
pub mod models;
pub mod recorder;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use controller::SessionController;
pub use models::error::AudioError;
pub use models::format::PcmFormat;
pub use models::outcome::{CaptureOutcome, PlaybackOutcome};
pub use models::state::{CaptureState, PlaybackState};
pub use recorder::VoiceRecorder;
pub use session::capture::CaptureSession;
pub use session::playback::PlaybackSession;
pub use session::StopHandle;
pub use traits::delegate::SessionDelegate;
pub use traits::device::{CaptureDevice, DeviceProvider, OutputDevice};
