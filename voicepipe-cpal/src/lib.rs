//! # voicepipe-cpal
//!
//! cpal-backed devices for `voicepipe-core`.
//!
//! cpal streams are callback-driven and `!Send`, so each device spawns a
//! dedicated thread that owns the stream and bridges it to the core's
//! blocking `read`/`write` contract over bounded crossbeam channels. The
//! channel bound is what gives playback its backpressure pacing.
//!
//! cpal does not distinguish a permission refusal from a missing device;
//! both surface as `DeviceUnavailable`.

mod capture;
mod output;

pub use capture::CpalCaptureDevice;
pub use output::CpalOutputDevice;

use voicepipe_core::{AudioError, DeviceProvider, PcmFormat};

/// Bytes of PCM per bridged chunk: 100ms of audio, rounded down to a whole
/// frame, at least one frame.
pub(crate) fn chunk_bytes(format: PcmFormat) -> usize {
    let frame = format.frame_bytes();
    let raw = format.bytes_per_second() / 10;
    (raw / frame).max(1) * frame
}

pub(crate) fn f32_to_s16le(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

pub(crate) fn s16le_to_f32(lo: u8, hi: u8) -> f32 {
    i16::from_le_bytes([lo, hi]) as f32 / -(i16::MIN as f32)
}

/// Device factory for the system default input and output endpoints.
pub struct CpalProvider;

impl DeviceProvider for CpalProvider {
    type Capture = CpalCaptureDevice;
    type Output = CpalOutputDevice;

    fn open_capture(&self, format: PcmFormat) -> Result<Self::Capture, AudioError> {
        CpalCaptureDevice::open(format)
    }

    fn open_output(&self, format: PcmFormat) -> Result<Self::Output, AudioError> {
        CpalOutputDevice::open(format)
    }
}
