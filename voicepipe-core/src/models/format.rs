use serde::{Deserialize, Serialize};

use super::error::AudioError;

/// PCM stream format shared by capture and playback.
///
/// The recording file is headerless, so the format is never recoverable from
/// the file itself. Whoever plays a file back must pass the same format that
/// was used to record it.
///
/// Samples are always interleaved signed 16-bit little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    /// Sample rate in Hz.
    pub sample_rate_hz: u32,

    /// Channel count (1 = mono, 2 = stereo interleaved).
    pub channels: u16,

    /// Bit depth. Only 16 is supported.
    pub bits_per_sample: u16,
}

impl PcmFormat {
    pub fn new(sample_rate_hz: u32, channels: u16) -> Self {
        Self {
            sample_rate_hz,
            channels,
            bits_per_sample: 16,
        }
    }

    pub fn validate(&self) -> Result<(), AudioError> {
        if self.sample_rate_hz == 0 {
            return Err(AudioError::InvalidFormat("sample rate must be positive".into()));
        }
        if ![1, 2].contains(&self.channels) {
            return Err(AudioError::InvalidFormat(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }
        if self.bits_per_sample != 16 {
            return Err(AudioError::InvalidFormat(format!(
                "unsupported bit depth: {}",
                self.bits_per_sample
            )));
        }
        Ok(())
    }

    /// Bytes per interleaved frame (one sample per channel).
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    /// Bytes of PCM data per second of audio.
    pub fn bytes_per_second(&self) -> usize {
        self.sample_rate_hz as usize * self.frame_bytes()
    }

    /// Duration in seconds of `byte_len` bytes of PCM at this format.
    pub fn duration_secs(&self, byte_len: u64) -> f64 {
        byte_len as f64 / self.bytes_per_second() as f64
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::new(44_100, 1)
    }
}
