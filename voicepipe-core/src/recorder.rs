use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::controller::SessionController;
use crate::models::error::AudioError;
use crate::models::format::PcmFormat;
use crate::models::outcome::CaptureOutcome;
use crate::traits::delegate::SessionDelegate;
use crate::traits::device::DeviceProvider;

/// UI-facing facade over the controller: one fixed format, one fixed
/// recording file, and the three entry points a record/play screen needs.
///
/// A UI wires its record button to `toggle_record`, its play button to
/// `request_play`, and learns that playback ended through the delegate's
/// `on_playback_finished`.
pub struct VoiceRecorder<P: DeviceProvider> {
    controller: SessionController<P>,
    format: PcmFormat,
    path: PathBuf,
}

impl<P: DeviceProvider> VoiceRecorder<P> {
    pub fn new(provider: P, format: PcmFormat, path: PathBuf) -> Self {
        Self {
            controller: SessionController::new(provider),
            format,
            path,
        }
    }

    /// Recorder writing to the default file under the platform cache
    /// directory.
    pub fn with_default_path(provider: P, format: PcmFormat) -> Self {
        Self::new(provider, format, Self::default_recording_path())
    }

    pub fn default_recording_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voicepipe")
            .join("recording.pcm")
    }

    pub fn set_delegate(&self, delegate: Arc<dyn SessionDelegate>) {
        self.controller.set_delegate(delegate);
    }

    /// Start recording when idle; stop and return the outcome when
    /// recording. A failed start leaves the recorder idle.
    pub fn toggle_record(&self) -> Result<Option<CaptureOutcome>, AudioError> {
        if self.controller.is_recording() {
            self.controller.stop_capture()
        } else {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    AudioError::FileIo(format!("failed to create {}: {}", parent.display(), e))
                })?;
            }
            self.controller.start_capture(self.format, &self.path)?;
            Ok(None)
        }
    }

    /// Play back the current recording. Completion is delivered through the
    /// delegate; a second request while playing fails with `Busy`.
    pub fn request_play(&self) -> Result<(), AudioError> {
        self.controller.play(self.format, &self.path)
    }

    pub fn is_recording(&self) -> bool {
        self.controller.is_recording()
    }

    pub fn is_playing(&self) -> bool {
        self.controller.is_playing()
    }

    pub fn recording_path(&self) -> &Path {
        &self.path
    }

    /// Teardown hook for process shutdown; see
    /// [`SessionController::shutdown`].
    pub fn shutdown(&self) {
        self.controller.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{temp_file_path, CollectingOutputDevice, ScriptedCaptureDevice, Step};
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    struct QueueProvider {
        captures: Mutex<VecDeque<ScriptedCaptureDevice>>,
        outputs: Mutex<VecDeque<CollectingOutputDevice>>,
    }

    impl DeviceProvider for QueueProvider {
        type Capture = ScriptedCaptureDevice;
        type Output = CollectingOutputDevice;

        fn open_capture(&self, _format: PcmFormat) -> Result<Self::Capture, AudioError> {
            self.captures
                .lock()
                .pop_front()
                .ok_or_else(|| AudioError::DeviceUnavailable("no capture device".into()))
        }

        fn open_output(&self, _format: PcmFormat) -> Result<Self::Output, AudioError> {
            self.outputs
                .lock()
                .pop_front()
                .ok_or_else(|| AudioError::DeviceUnavailable("no output device".into()))
        }
    }

    #[test]
    fn toggle_starts_then_stops() {
        let path = temp_file_path("recorder_toggle.pcm");
        let provider = QueueProvider {
            captures: Mutex::new(
                vec![ScriptedCaptureDevice::new(256, vec![Step::Data(vec![3u8; 256])])].into(),
            ),
            outputs: Mutex::new(VecDeque::new()),
        };
        let recorder = VoiceRecorder::new(provider, PcmFormat::default(), path.clone());

        assert_eq!(recorder.toggle_record().unwrap(), None);
        assert!(recorder.is_recording());

        let outcome = recorder.toggle_record().unwrap().unwrap();
        assert!(!recorder.is_recording());
        assert_eq!(outcome.path, path);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn failed_start_leaves_recorder_idle() {
        let provider = QueueProvider {
            captures: Mutex::new(VecDeque::new()),
            outputs: Mutex::new(VecDeque::new()),
        };
        let recorder = VoiceRecorder::new(
            provider,
            PcmFormat::default(),
            temp_file_path("recorder_no_device.pcm"),
        );

        let err = recorder.toggle_record().unwrap_err();
        assert!(matches!(err, AudioError::DeviceUnavailable(_)));
        assert!(!recorder.is_recording());
    }

    #[test]
    fn play_missing_recording_is_file_not_found() {
        let missing = temp_file_path("recorder_missing.pcm");
        std::fs::remove_file(&missing).ok();
        let provider = QueueProvider {
            captures: Mutex::new(VecDeque::new()),
            outputs: Mutex::new(vec![CollectingOutputDevice::new(256)].into()),
        };
        let recorder = VoiceRecorder::new(provider, PcmFormat::default(), missing);

        let err = recorder.request_play().unwrap_err();
        assert!(matches!(err, AudioError::FileNotFound(_)));
        assert!(!recorder.is_playing());
    }
}
