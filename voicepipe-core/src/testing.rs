//! Fake devices for exercising the session loops without real hardware.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::AudioError;
use crate::session::StopHandle;
use crate::traits::device::{CaptureDevice, OutputDevice};

pub fn temp_file_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("voicepipe_test_{}", name))
}

/// One scripted response from `ScriptedCaptureDevice::read`.
pub enum Step {
    Data(Vec<u8>),
    Empty,
    Fail(AudioError),
}

/// Capture device that plays back a fixed script of reads.
///
/// Once the script is exhausted it fires the armed `StopHandle` (simulating
/// the user pressing stop) and reports underruns until the loop exits.
pub struct ScriptedCaptureDevice {
    buffer_size: usize,
    script: Mutex<VecDeque<Step>>,
    stop_when_done: Arc<Mutex<Option<StopHandle>>>,
    stop_calls: Arc<AtomicUsize>,
    started: bool,
}

impl ScriptedCaptureDevice {
    pub fn new(buffer_size: usize, script: Vec<Step>) -> Self {
        Self {
            buffer_size,
            script: Mutex::new(script.into()),
            stop_when_done: Arc::new(Mutex::new(None)),
            stop_calls: Arc::new(AtomicUsize::new(0)),
            started: false,
        }
    }

    /// Cell to arm with the session's stop handle after `open`.
    pub fn stop_cell(&self) -> Arc<Mutex<Option<StopHandle>>> {
        Arc::clone(&self.stop_when_done)
    }

    /// Counter of `stop` calls, for asserting release-exactly-once.
    pub fn stop_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.stop_calls)
    }
}

impl CaptureDevice for ScriptedCaptureDevice {
    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.started = true;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, AudioError> {
        assert!(self.started, "read before start");
        match self.script.lock().pop_front() {
            Some(Step::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            Some(Step::Empty) => Ok(0),
            Some(Step::Fail(err)) => Err(err),
            None => {
                if let Some(handle) = self.stop_when_done.lock().as_ref() {
                    handle.request_stop();
                } else {
                    // Emulate a blocking device with nothing to deliver.
                    std::thread::sleep(std::time::Duration::from_millis(1));
                }
                Ok(0)
            }
        }
    }

    fn stop(&mut self) {
        self.stop_calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Output device that records every write it receives.
pub struct CollectingOutputDevice {
    buffer_size: usize,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_on_write: Option<usize>,
    gate: Option<std::sync::mpsc::Receiver<()>>,
    stop_calls: Arc<AtomicUsize>,
    started: bool,
}

impl CollectingOutputDevice {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            writes: Arc::new(Mutex::new(Vec::new())),
            fail_on_write: None,
            gate: None,
            stop_calls: Arc::new(AtomicUsize::new(0)),
            started: false,
        }
    }

    /// Fail the nth write (0-based) with `DeviceUnavailable`.
    pub fn fail_on_write(mut self, index: usize) -> Self {
        self.fail_on_write = Some(index);
        self
    }

    /// Block each write until the test sends a token, emulating a device
    /// that consumes data at its own pace.
    pub fn with_gate(mut self, gate: std::sync::mpsc::Receiver<()>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn writes(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.writes)
    }

    pub fn stop_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.stop_calls)
    }
}

impl OutputDevice for CollectingOutputDevice {
    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.started = true;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), AudioError> {
        assert!(self.started, "write before start");
        if let Some(gate) = &self.gate {
            gate.recv_timeout(std::time::Duration::from_secs(5))
                .map_err(|_| AudioError::DeviceUnavailable("gate closed".into()))?;
        }
        let mut writes = self.writes.lock();
        if self.fail_on_write == Some(writes.len()) {
            return Err(AudioError::DeviceUnavailable("output lost".into()));
        }
        writes.push(data.to_vec());
        Ok(())
    }

    fn stop(&mut self) {
        self.stop_calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}
