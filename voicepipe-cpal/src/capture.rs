use std::collections::VecDeque;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use voicepipe_core::{AudioError, CaptureDevice, PcmFormat};

use crate::{chunk_bytes, f32_to_s16le};

/// Blocking capture device over a cpal input stream.
///
/// The stream is owned by a dedicated thread (cpal streams are `!Send`);
/// its callback converts samples to s16le and ships them over a bounded
/// channel that `read` drains. When the channel backs up, whole chunks are
/// dropped: the capture loop is expected to keep up, and a dropped chunk is
/// preferable to unbounded memory growth.
pub struct CpalCaptureDevice {
    format: PcmFormat,
    buffer_size: usize,
    chunks: Option<Receiver<Vec<u8>>>,
    pending: VecDeque<u8>,
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalCaptureDevice {
    /// Open the system default input endpoint at `format`.
    pub fn open(format: PcmFormat) -> Result<Self, AudioError> {
        format.validate()?;

        if cpal::default_host().default_input_device().is_none() {
            return Err(AudioError::DeviceUnavailable("no input device".into()));
        }

        Ok(Self {
            format,
            buffer_size: chunk_bytes(format),
            chunks: None,
            pending: VecDeque::new(),
            stop_tx: None,
            thread: None,
        })
    }
}

impl CaptureDevice for CpalCaptureDevice {
    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn start(&mut self) -> Result<(), AudioError> {
        let (chunk_tx, chunk_rx) = bounded::<Vec<u8>>(8);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (ready_tx, ready_rx) = bounded::<Result<(), AudioError>>(1);

        let config = StreamConfig {
            channels: self.format.channels,
            sample_rate: SampleRate(self.format.sample_rate_hz),
            buffer_size: cpal::BufferSize::Default,
        };

        let thread = thread::Builder::new()
            .name("cpal-capture".into())
            .spawn(move || {
                let device = match cpal::default_host().default_input_device() {
                    Some(d) => d,
                    None => {
                        let _ = ready_tx.send(Err(AudioError::DeviceUnavailable(
                            "no input device".into(),
                        )));
                        return;
                    }
                };

                let stream = device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if chunk_tx.try_send(f32_to_s16le(data)).is_err() {
                            log::warn!("capture bridge full, dropping {} samples", data.len());
                        }
                    },
                    |err| log::error!("capture stream error: {}", err),
                    None,
                );

                let stream = match stream.map_err(map_build_err) {
                    Ok(s) => s,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(AudioError::DeviceUnavailable(e.to_string())));
                    return;
                }

                let _ = ready_tx.send(Ok(()));
                // Hold the stream alive until stop; a closed channel means
                // the device was dropped without an explicit stop.
                let _ = stop_rx.recv();
            })
            .map_err(|e| AudioError::Internal(format!("failed to spawn capture thread: {}", e)))?;

        ready_rx
            .recv_timeout(Duration::from_secs(5))
            .map_err(|_| AudioError::DeviceUnavailable("capture stream did not start".into()))??;

        self.chunks = Some(chunk_rx);
        self.stop_tx = Some(stop_tx);
        self.thread = Some(thread);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, AudioError> {
        let chunks = self
            .chunks
            .as_ref()
            .ok_or_else(|| AudioError::Internal("capture device not started".into()))?;

        if self.pending.is_empty() {
            match chunks.recv_timeout(Duration::from_millis(100)) {
                Ok(chunk) => self.pending.extend(chunk),
                // Transient underrun; lets the caller observe its stop flag.
                Err(RecvTimeoutError::Timeout) => return Ok(0),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(AudioError::DeviceUnavailable("capture stream ended".into()))
                }
            }
        }
        while self.pending.len() < buf.len() {
            match chunks.try_recv() {
                Ok(chunk) => self.pending.extend(chunk),
                Err(_) => break,
            }
        }

        let n = buf.len().min(self.pending.len());
        for (dst, src) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn stop(&mut self) {
        // Dropping the sender unblocks the stream thread's recv.
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        self.chunks = None;
        self.pending.clear();
    }
}

impl Drop for CpalCaptureDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

fn map_build_err(err: cpal::BuildStreamError) -> AudioError {
    match err {
        cpal::BuildStreamError::StreamConfigNotSupported => {
            AudioError::InvalidFormat("input stream config not supported".into())
        }
        other => AudioError::DeviceUnavailable(other.to_string()),
    }
}
