use std::collections::VecDeque;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};

use voicepipe_core::{AudioError, OutputDevice, PcmFormat};

use crate::{chunk_bytes, s16le_to_f32};

/// Blocking output device over a cpal output stream.
///
/// `write` pushes a chunk into a small bounded channel and blocks when the
/// channel is full; the stream callback drains it at hardware rate. That
/// bound is the backpressure that paces the playback loop to real time.
pub struct CpalOutputDevice {
    format: PcmFormat,
    buffer_size: usize,
    data_tx: Option<Sender<Vec<u8>>>,
    drained_rx: Option<Receiver<()>>,
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalOutputDevice {
    /// Open the system default output endpoint at `format`.
    pub fn open(format: PcmFormat) -> Result<Self, AudioError> {
        format.validate()?;

        if cpal::default_host().default_output_device().is_none() {
            return Err(AudioError::DeviceUnavailable("no output device".into()));
        }

        Ok(Self {
            format,
            buffer_size: chunk_bytes(format),
            data_tx: None,
            drained_rx: None,
            stop_tx: None,
            thread: None,
        })
    }
}

impl OutputDevice for CpalOutputDevice {
    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn start(&mut self) -> Result<(), AudioError> {
        let (data_tx, data_rx) = bounded::<Vec<u8>>(4);
        let (drained_tx, drained_rx) = bounded::<()>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (ready_tx, ready_rx) = bounded::<Result<(), AudioError>>(1);

        let config = StreamConfig {
            channels: self.format.channels,
            sample_rate: SampleRate(self.format.sample_rate_hz),
            buffer_size: cpal::BufferSize::Default,
        };

        let thread = thread::Builder::new()
            .name("cpal-output".into())
            .spawn(move || {
                let device = match cpal::default_host().default_output_device() {
                    Some(d) => d,
                    None => {
                        let _ = ready_tx.send(Err(AudioError::DeviceUnavailable(
                            "no output device".into(),
                        )));
                        return;
                    }
                };

                let mut pending: VecDeque<u8> = VecDeque::new();
                let stream = device.build_output_stream(
                    &config,
                    move |output: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        fill_output(&mut pending, &data_rx, &drained_tx, output);
                    },
                    |err| log::error!("output stream error: {}", err),
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
                let _ = stop_rx.recv();
            })
            .map_err(|e| AudioError::Internal(format!("failed to spawn output thread: {}", e)))?;

        ready_rx
            .recv_timeout(Duration::from_secs(5))
            .map_err(|_| AudioError::DeviceUnavailable("output stream did not start".into()))??;

        self.data_tx = Some(data_tx);
        self.drained_rx = Some(drained_rx);
        self.stop_tx = Some(stop_tx);
        self.thread = Some(thread);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), AudioError> {
        if data.is_empty() {
            // An empty chunk is reserved as the drain sentinel.
            return Ok(());
        }
        let tx = self
            .data_tx
            .as_ref()
            .ok_or_else(|| AudioError::Internal("output device not started".into()))?;
        tx.send(data.to_vec())
            .map_err(|_| AudioError::DeviceUnavailable("output stream ended".into()))
    }

    fn stop(&mut self) {
        // Drain handshake: queue an empty sentinel chunk and wait for the
        // callback to reach it, which means every chunk ahead of it has been
        // decoded into the output buffer.
        if let Some(tx) = self.data_tx.take() {
            if tx.send(Vec::new()).is_ok() {
                if let Some(drained) = self.drained_rx.as_ref() {
                    let _ = drained.recv_timeout(Duration::from_secs(2));
                }
            }
        }
        self.drained_rx = None;
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for CpalOutputDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Fill one output slice from the pending bytes, pulling queued chunks off
/// the channel as needed and zero-filling when starved. An empty chunk is
/// the drain sentinel: consuming it acknowledges on `drained_tx` that all
/// audio queued ahead of it has been delivered.
fn fill_output(
    pending: &mut VecDeque<u8>,
    data_rx: &Receiver<Vec<u8>>,
    drained_tx: &Sender<()>,
    output: &mut [f32],
) {
    for sample in output.iter_mut() {
        while pending.len() < 2 {
            match data_rx.try_recv() {
                Ok(chunk) if chunk.is_empty() => {
                    let _ = drained_tx.try_send(());
                }
                Ok(chunk) => pending.extend(chunk),
                Err(_) => break,
            }
        }
        if pending.len() >= 2 {
            let lo = pending.pop_front().unwrap();
            let hi = pending.pop_front().unwrap();
            *sample = s16le_to_f32(lo, hi);
        } else {
            *sample = 0.0;
        }
    }
}

fn map_build_err(err: cpal::BuildStreamError) -> AudioError {
    match err {
        cpal::BuildStreamError::StreamConfigNotSupported => {
            AudioError::InvalidFormat("output stream config not supported".into())
        }
        other => AudioError::DeviceUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::f32_to_s16le;

    #[test]
    fn fill_decodes_queued_chunks_in_order() {
        let (data_tx, data_rx) = bounded::<Vec<u8>>(4);
        let (drained_tx, drained_rx) = bounded::<()>(1);
        let mut pending = VecDeque::new();

        data_tx.send(f32_to_s16le(&[0.5, -0.5])).unwrap();
        data_tx.send(f32_to_s16le(&[1.0])).unwrap();

        let mut output = [9.9f32; 4];
        fill_output(&mut pending, &data_rx, &drained_tx, &mut output);

        assert!((output[0] - 0.5).abs() < 1e-3);
        assert!((output[1] + 0.5).abs() < 1e-3);
        assert!((output[2] - 1.0).abs() < 1e-3);
        // Starved tail is silence, not leftover garbage.
        assert_eq!(output[3], 0.0);
        assert!(drained_rx.try_recv().is_err());
    }

    #[test]
    fn drain_sentinel_acks_only_after_queued_audio_is_consumed() {
        let (data_tx, data_rx) = bounded::<Vec<u8>>(4);
        let (drained_tx, drained_rx) = bounded::<()>(1);
        let mut pending = VecDeque::new();

        data_tx.send(f32_to_s16le(&[0.25, 0.25, 0.25])).unwrap();
        data_tx.send(Vec::new()).unwrap(); // sentinel

        // First callback consumes only part of the queued audio: no ack yet.
        let mut output = [0.0f32; 2];
        fill_output(&mut pending, &data_rx, &drained_tx, &mut output);
        assert!(drained_rx.try_recv().is_err());

        // Second callback exhausts the audio and reaches the sentinel.
        let mut output = [0.0f32; 2];
        fill_output(&mut pending, &data_rx, &drained_tx, &mut output);
        assert!(drained_rx.try_recv().is_ok());
        assert_eq!(output[1], 0.0);
    }
}
