//! Microphone capture via cpal.
//!
//! The driver owns the input stream lifecycle. Each hardware callback
//! transforms its block synchronously and hands the frame off with a
//! non-blocking send; the callback itself never blocks and never lets a
//! failure propagate back into cpal.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, StreamConfig};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::transform::{transform, AudioBlock, TARGET_SAMPLE_RATE};
use super::{AudioError, Result};
use crate::platform::PlatformTuning;
use crate::session::SessionState;
use crate::transport::FrameSender;

pub struct CaptureDriver {
    stream: Option<Stream>,
    state: Arc<SessionState>,
    active_rate: u32,
}

impl CaptureDriver {
    /// Opens a mono input stream, attempting `preferred_rate` first and
    /// then the standard fallbacks. The first rate the OS accepts becomes
    /// the active source rate; if every candidate is refused the open
    /// fails.
    pub fn open(
        device: &Device,
        preferred_rate: u32,
        tuning: &PlatformTuning,
        state: Arc<SessionState>,
        frames: FrameSender,
    ) -> Result<Self> {
        let sample_format = device
            .default_input_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?
            .sample_format();

        let rates = fallback_rates(preferred_rate);
        for &rate in &rates {
            let config = StreamConfig {
                channels: 1,
                sample_rate: SampleRate(rate),
                buffer_size: cpal::BufferSize::Fixed(tuning.frames_per_buffer),
            };

            debug!(rate, "attempting to open input stream");
            match build_stream(device, &config, sample_format, state.clone(), frames.clone()) {
                Ok(stream) => {
                    if rate != preferred_rate {
                        info!(rate, "opened input stream at fallback rate");
                    } else {
                        info!(rate, "opened input stream");
                    }
                    return Ok(Self {
                        stream: Some(stream),
                        state,
                        active_rate: rate,
                    });
                }
                Err(e) => warn!(rate, error = %e, "input stream refused"),
            }
        }

        Err(AudioError::AllRatesFailed(rates))
    }

    /// The sample rate the OS actually granted.
    pub fn active_rate(&self) -> u32 {
        self.active_rate
    }

    pub fn start(&mut self) -> Result<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| AudioError::StreamPlay("stream already closed".to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))?;
        self.state.set_recording(true);

        info!(rate = self.active_rate, "microphone capture started");
        Ok(())
    }

    /// Halts the stream and releases the device. Idempotent: stopping an
    /// already-stopped driver is a no-op.
    pub fn stop(&mut self) {
        if self.stream.is_none() {
            return;
        }

        self.state.set_recording(false);
        self.stream.take();
        info!("microphone capture stopped");
    }
}

impl Drop for CaptureDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Candidate open order: the selected rate first, then the standard rates.
fn fallback_rates(preferred: u32) -> Vec<u32> {
    let mut rates = vec![preferred];
    for rate in [44100, 48000, 16000] {
        if !rates.contains(&rate) {
            rates.push(rate);
        }
    }
    rates
}

fn build_stream(
    device: &Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    state: Arc<SessionState>,
    frames: FrameSender,
) -> Result<Stream> {
    let source_rate = config.sample_rate.0;
    let err_callback = |err: cpal::StreamError| {
        warn!(error = %err, "audio stream error");
    };

    let stream = match sample_format {
        SampleFormat::I16 => device
            .build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if !state.should_forward() {
                        return;
                    }
                    forward_block(data.to_vec(), source_rate, &state, &frames);
                },
                err_callback,
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?,
        SampleFormat::F32 => device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !state.should_forward() {
                        return;
                    }
                    let samples = data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect();
                    forward_block(samples, source_rate, &state, &frames);
                },
                err_callback,
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?,
        other => return Err(AudioError::UnsupportedFormat(format!("{other:?}"))),
    };

    Ok(stream)
}

/// Runs on the cpal callback thread. Blocks captured outside the
/// connected-and-recording window are dropped silently; a full transport
/// backlog drops the frame rather than waiting.
fn forward_block(samples: Vec<i16>, source_rate: u32, state: &SessionState, frames: &FrameSender) {
    if !state.should_forward() {
        return;
    }

    let block = AudioBlock {
        samples,
        sample_rate: source_rate,
    };
    let frame = transform(&block, TARGET_SAMPLE_RATE);

    if !frames.send(frame) {
        warn!("transport backlog full, dropping audio frame");
    }
}
