//! Default-input-device capture via cpal.
//!
//! When compiled with the `microphone` feature, opens a mono i16 input
//! stream for the requested duration. Without the feature every recording
//! fails with an audio error.

use sleepcoach_core::error::CoachError;

use crate::{frame_count, AudioCapture, AudioClip};

/// Records from the system's default input device.
#[derive(Debug, Clone, Default)]
pub struct MicrophoneCapture;

impl MicrophoneCapture {
    pub fn new() -> Self {
        Self
    }

    /// Whether this build can actually capture audio.
    pub fn is_available(&self) -> bool {
        cfg!(feature = "microphone")
    }
}

// ---------------------------------------------------------------------------
// Real implementation (microphone feature enabled)
// ---------------------------------------------------------------------------

#[cfg(feature = "microphone")]
impl AudioCapture for MicrophoneCapture {
    async fn record(&self, duration_secs: u32, sample_rate: u32) -> Result<AudioClip, CoachError> {
        let frames = frame_count(duration_secs, sample_rate)?;
        tracing::info!(duration_secs, sample_rate, "Recording...");

        // cpal streams are !Send, so the whole stream lives on a blocking thread.
        let samples = tokio::task::spawn_blocking(move || {
            record_blocking(duration_secs, sample_rate, frames)
        })
        .await
        .map_err(|e| CoachError::Audio(format!("Recording task failed: {e}")))??;

        tracing::info!(samples = samples.len(), "Recording finished");
        Ok(AudioClip::new(samples, sample_rate))
    }
}

#[cfg(feature = "microphone")]
fn record_blocking(
    duration_secs: u32,
    target_rate: u32,
    frames: usize,
) -> Result<Vec<i16>, CoachError> {
    use std::sync::{Arc, Mutex};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| CoachError::Audio("No default input device".to_string()))?;
    let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

    // Capture in whatever the device prefers; conversion happens afterwards.
    let supported = device
        .default_input_config()
        .map_err(|e| CoachError::Audio(format!("Failed to query input config: {e}")))?;
    let format = supported.sample_format();
    let config = supported.config();
    let device_rate = config.sample_rate.0;
    let device_channels = config.channels;

    tracing::info!(
        device = %device_name,
        device_rate,
        device_channels,
        format = ?format,
        target_rate,
        "Using device's default config"
    );

    let raw = Arc::new(Mutex::new(Vec::<f32>::new()));
    let on_error = |err: cpal::StreamError| tracing::warn!(error = %err, "Microphone stream error");

    let stream = match format {
        cpal::SampleFormat::I16 => {
            let sink = Arc::clone(&raw);
            device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = sink.lock() {
                        buf.extend(data.iter().map(|&s| f32::from(s) / 32_768.0));
                    }
                },
                on_error,
                None,
            )
        }
        cpal::SampleFormat::U16 => {
            let sink = Arc::clone(&raw);
            device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = sink.lock() {
                        buf.extend(data.iter().map(|&s| (f32::from(s) - 32_768.0) / 32_768.0));
                    }
                },
                on_error,
                None,
            )
        }
        _ => {
            let sink = Arc::clone(&raw);
            device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = sink.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                on_error,
                None,
            )
        }
    }
    .map_err(|e| CoachError::Audio(format!("Failed to open input stream: {e}")))?;

    stream
        .play()
        .map_err(|e| CoachError::Audio(format!("Failed to start input stream: {e}")))?;
    std::thread::sleep(std::time::Duration::from_secs(u64::from(duration_secs)));
    drop(stream);

    let interleaved = {
        let mut guard = raw
            .lock()
            .map_err(|e| CoachError::Audio(format!("Capture buffer poisoned: {e}")))?;
        std::mem::take(&mut *guard)
    };

    let mono = downmix(&interleaved, device_channels);
    let resampled = resample(&mono, device_rate, target_rate);
    Ok(to_fixed_i16(&resampled, frames))
}

// ---------------------------------------------------------------------------
// Format conversion
// ---------------------------------------------------------------------------

/// Average interleaved frames down to one channel.
#[cfg_attr(not(feature = "microphone"), allow(dead_code))]
fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let ch = channels as usize;
    interleaved
        .chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

/// Linear-interpolation resampling.
#[cfg_attr(not(feature = "microphone"), allow(dead_code))]
fn resample(mono: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || mono.is_empty() || to_rate == 0 {
        return mono.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = (mono.len() as f64 / ratio).ceil() as usize;
    let last = mono.len() - 1;
    (0..out_len)
        .map(|i| {
            let src = i as f64 * ratio;
            let idx0 = (src.floor() as usize).min(last);
            let idx1 = (idx0 + 1).min(last);
            let frac = (src - idx0 as f64) as f32;
            mono[idx0] * (1.0 - frac) + mono[idx1] * frac
        })
        .collect()
}

/// Convert to 16-bit PCM, truncating or zero-padding to exactly `frames`.
#[cfg_attr(not(feature = "microphone"), allow(dead_code))]
fn to_fixed_i16(samples: &[f32], frames: usize) -> Vec<i16> {
    let mut out: Vec<i16> = samples
        .iter()
        .take(frames)
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect();
    out.resize(frames, 0);
    out
}

// ---------------------------------------------------------------------------
// Stub implementation (microphone feature disabled)
// ---------------------------------------------------------------------------

#[cfg(not(feature = "microphone"))]
impl AudioCapture for MicrophoneCapture {
    async fn record(&self, duration_secs: u32, sample_rate: u32) -> Result<AudioClip, CoachError> {
        frame_count(duration_secs, sample_rate)?;
        Err(CoachError::Audio(
            "Microphone capture requires the `microphone` feature to be enabled".to_string(),
        ))
    }
}
