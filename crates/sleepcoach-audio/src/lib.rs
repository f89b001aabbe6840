//! Sleep coach audio crate - fixed-duration microphone capture and WAV files.
//!
//! Provides the `AudioCapture` abstraction consumed by the voice input,
//! a silent test double, a cpal-backed microphone implementation behind
//! the `microphone` feature, and the per-turn WAV recording store.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sleepcoach_core::error::CoachError;

pub mod microphone;
pub mod recording;

pub use microphone::MicrophoneCapture;
pub use recording::RecordingStore;

// =============================================================================
// Audio clip
// =============================================================================

/// A mono, 16-bit PCM recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    /// Interleaved samples (single channel, so one per frame).
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Length of the clip in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples normalised to f32 in [-1.0, 1.0].
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples
            .iter()
            .map(|s| *s as f32 / -(i16::MIN as f32))
            .collect()
    }
}

// =============================================================================
// Trait
// =============================================================================

/// Collaborator that records one fixed-length utterance.
///
/// Recording blocks the turn until the full duration has been captured.
pub trait AudioCapture: Send + Sync {
    /// Record `duration_secs` seconds of mono 16-bit audio at `sample_rate` Hz.
    fn record(
        &self,
        duration_secs: u32,
        sample_rate: u32,
    ) -> impl Future<Output = Result<AudioClip, CoachError>> + Send;
}

/// Number of samples in a fixed-length recording, rejecting zero values.
pub(crate) fn frame_count(duration_secs: u32, sample_rate: u32) -> Result<usize, CoachError> {
    if duration_secs == 0 {
        return Err(CoachError::Audio(
            "Recording duration must be greater than 0".to_string(),
        ));
    }
    if sample_rate == 0 {
        return Err(CoachError::Audio(
            "Sample rate must be greater than 0".to_string(),
        ));
    }
    Ok(duration_secs as usize * sample_rate as usize)
}

// =============================================================================
// Silent implementation
// =============================================================================

/// Capture double that returns zeroed buffers of the requested length.
///
/// Counts recordings so tests can assert how many turns captured audio.
#[derive(Debug, Clone, Default)]
pub struct SilentCapture {
    recordings: Arc<AtomicUsize>,
}

impl SilentCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many clips have been recorded so far.
    pub fn recordings(&self) -> usize {
        self.recordings.load(Ordering::Relaxed)
    }
}

impl AudioCapture for SilentCapture {
    async fn record(&self, duration_secs: u32, sample_rate: u32) -> Result<AudioClip, CoachError> {
        let frames = frame_count(duration_secs, sample_rate)?;
        self.recordings.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(duration_secs, sample_rate, "Silent clip recorded");
        Ok(AudioClip::new(vec![0; frames], sample_rate))
    }
}

// =============================================================================
// Tests
// =============================================================================
