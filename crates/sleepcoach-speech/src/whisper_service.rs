//! Whisper transcription via whisper-rs (whisper.cpp bindings).
//!
//! When compiled with the `whisper` feature, loads a GGML model file and runs
//! speech-to-text on recorded clips. Without the feature, every
//! transcription fails with a service error.

#[cfg(feature = "whisper")]
use std::path::Path;

use sleepcoach_audio::AudioClip;
use sleepcoach_core::config::SpeechConfig;
use sleepcoach_core::error::CoachError;

use crate::{Transcript, TranscriptionService};

/// Sample rate whisper.cpp expects.
#[cfg(feature = "whisper")]
const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Whisper-backed transcription service.
///
/// Holds a loaded model context reused across turns.
pub struct WhisperService {
    #[cfg(feature = "whisper")]
    ctx: whisper_rs::WhisperContext,
    config: SpeechConfig,
}

impl WhisperService {
    /// Load the GGML model named in the speech configuration.
    ///
    /// # Errors
    /// Returns `CoachError::Transcription` if the model file doesn't exist
    /// or fails to load.
    #[cfg(feature = "whisper")]
    pub fn new(config: SpeechConfig) -> Result<Self, CoachError> {
        use whisper_rs::{WhisperContext, WhisperContextParameters};

        let model_path = &config.model_path;
        if !Path::new(model_path).exists() {
            return Err(CoachError::Transcription(format!(
                "Whisper model file not found: {}",
                model_path
            )));
        }

        tracing::info!(model = %model_path, lang = %config.language, "Loading Whisper model");

        let params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(model_path, params).map_err(|e| {
            CoachError::Transcription(format!("Failed to load Whisper model: {}", e))
        })?;

        Ok(Self { ctx, config })
    }

    /// Stub constructor when the `whisper` feature is disabled.
    #[cfg(not(feature = "whisper"))]
    pub fn new(config: SpeechConfig) -> Result<Self, CoachError> {
        tracing::warn!("WhisperService created without `whisper` feature; transcription will fail");
        Ok(Self { config })
    }

    /// Whether this build can actually transcribe audio.
    pub fn is_available() -> bool {
        cfg!(feature = "whisper")
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }
}

// ---------------------------------------------------------------------------
// Real implementation (whisper feature enabled)
// ---------------------------------------------------------------------------

#[cfg(feature = "whisper")]
impl TranscriptionService for WhisperService {
    async fn transcribe(&self, clip: &AudioClip) -> Result<Transcript, CoachError> {
        use whisper_rs::{FullParams, SamplingStrategy};

        if clip.is_empty() {
            return Err(CoachError::Transcription(
                "Cannot transcribe empty audio data".into(),
            ));
        }
        if clip.sample_rate == 0 {
            return Err(CoachError::Transcription(
                "Sample rate must be greater than 0".into(),
            ));
        }

        let samples = resample(&clip.to_f32(), clip.sample_rate, WHISPER_SAMPLE_RATE);
        tracing::debug!(
            samples = samples.len(),
            duration_secs = clip.duration_secs(),
            "Starting Whisper transcription"
        );

        let mut state = self.ctx.create_state().map_err(|e| {
            CoachError::Transcription(format!("Failed to create Whisper state: {}", e))
        })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        let lang = if self.config.language == "auto" {
            None
        } else {
            Some(self.config.language.as_str())
        };
        params.set_language(lang);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_single_segment(true);

        state
            .full(params, &samples)
            .map_err(|e| CoachError::Transcription(format!("Whisper inference failed: {}", e)))?;

        let n_segments = state.full_n_segments().map_err(|e| {
            CoachError::Transcription(format!("Failed to get segment count: {}", e))
        })?;

        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state.full_get_segment_text(i).map_err(|e| {
                CoachError::Transcription(format!("Failed to get segment {} text: {}", i, e))
            })?;
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(segment.trim());
        }

        tracing::info!(segments = n_segments, text_len = text.len(), "Transcription complete");
        Ok(Transcript::from_text(text))
    }
}

// ---------------------------------------------------------------------------
// Stub implementation (whisper feature disabled)
// ---------------------------------------------------------------------------

#[cfg(not(feature = "whisper"))]
impl TranscriptionService for WhisperService {
    async fn transcribe(&self, _clip: &AudioClip) -> Result<Transcript, CoachError> {
        Err(CoachError::Transcription(
            "Whisper transcription requires the `whisper` feature to be enabled".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Resampling helper
// ---------------------------------------------------------------------------

/// Linear resampling from one sample rate to another.
#[cfg(feature = "whisper")]
fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || input.is_empty() {
        return input.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (input.len() as f64 / ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_idx = i as f64 * ratio;
        let idx0 = (src_idx.floor() as usize).min(input.len() - 1);
        let idx1 = (idx0 + 1).min(input.len() - 1);
        let frac = (src_idx - idx0 as f64) as f32;
        output.push(input[idx0] * (1.0 - frac) + input[idx1] * frac);
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_matches_feature() {
        assert_eq!(WhisperService::is_available(), cfg!(feature = "whisper"));
    }

    #[test]
    fn test_whisper_service_no_model_file() {
        let config = SpeechConfig {
            model_path: "/nonexistent/model.bin".to_string(),
            language: "en".to_string(),
        };
        let result = WhisperService::new(config);
        // Without whisper feature: succeeds (stub). With: fails (no file).
        #[cfg(feature = "whisper")]
        assert!(result.is_err());
        #[cfg(not(feature = "whisper"))]
        assert!(result.is_ok());
    }

    #[cfg(not(feature = "whisper"))]
    #[tokio::test]
    async fn test_whisper_service_stub_returns_error() {
        let service = WhisperService::new(SpeechConfig::default()).unwrap();
        let clip = AudioClip::new(vec![0; 16_000], 16_000);
        let err = service.transcribe(&clip).await.unwrap_err();
        assert!(matches!(err, CoachError::Transcription(_)));
        assert!(err.to_string().contains("whisper"));
    }

    #[cfg(not(feature = "whisper"))]
    #[test]
    fn test_whisper_service_config_accessor() {
        let config = SpeechConfig {
            model_path: "/my/model.bin".to_string(),
            language: "auto".to_string(),
        };
        let service = WhisperService::new(config).unwrap();
        assert_eq!(service.config().model_path, "/my/model.bin");
        assert_eq!(service.config().language, "auto");
    }

    #[cfg(feature = "whisper")]
    #[test]
    fn test_resample_halves_length() {
        let input = vec![0.5f32; 32_000];
        let output = resample(&input, 32_000, 16_000);
        assert_eq!(output.len(), 16_000);
        assert!(output.iter().all(|s| (*s - 0.5).abs() < 1e-6));
    }
}
