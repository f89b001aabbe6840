//! Text-to-speech collaborators.

use std::sync::{Arc, Mutex};

use sleepcoach_core::config::VoiceConfig;
use sleepcoach_core::error::CoachError;
use tokio::process::Command;

use crate::SpeechSynthesizer;

/// Speaks through an external espeak-compatible program.
///
/// Invoked as `<command> -s <rate> -a <amplitude> <text>` and awaited until
/// playback finishes, so turns never overlap.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    program: String,
    rate: u32,
    volume: f32,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>, rate: u32, volume: f32) -> Self {
        Self {
            program: program.into(),
            rate,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &VoiceConfig) -> Self {
        Self::new(config.command.clone(), config.rate, config.volume)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command-line arguments for one utterance.
    pub fn args(&self, text: &str) -> Vec<String> {
        // espeak amplitude runs 0..=200 with 100 as the normal level.
        let amplitude = (self.volume * 100.0).round() as u32;
        vec![
            "-s".to_string(),
            self.rate.to_string(),
            "-a".to_string(),
            amplitude.to_string(),
            text.to_string(),
        ]
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    async fn speak(&self, text: &str) -> Result<(), CoachError> {
        if text.is_empty() {
            return Ok(());
        }
        let status = Command::new(&self.program)
            .args(self.args(text))
            .status()
            .await
            .map_err(|e| CoachError::Synthesis(format!("Failed to run {}: {}", self.program, e)))?;

        if !status.success() {
            return Err(CoachError::Synthesis(format!(
                "{} exited with {}",
                self.program, status
            )));
        }
        tracing::debug!(program = %self.program, text_len = text.len(), "Response spoken");
        Ok(())
    }
}

/// Synthesizer that produces no audio.
#[derive(Debug, Clone, Default)]
pub struct SilentSynthesizer;

impl SpeechSynthesizer for SilentSynthesizer {
    async fn speak(&self, _text: &str) -> Result<(), CoachError> {
        Ok(())
    }
}

/// Synthesizer double that records everything it was asked to say.
#[derive(Debug, Clone, Default)]
pub struct RecordingSynthesizer {
    spoken: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A synthesizer that records the text and then reports a failure.
    pub fn failing() -> Self {
        Self {
            spoken: Arc::default(),
            fail: true,
        }
    }

    /// Everything spoken so far, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl SpeechSynthesizer for RecordingSynthesizer {
    async fn speak(&self, text: &str) -> Result<(), CoachError> {
        self.spoken
            .lock()
            .map_err(|e| CoachError::Synthesis(format!("Recorder mutex poisoned: {e}")))?
            .push(text.to_string());
        if self.fail {
            return Err(CoachError::Synthesis("speaker unavailable".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args() {
        let synth = CommandSynthesizer::new("espeak", 150, 0.9);
        assert_eq!(
            synth.args("Goodbye! Sleep well!"),
            vec!["-s", "150", "-a", "90", "Goodbye! Sleep well!"]
        );
    }

    #[test]
    fn test_volume_is_clamped() {
        let synth = CommandSynthesizer::new("espeak", 150, 3.0);
        assert_eq!(synth.args("hi")[3], "100");
    }

    #[test]
    fn test_from_config() {
        let synth = CommandSynthesizer::from_config(&VoiceConfig::default());
        assert_eq!(synth.program(), "espeak");
        assert_eq!(synth.args("x")[1], "150");
    }

    #[tokio::test]
    async fn test_missing_program_is_synthesis_error() {
        let synth = CommandSynthesizer::new("/nonexistent/tts-binary", 150, 0.9);
        let err = synth.speak("hello").await.unwrap_err();
        assert!(matches!(err, CoachError::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_empty_text_is_noop() {
        let synth = CommandSynthesizer::new("/nonexistent/tts-binary", 150, 0.9);
        assert!(synth.speak("").await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_program() {
        let synth = CommandSynthesizer::new("true", 150, 0.9);
        assert!(synth.speak("hello").await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_program() {
        let synth = CommandSynthesizer::new("false", 150, 0.9);
        let err = synth.speak("hello").await.unwrap_err();
        assert!(err.to_string().contains("false"));
    }

    #[tokio::test]
    async fn test_recording_synthesizer() {
        let synth = RecordingSynthesizer::new();
        synth.speak("one").await.unwrap();
        synth.clone().speak("two").await.unwrap();
        assert_eq!(synth.spoken(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_failing_recording_synthesizer_still_records() {
        let synth = RecordingSynthesizer::failing();
        assert!(synth.speak("one").await.is_err());
        assert_eq!(synth.spoken(), vec!["one"]);
    }

    #[tokio::test]
    async fn test_silent_synthesizer() {
        assert!(SilentSynthesizer.speak("anything").await.is_ok());
    }
}
