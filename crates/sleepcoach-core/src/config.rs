use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CoachError, Result};

/// Top-level configuration for the sleep coach.
///
/// Loaded from `~/.sleepcoach/config.toml` by default. Each section covers
/// one collaborator of the conversation loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SleepCoachConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

impl SleepCoachConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SleepCoachConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the collaborators cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.audio.duration_secs == 0 {
            return Err(CoachError::Config(
                "audio.duration_secs must be greater than 0".to_string(),
            ));
        }
        if self.audio.sample_rate == 0 {
            return Err(CoachError::Config(
                "audio.sample_rate must be greater than 0".to_string(),
            ));
        }
        if self.voice.rate == 0 {
            return Err(CoachError::Config(
                "voice.rate must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.voice.volume) {
            return Err(CoachError::Config(format!(
                "voice.volume must be within 0.0..=1.0, got {}",
                self.voice.volume
            )));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Print `You:` / `Sleep Coach:` lines to stdout for each turn.
    pub echo_transcript: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            echo_transcript: true,
        }
    }
}

/// Microphone capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Fixed recording length per turn, in seconds.
    pub duration_secs: u32,
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Keep the per-turn WAV files instead of deleting them after transcription.
    pub keep_recordings: bool,
    /// Directory for per-turn WAV files.
    pub recordings_dir: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_secs: 5,
            sample_rate: 16_000,
            keep_recordings: false,
            recordings_dir: "recordings".to_string(),
        }
    }
}

/// Speech-to-text configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Path to the Whisper GGML model file.
    pub model_path: String,
    /// Language code for transcription (e.g., "en", "auto").
    pub language: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model_path: String::new(),
            language: "en".to_string(),
        }
    }
}

/// Text-to-speech configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Speaking rate in words per minute.
    pub rate: u32,
    /// Output volume (0.0 to 1.0).
    pub volume: f32,
    /// External TTS program. Empty disables spoken output.
    pub command: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            rate: 150,
            volume: 0.9,
            command: "espeak".to_string(),
        }
    }
}

/// Knowledge base source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Optional TOML file replacing the built-in knowledge base.
    pub path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_temp_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_config_default_values() {
        let config = SleepCoachConfig::default();

        assert_eq!(config.general.log_level, "info");
        assert!(config.general.echo_transcript);

        assert_eq!(config.audio.duration_secs, 5);
        assert_eq!(config.audio.sample_rate, 16_000);
        assert!(!config.audio.keep_recordings);
        assert_eq!(config.audio.recordings_dir, "recordings");

        assert!(config.speech.model_path.is_empty());
        assert_eq!(config.speech.language, "en");

        assert_eq!(config.voice.rate, 150);
        assert!((config.voice.volume - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.voice.command, "espeak");

        assert!(config.knowledge.path.is_none());
    }

    #[test]
    fn test_config_load_partial_toml() {
        let content = r#"
[audio]
duration_secs = 8

[voice]
command = ""
"#;
        let file = create_temp_config(content);
        let config = SleepCoachConfig::load(file.path()).unwrap();

        assert_eq!(config.audio.duration_secs, 8);
        // Unset fields in a present section keep their defaults.
        assert_eq!(config.audio.sample_rate, 16_000);
        assert!(config.voice.command.is_empty());
        assert_eq!(config.voice.rate, 150);
        assert_eq!(config.speech.language, "en");
    }

    #[test]
    fn test_config_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = SleepCoachConfig::load(file.path()).unwrap();
        assert_eq!(config.audio.duration_secs, 5);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = SleepCoachConfig::load(file.path());
        assert!(matches!(result, Err(CoachError::Config(_))));
    }

    #[test]
    fn test_config_load_or_default_missing_file() {
        let config =
            SleepCoachConfig::load_or_default(Path::new("/does/not/exist/config.toml"));
        assert_eq!(config.audio.sample_rate, 16_000);
    }

    #[test]
    fn test_config_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = SleepCoachConfig::default();
        config.knowledge.path = Some("/etc/sleepcoach/knowledge.toml".to_string());
        config.save(&path).unwrap();

        let reloaded = SleepCoachConfig::load(&path).unwrap();
        assert_eq!(
            reloaded.knowledge.path.as_deref(),
            Some("/etc/sleepcoach/knowledge.toml")
        );
        assert_eq!(reloaded.voice.rate, 150);
    }

    #[test]
    fn test_validate_defaults_ok() {
        assert!(SleepCoachConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SleepCoachConfig::default();
        config.audio.duration_secs = 0;
        assert!(config.validate().is_err());

        let mut config = SleepCoachConfig::default();
        config.audio.sample_rate = 0;
        assert!(config.validate().is_err());

        let mut config = SleepCoachConfig::default();
        config.voice.rate = 0;
        assert!(config.validate().is_err());

        let mut config = SleepCoachConfig::default();
        config.voice.volume = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("voice.volume"));
    }
}
