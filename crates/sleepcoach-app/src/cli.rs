//! CLI argument definitions for the sleep coach.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::Parser;
use sleepcoach_core::config::SleepCoachConfig;

/// Sleep coach: a voice conversation about sleep health.
#[derive(Parser, Debug)]
#[command(name = "sleepcoach", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Type utterances instead of speaking them; replies are printed only.
    #[arg(short = 't', long = "text")]
    pub text: bool,

    /// Recording length per turn, in seconds.
    #[arg(short = 'd', long = "duration")]
    pub duration: Option<u32>,

    /// Capture sample rate in Hz.
    #[arg(long = "sample-rate")]
    pub sample_rate: Option<u32>,

    /// Whisper GGML model file.
    #[arg(short = 'm', long = "model")]
    pub model: Option<PathBuf>,

    /// Print the knowledge base and exit.
    #[arg(long = "list-topics")]
    pub list_topics: bool,

    /// With --list-topics, print JSON instead of text.
    #[arg(long = "json", requires = "list_topics")]
    pub json: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SLEEPCOACH_CONFIG env var > ~/.sleepcoach/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SLEEPCOACH_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log filter directive.
    ///
    /// Priority: --log-level flag > RUST_LOG env var > config file value.
    pub fn resolve_log_filter(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if let Ok(filter) = std::env::var("RUST_LOG") {
            if !filter.is_empty() {
                return filter;
            }
        }
        config_level.to_string()
    }

    /// Overlay command-line overrides onto the loaded configuration.
    pub fn apply_overrides(&self, config: &mut SleepCoachConfig) {
        if let Some(duration) = self.duration {
            config.audio.duration_secs = duration;
        }
        if let Some(rate) = self.sample_rate {
            config.audio.sample_rate = rate;
        }
        if let Some(ref model) = self.model {
            config.speech.model_path = model.to_string_lossy().to_string();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".sleepcoach").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".sleepcoach").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let args = CliArgs::parse_from(["sleepcoach"]);
        assert!(!args.text);
        assert!(!args.list_topics);
        assert!(args.config.is_none());
        assert!(args.duration.is_none());
    }

    #[test]
    fn test_parse_all_flags() {
        let args = CliArgs::parse_from([
            "sleepcoach",
            "--config",
            "/tmp/coach.toml",
            "--text",
            "-d",
            "8",
            "--sample-rate",
            "22050",
            "--model",
            "/models/ggml-base.en.bin",
            "-l",
            "debug",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/coach.toml"));
        assert!(args.text);
        assert_eq!(args.duration, Some(8));
        assert_eq!(args.sample_rate, Some(22_050));
        assert_eq!(args.resolve_log_filter("info"), "debug");
    }

    #[test]
    fn test_json_requires_list_topics() {
        assert!(CliArgs::try_parse_from(["sleepcoach", "--json"]).is_err());
        let args = CliArgs::try_parse_from(["sleepcoach", "--list-topics", "--json"]).unwrap();
        assert!(args.json);
    }

    #[test]
    fn test_apply_overrides() {
        let args = CliArgs::parse_from([
            "sleepcoach",
            "--duration",
            "3",
            "--model",
            "/models/tiny.bin",
        ]);
        let mut config = SleepCoachConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.audio.duration_secs, 3);
        assert_eq!(config.audio.sample_rate, 16_000);
        assert_eq!(config.speech.model_path, "/models/tiny.bin");
        assert_eq!(config.general.log_level, "info");
    }
}
