use thiserror::Error;

/// Top-level error type for the sleep coach.
///
/// Only collaborators (capture, transcription, synthesis) and startup
/// loading can fail. The dialogue manager itself is total and never
/// produces one of these.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoachError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Knowledge base error: {0}")]
    Knowledge(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for CoachError {
    fn from(err: toml::de::Error) -> Self {
        CoachError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CoachError {
    fn from(err: toml::ser::Error) -> Self {
        CoachError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CoachError {
    fn from(err: serde_json::Error) -> Self {
        CoachError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for sleep coach operations.
pub type Result<T> = std::result::Result<T, CoachError>;
