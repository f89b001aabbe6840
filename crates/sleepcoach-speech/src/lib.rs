//! Sleep coach speech crate - speech-to-text and text-to-speech collaborators.
//!
//! Provides the tagged `Transcript` result, trait abstractions for
//! transcription, synthesis and utterance sources, and the concrete
//! implementations used by the binary and by tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use sleepcoach_audio::AudioClip;
use sleepcoach_core::error::CoachError;

pub mod input;
pub mod synth;
pub mod whisper_service;

pub use input::{ScriptedInput, TypedInput, VoiceInput};
pub use synth::{CommandSynthesizer, RecordingSynthesizer, SilentSynthesizer};
pub use whisper_service::WhisperService;

/// Text routed to the dialogue manager when audio held no recognisable speech.
pub const UNINTELLIGIBLE_TEXT: &str = "Sorry, I couldn't understand that.";

/// Text routed to the dialogue manager when the recogniser itself failed.
pub const SERVICE_ERROR_TEXT: &str =
    "Sorry, there was an error with the speech recognition service.";

// =============================================================================
// Transcript
// =============================================================================

/// Outcome of recognising one utterance.
///
/// Failures are tagged here but still reach the dialogue manager as plain
/// text via [`Transcript::as_utterance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// Speech was recognised.
    Recognized(String),
    /// Audio was captured but contained nothing recognisable.
    Unintelligible,
    /// The recogniser failed; the payload is the underlying error message.
    ServiceError(String),
}

impl Transcript {
    /// Build a transcript from raw recogniser output.
    ///
    /// Non-speech markers such as `[BLANK_AUDIO]` or `(wind blowing)` are
    /// dropped and leading/trailing punctuation is trimmed, so `" Yes."`
    /// becomes `"Yes"`. Nothing left means unintelligible.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = strip_non_speech(&text.into());
        let clean = text.trim_matches(|c: char| !c.is_alphanumeric());
        if clean.is_empty() {
            Transcript::Unintelligible
        } else {
            Transcript::Recognized(clean.to_string())
        }
    }

    /// The text handed to the dialogue manager for this transcript.
    pub fn as_utterance(&self) -> &str {
        match self {
            Transcript::Recognized(text) => text,
            Transcript::Unintelligible => UNINTELLIGIBLE_TEXT,
            Transcript::ServiceError(_) => SERVICE_ERROR_TEXT,
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, Transcript::Recognized(_))
    }
}

/// Remove bracketed or parenthesised annotations the recogniser emits for
/// non-speech audio.
fn strip_non_speech(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut closing: Option<char> = None;
    for c in text.chars() {
        match (closing, c) {
            (None, '[') => closing = Some(']'),
            (None, '(') => closing = Some(')'),
            (None, _) => out.push(c),
            (Some(end), _) if c == end => {
                closing = None;
                out.push(' ');
            }
            (Some(_), _) => {}
        }
    }
    out
}

// =============================================================================
// Traits
// =============================================================================

/// Service for turning a recorded clip into text.
pub trait TranscriptionService: Send + Sync {
    /// Transcribe one clip.
    ///
    /// Unrecognisable audio is `Ok(Transcript::Unintelligible)`; an `Err`
    /// means the service itself failed.
    fn transcribe(
        &self,
        clip: &AudioClip,
    ) -> impl Future<Output = Result<Transcript, CoachError>> + Send;
}

/// Service that speaks a response aloud, returning once playback finished.
pub trait SpeechSynthesizer: Send + Sync {
    fn speak(&self, text: &str) -> impl Future<Output = Result<(), CoachError>> + Send;
}

/// Where the conversation loop gets the next user utterance from.
pub trait UtteranceSource: Send {
    /// Wait for the next utterance. `Ok(None)` means input is closed.
    fn next_utterance(
        &mut self,
    ) -> impl Future<Output = Result<Option<Transcript>, CoachError>> + Send;

    /// Whether the user already sees their own input (e.g. typed text),
    /// so the loop should not echo it back.
    fn echoes_input(&self) -> bool {
        false
    }
}

// =============================================================================
// Scripted transcriber
// =============================================================================

/// Transcriber double that replays a fixed queue of transcripts.
///
/// Once the queue is empty every call fails like a broken service would.
#[derive(Debug, Default)]
pub struct ScriptedTranscriber {
    queue: Mutex<VecDeque<Transcript>>,
}

impl ScriptedTranscriber {
    pub fn new(transcripts: impl IntoIterator<Item = Transcript>) -> Self {
        Self {
            queue: Mutex::new(transcripts.into_iter().collect()),
        }
    }

    /// Remaining scripted transcripts.
    pub fn remaining(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }
}

impl TranscriptionService for ScriptedTranscriber {
    async fn transcribe(&self, clip: &AudioClip) -> Result<Transcript, CoachError> {
        if clip.is_empty() {
            return Err(CoachError::Transcription(
                "Cannot transcribe empty audio data".to_string(),
            ));
        }
        let next = self
            .queue
            .lock()
            .map_err(|e| CoachError::Transcription(format!("Script mutex poisoned: {e}")))?
            .pop_front();
        next.ok_or_else(|| CoachError::Transcription("Transcript script exhausted".to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> AudioClip {
        AudioClip::new(vec![0; 16_000], 16_000)
    }

    #[test]
    fn test_from_text_trims() {
        assert_eq!(
            Transcript::from_text("  I have insomnia \n"),
            Transcript::Recognized("I have insomnia".to_string())
        );
    }

    #[test]
    fn test_from_text_blank_is_unintelligible() {
        assert_eq!(Transcript::from_text("   "), Transcript::Unintelligible);
        assert_eq!(Transcript::from_text(""), Transcript::Unintelligible);
    }

    #[test]
    fn test_from_text_strips_sentence_punctuation() {
        assert_eq!(Transcript::from_text(" Yes."), Transcript::Recognized("Yes".to_string()));
        assert_eq!(Transcript::from_text("Bye!"), Transcript::Recognized("Bye".to_string()));
        assert_eq!(
            Transcript::from_text(" What about REM sleep?"),
            Transcript::Recognized("What about REM sleep".to_string())
        );
        assert_eq!(
            Transcript::from_text("I can't sleep, really."),
            Transcript::Recognized("I can't sleep, really".to_string())
        );
    }

    #[test]
    fn test_from_text_non_speech_markers_are_unintelligible() {
        assert_eq!(Transcript::from_text("[BLANK_AUDIO]"), Transcript::Unintelligible);
        assert_eq!(Transcript::from_text(" (wind blowing) "), Transcript::Unintelligible);
        assert_eq!(Transcript::from_text("..."), Transcript::Unintelligible);
        assert_eq!(
            Transcript::from_text("[MUSIC] Yes."),
            Transcript::Recognized("Yes".to_string())
        );
    }

    #[test]
    fn test_as_utterance_sentinels() {
        assert_eq!(Transcript::Unintelligible.as_utterance(), UNINTELLIGIBLE_TEXT);
        assert_eq!(
            Transcript::ServiceError("timeout".to_string()).as_utterance(),
            SERVICE_ERROR_TEXT
        );
        assert_eq!(Transcript::Recognized("yes".to_string()).as_utterance(), "yes");
    }

    #[test]
    fn test_is_failure() {
        assert!(Transcript::Unintelligible.is_failure());
        assert!(Transcript::ServiceError(String::new()).is_failure());
        assert!(!Transcript::Recognized("ok".to_string()).is_failure());
    }

    #[tokio::test]
    async fn test_scripted_transcriber_replays_in_order() {
        let transcriber = ScriptedTranscriber::new([
            Transcript::Recognized("insomnia".to_string()),
            Transcript::Unintelligible,
        ]);
        assert_eq!(transcriber.remaining(), 2);
        assert_eq!(
            transcriber.transcribe(&clip()).await.unwrap(),
            Transcript::Recognized("insomnia".to_string())
        );
        assert_eq!(
            transcriber.transcribe(&clip()).await.unwrap(),
            Transcript::Unintelligible
        );
        assert!(transcriber.transcribe(&clip()).await.is_err());
    }

    #[tokio::test]
    async fn test_scripted_transcriber_rejects_empty_clip() {
        let transcriber = ScriptedTranscriber::new([Transcript::Unintelligible]);
        let empty = AudioClip::new(Vec::new(), 16_000);
        assert!(transcriber.transcribe(&empty).await.is_err());
        assert_eq!(transcriber.remaining(), 1);
    }
}
