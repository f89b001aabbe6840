//! Utterance sources feeding the conversation loop.

use std::collections::VecDeque;

use sleepcoach_audio::{AudioCapture, RecordingStore};
use sleepcoach_core::error::CoachError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

use crate::{Transcript, TranscriptionService, UtteranceSource};

// =============================================================================
// Voice input
// =============================================================================

/// Microphone -> speech-to-text pipeline for one utterance per call.
///
/// A transcription failure is not retried; it becomes
/// `Transcript::ServiceError` and the turn proceeds.
pub struct VoiceInput<C, T> {
    capture: C,
    transcriber: T,
    duration_secs: u32,
    sample_rate: u32,
    recordings: Option<RecordingStore>,
}

impl<C: AudioCapture, T: TranscriptionService> VoiceInput<C, T> {
    pub fn new(capture: C, transcriber: T, duration_secs: u32, sample_rate: u32) -> Self {
        Self {
            capture,
            transcriber,
            duration_secs,
            sample_rate,
            recordings: None,
        }
    }

    /// Write every captured clip to WAV through `store`.
    pub fn with_recordings(mut self, store: RecordingStore) -> Self {
        self.recordings = Some(store);
        self
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    fn persist(&self, clip: &sleepcoach_audio::AudioClip) -> Option<std::path::PathBuf> {
        let store = self.recordings.as_ref()?;
        match store.save(clip) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save recording");
                None
            }
        }
    }
}

impl<C: AudioCapture, T: TranscriptionService> UtteranceSource for VoiceInput<C, T> {
    async fn next_utterance(&mut self) -> Result<Option<Transcript>, CoachError> {
        let clip = self
            .capture
            .record(self.duration_secs, self.sample_rate)
            .await?;
        let saved = self.persist(&clip);

        // Transcribe what actually landed on disk when a store is attached.
        let clip = match saved.as_deref().map(RecordingStore::read) {
            Some(Ok(from_disk)) => from_disk,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Failed to read recording back");
                clip
            }
            None => clip,
        };

        let transcript = match self.transcriber.transcribe(&clip).await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "Speech recognition failed");
                Transcript::ServiceError(e.to_string())
            }
        };

        if let (Some(store), Some(path)) = (&self.recordings, saved) {
            if let Err(e) = store.discard(&path) {
                tracing::warn!(error = %e, path = %path.display(), "Failed to remove recording");
            }
        }

        Ok(Some(transcript))
    }
}

// =============================================================================
// Typed input
// =============================================================================

/// Keyboard mode: one line of text per utterance.
pub struct TypedInput<R> {
    reader: R,
}

impl TypedInput<BufReader<Stdin>> {
    /// Read utterances from standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> TypedInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: AsyncBufRead + Unpin + Send> UtteranceSource for TypedInput<R> {
    async fn next_utterance(&mut self) -> Result<Option<Transcript>, CoachError> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(Transcript::from_text(line)))
    }

    fn echoes_input(&self) -> bool {
        true
    }
}

// =============================================================================
// Scripted input
// =============================================================================

/// Source double that yields a fixed list of transcripts, then closes.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    queue: VecDeque<Transcript>,
}

impl ScriptedInput {
    pub fn new(transcripts: impl IntoIterator<Item = Transcript>) -> Self {
        Self {
            queue: transcripts.into_iter().collect(),
        }
    }

    /// Script of recognised utterances.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(lines.into_iter().map(Transcript::from_text))
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl UtteranceSource for ScriptedInput {
    async fn next_utterance(&mut self) -> Result<Option<Transcript>, CoachError> {
        Ok(self.queue.pop_front())
    }
}

// =============================================================================
// Tests
// =============================================================================
