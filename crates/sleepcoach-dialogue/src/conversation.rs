//! Turn-taking loop between the user and the dialogue manager.
//!
//! Lifecycle is `Running -> Terminated`, entered on an exit phrase or when
//! the utterance source closes. Each turn runs to completion before the
//! next begins: listen, route, speak.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::Instrument;
use uuid::Uuid;

use sleepcoach_core::error::CoachError;
use sleepcoach_core::state::ConversationState;
use sleepcoach_speech::{SpeechSynthesizer, UtteranceSource};

use crate::manager::DialogueManager;
use crate::responses::{FAREWELL, GREETING};
use crate::rules::Utterance;

/// Utterances that end the conversation (whole-string, case-insensitive).
pub const EXIT_PHRASES: &[&str] = &["quit", "exit", "bye"];

/// Rule name recorded for the farewell turn.
const EXIT_RULE: &str = "exit";

/// Whether the conversation loop is still taking turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    Running,
    Terminated,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::Running => write!(f, "Running"),
            LoopState::Terminated => write!(f, "Terminated"),
        }
    }
}

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub user: String,
    pub coach: String,
    pub rule: &'static str,
    pub at: DateTime<Utc>,
}

/// In-memory history of the current session. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn push(&mut self, user: &str, coach: &str, rule: &'static str) {
        self.turns.push(Turn {
            user: user.to_string(),
            coach: coach.to_string(),
            rule,
            at: Utc::now(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Drives one conversation session.
///
/// Owns the single `ConversationState` for the session and lends it to the
/// dialogue manager on each turn.
pub struct ConversationLoop {
    manager: DialogueManager,
    state: ConversationState,
    status: LoopState,
    log: ConversationLog,
    session_id: Uuid,
    echo: bool,
}

impl ConversationLoop {
    pub fn new(manager: DialogueManager) -> Self {
        Self {
            manager,
            state: ConversationState::new(),
            status: LoopState::Running,
            log: ConversationLog::default(),
            session_id: Uuid::new_v4(),
            echo: false,
        }
    }

    /// Print `You:` / `Sleep Coach:` lines to stdout while running.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn status(&self) -> LoopState {
        self.status
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn is_exit_phrase(utterance: &str) -> bool {
        Utterance::new(utterance).is_one_of(EXIT_PHRASES)
    }

    /// Process one utterance without any I/O.
    ///
    /// Returns the reply to speak, or `None` once the loop has terminated.
    pub fn step(&mut self, utterance: &str) -> Option<String> {
        if self.status == LoopState::Terminated {
            return None;
        }

        if Self::is_exit_phrase(utterance) {
            return Some(self.terminate(utterance));
        }

        let reply = self.manager.respond(utterance, &mut self.state);
        self.log.push(utterance, &reply.text, reply.rule);
        Some(reply.text)
    }

    fn terminate(&mut self, utterance: &str) -> String {
        tracing::info!(turns = self.log.len(), "Conversation ended");
        self.status = LoopState::Terminated;
        self.log.push(utterance, FAREWELL, EXIT_RULE);
        FAREWELL.to_string()
    }

    /// Greet, then take turns until an exit phrase or end of input.
    ///
    /// Synthesis failures are logged and the conversation continues; an
    /// error from the utterance source ends the run.
    pub async fn run<S, V>(&mut self, source: &mut S, voice: &V) -> Result<(), CoachError>
    where
        S: UtteranceSource,
        V: SpeechSynthesizer,
    {
        let span = tracing::info_span!("conversation", session_id = %self.session_id);
        async {
            tracing::info!("Conversation started");
            self.say(voice, GREETING).await;

            while self.status == LoopState::Running {
                let reply = match source.next_utterance().await? {
                    Some(transcript) => {
                        if transcript.is_failure() {
                            tracing::warn!(transcript = ?transcript, "Speech not recognised");
                        }
                        let utterance = transcript.as_utterance();
                        if self.echo && !source.echoes_input() {
                            println!("You: {utterance}");
                        }
                        self.step(utterance)
                    }
                    None => {
                        tracing::info!("Input closed");
                        Some(self.terminate(""))
                    }
                };

                if let Some(text) = reply {
                    self.say(voice, &text).await;
                }
            }
            Ok::<(), CoachError>(())
        }
        .instrument(span)
        .await
    }

    async fn say<V: SpeechSynthesizer>(&self, voice: &V, text: &str) {
        if self.echo {
            println!("Sleep Coach: {text}");
        }
        if let Err(e) = voice.speak(text).await {
            tracing::warn!(error = %e, "Failed to speak response");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responses;
    use sleepcoach_core::state::Topic;
    use sleepcoach_speech::{RecordingSynthesizer, ScriptedInput, Transcript};

    #[test]
    fn test_loop_state_display() {
        assert_eq!(LoopState::Running.to_string(), "Running");
        assert_eq!(LoopState::Terminated.to_string(), "Terminated");
    }

    #[test]
    fn test_exit_phrases() {
        assert!(ConversationLoop::is_exit_phrase("bye"));
        assert!(ConversationLoop::is_exit_phrase("QUIT"));
        assert!(ConversationLoop::is_exit_phrase(" exit "));
        assert!(!ConversationLoop::is_exit_phrase("goodbye"));
        assert!(!ConversationLoop::is_exit_phrase("bye for now"));
    }

    #[test]
    fn test_step_routes_and_logs() {
        let mut conv = ConversationLoop::new(DialogueManager::default());
        let reply = conv.step("I have insomnia").unwrap();
        assert!(reply.contains("difficulty falling or staying asleep"));
        assert_eq!(conv.state().topic, Some(Topic::Insomnia));
        assert_eq!(conv.log().len(), 1);
        assert_eq!(conv.log().last().unwrap().rule, "topic");
        assert_eq!(conv.status(), LoopState::Running);
    }

    #[test]
    fn test_step_exit_terminates() {
        let mut conv = ConversationLoop::new(DialogueManager::default());
        assert_eq!(conv.step("Bye").as_deref(), Some(FAREWELL));
        assert_eq!(conv.status(), LoopState::Terminated);
        assert_eq!(conv.step("insomnia"), None);
        assert!(conv.state().is_empty());
        assert_eq!(conv.log().len(), 1);
    }

    #[tokio::test]
    async fn test_run_speaks_greeting_replies_and_farewell() {
        let mut conv = ConversationLoop::new(DialogueManager::default());
        let mut input = ScriptedInput::from_lines(["I have insomnia", "yes", "bye", "insomnia"]);
        let voice = RecordingSynthesizer::new();

        conv.run(&mut input, &voice).await.unwrap();

        let spoken = voice.spoken();
        assert_eq!(spoken.len(), 4);
        assert_eq!(spoken[0], GREETING);
        assert_eq!(spoken[2], responses::INSOMNIA_DETAILED);
        assert_eq!(spoken[3], FAREWELL);
        assert_eq!(conv.status(), LoopState::Terminated);
        // Nothing after the exit phrase is consumed.
        assert_eq!(input.remaining(), 1);
    }

    #[tokio::test]
    async fn test_run_end_of_input_says_farewell() {
        let mut conv = ConversationLoop::new(DialogueManager::default());
        let mut input = ScriptedInput::from_lines(["stage"]);
        let voice = RecordingSynthesizer::new();

        conv.run(&mut input, &voice).await.unwrap();

        assert_eq!(voice.spoken().last().map(String::as_str), Some(FAREWELL));
        assert_eq!(conv.status(), LoopState::Terminated);
    }

    #[tokio::test]
    async fn test_run_routes_recognition_failures_as_text() {
        let mut conv = ConversationLoop::new(DialogueManager::default());
        let mut input = ScriptedInput::new([
            Transcript::Unintelligible,
            Transcript::ServiceError("network down".to_string()),
        ]);
        let voice = RecordingSynthesizer::new();

        conv.run(&mut input, &voice).await.unwrap();

        let turns = conv.log().turns();
        assert_eq!(turns[0].user, "Sorry, I couldn't understand that.");
        assert_eq!(turns[0].rule, "fallback");
        assert_eq!(
            turns[1].user,
            "Sorry, there was an error with the speech recognition service."
        );
        assert_eq!(turns[1].rule, "fallback");
    }

    #[tokio::test]
    async fn test_run_continues_when_synthesis_fails() {
        let mut conv = ConversationLoop::new(DialogueManager::default());
        let mut input = ScriptedInput::from_lines(["insomnia", "quit"]);
        let voice = RecordingSynthesizer::failing();

        conv.run(&mut input, &voice).await.unwrap();

        assert_eq!(voice.spoken().len(), 3);
        assert_eq!(conv.status(), LoopState::Terminated);
    }
}
