//! Mutable per-session conversation state.
//!
//! Owned by the conversation loop and handed to the dialogue manager by
//! `&mut` on every turn. Never persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Topic the conversation is currently about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Insomnia,
    SleepApnea,
    RestlessLegs,
    CircadianRhythmDisorder,
    SleepHygiene,
    SleepStages,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Topic::Insomnia => "insomnia",
            Topic::SleepApnea => "sleep_apnea",
            Topic::RestlessLegs => "restless_legs",
            Topic::CircadianRhythmDisorder => "circadian_rhythm_disorder",
            Topic::SleepHygiene => "sleep_hygiene",
            Topic::SleepStages => "sleep_stages",
        };
        f.write_str(name)
    }
}

/// How far into the advice sequence the user has gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceDepth {
    Basic,
    Detailed,
}

impl fmt::Display for AdviceDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdviceDepth::Basic => write!(f, "basic"),
            AdviceDepth::Detailed => write!(f, "detailed"),
        }
    }
}

/// Topic, subtopic and advice depth carried between turns.
///
/// `advice_depth` only reaches `Detailed` while the topic is insomnia.
/// `subtopic` is carried for compatibility and no rule writes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub topic: Option<Topic>,
    pub subtopic: Option<String>,
    pub advice_depth: Option<AdviceDepth>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every field back to `None`.
    pub fn reset(&mut self) {
        self.topic = None;
        self.subtopic = None;
        self.advice_depth = None;
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.topic.is_none() && self.subtopic.is_none() && self.advice_depth.is_none()
    }

    /// Enter a topic at basic depth.
    pub fn enter(&mut self, topic: Topic) {
        self.topic = Some(topic);
        self.advice_depth = Some(AdviceDepth::Basic);
    }

    /// Current `(topic, depth)` pair, the key most rules branch on.
    pub fn position(&self) -> (Option<Topic>, Option<AdviceDepth>) {
        (self.topic, self.advice_depth)
    }
}
