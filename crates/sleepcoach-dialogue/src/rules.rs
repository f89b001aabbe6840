//! The ordered routing rules.
//!
//! Rules are evaluated top to bottom and the first whose predicate holds
//! produces the reply. Keyword checks are plain substring matches on the
//! lower-cased utterance; affirmations and negations must match the whole
//! utterance.

use sleepcoach_core::knowledge::{KnowledgeBase, SleepStage};
use sleepcoach_core::state::{AdviceDepth, ConversationState, Topic};

use crate::responses;

// =============================================================================
// Keyword tables
// =============================================================================

pub const AFFIRMATIONS: &[&str] = &["yes", "yeah", "sure", "okay", "ok"];

pub const NEGATIONS: &[&str] = &["no", "nope", "not now"];

/// Issue keywords in priority order.
pub const TOPIC_KEYWORDS: &[(&str, Topic)] = &[
    ("insomnia", Topic::Insomnia),
    ("sleep apnea", Topic::SleepApnea),
    ("restless legs", Topic::RestlessLegs),
    ("circadian rhythm", Topic::CircadianRhythmDisorder),
];

pub const HYGIENE_KEYWORDS: &[&str] = &["hygiene", "routine", "habit", "schedule", "improve", "better"];

pub const STAGE_KEYWORDS: &[&str] = &["stage", "n1", "n2", "n3", "rem", "rm"];

/// Sub-keys selecting a single stage, checked in order.
const STAGE_LOOKUP: &[(SleepStage, &[&str])] = &[
    (SleepStage::N1, &["n1", "stage 1"]),
    (SleepStage::N2, &["n2", "stage 2"]),
    (SleepStage::N3, &["n3", "stage 3", "deep"]),
    (SleepStage::Rem, &["rem", "rm", "rapid"]),
];

// =============================================================================
// Utterance
// =============================================================================

/// A user utterance normalised for matching (trimmed, lower-cased).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    text: String,
}

impl Utterance {
    pub fn new(raw: &str) -> Self {
        Self {
            text: raw.trim().to_lowercase(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whole-utterance match against any of `phrases`.
    pub fn is_one_of(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|p| self.text == *p)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.text.contains(keyword)
    }

    /// Substring match against any of `keywords`.
    pub fn contains_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.text.contains(k))
    }
}

impl From<&str> for Utterance {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

// =============================================================================
// Rule
// =============================================================================

/// One entry of the decision list.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Short identifier, logged and recorded on each reply.
    pub name: &'static str,
    /// Whether this rule handles the utterance in the given state.
    pub matches: fn(&Utterance, &ConversationState) -> bool,
    /// Produce the reply, updating the state as needed.
    pub apply: fn(&Utterance, &mut ConversationState, &KnowledgeBase) -> String,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

pub const AFFIRMATION: Rule = Rule {
    name: "affirmation",
    matches: |u, _| u.is_one_of(AFFIRMATIONS),
    apply: affirm,
};

pub const NEGATION: Rule = Rule {
    name: "negation",
    matches: |u, _| u.is_one_of(NEGATIONS),
    apply: negate,
};

pub const TOPIC_DETECTION: Rule = Rule {
    name: "topic",
    matches: |u, _| detect_topic(u).is_some(),
    apply: enter_topic,
};

pub const HYGIENE: Rule = Rule {
    name: "hygiene",
    matches: |u, _| u.contains_any(HYGIENE_KEYWORDS),
    apply: hygiene,
};

pub const STAGE_QUERY: Rule = Rule {
    name: "stage",
    matches: |u, _| u.contains_any(STAGE_KEYWORDS),
    apply: stage,
};

pub const INSOMNIA_SUBTOPIC: Rule = Rule {
    name: "insomnia_subtopic",
    matches: |u, s| {
        s.position() == (Some(Topic::Insomnia), Some(AdviceDepth::Detailed))
            && (u.contains("falling asleep") || u.contains("staying asleep"))
    },
    apply: insomnia_subtopic,
};

pub const FALLBACK: Rule = Rule {
    name: "fallback",
    matches: |_, _| true,
    apply: |_, _, _| responses::FALLBACK.to_string(),
};

/// The full decision list, in evaluation order. The last rule always matches.
pub static RULES: [Rule; 7] = [
    AFFIRMATION,
    NEGATION,
    TOPIC_DETECTION,
    HYGIENE,
    STAGE_QUERY,
    INSOMNIA_SUBTOPIC,
    FALLBACK,
];

// =============================================================================
// Handlers
// =============================================================================

fn affirm(_: &Utterance, state: &mut ConversationState, _: &KnowledgeBase) -> String {
    match state.position() {
        (Some(Topic::Insomnia), Some(AdviceDepth::Basic)) => {
            state.advice_depth = Some(AdviceDepth::Detailed);
            responses::INSOMNIA_DETAILED.to_string()
        }
        (Some(Topic::Insomnia), Some(AdviceDepth::Detailed)) => responses::insomnia_combined(),
        (Some(Topic::SleepHygiene), _) => responses::HYGIENE_FOLLOW_UP.to_string(),
        (Some(Topic::SleepApnea), _) => responses::SLEEP_APNEA_FOLLOW_UP.to_string(),
        (Some(Topic::RestlessLegs), _) => responses::RESTLESS_LEGS_FOLLOW_UP.to_string(),
        (Some(Topic::CircadianRhythmDisorder), _) => responses::CIRCADIAN_FOLLOW_UP.to_string(),
        _ => responses::CLARIFY.to_string(),
    }
}

fn negate(_: &Utterance, state: &mut ConversationState, _: &KnowledgeBase) -> String {
    state.reset();
    responses::CLOSING.to_string()
}

/// First issue keyword contained in the utterance, by table order.
pub fn detect_topic(utterance: &Utterance) -> Option<Topic> {
    TOPIC_KEYWORDS
        .iter()
        .find(|(keyword, _)| utterance.contains(keyword))
        .map(|(_, topic)| *topic)
}

fn enter_topic(utterance: &Utterance, state: &mut ConversationState, _: &KnowledgeBase) -> String {
    match detect_topic(utterance) {
        Some(topic) => {
            state.enter(topic);
            responses::topic_intro(topic).to_string()
        }
        None => responses::FALLBACK.to_string(),
    }
}

fn hygiene(_: &Utterance, state: &mut ConversationState, kb: &KnowledgeBase) -> String {
    state.enter(Topic::SleepHygiene);
    responses::hygiene_advice(kb)
}

/// Stage named by the utterance, or `None` for a generic stage question.
pub fn lookup_stage(utterance: &Utterance) -> Option<SleepStage> {
    STAGE_LOOKUP
        .iter()
        .find(|(_, keys)| utterance.contains_any(keys))
        .map(|(stage, _)| *stage)
}

fn stage(utterance: &Utterance, state: &mut ConversationState, kb: &KnowledgeBase) -> String {
    state.enter(Topic::SleepStages);
    match lookup_stage(utterance) {
        Some(stage) => responses::stage_description(kb, stage),
        None => responses::stage_overview(kb),
    }
}

fn insomnia_subtopic(utterance: &Utterance, _: &mut ConversationState, _: &KnowledgeBase) -> String {
    if utterance.contains("falling asleep") {
        responses::falling_asleep()
    } else {
        responses::staying_asleep()
    }
}

// =============================================================================
// Tests
// =============================================================================
