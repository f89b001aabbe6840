//! Dialogue manager: applies the rule list to one utterance.

use sleepcoach_core::knowledge::KnowledgeBase;
use sleepcoach_core::state::ConversationState;

use crate::rules::{Rule, Utterance, RULES};

/// The outcome of routing one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text to speak back to the user.
    pub text: String,
    /// Name of the rule that produced it.
    pub rule: &'static str,
}

/// Stateless router over a knowledge base.
///
/// The conversation state is owned by the caller and passed in on every
/// turn; `respond` is total and always yields a non-empty reply.
#[derive(Debug, Clone)]
pub struct DialogueManager {
    knowledge: KnowledgeBase,
}

impl Default for DialogueManager {
    fn default() -> Self {
        Self::new(KnowledgeBase::builtin())
    }
}

impl DialogueManager {
    pub fn new(knowledge: KnowledgeBase) -> Self {
        Self { knowledge }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// The first rule that handles `utterance` in `state`.
    ///
    /// `RULES` ends with the catch-all fallback, so the scan always stops.
    pub fn select(&self, utterance: &Utterance, state: &ConversationState) -> &'static Rule {
        RULES
            .iter()
            .find(|rule| (rule.matches)(utterance, state))
            .unwrap_or(&RULES[RULES.len() - 1])
    }

    /// Route one utterance, updating `state` in place.
    pub fn respond(&self, utterance: &str, state: &mut ConversationState) -> Reply {
        let utterance = Utterance::new(utterance);
        let rule = self.select(&utterance, state);
        let text = (rule.apply)(&utterance, state, &self.knowledge);

        tracing::debug!(
            rule = rule.name,
            topic = ?state.topic,
            advice_depth = ?state.advice_depth,
            "Utterance routed"
        );

        Reply {
            text,
            rule: rule.name,
        }
    }
}
