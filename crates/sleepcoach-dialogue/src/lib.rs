//! Dialogue management for the sleep coach.
//!
//! Routes each user utterance through an ordered rule list to produce a
//! response, tracking topic and advice depth across turns, and drives
//! the turn-taking loop between the speech collaborators.

pub mod conversation;
pub mod manager;
pub mod responses;
pub mod rules;

pub use conversation::{ConversationLog, ConversationLoop, LoopState, Turn};
pub use manager::{DialogueManager, Reply};
pub use rules::{Rule, Utterance, RULES};
