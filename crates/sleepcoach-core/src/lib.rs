pub mod config;
pub mod error;
pub mod knowledge;
pub mod state;

pub use config::SleepCoachConfig;
pub use error::{CoachError, Result};
pub use knowledge::{KnowledgeBase, SleepStage};
pub use state::{AdviceDepth, ConversationState, Topic};
