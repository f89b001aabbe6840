//! Response text.
//!
//! Fixed replies are constants; replies that render knowledge-base data
//! are built by the functions below.

use sleepcoach_core::knowledge::{KnowledgeBase, SleepStage};
use sleepcoach_core::state::Topic;

pub const GREETING: &str = "Hello! I'm your sleep coach. How can I help you today?";

pub const FAREWELL: &str = "Goodbye! Sleep well!";

pub const CLOSING: &str = "Okay! Let me know if you have any other sleep questions.";

pub const FALLBACK: &str = "I'm here to help with your sleep concerns. You can ask me about:\n\
- Sleep stages (N1, N2, N3, REM)\n\
- Sleep hygiene practices\n\
- Common sleep issues (insomnia, sleep apnea, etc.)";

pub const CLARIFY: &str = "What specific aspect would you like to know more about? \
You can ask about sleep stages, sleep hygiene, or common sleep issues.";

pub const INSOMNIA_DETAILED: &str = "Here are some advanced tips for managing insomnia:\n\
- Try cognitive behavioral therapy for insomnia (CBT-I)\n\
- Avoid clock-watching at night\n\
- Get out of bed if you can't sleep after 20 minutes\n\
- Reserve your bed for sleep only\n\
Would you like tips for falling asleep or staying asleep?";

const FALLING_ASLEEP_TIPS: &str =
    "For falling asleep: Try progressive muscle relaxation, deep breathing, or mindfulness meditation.";

const STAYING_ASLEEP_TIPS: &str =
    "For staying asleep: Keep your bedroom cool, avoid large meals before bed, and manage stress.";

const MORE_TIPS_PROMPT: &str = "Would you like more tips?";

pub const HYGIENE_FOLLOW_UP: &str = "Would you like personalized sleep hygiene tips based on your routine? \
If so, tell me about your bedtime habits.";

pub const SLEEP_APNEA_FOLLOW_UP: &str = "If you suspect sleep apnea, it's important to consult a healthcare provider. \
Would you like to know about lifestyle changes or medical treatments?";

pub const RESTLESS_LEGS_FOLLOW_UP: &str = "For restless legs, regular exercise and good sleep hygiene can help. \
Would you like more tips or information about medications?";

pub const CIRCADIAN_FOLLOW_UP: &str =
    "Would you like advice on adjusting your sleep schedule or using light therapy?";

/// Falling-asleep and staying-asleep tips together, offered once detailed
/// insomnia advice has been given.
pub fn insomnia_combined() -> String {
    format!(
        "{FALLING_ASLEEP_TIPS}\n{STAYING_ASLEEP_TIPS}\nWould you like to discuss another sleep issue?"
    )
}

pub fn falling_asleep() -> String {
    format!("{FALLING_ASLEEP_TIPS}\n{MORE_TIPS_PROMPT}")
}

pub fn staying_asleep() -> String {
    format!("{STAYING_ASLEEP_TIPS}\n{MORE_TIPS_PROMPT}")
}

/// One-line definition of a detectable issue plus a yes/no offer of tips.
pub fn topic_intro(topic: Topic) -> &'static str {
    match topic {
        Topic::Insomnia => {
            "Insomnia is difficulty falling or staying asleep. Would you like some tips to manage insomnia?"
        }
        Topic::SleepApnea => {
            "Sleep apnea is breathing interruptions during sleep. Would you like advice on managing sleep apnea?"
        }
        Topic::RestlessLegs => {
            "Restless legs syndrome causes uncomfortable sensations in your legs at night. Would you like tips to manage it?"
        }
        Topic::CircadianRhythmDisorder => {
            "Circadian rhythm disorder is a misalignment of your sleep-wake cycle. Would you like advice on managing it?"
        }
        Topic::SleepHygiene | Topic::SleepStages => CLARIFY,
    }
}

/// Bulleted hygiene list followed by an offer of personalised tips.
pub fn hygiene_advice(kb: &KnowledgeBase) -> String {
    let mut out = String::from("Here are some important sleep hygiene practices:");
    for tip in kb.hygiene_tips() {
        out.push_str("\n- ");
        out.push_str(tip);
    }
    out.push_str("\nWould you like more personalized tips?");
    out
}

/// A single stage, e.g. `"N3 sleep is Deep sleep, important for physical recovery"`.
pub fn stage_description(kb: &KnowledgeBase, stage: SleepStage) -> String {
    format!("{} sleep is {}", stage.code(), kb.stage(stage))
}

/// Numbered listing of every stage, N1 through REM.
pub fn stage_overview(kb: &KnowledgeBase) -> String {
    let mut out = String::from("There are four main stages of sleep:");
    for (i, (stage, description)) in kb.stages().enumerate() {
        out.push_str(&format!("\n{}. {}: {}", i + 1, stage.code(), description));
    }
    out
}
