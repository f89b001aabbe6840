//! Static sleep reference data consulted by the dialogue manager.
//!
//! The knowledge base is built once at startup, either from the built-in
//! tables or from a TOML file, and is read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CoachError, Result};

/// One of the four sleep stages, ordered N1 -> N2 -> N3 -> REM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SleepStage {
    N1,
    N2,
    N3,
    #[serde(rename = "REM")]
    Rem,
}

impl SleepStage {
    pub const ALL: [SleepStage; 4] = [SleepStage::N1, SleepStage::N2, SleepStage::N3, SleepStage::Rem];

    /// Stage code as used in the knowledge tables and in responses.
    pub fn code(&self) -> &'static str {
        match self {
            SleepStage::N1 => "N1",
            SleepStage::N2 => "N2",
            SleepStage::N3 => "N3",
            SleepStage::Rem => "REM",
        }
    }

    /// Parse a stage code. Exact match only.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

impl fmt::Display for SleepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A common sleep issue with its one-sentence description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub key: String,
    pub description: String,
}

/// Read-only sleep reference data.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeBase {
    stages: BTreeMap<SleepStage, String>,
    hygiene: Vec<String>,
    issues: Vec<Issue>,
}

/// On-disk TOML layout for a knowledge base override.
#[derive(Debug, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    stages: BTreeMap<String, String>,
    #[serde(default)]
    hygiene: Vec<String>,
    #[serde(default)]
    issues: BTreeMap<String, String>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KnowledgeBase {
    /// The built-in sleep knowledge.
    pub fn builtin() -> Self {
        let stages = BTreeMap::from([
            (
                SleepStage::N1,
                "Light sleep, transition between wakefulness and sleep".to_string(),
            ),
            (
                SleepStage::N2,
                "Deeper sleep, body temperature drops, heart rate slows".to_string(),
            ),
            (
                SleepStage::N3,
                "Deep sleep, important for physical recovery".to_string(),
            ),
            (
                SleepStage::Rem,
                "Rapid Eye Movement sleep, important for memory and learning".to_string(),
            ),
        ]);

        let hygiene = [
            "Maintain consistent sleep schedule",
            "Create a dark, quiet, and cool sleep environment",
            "Limit exposure to blue light before bed",
            "Avoid caffeine and alcohol close to bedtime",
            "Exercise regularly but not close to bedtime",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let issues = [
            ("insomnia", "Difficulty falling or staying asleep"),
            ("sleep_apnea", "Breathing interruptions during sleep"),
            ("restless_legs", "Uncomfortable sensations in legs at night"),
            ("circadian_rhythm_disorder", "Misalignment of sleep-wake cycle"),
        ]
        .iter()
        .map(|(key, description)| Issue {
            key: key.to_string(),
            description: description.to_string(),
        })
        .collect();

        Self {
            stages,
            hygiene,
            issues,
        }
    }

    /// Load a knowledge base from a TOML file.
    ///
    /// All four stage codes must be present and the hygiene list must not
    /// be empty. Nothing else is checked.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let kb = Self::from_toml(&content)?;
        info!(
            path = %path.display(),
            hygiene_tips = kb.hygiene.len(),
            issues = kb.issues.len(),
            "Knowledge base loaded"
        );
        Ok(kb)
    }

    /// Parse a knowledge base from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: KnowledgeFile =
            toml::from_str(content).map_err(|e| CoachError::Knowledge(e.to_string()))?;

        let mut stages = BTreeMap::new();
        for (code, description) in file.stages {
            let stage = SleepStage::from_code(&code)
                .ok_or_else(|| CoachError::Knowledge(format!("unknown sleep stage: {code}")))?;
            stages.insert(stage, description);
        }
        if let Some(missing) = SleepStage::ALL.iter().find(|s| !stages.contains_key(s)) {
            return Err(CoachError::Knowledge(format!(
                "missing description for sleep stage {missing}"
            )));
        }
        if file.hygiene.is_empty() {
            return Err(CoachError::Knowledge(
                "hygiene tip list must not be empty".to_string(),
            ));
        }

        let issues = file
            .issues
            .into_iter()
            .map(|(key, description)| Issue { key, description })
            .collect();

        Ok(Self {
            stages,
            hygiene: file.hygiene,
            issues,
        })
    }

    /// Description of a single sleep stage.
    pub fn stage(&self, stage: SleepStage) -> &str {
        // Every stage is guaranteed present by construction.
        self.stages.get(&stage).map(String::as_str).unwrap_or_default()
    }

    /// All stages in N1 -> REM order.
    pub fn stages(&self) -> impl Iterator<Item = (SleepStage, &str)> {
        self.stages.iter().map(|(s, d)| (*s, d.as_str()))
    }

    /// Hygiene tips in presentation order.
    pub fn hygiene_tips(&self) -> &[String] {
        &self.hygiene
    }

    /// Description of a common issue by key, e.g. `"sleep_apnea"`.
    pub fn issue(&self, key: &str) -> Option<&str> {
        self.issues
            .iter()
            .find(|i| i.key == key)
            .map(|i| i.description.as_str())
    }

    /// All common issues in table order.
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter()
    }
}
