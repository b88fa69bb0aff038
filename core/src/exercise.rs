//! Exercise snapshots and submitted answers.
//!
//! The content platform owns exercise CRUD; submissions carry a snapshot of
//! the fields the engine needs (difficulty, base rewards, gradable content).
//! Exercise types are a closed enum so that adding one is a compile-time
//! checked change in the scorer and quest engine, not a string branch.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ExerciseId;

/// Default coin payout for exercises that define none.
pub const DEFAULT_COIN_REWARD: i64 = 5;

/// Default XP payout for exercises that define none.
pub const DEFAULT_XP_REWARD: i64 = 20;

/// Exercise difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Introductory exercises.
    Easy,
    /// Standard exercises.
    Medium,
    /// Advanced exercises.
    Hard,
}

impl Difficulty {
    /// Score multiplier for this tier.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Easy => 1.0,
            Self::Medium => 1.25,
            Self::Hard => 1.5,
        }
    }
}

/// The exercise snapshot submitted alongside answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    /// Exercise id from the content module.
    pub id: ExerciseId,

    /// Difficulty tier.
    pub difficulty: Difficulty,

    /// Base coin payout at a final score of 100.
    #[serde(default = "default_coin_reward")]
    pub coin_reward: i64,

    /// Base XP payout at a final score of 100.
    #[serde(default = "default_xp_reward")]
    pub xp_reward: i64,

    /// Minimum final score considered a pass.
    #[serde(default = "default_passing_score")]
    pub passing_score: u8,

    /// Estimated completion time, used for the speed bonus.
    pub estimated_seconds: Option<u32>,

    /// Gradable content.
    pub content: ExerciseContent,
}

fn default_coin_reward() -> i64 {
    DEFAULT_COIN_REWARD
}

fn default_xp_reward() -> i64 {
    DEFAULT_XP_REWARD
}

fn default_passing_score() -> u8 {
    60
}

/// Gradable content, one variant per exercise type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExerciseContent {
    /// One correct answer per question, compared case-insensitively.
    MultipleChoice {
        /// The questions with their correct answers.
        questions: Vec<ChoiceQuestion>,
    },

    /// Blanks with one or more accepted answers each.
    FillBlanks {
        /// The blanks to fill.
        blanks: Vec<Blank>,
    },

    /// Questions whose answer is a set of options (order-insensitive).
    MultiSelect {
        /// The questions with their correct option sets.
        questions: Vec<SelectQuestion>,
    },

    /// Items that must be arranged in the given order.
    Ordering {
        /// The correct sequence.
        items: Vec<String>,
    },

    /// Left/right pairs that must be matched.
    Matching {
        /// The correct pairs.
        pairs: Vec<MatchPair>,
    },

    /// Free-form response graded by a contribution heuristic.
    FreeResponse {
        /// Minimum word count considered a complete contribution.
        min_words: u32,
    },

    /// Project work with no deterministic check; always routed to manual
    /// teacher grading and never auto-credited.
    Project {},
}

/// A multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceQuestion {
    /// Question id, referenced by the submitted answers.
    pub id: String,
    /// The correct answer.
    pub correct: String,
}

/// A fill-in-the-blank slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blank {
    /// Blank id, referenced by the submitted answers.
    pub id: String,
    /// Accepted answers (any match counts).
    pub accepted: Vec<String>,
}

/// A multi-select question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectQuestion {
    /// Question id, referenced by the submitted answers.
    pub id: String,
    /// The correct option set.
    pub correct: Vec<String>,
}

/// A matching pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    /// Left-hand item.
    pub left: String,
    /// Right-hand item it maps to.
    pub right: String,
}

/// Submitted answers, mirroring the content variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubmittedAnswers {
    /// Answers keyed by question id.
    MultipleChoice {
        /// question id → chosen answer.
        answers: HashMap<String, String>,
    },

    /// Answers keyed by blank id.
    FillBlanks {
        /// blank id → filled text.
        answers: HashMap<String, String>,
    },

    /// Selected option sets keyed by question id.
    MultiSelect {
        /// question id → selected options.
        answers: HashMap<String, Vec<String>>,
    },

    /// The submitted sequence.
    Ordering {
        /// Items in submitted order.
        order: Vec<String>,
    },

    /// The submitted pairs.
    Matching {
        /// Submitted left/right pairs.
        pairs: Vec<MatchPair>,
    },

    /// Free-form text.
    FreeResponse {
        /// The submitted text.
        text: String,
    },

    /// Project hand-in marker (content lives elsewhere).
    Project {},
}
