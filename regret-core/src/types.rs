//! Core type definitions for the regret memory graph.
//!
//! All types are serializable; the snapshot store writes them as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{RegretError, Result};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifier of a memory node. Assigned 1, 2, 3, … and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Judgment & emotion labels
// ---------------------------------------------------------------------------

/// Verdict the judge passed on a prompt/response pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    /// Appropriate and ethical.
    Good,
    /// Inappropriate or unethical.
    Bad,
    /// No verdict (also the fallback when the judge is unreachable).
    #[default]
    Neutral,
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => write!(f, "good"),
            Self::Bad => write!(f, "bad"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

impl FromStr for Judgment {
    type Err = RegretError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good" => Ok(Self::Good),
            "bad" => Ok(Self::Bad),
            "neutral" => Ok(Self::Neutral),
            other => Err(RegretError::Validation(format!("unknown judgment '{other}'"))),
        }
    }
}

/// Discrete emotion attached to a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    /// Bad judgment with high regret or negative sentiment.
    Angry,
    /// High regret.
    Sad,
    /// Low regret or positive sentiment.
    Happy,
    /// Nothing notable.
    #[default]
    Neutral,
    /// Bad judgment without strong regret.
    Anxious,
    /// Low regret, accurate, well received.
    Confident,
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Angry => "angry",
            Self::Sad => "sad",
            Self::Happy => "happy",
            Self::Neutral => "neutral",
            Self::Anxious => "anxious",
            Self::Confident => "confident",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Regret scores
// ---------------------------------------------------------------------------

/// Lowest value any regret criterion may take.
pub const SCORE_MIN: f64 = 1.0;
/// Highest value any regret criterion may take.
pub const SCORE_MAX: f64 = 10.0;
/// Value used for every criterion when the judge cannot produce one.
pub const SCORE_FALLBACK: f64 = 5.0;

/// Multi-criteria regret judgment. Every criterion lies in `[1, 10]`.
///
/// Fields are private: a value only exists if it came through [`new`],
/// [`clamped`] or [`fallback`], and deserialization goes through [`new`]
/// as well.
///
/// [`new`]: RegretScores::new
/// [`clamped`]: RegretScores::clamped
/// [`fallback`]: RegretScores::fallback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScores")]
pub struct RegretScores {
    ethical_regret: f64,
    factual_accuracy: f64,
    emotional_impact: f64,
}

/// Unvalidated wire form of [`RegretScores`].
#[derive(Deserialize)]
struct RawScores {
    ethical_regret: f64,
    factual_accuracy: f64,
    emotional_impact: f64,
}

impl TryFrom<RawScores> for RegretScores {
    type Error = RegretError;

    fn try_from(raw: RawScores) -> Result<Self> {
        Self::new(raw.ethical_regret, raw.factual_accuracy, raw.emotional_impact)
    }
}

impl RegretScores {
    /// Build a score triple, rejecting anything outside `[1, 10]`.
    ///
    /// # Errors
    /// Returns [`RegretError::Validation`] for out-of-range or non-finite values.
    pub fn new(ethical_regret: f64, factual_accuracy: f64, emotional_impact: f64) -> Result<Self> {
        for (name, value) in [
            ("ethical_regret", ethical_regret),
            ("factual_accuracy", factual_accuracy),
            ("emotional_impact", emotional_impact),
        ] {
            if !value.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&value) {
                return Err(RegretError::Validation(format!(
                    "{name} must be within [{SCORE_MIN}, {SCORE_MAX}], got {value}"
                )));
            }
        }
        Ok(Self {
            ethical_regret,
            factual_accuracy,
            emotional_impact,
        })
    }

    /// Build a score triple, clamping each value into `[1, 10]`.
    /// Non-finite values become the fallback score.
    #[must_use]
    pub fn clamped(ethical_regret: f64, factual_accuracy: f64, emotional_impact: f64) -> Self {
        Self {
            ethical_regret: clamp_score(ethical_regret),
            factual_accuracy: clamp_score(factual_accuracy),
            emotional_impact: clamp_score(emotional_impact),
        }
    }

    /// The neutral `{5, 5, 5}` triple.
    #[must_use]
    pub const fn fallback() -> Self {
        Self {
            ethical_regret: SCORE_FALLBACK,
            factual_accuracy: SCORE_FALLBACK,
            emotional_impact: SCORE_FALLBACK,
        }
    }

    /// How ethically regrettable the response was (higher = worse).
    #[must_use]
    pub const fn ethical_regret(&self) -> f64 {
        self.ethical_regret
    }

    /// How factually accurate the response was (higher = better).
    #[must_use]
    pub const fn factual_accuracy(&self) -> f64 {
        self.factual_accuracy
    }

    /// How well the response landed emotionally (higher = better).
    #[must_use]
    pub const fn emotional_impact(&self) -> f64 {
        self.emotional_impact
    }

    /// Single derived regret scalar in `[0, 10]`; higher means more regret.
    ///
    /// ```text
    /// overall = (ethical + (10 - factual) + (10 - emotional)) / 3
    /// ```
    #[must_use]
    pub fn overall_regret(&self) -> f64 {
        (self.ethical_regret + (SCORE_MAX - self.factual_accuracy) + (SCORE_MAX - self.emotional_impact))
            / 3.0
    }
}

impl Default for RegretScores {
    fn default() -> Self {
        Self::fallback()
    }
}

fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(SCORE_MIN, SCORE_MAX)
    } else {
        SCORE_FALLBACK
    }
}

// ---------------------------------------------------------------------------
// Memory node
// ---------------------------------------------------------------------------

/// One recorded interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryNode {
    /// Unique, monotonically assigned id.
    pub id: NodeId,
    /// What the user asked.
    pub prompt: String,
    /// What the model answered.
    pub response: String,
    /// The judge's verdict.
    pub judgment: Judgment,
    /// The judge's criteria, adjusted by feedback.
    pub regret_scores: RegretScores,
    /// Emotion derived at insertion time.
    pub emotion: Emotion,
    /// Insertion time. Never changes.
    pub created_at: DateTime<Utc>,
    /// Time-decayed regret; starts at `overall_regret` and only moves via
    /// decay passes or feedback.
    pub residual_regret: f64,
}

impl MemoryNode {
    /// Derived overall regret of this node's scores.
    #[must_use]
    pub fn overall_regret(&self) -> f64 {
        self.regret_scores.overall_regret()
    }

    /// Whole days elapsed since insertion, truncated. Zero for future timestamps.
    #[must_use]
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }
}
