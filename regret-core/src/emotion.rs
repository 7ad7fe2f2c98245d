//! Emotion & mood derivation.
//!
//! Pure functions, no state. A memory's emotion is picked by a fixed rule
//! chain evaluated top to bottom (first match wins):
//!
//! ```text
//! bad  ∧ (regret > 5 ∨ sentiment < 0.4)                       → angry
//! bad                                                          → anxious
//! regret > 7                                                   → sad
//! regret < 3 ∧ factual > 7 ∧ emotional > 7 ∧ sentiment > 0.6   → confident
//! regret < 3 ∨ sentiment > 0.6                                 → happy
//! otherwise                                                    → neutral
//! ```
//!
//! An absent sentiment signal never satisfies a sentiment comparison.
//!
//! Mood is a bounded 1–10 scalar derived from the rolling average regret,
//! with two linear maps meeting (discontinuously) at the mood threshold.

use crate::types::{Emotion, Judgment};

/// Lowest possible mood.
pub const MOOD_MIN: i64 = 1;
/// Highest possible mood.
pub const MOOD_MAX: i64 = 10;

/// Pick the emotion for a freshly judged interaction.
#[must_use]
pub fn derive_emotion(
    judgment: Judgment,
    overall_regret: f64,
    factual_accuracy: f64,
    emotional_impact: f64,
    sentiment: Option<f64>,
) -> Emotion {
    let negative = sentiment.is_some_and(|s| s < 0.4);
    let positive = sentiment.is_some_and(|s| s > 0.6);

    if judgment == Judgment::Bad {
        if overall_regret > 5.0 || negative {
            return Emotion::Angry;
        }
        return Emotion::Anxious;
    }
    if overall_regret > 7.0 {
        return Emotion::Sad;
    }
    if overall_regret < 3.0 && factual_accuracy > 7.0 && emotional_impact > 7.0 && positive {
        return Emotion::Confident;
    }
    if overall_regret < 3.0 || positive {
        return Emotion::Happy;
    }
    Emotion::Neutral
}

/// Map an average regret to a mood in `[1, 10]`.
///
/// Above the threshold: `11 - floor(avg)`. At or below: `6 + floor(avg)`.
/// Both branches are clamped.
#[must_use]
pub fn derive_mood(avg_regret: f64, mood_threshold: f64) -> u8 {
    // Saturating float→int cast; NaN maps to 0 and lands on the lower branch.
    #[allow(clippy::cast_possible_truncation)]
    let whole = avg_regret.floor() as i64;
    let mood = if avg_regret > mood_threshold {
        11 - whole
    } else {
        6 + whole
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mood = mood.clamp(MOOD_MIN, MOOD_MAX) as u8;
    mood
}
