//! Evolution stages derived from the cumulative input count
//!
//! The stage is never stored; it is recomputed from `total_input_count` every
//! time so it cannot drift from the counter.

use serde::{Deserialize, Serialize};

/// Number of segments in the evolution bar
pub const EVOLUTION_SEGMENTS: u32 = 10;

/// Evolution stage, ordinal 1 through 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Stage {
    Human = 1,
    Awakened = 2,
    Biased = 3,
    Concept = 4,
    FinalForm = 5,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Human,
        Stage::Awakened,
        Stage::Biased,
        Stage::Concept,
        Stage::FinalForm,
    ];

    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Human => "HUMAN",
            Stage::Awakened => "AWAKENED",
            Stage::Biased => "BIASED",
            Stage::Concept => "CONCEPT",
            Stage::FinalForm => "FINAL FORM",
        }
    }

    /// Visual tone handed to the portrait generator
    pub fn tone(&self) -> &'static str {
        match self {
            Stage::Human => "自然なポートレート",
            Stage::Awakened => "目に光・ドラマチック",
            Stage::Biased => "誇張・属性強調",
            Stage::Concept => "抽象・幾何学",
            Stage::FinalForm => "超越存在・叙事詩的",
        }
    }

    /// Input count at which this stage begins
    pub fn floor(&self) -> u32 {
        match self {
            Stage::Human => 0,
            Stage::Awakened => 8,
            Stage::Biased => 20,
            Stage::Concept => 40,
            Stage::FinalForm => 70,
        }
    }

    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Human => Some(Stage::Awakened),
            Stage::Awakened => Some(Stage::Biased),
            Stage::Biased => Some(Stage::Concept),
            Stage::Concept => Some(Stage::FinalForm),
            Stage::FinalForm => None,
        }
    }
}

/// Stage for a cumulative input count, highest threshold first
pub fn stage_of(count: u32) -> Stage {
    Stage::ALL
        .into_iter()
        .rev()
        .find(|stage| count >= stage.floor())
        .unwrap_or(Stage::Human)
}

/// The next unmet threshold, or `None` once the final stage is reached
pub fn next_threshold(count: u32) -> Option<u32> {
    stage_of(count).next().map(|stage| stage.floor())
}

/// Evolution bar metrics for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionProgress {
    /// Fraction of the way to the next stage, in [0, 1]
    pub ratio: f64,
    /// Filled segments out of EVOLUTION_SEGMENTS
    pub filled: u32,
    /// `None` at the final stage
    pub next_threshold: Option<u32>,
}

impl EvolutionProgress {
    pub fn from_count(count: u32) -> Self {
        let stage = stage_of(count);
        let Some(next) = next_threshold(count) else {
            return Self {
                ratio: 1.0,
                filled: EVOLUTION_SEGMENTS,
                next_threshold: None,
            };
        };

        let floor = stage.floor();
        let ratio = ((count - floor) as f64 / (next - floor) as f64).clamp(0.0, 1.0);
        let filled = (ratio * EVOLUTION_SEGMENTS as f64).floor() as u32;

        Self {
            ratio,
            filled,
            next_threshold: Some(next),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next_threshold.is_none()
    }

    /// `NEXT:<n>` while evolving, `MAX` at the final stage
    pub fn label(&self) -> String {
        match self.next_threshold {
            Some(next) => format!("NEXT:{}", next),
            None => "MAX".to_string(),
        }
    }

    /// Ten-segment bar such as `■■■□□□□□□□`
    pub fn bar(&self) -> String {
        (0..EVOLUTION_SEGMENTS)
            .map(|i| if i < self.filled { '■' } else { '□' })
            .collect()
    }
}
