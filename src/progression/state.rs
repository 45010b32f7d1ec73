//! ProgressionState - the single persisted record of the character
//!
//! Pure data plus the bounded mutations on it. Persistence is layered on top
//! by `AttributeStore`; nothing in here touches storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battle::transcript::BattleResult;
use crate::core::types::{StatCode, StatDeltas, Stats};
use crate::progression::analysis::AnalysisResult;
use crate::progression::job::{job_of, Job};
use crate::progression::stage::{stage_of, EvolutionProgress, Stage};

/// Trait slots available to the character
pub const MAX_TRAITS: usize = 12;
/// Change records kept, newest first
pub const CHANGE_HISTORY_CAP: usize = 50;
/// Battle records kept, newest first
pub const BATTLE_HISTORY_CAP: usize = 20;

/// One accepted impression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub response: AnalysisResult,
}

/// Audit record of what one impression changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub input: String,
    #[serde(default)]
    pub stat_changes: StatDeltas,
    #[serde(default)]
    pub new_traits: Vec<String>,
    #[serde(default)]
    pub narrative: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// The full progression state
///
/// Missing fields in a stored record are filled from `Default`, so older or
/// partial saves still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressionState {
    pub entries: Vec<Entry>,
    pub stats: Stats,
    pub traits: Vec<String>,
    pub epithet: String,
    pub change_history: Vec<ChangeRecord>,
    pub battle_history: Vec<BattleResult>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_battle_time: Option<DateTime<Utc>>,
    #[serde(rename = "imageB64")]
    pub image_b64: Option<String>,
    pub total_input_count: u32,
}

impl ProgressionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        stage_of(self.total_input_count)
    }

    pub fn job(&self) -> Job {
        job_of(&self.stats)
    }

    pub fn evolution(&self) -> EvolutionProgress {
        EvolutionProgress::from_count(self.total_input_count)
    }

    /// Apply deltas with clamping; unknown codes are ignored
    ///
    /// Returns how many recognized codes were applied.
    pub fn apply_stat_changes(&mut self, deltas: &StatDeltas) -> usize {
        let mut applied = 0;
        for (key, delta) in deltas {
            if let Ok(code) = key.parse::<StatCode>() {
                self.stats.adjust(code, *delta);
                applied += 1;
            }
        }
        applied
    }

    /// Append new traits in order until the slots run out
    ///
    /// Duplicates are skipped. Candidates left over once the cap is reached
    /// are discarded. Returns the traits actually added.
    pub fn add_traits(&mut self, candidates: &[String]) -> Vec<String> {
        let mut added = Vec::new();
        for candidate in candidates {
            if self.traits.len() >= MAX_TRAITS {
                break;
            }
            if !self.traits.contains(candidate) {
                self.traits.push(candidate.clone());
                added.push(candidate.clone());
            }
        }
        added
    }

    /// Replace the epithet; an empty value leaves it unchanged
    pub fn set_epithet(&mut self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        self.epithet = value.to_string();
        true
    }

    /// Record an accepted impression and bump the input counter by one
    pub fn add_entry(&mut self, text: &str, response: AnalysisResult, at: DateTime<Utc>) {
        self.entries.push(Entry {
            text: text.to_string(),
            timestamp: at,
            response,
        });
        self.total_input_count = self.total_input_count.saturating_add(1);
    }

    pub fn add_change_record(&mut self, record: ChangeRecord) {
        self.change_history.insert(0, record);
        self.change_history.truncate(CHANGE_HISTORY_CAP);
    }

    /// Prepend a battle and stamp the last battle time
    pub fn add_battle_record(&mut self, record: BattleResult) {
        self.last_battle_time = Some(record.resolved_at);
        self.battle_history.insert(0, record);
        self.battle_history.truncate(BATTLE_HISTORY_CAP);
    }

    pub fn set_image(&mut self, payload: String) {
        self.image_b64 = Some(payload);
    }

    /// Repair a record loaded from storage so the invariants hold again
    pub fn normalize(&mut self) {
        self.stats.normalize();

        let mut seen = Vec::with_capacity(self.traits.len());
        for t in self.traits.drain(..) {
            if seen.len() < MAX_TRAITS && !seen.contains(&t) {
                seen.push(t);
            }
        }
        self.traits = seen;

        self.change_history.truncate(CHANGE_HISTORY_CAP);
        self.battle_history.truncate(BATTLE_HISTORY_CAP);
    }
}
