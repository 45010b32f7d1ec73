//! Structured result of analyzing one audience impression
//!
//! Whatever the text-analysis collaborator returns is funneled through
//! `AnalysisResult::from_value`, which fills defaults for absent or malformed
//! fields. Nothing past this boundary has to care about the raw reply.

use crate::core::types::StatDeltas;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisResult {
    pub stat_changes: StatDeltas,
    pub new_traits: Vec<String>,
    pub epithet: String,
    pub narrative: String,
    pub image_prompt_hint: String,
}

impl AnalysisResult {
    /// Decode a reply leniently
    ///
    /// - non-object `statChanges`, or non-numeric deltas, are skipped
    /// - fractional deltas are rounded; numeric strings are accepted
    /// - non-string or blank traits are skipped
    /// - non-string text fields become empty
    pub fn from_value(value: &Value) -> Self {
        let stat_changes = value
            .get("statChanges")
            .and_then(Value::as_object)
            .map(|changes| {
                changes
                    .iter()
                    .filter_map(|(code, delta)| Some((code.clone(), delta_of(delta)?)))
                    .collect()
            })
            .unwrap_or_default();

        let new_traits = value
            .get("newTraits")
            .and_then(Value::as_array)
            .map(|traits| {
                traits
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            stat_changes,
            new_traits,
            epithet: text_of(value, "epithet"),
            narrative: text_of(value, "narrative"),
            image_prompt_hint: text_of(value, "imagePromptHint"),
        }
    }

    /// Sum of all deltas, used to pick the rising or falling cue
    pub fn net_change(&self) -> i64 {
        self.stat_changes.values().fold(0i64, |acc, d| acc.saturating_add(*d))
    }

    /// Compact `CHA+5 LCK+3` summary of the non-zero deltas
    pub fn change_summary(&self) -> String {
        self.stat_changes
            .iter()
            .filter(|(_, delta)| **delta != 0)
            .map(|(code, delta)| format!("{}{:+}", code, delta))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn delta_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn text_of(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
