//! Battle transcripts and results
//!
//! A transcript is the ordered list of tagged narrative lines one battle
//! produced. Results are created once and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Semantic tag of a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogKind {
    Appear,
    Info,
    Attack,
    Crit,
    Dodge,
    EnemyAttack,
    Defeat,
    Lose,
    Draw,
    Result,
    Bonus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub text: String,
}

impl LogLine {
    pub fn new(kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Ordered transcript of one battle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    lines: Vec<LogLine>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: LogKind, text: impl Into<String>) {
        self.lines.push(LogLine::new(kind, text));
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn count(&self, kind: LogKind) -> usize {
        self.lines.iter().filter(|line| line.kind == kind).count()
    }

    pub fn contains(&self, kind: LogKind) -> bool {
        self.lines.iter().any(|line| line.kind == kind)
    }
}

/// Outcome of one resolved battle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleResult {
    #[serde(rename = "enemy")]
    pub adversary: String,
    pub won: bool,
    pub rounds: u32,
    pub log: Transcript,
    #[serde(rename = "playerHP", default)]
    pub player_hp: u32,
    #[serde(rename = "playerMaxHP", default)]
    pub player_max_hp: u32,
    #[serde(rename = "enemyHP", default)]
    pub adversary_hp: u32,
    #[serde(rename = "enemyMaxHP", default)]
    pub adversary_max_hp: u32,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub resolved_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_kind_tags() {
        let json = serde_json::to_string(&LogKind::EnemyAttack).unwrap();
        assert_eq!(json, "\"enemy-attack\"");
        let json = serde_json::to_string(&LogKind::Crit).unwrap();
        assert_eq!(json, "\"crit\"");
    }

    #[test]
    fn test_line_serializes_with_type_key() {
        let line = LogLine::new(LogKind::Dodge, "ひらり");
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["type"], "dodge");
        assert_eq!(json["text"], "ひらり");
    }

    #[test]
    fn test_transcript_counts() {
        let mut transcript = Transcript::new();
        transcript.push(LogKind::Attack, "a");
        transcript.push(LogKind::Attack, "b");
        transcript.push(LogKind::Defeat, "c");

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.count(LogKind::Attack), 2);
        assert!(transcript.contains(LogKind::Defeat));
        assert!(!transcript.contains(LogKind::Lose));
    }

    #[test]
    fn test_stored_record_without_hp_fields_loads() {
        let record: BattleResult = serde_json::from_str(
            r#"{"enemy":"THE VOID","won":false,"rounds":4,"log":[{"type":"lose","text":"x"}],"timestamp":1741230000000}"#,
        )
        .unwrap();
        assert_eq!(record.adversary, "THE VOID");
        assert_eq!(record.player_hp, 0);
        assert_eq!(record.log.count(LogKind::Lose), 1);
    }
}
