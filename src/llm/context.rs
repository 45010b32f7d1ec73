//! Prompt context for impression analysis and portrait generation
//!
//! `ImpressionContext` is a read-only snapshot of the character taken when a
//! request starts, so a prompt never sees a half-applied update.

use crate::core::types::Stats;
use crate::llm::parser::FALLBACK_IMAGE_HINT;
use crate::progression::stage::Stage;
use crate::progression::state::ProgressionState;

/// Traits included in a portrait prompt
pub const IMAGE_PROMPT_TRAITS: usize = 6;

/// Character snapshot used to build prompts
#[derive(Debug, Clone, PartialEq)]
pub struct ImpressionContext {
    pub stats: Stats,
    pub stage: Stage,
    pub traits: Vec<String>,
    pub epithet: String,
    pub total_input_count: u32,
}

impl ImpressionContext {
    pub fn from_state(state: &ProgressionState) -> Self {
        Self {
            stats: state.stats,
            stage: state.stage(),
            traits: state.traits.clone(),
            epithet: state.epithet.clone(),
            total_input_count: state.total_input_count,
        }
    }

    /// `STR:30 INT:30 ...` in display order
    pub fn stat_line(&self) -> String {
        self.stats
            .iter()
            .map(|(code, value)| format!("{}:{}", code, value))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Current state block appended to the analysis instructions
    pub fn summary(&self) -> String {
        let traits = if self.traits.is_empty() {
            "なし".to_string()
        } else {
            self.traits.join(", ")
        };
        let epithet = if self.epithet.is_empty() {
            "なし"
        } else {
            &self.epithet
        };

        format!(
            "現在のステータス：\n{}\n\n現在のステージ：{} ({})\n現在の特性：{}\n現在の称号：{}\n累計入力数：{}",
            self.stat_line(),
            self.stage.ordinal(),
            self.stage.name(),
            traits,
            epithet,
            self.total_input_count
        )
    }

    /// System prompt for analyzing one impression
    pub fn analysis_instructions(&self) -> String {
        format!(
            "{}\n5. imagePromptHint: キャラクター画像生成のためのヒント（英語、20語以内）。ステージ{}のトーン「{}」を反映すること。\n\n{}",
            ANALYSIS_RULES,
            self.stage.ordinal(),
            self.stage.tone(),
            ANALYSIS_OUTPUT_FORMAT
        )
    }

    /// User message carrying the impression and the current state
    pub fn analysis_request(&self, impression: &str) -> String {
        format!(
            "来場者がキャラクター「青田 努」について以下の印象・評価・想像を入力しました：\n\n「{}」\n\n{}",
            impression,
            self.summary()
        )
    }

    /// Prompt for a new portrait
    pub fn image_prompt(&self, hint: &str) -> String {
        let traits: Vec<&str> = self
            .traits
            .iter()
            .take(IMAGE_PROMPT_TRAITS)
            .map(String::as_str)
            .collect();
        let traits = if traits.is_empty() {
            "ordinary person".to_string()
        } else {
            traits.join(", ")
        };
        let hint = match hint.trim() {
            "" => FALLBACK_IMAGE_HINT,
            hint => hint,
        };
        let title = if self.epithet.is_empty() {
            "none"
        } else {
            &self.epithet
        };

        let mut lines = vec![
            "Generate a character portrait image.".to_string(),
            "Subject: A Japanese man named \"Aota Tsutomu\", age around 40.".to_string(),
            format!(
                "Stage {} \"{}\": {}",
                self.stage.ordinal(),
                self.stage.name(),
                self.stage.tone()
            ),
            format!("Visual hint: {}", hint),
            format!("Traits: {}", traits),
            format!("Stats - {}", self.stat_line()),
            format!("Title: {}", title),
            String::new(),
            "Style: RPG character portrait, dramatic lighting, fantasy art style.".to_string(),
        ];
        if self.stage >= Stage::Concept {
            lines.push("Abstract, geometric, transcendent being.".to_string());
        }
        if self.stage >= Stage::FinalForm {
            lines.push("Epic, godlike, cosmic energy, final form.".to_string());
        }
        lines.push("Square format, centered composition.".to_string());
        lines.join("\n")
    }
}

const ANALYSIS_RULES: &str = "あなたはRPGゲームのマスターAIです。
来場者の入力をもとに、キャラクターの変化を以下のルールに従ってJSON形式で返答してください：
1. statChanges: 各ステータスの変動値（-5〜+10の整数）。ポジティブな入力→CHA/LCK上昇傾向、ネガティブな入力→STR/INT上昇傾向。入力内容に関連するステータスをより大きく変動させる。
2. newTraits: 入力から連想される新しい特性（4文字以内、1〜2個）。既存特性と重複しないこと。
3. epithet: 現在の状態を反映した称号（10文字以内）。前回と同じでもよい。
4. narrative: 世界観テキスト（ドラクエ風のナレーション、40文字以内）。";

const ANALYSIS_OUTPUT_FORMAT: &str = r#"JSONのみを返してください。マークダウンのコードブロックは使わないでください。

{
  "statChanges": {"STR":0,"INT":0,"AGI":0,"CHA":0,"WIS":0,"LCK":0},
  "newTraits": [],
  "epithet": "",
  "narrative": "",
  "imagePromptHint": ""
}"#;
