//! Turn a free-text impression into an `AnalysisResult`
//!
//! Transport failures propagate so the caller can drop the submission. A reply
//! that arrives but cannot be decoded degrades to a small uniform bump instead.

use crate::core::error::Result;
use crate::core::types::StatCode;
use crate::llm::client::LlmClient;
use crate::llm::context::ImpressionContext;
use crate::progression::analysis::AnalysisResult;
use serde_json::Value;

/// Epithet used by the fallback when the character has none yet
pub const FALLBACK_EPITHET: &str = "旅人";
pub const FALLBACK_NARRATIVE: &str = "なにかが変わった気がする…";
pub const FALLBACK_IMAGE_HINT: &str = "portrait of a Japanese man";

/// Analyze one impression against the current character
pub async fn analyze_impression(
    client: &LlmClient,
    impression: &str,
    context: &ImpressionContext,
) -> Result<AnalysisResult> {
    let reply = client
        .complete(
            &context.analysis_instructions(),
            &context.analysis_request(impression),
        )
        .await?;
    Ok(decode_reply(&reply, context))
}

/// Decode a raw reply, falling back when it holds no usable JSON object
pub fn decode_reply(reply: &str, context: &ImpressionContext) -> AnalysisResult {
    let value = extract_json(reply).and_then(|json| serde_json::from_str::<Value>(json).ok());
    match value {
        Some(value) if value.is_object() => AnalysisResult::from_value(&value),
        _ => {
            tracing::warn!(reply, "Unreadable analysis reply, using fallback");
            fallback_analysis(context)
        }
    }
}

/// +1 to every attribute and nothing else
pub fn fallback_analysis(context: &ImpressionContext) -> AnalysisResult {
    let epithet = if context.epithet.is_empty() {
        FALLBACK_EPITHET.to_string()
    } else {
        context.epithet.clone()
    };

    AnalysisResult {
        stat_changes: StatCode::ALL
            .iter()
            .map(|code| (code.as_str().to_string(), 1))
            .collect(),
        new_traits: Vec::new(),
        epithet,
        narrative: FALLBACK_NARRATIVE.to_string(),
        image_prompt_hint: FALLBACK_IMAGE_HINT.to_string(),
    }
}

/// Extract the JSON object from a reply (handles code fences and surrounding text)
fn extract_json(reply: &str) -> Option<&str> {
    let body = strip_code_fence(reply.trim());
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (start < end).then(|| &body[start..=end])
}

/// Contents of the first ``` fenced block, or the input unchanged
fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let rest = &text[open + 3..];
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.find("```") {
        Some(close) => rest[..close].trim(),
        None => text,
    }
}
