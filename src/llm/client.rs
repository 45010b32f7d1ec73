//! Async LLM client for impression analysis and portrait generation
//!
//! Speaks three wire formats, picked from the endpoint URL:
//! - Gemini `generateContent` (text and image)
//! - Anthropic messages
//! - OpenAI-compatible chat completions
//!
//! Only Gemini can generate images.

use crate::core::config::LlmSettings;
use crate::core::error::{AotaError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// API format type
#[derive(Debug, Clone, PartialEq)]
pub enum ApiFormat {
    Gemini,
    Anthropic,
    OpenAI,
}

pub struct LlmClient {
    client: Client,
    api_key: String,
    api_base: String,
    text_model: String,
    image_model: String,
    api_format: ApiFormat,
}

impl LlmClient {
    pub fn new(api_key: String, settings: &LlmSettings) -> Self {
        let api_format = Self::detect_api_format(&settings.api_base);
        Self {
            client: Client::new(),
            api_key,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            text_model: settings.text_model.clone(),
            image_model: settings.image_model.clone(),
            api_format,
        }
    }

    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("generativelanguage.googleapis.com") {
            ApiFormat::Gemini
        } else if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            ApiFormat::OpenAI
        }
    }

    /// Create a client with the key taken from the environment
    ///
    /// Reads `LLM_API_KEY`, falling back to `GEMINI_API_KEY`.
    pub fn from_env(settings: &LlmSettings) -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .map_err(|_| AotaError::LlmError("LLM_API_KEY / GEMINI_API_KEY not set".into()))?;
        Ok(Self::new(api_key, settings))
    }

    pub fn api_format(&self) -> &ApiFormat {
        &self.api_format
    }

    pub fn supports_images(&self) -> bool {
        self.api_format == ApiFormat::Gemini
    }

    /// Send a text completion request
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        match self.api_format {
            ApiFormat::Gemini => self.complete_gemini(system, user).await,
            ApiFormat::Anthropic => self.complete_anthropic(system, user).await,
            ApiFormat::OpenAI => self.complete_openai(system, user).await,
        }
    }

    /// Generate a portrait and return its base64 payload
    pub async fn generate_image(&self, prompt: &str) -> Result<String> {
        if !self.supports_images() {
            return Err(AotaError::LlmError(format!(
                "Image generation is not supported for {:?}",
                self.api_format
            )));
        }

        let request = GeminiRequest {
            system_instruction: None,
            contents: vec![GeminiContent::text(prompt)],
            generation_config: GenerationConfig {
                temperature: None,
                max_output_tokens: None,
                response_modalities: Some(vec!["TEXT".into(), "IMAGE".into()]),
            },
        };

        let response = self.post_gemini(&self.image_model, &request).await?;
        response
            .parts()
            .iter()
            .find_map(|part| part.inline_data.as_ref())
            .map(|data| data.data.clone())
            .ok_or_else(|| AotaError::LlmError("No image returned".into()))
    }

    /// Endpoint for a model; the key travels in a header, never in the URL
    fn gemini_url(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.api_base, model)
    }

    async fn post_gemini(&self, model: &str, request: &GeminiRequest) -> Result<GeminiResponse> {
        let response = self
            .client
            .post(self.gemini_url(model))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AotaError::LlmError(format!(
                "API error: {} {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(transport_error)
    }

    async fn complete_gemini(&self, system: &str, user: &str) -> Result<String> {
        let request = GeminiRequest {
            system_instruction: (!system.is_empty()).then(|| GeminiContent::text(system)),
            contents: vec![GeminiContent::text(user)],
            generation_config: GenerationConfig {
                temperature: Some(0.8),
                max_output_tokens: Some(500),
                response_modalities: None,
            },
        };

        let response = self.post_gemini(&self.text_model, &request).await?;
        Ok(response
            .parts()
            .iter()
            .find_map(|part| part.text.clone())
            .unwrap_or_default())
    }

    async fn complete_anthropic(&self, system: &str, user: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: self.text_model.clone(),
            max_tokens: 1024,
            system: system.into(),
            messages: vec![Message {
                role: "user".into(),
                content: user.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_base)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AotaError::LlmError(format!("API error: {}", error_text)));
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(transport_error)?;

        completion
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| AotaError::LlmError("Empty response".into()))
    }

    async fn complete_openai(&self, system: &str, user: &str) -> Result<String> {
        let request = OpenAIRequest {
            model: self.text_model.clone(),
            max_tokens: 1024,
            temperature: 0.8,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_base)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AotaError::LlmError(format!("API error: {}", error_text)));
        }

        let completion: OpenAIResponse = response
            .json()
            .await
            .map_err(transport_error)?;

        completion
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| AotaError::LlmError("Empty response".into()))
    }
}

// Gemini generateContent format
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiTextPart>,
}

impl GeminiContent {
    fn text(text: &str) -> Self {
        Self {
            parts: vec![GeminiTextPart { text: text.into() }],
        }
    }
}

#[derive(Serialize)]
struct GeminiTextPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GeminiResponse {
    /// Parts of the first candidate
    fn parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
struct InlineData {
    data: String,
}

fn transport_error(e: reqwest::Error) -> AotaError {
    AotaError::LlmError(e.without_url().to_string())
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_base: &str) -> LlmSettings {
        LlmSettings {
            api_base: api_base.into(),
            ..LlmSettings::default()
        }
    }

    #[test]
    fn test_format_detection() {
        let gemini = LlmClient::new("k".into(), &LlmSettings::default());
        assert_eq!(gemini.api_format(), &ApiFormat::Gemini);
        assert!(gemini.supports_images());

        let anthropic = LlmClient::new("k".into(), &settings("https://api.anthropic.com/v1/messages"));
        assert_eq!(anthropic.api_format(), &ApiFormat::Anthropic);
        assert!(!anthropic.supports_images());

        let openai = LlmClient::new("k".into(), &settings("https://api.deepseek.com/chat/completions"));
        assert_eq!(openai.api_format(), &ApiFormat::OpenAI);
    }

    #[test]
    fn test_gemini_url() {
        let client = LlmClient::new("secret".into(), &settings("https://generativelanguage.googleapis.com/v1beta/models/"));
        assert_eq!(
            client.gemini_url("gemini-2.0-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let client = LlmClient::new(
            "SUPER_SECRET_KEY".into(),
            &settings("http://127.0.0.1:1/generativelanguage.googleapis.com"),
        );
        assert_eq!(client.api_format(), &ApiFormat::Gemini);

        let err = client.complete("system", "hello").await.unwrap_err();
        assert!(matches!(err, AotaError::LlmError(_)));
        assert!(!err.to_string().contains("SUPER_SECRET_KEY"));
        assert!(!format!("{:?}", err).contains("SUPER_SECRET_KEY"));

        let err = client.generate_image("portrait").await.unwrap_err();
        assert!(!err.to_string().contains("SUPER_SECRET_KEY"));
    }

    #[test]
    fn test_gemini_request_shape() {
        let request = GeminiRequest {
            system_instruction: None,
            contents: vec![GeminiContent::text("hello")],
            generation_config: GenerationConfig {
                temperature: Some(0.8),
                max_output_tokens: Some(500),
                response_modalities: None,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 500);
        assert!(json.get("systemInstruction").is_none());
        assert!(json["generationConfig"].get("responseModalities").is_none());
    }

    #[test]
    fn test_gemini_response_finds_inline_image() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"here"},{"inlineData":{"mimeType":"image/png","data":"QUJD"}}]}}]}"#,
        )
        .unwrap();
        let image = response.parts().iter().find_map(|p| p.inline_data.as_ref());
        assert_eq!(image.map(|d| d.data.as_str()), Some("QUJD"));
    }

    #[test]
    fn test_empty_gemini_response_has_no_parts() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(response.parts().is_empty());
    }
}
