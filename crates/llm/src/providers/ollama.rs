//! Ollama generation provider.
//!
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::types::GenerationSettings;
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Body of `POST /api/generate`.
#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<SamplingOptions>,
    /// Seconds to keep the model loaded; 0 unloads it immediately
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<i64>,
    stream: bool,
}

#[derive(Debug, Serialize, PartialEq)]
struct SamplingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl SamplingOptions {
    fn from_settings(settings: GenerationSettings) -> Option<Self> {
        if settings == GenerationSettings::default() {
            return None;
        }
        Some(Self {
            temperature: settings.temperature,
            num_predict: settings.max_tokens,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    model: String,
    #[serde(default)]
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl From<GenerateReply> for LlmResponse {
    fn from(reply: GenerateReply) -> Self {
        LlmResponse {
            content: reply.response,
            model: reply.model,
            usage: LlmUsage::new(
                reply.prompt_eval_count.unwrap_or(0),
                reply.eval_count.unwrap_or(0),
            ),
        }
    }
}

/// Client for a local or remote Ollama server.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Client for http://localhost:11434.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_OLLAMA_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Apply a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> AppResult<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    fn generate_body<'a>(request: &'a LlmRequest) -> GenerateBody<'a> {
        GenerateBody {
            model: &request.model,
            prompt: &request.prompt,
            options: SamplingOptions::from_settings(request.settings),
            keep_alive: None,
            stream: false,
        }
    }

    async fn post_generate(&self, body: &GenerateBody<'_>) -> AppResult<GenerateReply> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to reach Ollama at {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Generation(format!(
                "Ollama API error ({}): {}",
                status, detail
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse Ollama response: {}", e)))
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, prompt_len = request.prompt.len(), "Sending generate request to Ollama");

        let reply = self.post_generate(&Self::generate_body(request)).await?;
        Ok(reply.into())
    }

    /// Unload the model from Ollama's memory with `keep_alive: 0`.
    async fn unload(&self, model: &str) -> AppResult<()> {
        let body = GenerateBody {
            model,
            prompt: "",
            options: None,
            keep_alive: Some(0),
            stream: false,
        };

        self.post_generate(&body).await?;
        tracing::debug!(model = %model, "Ollama model unloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url_and_trailing_slash() {
        assert_eq!(OllamaClient::new().base_url, "http://localhost:11434");
        assert_eq!(
            OllamaClient::with_base_url("http://gpu-box:11434/").base_url,
            "http://gpu-box:11434"
        );
    }

    #[test]
    fn test_generate_body_carries_sampling() {
        let request = LlmRequest::new("Hello", "llama3").with_settings(GenerationSettings {
            temperature: Some(0.7),
            max_tokens: Some(100),
        });

        let body = OllamaClient::generate_body(&request);
        assert_eq!(body.model, "llama3");
        assert!(!body.stream);
        assert_eq!(
            body.options,
            Some(SamplingOptions {
                temperature: Some(0.7),
                num_predict: Some(100),
            })
        );
    }

    #[test]
    fn test_default_settings_omit_options() {
        let request = LlmRequest::new("Hello", "llama3");
        let json = serde_json::to_value(OllamaClient::generate_body(&request)).unwrap();
        assert!(json.get("options").is_none());
        assert!(json.get("keep_alive").is_none());
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_reply_conversion() {
        let raw = r#"{"model":"llama3","response":"What is ATP?","done":true,"prompt_eval_count":12,"eval_count":4}"#;
        let reply: GenerateReply = serde_json::from_str(raw).unwrap();

        let response = LlmResponse::from(reply);
        assert_eq!(response.content, "What is ATP?");
        assert_eq!(response.usage.total(), 16);
    }
}
