//! Generation client abstraction.
//!
//! The pipeline only ever needs one capability from a model backend:
//! send a prompt, get text back. `LlmClient` is that seam.

use crate::types::GenerationSettings;
use docqa_core::AppResult;

/// One prompt addressed to one model.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub prompt: String,

    /// Model identifier (e.g., "llama3.2", "gpt-3.5-turbo")
    pub model: String,

    /// Sampling parameters; unset fields use the backend's defaults
    pub settings: GenerationSettings,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Text returned by a backend.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,

    /// Model that generated the response, as reported by the backend
    pub model: String,

    pub usage: LlmUsage,
}

/// Token counts reported by a backend, zero when it reports none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Trait for text-generation providers.
///
/// Implementations report backend failures as `AppError::Generation`.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama", "openai").
    fn provider_name(&self) -> &str;

    /// Generate a full completion for `request`.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;

    /// Release backend resources held for `model` (weights, device memory).
    ///
    /// Providers without server-side state keep the default no-op.
    async fn unload(&self, _model: &str) -> AppResult<()> {
        Ok(())
    }
}
