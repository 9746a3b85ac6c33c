//! Generation model resource with an explicit acquire/release lifecycle.
//!
//! A `ModelHandle` is created once by the top-level entry point, borrowed by
//! every stage that generates text, and released exactly once when the run is
//! over. Generating through a released handle is an error.

use crate::client::{LlmClient, LlmRequest};
use crate::types::GenerationSettings;
use docqa_core::{AppError, AppResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Owned handle to a generation model.
pub struct ModelHandle {
    client: Option<Arc<dyn LlmClient>>,
    model: String,
    provider: String,
    calls: AtomicU64,
    tokens: AtomicU64,
}

impl ModelHandle {
    /// Acquire a handle for `model` served by `client`.
    pub fn acquire(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        let model = model.into();
        let provider = client.provider_name().to_string();
        tracing::debug!(provider = %provider, model = %model, "Acquired model handle");

        Self {
            client: Some(client),
            model,
            provider,
            calls: AtomicU64::new(0),
            tokens: AtomicU64::new(0),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Number of generation calls issued through this handle.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Prompt plus completion tokens reported by the backend so far.
    pub fn tokens(&self) -> u64 {
        self.tokens.load(Ordering::Relaxed)
    }

    pub fn is_released(&self) -> bool {
        self.client.is_none()
    }

    /// Generate text for `prompt` with the backend's sampling defaults.
    pub async fn generate(&self, prompt: &str) -> AppResult<String> {
        self.generate_with(prompt, GenerationSettings::default())
            .await
    }

    /// Generate text for `prompt` with explicit sampling `settings`.
    pub async fn generate_with(
        &self,
        prompt: &str,
        settings: GenerationSettings,
    ) -> AppResult<String> {
        let client = self.client.as_ref().ok_or_else(|| {
            AppError::Generation(format!("Model '{}' has already been released", self.model))
        })?;

        let request = LlmRequest::new(prompt, &self.model).with_settings(settings);

        self.calls.fetch_add(1, Ordering::Relaxed);
        let response = client.complete(&request).await.map_err(|e| match e {
            AppError::Generation(_) => e,
            other => AppError::Generation(other.to_string()),
        })?;

        self.tokens
            .fetch_add(u64::from(response.usage.total()), Ordering::Relaxed);

        tracing::debug!(
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Generation completed"
        );

        Ok(response.content)
    }

    /// Release the model's backend resources.
    ///
    /// The first call unloads the model; later calls are no-ops.
    pub async fn release(&mut self) -> AppResult<()> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };

        tracing::info!(
            provider = %self.provider,
            model = %self.model,
            calls = self.calls(),
            tokens = self.tokens(),
            "Releasing model"
        );

        client.unload(&self.model).await
    }

    /// Release the model and hand back `result`.
    ///
    /// A release failure is logged, and only returned when `result` is `Ok`.
    pub async fn release_after<T>(&mut self, result: AppResult<T>) -> AppResult<T> {
        if let Err(e) = self.release().await {
            tracing::warn!("Failed to release model '{}': {}", self.model, e);
            if result.is_ok() {
                return Err(e);
            }
        }
        result
    }
}

impl Drop for ModelHandle {
    fn drop(&mut self) {
        if self.client.is_some() {
            tracing::warn!(model = %self.model, "Model handle dropped without release");
        }
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("released", &self.is_released())
            .field("calls", &self.calls())
            .finish()
    }
}
