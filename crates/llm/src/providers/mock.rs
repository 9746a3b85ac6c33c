//! Scripted LLM client for tests and offline runs.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docqa_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::Mutex;

type Handler = dyn Fn(&str) -> AppResult<String> + Send + Sync;

const DEFAULT_RESPONSE: &str = "mock response";

/// Mock client whose responses come from a closure over the prompt.
///
/// Every request is recorded so tests can assert on the prompts a stage
/// produced and on how many calls it made.
pub struct MockClient {
    handler: Box<Handler>,
    requests: Mutex<Vec<LlmRequest>>,
    unloaded: Mutex<Vec<String>>,
}

impl MockClient {
    /// Respond to each prompt with `handler(prompt)`.
    pub fn new(handler: impl Fn(&str) -> AppResult<String> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            unloaded: Mutex::new(Vec::new()),
        }
    }

    /// Return `responses` in order, then a fixed default response.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::new(move |_prompt| {
            let next = queue
                .lock()
                .map_err(|e| AppError::Generation(format!("mock queue poisoned: {}", e)))?
                .pop_front();
            Ok(next.unwrap_or_else(|| DEFAULT_RESPONSE.to_string()))
        })
    }

    /// Fail every request with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_prompt| Err(AppError::Generation(message.clone())))
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }

    /// Models released through `unload`.
    pub fn unloaded_models(&self) -> Vec<String> {
        self.unloaded
            .lock()
            .map(|models| models.clone())
            .unwrap_or_default()
    }
}

/// Whitespace-separated words, standing in for a token count.
fn word_count(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

impl std::fmt::Debug for MockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockClient")
            .field("requests", &self.requests().len())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let content = (self.handler)(&request.prompt)?;
        let usage = LlmUsage::new(word_count(&request.prompt), word_count(&content));

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage,
        })
    }

    async fn unload(&self, model: &str) -> AppResult<()> {
        if let Ok(mut unloaded) = self.unloaded.lock() {
            unloaded.push(model.to_string());
        }
        Ok(())
    }
}
