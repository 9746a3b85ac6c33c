//! Text-generation integration for docqa.
//!
//! This crate provides a provider-agnostic abstraction over the generation
//! capability the pipeline consumes: `generate(prompt) -> text`.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI**: Chat completions API (and compatible servers)
//! - **Mock**: Scripted responses for tests
//!
//! # Example
//! ```no_run
//! use docqa_llm::{ModelHandle, providers::OllamaClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut model = ModelHandle::acquire(Arc::new(OllamaClient::new()), "llama3.2");
//! let text = model.generate("Hello, world!").await?;
//! println!("{}", text);
//! model.release().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod handle;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use handle::ModelHandle;
pub use providers::{MockClient, OllamaClient, OpenAiClient};
pub use types::{GenerationSettings, ProviderType};
