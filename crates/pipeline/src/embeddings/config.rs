//! Embedding configuration.

use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Embedding settings for a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram", "ollama", "openai"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier (provider-specific)
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding vector dimensions
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Maximum texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Custom API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_provider() -> String {
    "trigram".to_string()
}

fn default_model() -> String {
    "trigram-v1".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_batch_size() -> usize {
    100
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dimensions: default_dimensions(),
            batch_size: default_batch_size(),
            endpoint: None,
        }
    }
}

impl EmbeddingConfig {
    /// Defaults for a named provider.
    pub fn for_provider(provider: &str) -> Self {
        match provider {
            "ollama" => Self {
                provider: "ollama".to_string(),
                model: "nomic-embed-text".to_string(),
                dimensions: 768,
                ..Default::default()
            },
            "openai" => Self {
                provider: "openai".to_string(),
                model: "text-embedding-3-small".to_string(),
                dimensions: 1536,
                ..Default::default()
            },
            _ => Self::default(),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.model.is_empty() {
            return Err(AppError::Config("embedding model cannot be empty".to_string()));
        }
        if self.dimensions == 0 {
            return Err(AppError::Config(
                "embedding dimensions must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(AppError::Config(
                "embedding batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "trigram-v1");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.batch_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_defaults() {
        let ollama = EmbeddingConfig::for_provider("ollama");
        assert_eq!(ollama.model, "nomic-embed-text");
        assert_eq!(ollama.dimensions, 768);

        let openai = EmbeddingConfig::for_provider("openai");
        assert_eq!(openai.dimensions, 1536);
    }

    #[test]
    fn test_validate_rejects_zero_dimensions() {
        let config = EmbeddingConfig {
            dimensions: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
