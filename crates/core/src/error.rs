//! Error types for docqa.
//!
//! One enum covers every failure the pipeline can surface. Variants are split
//! into fatal kinds, which abort a run, and scoped kinds, which only cost the
//! batch or question that raised them.

use thiserror::Error;

/// Unified error type for docqa.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source document is missing, unreadable, or in an unsupported format
    #[error("Document read error: {0}")]
    DocumentRead(String),

    /// Text-generation backend failure
    #[error("Generation error: {0}")]
    Generation(String),

    /// Embedding backend failure
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Retrieval index requested over zero answer chunks
    #[error("Cannot build a retrieval index from zero answer chunks")]
    EmptyIndex,

    /// No candidate questions survived batch generation and the fallback path
    #[error("No questions could be generated from the document")]
    NoQuestions,

    /// Chunk size / overlap pair that cannot make progress
    #[error("Invalid chunking parameters: {0}")]
    InvalidChunking(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error ends a pipeline run.
    ///
    /// Generation and embedding failures are scoped to a single batch or
    /// question and are recorded instead of propagated.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AppError::Generation(_) | AppError::Embedding(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_errors_are_not_fatal() {
        assert!(!AppError::Generation("timeout".to_string()).is_fatal());
        assert!(!AppError::Embedding("bad dims".to_string()).is_fatal());
    }

    #[test]
    fn test_fatal_errors() {
        assert!(AppError::EmptyIndex.is_fatal());
        assert!(AppError::NoQuestions.is_fatal());
        assert!(AppError::DocumentRead("missing".to_string()).is_fatal());
        assert!(AppError::InvalidChunking("overlap".to_string()).is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = AppError::DocumentRead("file not found: a.pdf".to_string());
        assert_eq!(err.to_string(), "Document read error: file not found: a.pdf");
        assert!(AppError::EmptyIndex.to_string().contains("zero answer chunks"));
    }

    #[test]
    fn test_from_serde_json() {
        let err: AppError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
