//! Prompt system for docqa.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions, built in and overridable per workspace
//! - Handlebars template rendering

pub mod builder;
pub mod library;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use library::PromptLibrary;
pub use loader::{list_prompts, load_builtin, load_prompt, PromptEntry};
pub use types::{BuiltPrompt, PromptDefinition, PromptGeneration, PromptSource};
