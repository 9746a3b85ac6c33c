//! The set of prompts one pipeline run renders.

use crate::builder::build_prompt;
use crate::loader::{load_builtin, load_prompt, ANSWER_STUFF, QUESTIONS_BATCH, QUESTIONS_SINGLE};
use crate::types::{BuiltPrompt, PromptDefinition};
use docqa_core::AppResult;
use std::collections::HashMap;
use std::path::Path;

/// Prompts for question generation and answer synthesis, resolved once.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    questions_batch: PromptDefinition,
    questions_single: PromptDefinition,
    answer_stuff: PromptDefinition,
}

impl PromptLibrary {
    /// Built-in prompts only.
    pub fn builtin() -> AppResult<Self> {
        Ok(Self {
            questions_batch: load_builtin(QUESTIONS_BATCH)?,
            questions_single: load_builtin(QUESTIONS_SINGLE)?,
            answer_stuff: load_builtin(ANSWER_STUFF)?,
        })
    }

    /// Built-in prompts with workspace overrides applied.
    pub fn for_workspace(workspace_path: &Path) -> AppResult<Self> {
        Ok(Self {
            questions_batch: load_prompt(workspace_path, QUESTIONS_BATCH)?,
            questions_single: load_prompt(workspace_path, QUESTIONS_SINGLE)?,
            answer_stuff: load_prompt(workspace_path, ANSWER_STUFF)?,
        })
    }

    /// Prompt asking for several questions about a batch of chunks.
    pub fn questions_batch(&self, text: &str) -> AppResult<BuiltPrompt> {
        build_prompt(&self.questions_batch, &vars(&[("text", text)]))
    }

    /// Prompt asking for one question about a single excerpt.
    pub fn questions_single(&self, text: &str) -> AppResult<BuiltPrompt> {
        build_prompt(&self.questions_single, &vars(&[("text", text)]))
    }

    /// Prompt answering `question` from stuffed `context`.
    pub fn answer(&self, context: &str, question: &str) -> AppResult<BuiltPrompt> {
        build_prompt(
            &self.answer_stuff,
            &vars(&[("context", context), ("question", question)]),
        )
    }
}

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_single_question_prompt() {
        let library = PromptLibrary::builtin().unwrap();
        let built = library.questions_single("Mitochondria produce ATP.").unwrap();
        assert_eq!(
            built.text,
            "Generate one specific question from this text: Mitochondria produce ATP."
        );
        assert_eq!(built.source_prompt_id, QUESTIONS_SINGLE);
    }

    #[test]
    fn test_builtin_answer_prompt() {
        let library = PromptLibrary::builtin().unwrap();
        let built = library
            .answer("Page 2: Mitochondria produce ATP.", "What produces ATP?")
            .unwrap();
        assert!(built.text.contains("Page 2: Mitochondria produce ATP.\n\nQuestion: What produces ATP?"));
        assert!(built.text.ends_with("Helpful Answer:"));
    }

    #[test]
    fn test_batch_prompt_embeds_text() {
        let library = PromptLibrary::builtin().unwrap();
        let built = library.questions_batch("[Page 1]\nSome text").unwrap();
        assert!(built.text.contains("Here is the text to analyze:\n[Page 1]\nSome text"));
    }

    #[test]
    fn test_workspace_override() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join(".docqa/prompts");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("qa.questions.single.yml"),
            r#"
id: qa.questions.single
title: Terse
apiVersion: "1.0"
variables: [text]
template: "Ask about: {{text}}"
"#,
        )
        .unwrap();

        let library = PromptLibrary::for_workspace(temp_dir.path()).unwrap();
        let built = library.questions_single("ATP").unwrap();
        assert_eq!(built.text, "Ask about: ATP");
    }
}
