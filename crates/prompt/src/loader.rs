//! Prompt loader for built-in and workspace YAML prompt definitions.

use crate::types::{PromptDefinition, PromptSource};
use docqa_core::{AppError, AppResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const QUESTIONS_BATCH: &str = "qa.questions.batch";
pub const QUESTIONS_SINGLE: &str = "qa.questions.single";
pub const ANSWER_STUFF: &str = "qa.answer.stuff";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (
        QUESTIONS_BATCH,
        include_str!("../prompts/qa.questions.batch.yml"),
    ),
    (
        QUESTIONS_SINGLE,
        include_str!("../prompts/qa.questions.single.yml"),
    ),
    (ANSWER_STUFF, include_str!("../prompts/qa.answer.stuff.yml")),
];

/// A prompt available to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptEntry {
    pub id: String,
    pub title: String,
    pub source: PromptSource,
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".docqa/prompts")
}

/// Load a prompt definition by ID.
///
/// A file named `<id>.yml` in the workspace's `.docqa/prompts/` directory
/// takes precedence over the built-in definition of the same ID.
///
/// # Example
/// ```no_run
/// use docqa_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "qa.answer.stuff")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    if prompt_file.exists() {
        tracing::debug!("Loading prompt from: {:?}", prompt_file);
        let definition = load_prompt_file(&prompt_file)?;
        if definition.id != prompt_id {
            return Err(AppError::Prompt(format!(
                "Prompt file {:?} declares id '{}', expected '{}'",
                prompt_file, definition.id, prompt_id
            )));
        }
        tracing::info!("Loaded workspace prompt: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    load_builtin(prompt_id)
}

/// Load one of the prompts compiled into the binary.
pub fn load_builtin(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, contents) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;

    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse built-in prompt {}: {}", prompt_id, e))
    })?;
    validate_prompt(&definition)?;

    Ok(definition)
}

fn load_prompt_file(prompt_file: &Path) -> AppResult<PromptDefinition> {
    let contents = std::fs::read_to_string(prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// List built-in prompts plus any workspace prompts, sorted by ID.
///
/// Workspace files shadow built-ins with the same ID.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<PromptEntry>> {
    let mut entries = BTreeMap::new();

    for (id, _) in BUILTIN_PROMPTS {
        let definition = load_builtin(id)?;
        entries.insert(
            definition.id.clone(),
            PromptEntry {
                id: definition.id,
                title: definition.title,
                source: PromptSource::Builtin,
            },
        );
    }

    let dir = prompts_dir(workspace_path);
    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("yml") {
                continue;
            }

            match load_prompt_file(path) {
                Ok(definition) => {
                    entries.insert(
                        definition.id.clone(),
                        PromptEntry {
                            id: definition.id,
                            title: definition.title,
                            source: PromptSource::Workspace,
                        },
                    );
                }
                Err(e) => tracing::warn!("Skipping invalid prompt {:?}: {}", path, e),
            }
        }
    }

    Ok(entries.into_values().collect())
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.api_version.is_empty() {
        return Err(AppError::Prompt(
            "Prompt apiVersion cannot be empty".to_string(),
        ));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if let Some(missing) = def
        .variables
        .iter()
        .find(|name| !def.template.contains(&format!("{{{{{}}}}}", name)))
    {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' declares variable '{}' but its template never uses it",
            def.id, missing
        )));
    }

    Ok(())
}
