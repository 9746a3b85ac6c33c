//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Every variable the definition declares must be supplied. Rendering is
/// strict, so a template referencing an unknown variable fails instead of
/// silently rendering an empty string.
///
/// # Example
/// ```no_run
/// use docqa_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("text".to_string(), "Mitochondria produce ATP.".to_string());
///
/// let built = build_prompt(&def, &vars)?;
/// println!("{}", built.text);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: &HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    if let Some(missing) = definition
        .variables
        .iter()
        .find(|name| !variables.contains_key(name.as_str()))
    {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' requires variable '{}'",
            definition.id, missing
        )));
    }

    let text = render_template(&definition.template, variables)?;

    Ok(BuiltPrompt {
        text,
        source_prompt_id: definition.id.clone(),
        generation: definition.generation,
    })
}

/// Render a Handlebars template with variables.
pub(crate) fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PromptGeneration;

    fn create_test_definition(template: &str) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            variables: vec!["text".to_string()],
            generation: PromptGeneration {
                temperature: Some(0.1),
                max_tokens: None,
            },
            template: template.to_string(),
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), "Hello, world!".to_string());

        let result = render_template("Text: {{text}}", &vars).unwrap();
        assert_eq!(result, "Text: Hello, world!");
    }

    #[test]
    fn test_render_does_not_escape() {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), "a < b && \"c\"".to_string());

        let result = render_template("{{text}}", &vars).unwrap();
        assert_eq!(result, "a < b && \"c\"");
    }

    #[test]
    fn test_build_prompt_carries_generation_settings() {
        let def = create_test_definition("Q: {{text}}");
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), "What is ATP?".to_string());

        let built = build_prompt(&def, &vars).unwrap();
        assert_eq!(built.text, "Q: What is ATP?");
        assert_eq!(built.source_prompt_id, "test.prompt");
        assert_eq!(built.generation.temperature, Some(0.1));
    }

    #[test]
    fn test_build_prompt_missing_declared_variable() {
        let def = create_test_definition("Q: {{text}}");
        let result = build_prompt(&def, &HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(msg)) if msg.contains("'text'")));
    }

    #[test]
    fn test_render_template_unknown_variable_is_strict() {
        let vars = HashMap::new();
        let result = render_template("Question: {{missing}}", &vars);
        assert!(result.is_err());
    }
}
