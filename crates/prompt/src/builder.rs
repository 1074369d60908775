//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use medrag_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// This function:
/// 1. Adds the definition's `tone` and `style` unless the caller set them
/// 2. Renders the system template, if any
/// 3. Renders the user template
/// 4. Returns a `BuiltPrompt` ready for LLM execution
///
/// # Arguments
/// * `definition` - Prompt definition (built-in or loaded from YAML)
/// * `variables` - Template variables (`institution`, `domain`, `query`, `context`)
///
/// # Example
/// ```no_run
/// use medrag_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "מה זה כימותרפיה?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    mut variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    variables
        .entry("tone".to_string())
        .or_insert_with(|| definition.behavior.tone.clone());
    variables
        .entry("style".to_string())
        .or_insert_with(|| definition.behavior.style.clone());

    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(template, &variables))
        .transpose()?;

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptBehavior, PromptOutputSpec};

    fn create_test_definition(system: Option<&str>) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            behavior: PromptBehavior {
                tone: "professional".to_string(),
                style: "concise".to_string(),
            },
            system: system.map(str::to_string),
            template: "Question: {{query}}\n\n{{context}}".to_string(),
            output: PromptOutputSpec {
                format: "markdown".to_string(),
                citation_marker: None,
            },
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{query}}", &vars);
        assert_eq!(result.unwrap(), "Question: Hello, world!");
    }

    #[test]
    fn test_no_html_escaping() {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "a < b & \"c\"".to_string());

        let result = render_template("{{context}}", &vars).unwrap();
        assert_eq!(result, "a < b & \"c\"");
    }

    #[test]
    fn test_build_prompt_without_system() {
        let def = create_test_definition(None);
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "Test question".to_string());
        vars.insert("context".to_string(), "ctx".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.user, "Question: Test question\n\nctx");
        assert!(built.system.is_none());
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_build_prompt_with_system_and_behavior() {
        let def = create_test_definition(Some("Assistant of {{institution}}. Tone: {{tone}}."));
        let mut vars = HashMap::new();
        vars.insert("institution".to_string(), "City Hospital".to_string());
        vars.insert("query".to_string(), "q".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(
            built.system.as_deref(),
            Some("Assistant of City Hospital. Tone: professional.")
        );
        assert_eq!(
            built.metadata.resolved_variables.get("style").map(String::as_str),
            Some("concise")
        );
    }

    #[test]
    fn test_invalid_template_is_prompt_error() {
        let vars = HashMap::new();
        let result = render_template("{{#if}}", &vars);
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_render_template_missing_variable() {
        let vars = HashMap::new();
        let result = render_template("Question: {{missing}}", &vars);
        // Handlebars renders missing variables as empty string
        assert_eq!(result.unwrap(), "Question: ");
    }
}
