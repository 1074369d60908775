//! Prompt loader for built-in and workspace YAML prompt definitions.

use crate::types::PromptDefinition;
use medrag_core::{AppError, AppResult, Locale};
use std::path::{Path, PathBuf};

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    ("rag.answer.he", include_str!("../defaults/rag.answer.he.yml")),
    ("rag.answer.en", include_str!("../defaults/rag.answer.en.yml")),
];

/// Identifier of the built-in answering prompt for a locale.
pub fn prompt_id_for(locale: Locale) -> &'static str {
    match locale {
        Locale::Hebrew => "rag.answer.he",
        Locale::English => "rag.answer.en",
    }
}

/// Parse one of the prompts compiled into the binary.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, source) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("No built-in prompt: {}", prompt_id)))?;

    let definition: PromptDefinition = serde_yaml::from_str(source).map_err(|e| {
        AppError::Prompt(format!("Failed to parse built-in prompt {}: {}", prompt_id, e))
    })?;
    validate_prompt(&definition)?;
    Ok(definition)
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".medrag/prompts")
}

/// Load a prompt definition by ID from the workspace.
///
/// This function searches for a prompt file named `<id>.yml` in the
/// `.medrag/prompts/` directory.
///
/// # Arguments
/// * `workspace_path` - Root workspace directory containing `.medrag/`
/// * `prompt_id` - Prompt identifier (e.g., "rag.answer.he")
///
/// # Returns
/// A parsed `PromptDefinition` or an error if not found/invalid.
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
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

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Workspace override if present, built-in definition otherwise.
pub fn resolve_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let override_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));
    if override_file.exists() {
        return load_prompt(workspace_path, prompt_id);
    }
    builtin_prompt(prompt_id)
}

/// List all available prompt IDs: built-ins plus workspace overrides.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| id.to_string())
        .collect();

    let dir = prompts_dir(workspace_path);
    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids.sort();
    prompt_ids.dedup();
    Ok(prompt_ids)
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

    // Validate API version format (simple check)
    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_prompt(dir: &Path, id: &str, valid: bool) -> PathBuf {
        let prompts_dir = dir.join(".medrag/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();

        let content = if valid {
            format!(
                r#"
id: {}
title: "Test Prompt"
apiVersion: "1.0"
createdBy: test
behavior:
  tone: professional
  style: concise
template: "Test template: {{{{query}}}}"
output:
  format: markdown
"#,
                id
            )
        } else {
            "invalid: yaml: content:".to_string()
        };

        let file_path = prompts_dir.join(format!("{}.yml", id));
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_builtin_prompts_parse() {
        for locale in [Locale::Hebrew, Locale::English] {
            let def = builtin_prompt(prompt_id_for(locale)).unwrap();
            assert_eq!(def.id, prompt_id_for(locale));
            assert!(def.system.is_some());
            assert!(def.template.contains("{{context}}"));
            assert!(def.template.contains("{{query}}"));
        }
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(matches!(builtin_prompt("nope"), Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "test.prompt", true);

        let prompt = load_prompt(temp_dir.path(), "test.prompt").unwrap();
        assert_eq!(prompt.id, "test.prompt");
        assert_eq!(prompt.title, "Test Prompt");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "invalid", false);

        let result = load_prompt(temp_dir.path(), "invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_prefers_workspace_override() {
        let temp_dir = TempDir::new().unwrap();

        let builtin = resolve_prompt(temp_dir.path(), "rag.answer.he").unwrap();
        assert_eq!(builtin.created_by, "medrag");

        create_test_prompt(temp_dir.path(), "rag.answer.he", true);
        let overridden = resolve_prompt(temp_dir.path(), "rag.answer.he").unwrap();
        assert_eq!(overridden.created_by, "test");
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "prompt1", true);
        create_test_prompt(temp_dir.path(), "rag.answer.en", true);

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(prompts.contains(&"prompt1".to_string()));
        assert!(prompts.contains(&"rag.answer.he".to_string()));
    }
}
