//! Collection configuration management.

use crate::types::KnowledgeBaseConfig;
use medrag_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Load collection configuration.
///
/// Loads from `.medrag/knowledge/<collection>/config.yaml` if it exists,
/// otherwise returns the defaults under the provided name.
pub fn load_config(workspace: &Path, collection: &str) -> AppResult<KnowledgeBaseConfig> {
    let config_path = get_config_path(workspace, collection);

    if config_path.exists() {
        let content = fs::read_to_string(&config_path).map_err(|e| {
            AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
        })?;

        let mut config: KnowledgeBaseConfig = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
        })?;

        // Ensure name matches
        config.name = collection.to_string();

        validate_config(&config)?;
        tracing::debug!("Loaded collection config for '{}'", collection);
        Ok(config)
    } else {
        let config = KnowledgeBaseConfig {
            name: collection.to_string(),
            ..Default::default()
        };

        tracing::debug!(
            "Using default collection config for '{}' (no config file found)",
            collection
        );
        Ok(config)
    }
}

/// Save collection configuration.
pub fn save_config(workspace: &Path, config: &KnowledgeBaseConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace, &config.name);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)?;

    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved collection config for '{}'", config.name);
    Ok(())
}

fn validate_config(config: &KnowledgeBaseConfig) -> AppResult<()> {
    if config.max_chunk_size == 0 {
        return Err(AppError::Config(
            "max_chunk_size must be greater than zero".to_string(),
        ));
    }
    if config.batch_size == 0 {
        return Err(AppError::Config(
            "batch_size must be greater than zero".to_string(),
        ));
    }
    if config.embedding_dim == 0 {
        return Err(AppError::Config(
            "embedding_dim must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Get the path to a collection's config file.
pub fn get_config_path(workspace: &Path, collection: &str) -> PathBuf {
    get_base_dir(workspace, collection).join("config.yaml")
}

/// Get the directory holding a collection's files.
pub fn get_base_dir(workspace: &Path, collection: &str) -> PathBuf {
    workspace
        .join(".medrag")
        .join("knowledge")
        .join(collection)
}

/// Default location of the processed chunks written by ingestion.
pub fn get_chunks_path(workspace: &Path, collection: &str) -> PathBuf {
    get_base_dir(workspace, collection).join("processed_chunks.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path(), "oncology").unwrap();

        assert_eq!(config.name, "oncology");
        assert_eq!(config.provider, "openai");
        assert_eq!(config.max_chunk_size, 500);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let config = KnowledgeBaseConfig {
            name: "cardiology".to_string(),
            max_chunk_size: 300,
            provider: "mock".to_string(),
            ..Default::default()
        };

        save_config(temp.path(), &config).unwrap();

        let loaded = load_config(temp.path(), "cardiology").unwrap();
        assert_eq!(loaded.name, "cardiology");
        assert_eq!(loaded.max_chunk_size, 300);
        assert_eq!(loaded.provider, "mock");
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let temp = TempDir::new().unwrap();
        let path = get_config_path(temp.path(), "bad");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "name: bad\nbatch_size: 0\n").unwrap();

        assert!(matches!(
            load_config(temp.path(), "bad"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_paths() {
        let ws = Path::new("/ws");
        assert_eq!(
            get_config_path(ws, "oncology"),
            PathBuf::from("/ws/.medrag/knowledge/oncology/config.yaml")
        );
        assert!(get_chunks_path(ws, "oncology").ends_with("processed_chunks.json"));
    }
}
