// src/core/config_manager.rs
//! Unified configuration management: config.yaml sections plus environment overrides

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::FsOps;

pub const DEFAULT_PORT: u16 = 8010;
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: EnvironmentConfig,
    pub generation: GenerationConfig,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    pub data_path: PathBuf,
    pub download_path: PathBuf,
    pub database_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            api_key: None,
            timeout_seconds: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct EnvironmentSection {
    #[serde(flatten)]
    paths: EnvironmentConfig,
    #[serde(default)]
    generation: Option<GenerationConfig>,
    #[serde(default)]
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentSection,
    production: EnvironmentSection,
}

impl ConfigManager {
    /// Load configuration for the current environment
    pub fn load() -> Result<Self> {
        let environment = Self::environment_name();
        info!("Loading configuration for environment: {}", environment);

        let base_dir = std::env::current_dir().context("Failed to get current directory")?;
        let config_path = base_dir.join("config.yaml");

        let section = if config_path.exists() {
            Some(Self::load_section(&config_path, &environment)?)
        } else {
            None
        };

        let config = Self::from_section(section, &base_dir);
        Ok(config.with_env_overrides(&base_dir))
    }

    fn environment_name() -> String {
        std::env::var("CV_STUDIO_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn load_section(path: &Path, environment: &str) -> Result<EnvironmentSection> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(match environment {
            "production" => file.production,
            _ => file.local,
        })
    }

    fn from_section(section: Option<EnvironmentSection>, base_dir: &Path) -> Self {
        match section {
            Some(section) => Self {
                environment: EnvironmentConfig {
                    data_path: FsOps::normalize_path(base_dir, &section.paths.data_path),
                    download_path: FsOps::normalize_path(base_dir, &section.paths.download_path),
                    database_path: FsOps::normalize_path(base_dir, &section.paths.database_path),
                },
                generation: section.generation.unwrap_or_default(),
                port: section.port.unwrap_or(DEFAULT_PORT),
            },
            None => Self {
                environment: EnvironmentConfig {
                    data_path: base_dir.join("data"),
                    download_path: base_dir.join("downloads"),
                    database_path: base_dir.join("data").join("skills.db"),
                },
                generation: GenerationConfig::default(),
                port: DEFAULT_PORT,
            },
        }
    }

    fn with_env_overrides(mut self, base_dir: &Path) -> Self {
        if let Ok(dir) = std::env::var("CV_STUDIO_DATA_DIR") {
            self.environment.data_path = FsOps::normalize_path(base_dir, Path::new(&dir));
        }
        if let Ok(dir) = std::env::var("CV_STUDIO_DOWNLOAD_DIR") {
            self.environment.download_path = FsOps::normalize_path(base_dir, Path::new(&dir));
        }
        if let Ok(path) = std::env::var("CV_STUDIO_DATABASE") {
            self.environment.database_path = FsOps::normalize_path(base_dir, Path::new(&path));
        }
        if let Some(port) = std::env::var("CV_STUDIO_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
        {
            self.port = port;
        }
        if let Ok(url) = std::env::var("OPENAI_API_URL") {
            self.generation.api_url = url;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            self.generation.model = model;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.generation.api_key = Some(key);
            }
        }
        self
    }

    /// File backing the client-side key-value storage (snapshot slot and settings)
    pub fn settings_path(&self) -> PathBuf {
        self.environment.data_path.join("storage.json")
    }

    /// Ensure all required directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        FsOps::ensure_dir_exists(&self.environment.data_path).await?;
        FsOps::ensure_dir_exists(&self.environment.download_path).await?;

        if let Some(db_parent) = self.environment.database_path.parent() {
            FsOps::ensure_dir_exists(db_parent).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_sections_resolve_relative_paths() {
        let yaml = r#"
local:
  data_path: data
  download_path: out
  database_path: data/skills.db
production:
  data_path: /app/data
  download_path: /app/out
  database_path: /app/data/skills.db
  port: 9000
  generation:
    model: gpt-4o
"#;
        let file: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        let base = PathBuf::from("/srv/studio");

        let local = ConfigManager::from_section(Some(file.local), &base);
        assert_eq!(local.environment.data_path, base.join("data"));
        assert_eq!(local.port, DEFAULT_PORT);
        assert_eq!(local.generation.model, DEFAULT_MODEL);

        let production = ConfigManager::from_section(Some(file.production), &base);
        assert_eq!(production.environment.download_path, PathBuf::from("/app/out"));
        assert_eq!(production.port, 9000);
        assert_eq!(production.generation.model, "gpt-4o");
        assert_eq!(production.generation.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_defaults_without_config_file() {
        let base = PathBuf::from("/tmp/studio");
        let config = ConfigManager::from_section(None, &base);
        assert_eq!(config.environment.download_path, base.join("downloads"));
        assert_eq!(config.settings_path(), base.join("data").join("storage.json"));
        assert!(config.generation.api_key.is_none());
    }
}
