use crate::operations::StripMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_DIR: &str = ".contentops";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// User every mutation is performed as
    #[serde(default = "default_acting_user_id")]
    pub acting_user_id: u64,

    /// Role granted by `roles --add`
    #[serde(default = "default_role_identifier")]
    pub role_identifier: String,

    /// Rich-text field `strip-links` operates on
    #[serde(default = "default_link_field")]
    pub link_field: String,

    #[serde(default)]
    pub strip_mode: StripMode,

    /// JSON snapshot backing the repository
    #[serde(default = "default_repository")]
    pub repository: PathBuf,

    /// Whether to use color output by default (None = auto-detect)
    #[serde(default)]
    pub use_color: Option<bool>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            acting_user_id: default_acting_user_id(),
            role_identifier: default_role_identifier(),
            link_field: default_link_field(),
            strip_mode: StripMode::default(),
            repository: default_repository(),
            use_color: None,
        }
    }
}

fn default_acting_user_id() -> u64 {
    14
}

fn default_role_identifier() -> String {
    "editor".to_string()
}

fn default_link_field() -> String {
    "body".to_string()
}

fn default_repository() -> PathBuf {
    PathBuf::from("repository.json")
}

impl Config {
    /// Load config from .contentops/config.toml if it exists
    pub fn load() -> Result<Self> {
        if let Ok(cwd) = std::env::current_dir() {
            let config_path = cwd.join(CONFIG_DIR).join("config.toml");
            if config_path.exists() {
                return Self::load_from_path(&config_path);
            }
        }

        Ok(Self::default())
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save config to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.defaults.acting_user_id, 14);
        assert_eq!(config.defaults.role_identifier, "editor");
        assert_eq!(config.defaults.link_field, "body");
        assert_eq!(config.defaults.strip_mode, StripMode::Tree);
        assert_eq!(config.defaults.repository, PathBuf::from("repository.json"));
        assert_eq!(config.defaults.use_color, None);
    }

    #[test]
    fn test_load_save_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_DIR).join("config.toml");

        let mut config = Config::default();
        config.defaults.acting_user_id = 99;
        config.defaults.strip_mode = StripMode::Flat;
        config.defaults.use_color = Some(false);
        config.save_to_path(&config_path).unwrap();

        let loaded = Config::load_from_path(&config_path).unwrap();
        assert_eq!(loaded.defaults.acting_user_id, 99);
        assert_eq!(loaded.defaults.strip_mode, StripMode::Flat);
        assert_eq!(loaded.defaults.use_color, Some(false));
    }

    #[test]
    fn test_partial_config() {
        let toml_content = r#"
[defaults]
role_identifier = "contributor"
strip_mode = "flat"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.defaults.role_identifier, "contributor");
        assert_eq!(config.defaults.strip_mode, StripMode::Flat);
        assert_eq!(config.defaults.acting_user_id, 14);
        assert_eq!(config.defaults.link_field, "body");
    }

    #[test]
    fn test_bad_config_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[defaults]\nacting_user_id = \"nope\"\n").unwrap();

        let err = Config::load_from_path(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }
}
