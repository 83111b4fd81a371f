use std::{collections::HashMap, env, fs, path::{Path, PathBuf}};
use crate::errors::ConfigError;

use super::app_config::{
    ContainerConfig, PartialContainerConfig, CONFIG_FILE_NAME, ENV_LOG_LEVEL, ENV_RESOURCE_FORMAT,
    ENV_RESOURCE_ROOT, USER_CONFIG_PATH,
};

/// Configuration loader responsible for loading config from files and environment
pub struct ConfigLoader {
    base_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default paths
    pub fn new() -> Self {
        Self { base_path: None }
    }

    /// Create a config loader with custom base path (for testing)
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self { base_path: Some(base_path) }
    }

    /// Load complete runtime configuration
    pub fn load_config(&self) -> Result<ContainerConfig, ConfigError> {
        let config_path = self.config_path();
        let partial_config = self.load_partial_config(&config_path)?;
        let env_map = self.collect_env_vars();
        ContainerConfig::from_partial_and_env(partial_config, env_map)
    }

    /// Location of the user configuration file
    pub fn config_path(&self) -> PathBuf {
        self.extract_file_path(USER_CONFIG_PATH, CONFIG_FILE_NAME)
    }

    /// Extract file path with tilde expansion and base path override
    fn extract_file_path(&self, base_dir: &str, file_name: &str) -> PathBuf {
        let expanded_base = if let Some(base_path) = &self.base_path {
            // For testing: use custom base path
            base_path.join(base_dir.trim_start_matches("~/"))
        } else {
            let expanded = shellexpand::tilde(base_dir);
            PathBuf::from(expanded.as_ref())
        };

        expanded_base.join(file_name)
    }

    /// Load partial configuration from TOML file; a missing file is not an error
    fn load_partial_config(&self, config_path: &Path) -> Result<Option<PartialContainerConfig>, ConfigError> {
        if !config_path.exists() {
            tracing::debug!("配置文件 {:?} 不存在，使用默认配置", config_path);
            return Ok(None);
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            ConfigError::FileRead(config_path.to_string_lossy().to_string(), e)
        })?;

        let partial_config: PartialContainerConfig = toml::from_str(&content).map_err(|e| {
            ConfigError::TomlParse(config_path.to_string_lossy().to_string(), e)
        })?;

        tracing::info!("已加载配置文件: {:?}", config_path);
        Ok(Some(partial_config))
    }

    /// Collect relevant environment variables
    fn collect_env_vars(&self) -> HashMap<String, String> {
        let env_keys = [ENV_RESOURCE_ROOT, ENV_RESOURCE_FORMAT, ENV_LOG_LEVEL];

        let mut env_map = HashMap::new();
        for key in &env_keys {
            if let Ok(value) = env::var(key) {
                env_map.insert(key.to_string(), value);
            }
        }
        env_map
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::resources::ResourceFormat;
    use tempfile::TempDir;

    fn create_test_loader() -> (ConfigLoader, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_base_path(temp_dir.path().to_path_buf());
        (loader, temp_dir)
    }

    #[test]
    fn test_extract_file_path() {
        let (loader, temp_dir) = create_test_loader();
        let path = loader.config_path();
        assert_eq!(path, temp_dir.path().join(".config/scene-di/config.toml"));
    }

    #[test]
    fn test_missing_file_yields_none() {
        let (loader, _temp_dir) = create_test_loader();
        assert!(loader.load_partial_config(&loader.config_path()).unwrap().is_none());
    }

    #[test]
    fn test_load_partial_config_from_file() {
        let (loader, _temp_dir) = create_test_loader();
        let config_path = loader.config_path();
        fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        fs::write(&config_path, "[resources]\nroot = \"assets\"\nformat = \"toml\"\n").unwrap();

        let partial = loader.load_partial_config(&config_path).unwrap();
        let config = ContainerConfig::from_partial_and_env(partial, HashMap::new()).unwrap();
        assert_eq!(config.resources.root, "assets");
        assert_eq!(config.resources.format, ResourceFormat::Toml);
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let (loader, _temp_dir) = create_test_loader();
        let config_path = loader.config_path();
        fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        fs::write(&config_path, "[resources\nroot = 1").unwrap();

        let err = loader.load_partial_config(&config_path).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(..)));
    }
}
