use serde::Deserialize;
use std::{collections::HashMap, path::PathBuf};
use crate::errors::ConfigError;
use crate::infrastructure::resources::ResourceFormat;
use crate::logging::{parse_log_level, LogFormat, LoggingConfig};

use super::loader::ConfigLoader;

// Configuration location constants
pub const USER_CONFIG_PATH: &str = "~/.config/scene-di";
pub const CONFIG_FILE_NAME: &str = "config.toml";

// Environment overrides
pub const ENV_RESOURCE_ROOT: &str = "SCENE_DI_RESOURCE_ROOT";
pub const ENV_RESOURCE_FORMAT: &str = "SCENE_DI_RESOURCE_FORMAT";
pub const ENV_LOG_LEVEL: &str = "SCENE_DI_LOG_LEVEL";

const DEFAULT_RESOURCE_ROOT: &str = "resources";

/// Where resource-backed services are read from
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceConfig {
    pub root: String,
    pub format: ResourceFormat,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_RESOURCE_ROOT.to_string(),
            format: ResourceFormat::Json,
        }
    }
}

/// Main container runtime configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerConfig {
    pub resources: ResourceConfig,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialResourceConfig {
    root: Option<String>,
    format: Option<ResourceFormat>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialLoggingConfig {
    level: Option<String>,
    format: Option<LogFormat>,
    show_target: Option<bool>,
}

/// Partial configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialContainerConfig {
    resources: Option<PartialResourceConfig>,
    logging: Option<PartialLoggingConfig>,
}

impl ContainerConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load_config()
    }

    /// Load configuration with custom base path (for testing)
    pub fn load_with_base_path(base_path: PathBuf) -> Result<Self, ConfigError> {
        ConfigLoader::with_base_path(base_path).load_config()
    }

    /// Environment values win over file values, file values over defaults.
    pub fn from_partial_and_env(
        partial: Option<PartialContainerConfig>,
        env_map: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();
        let defaults = ContainerConfig::default();

        let file_resources = partial.resources.unwrap_or_default();
        let format = match env_map.get(ENV_RESOURCE_FORMAT) {
            Some(value) => parse_resource_format(value)?,
            None => file_resources.format.unwrap_or(defaults.resources.format),
        };
        let resources = ResourceConfig {
            root: env_map
                .get(ENV_RESOURCE_ROOT)
                .cloned()
                .or(file_resources.root)
                .unwrap_or(defaults.resources.root),
            format,
        };

        let file_logging = partial.logging.unwrap_or_default();
        let logging = LoggingConfig {
            level: env_map
                .get(ENV_LOG_LEVEL)
                .cloned()
                .or(file_logging.level)
                .unwrap_or(defaults.logging.level),
            format: file_logging.format.unwrap_or(defaults.logging.format),
            show_target: file_logging.show_target.unwrap_or(defaults.logging.show_target),
        };

        let config = ContainerConfig { resources, logging };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resources.root.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "resources.root".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        parse_log_level(&self.logging.level)?;
        Ok(())
    }
}

fn parse_resource_format(value: &str) -> Result<ResourceFormat, ConfigError> {
    match value.to_lowercase().as_str() {
        "json" => Ok(ResourceFormat::Json),
        "toml" => Ok(ResourceFormat::Toml),
        other => Err(ConfigError::InvalidValue {
            field: ENV_RESOURCE_FORMAT.to_string(),
            reason: format!("unsupported resource format '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = ContainerConfig::from_partial_and_env(None, HashMap::new()).unwrap();
        assert_eq!(config, ContainerConfig::default());
        assert_eq!(config.resources.root, "resources");
    }

    #[test]
    fn test_env_overrides_file() {
        let partial: PartialContainerConfig = toml::from_str(
            r#"
            [resources]
            root = "assets"
            format = "toml"

            [logging]
            level = "warn"
            "#,
        )
        .unwrap();
        let mut env_map = HashMap::new();
        env_map.insert(ENV_RESOURCE_ROOT.to_string(), "/srv/data".to_string());

        let config = ContainerConfig::from_partial_and_env(Some(partial), env_map).unwrap();
        assert_eq!(config.resources.root, "/srv/data");
        assert_eq!(config.resources.format, ResourceFormat::Toml);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut env_map = HashMap::new();
        env_map.insert(ENV_RESOURCE_FORMAT.to_string(), "yaml".to_string());
        assert!(ContainerConfig::from_partial_and_env(None, env_map).is_err());

        let mut env_map = HashMap::new();
        env_map.insert(ENV_LOG_LEVEL.to_string(), "chatty".to_string());
        assert!(ContainerConfig::from_partial_and_env(None, env_map).is_err());
    }
}
