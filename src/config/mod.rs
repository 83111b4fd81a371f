pub mod app_config;
pub mod loader;

// Re-export commonly used types
pub use app_config::{ContainerConfig, ResourceConfig};
pub use loader::ConfigLoader;
pub use crate::logging::LoggingConfig;

// Re-export constants
pub use app_config::{
    CONFIG_FILE_NAME, ENV_LOG_LEVEL, ENV_RESOURCE_FORMAT, ENV_RESOURCE_ROOT, USER_CONFIG_PATH,
};
