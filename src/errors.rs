use crate::scene::{ComponentRef, NodeId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("A project container already exists: {existing}")]
    DuplicateProjectContainer { existing: String },
    #[error("No service registered for '{dependency}' required by '{dependent}'")]
    MissingDependency {
        dependency: &'static str,
        dependent: &'static str,
    },
    #[error("Type cast failed: expected '{expected}' in {context}")]
    TypeMismatch {
        expected: &'static str,
        context: String,
    },
    #[error("The container behind this handle has been dropped")]
    ContainerDropped,
    #[error("Unknown scene node {0}")]
    UnknownNode(NodeId),
    #[error("Unknown component {0}")]
    UnknownComponent(ComponentRef),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

pub fn missing_dependency<T: ?Sized + 'static>(dependent: &'static str) -> ContainerError {
    ContainerError::MissingDependency {
        dependency: std::any::type_name::<T>(),
        dependent,
    }
}
