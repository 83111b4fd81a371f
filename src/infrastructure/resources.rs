//! 资源加载
//!
//! Resource-backed services are deserialized from a `serde_json::Value`
//! looked up by path. A loader answers `None` for anything it cannot find or
//! read; the caller decides how loudly to report that.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ResourceConfig;

/// Looks up serialized resource data by path.
pub trait ResourceLoader {
    fn load(&self, path: &str, type_name: &'static str) -> Option<serde_json::Value>;
}

/// On-disk encoding of resource files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFormat {
    #[default]
    Json,
    Toml,
}

impl ResourceFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ResourceFormat::Json => "json",
            ResourceFormat::Toml => "toml",
        }
    }

    fn parse(self, content: &str) -> Result<serde_json::Value, String> {
        match self {
            ResourceFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            ResourceFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Reads `<root>/<path>.<extension>` from disk.
#[derive(Debug, Clone)]
pub struct FileResourceLoader {
    root: PathBuf,
    format: ResourceFormat,
}

impl FileResourceLoader {
    pub fn new(root: impl Into<PathBuf>, format: ResourceFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    pub fn from_config(config: &ResourceConfig) -> Self {
        let expanded = shellexpand::tilde(&config.root);
        Self::new(PathBuf::from(expanded.as_ref()), config.format)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, path: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", path.trim_start_matches('/'), self.format.extension()))
    }
}

impl ResourceLoader for FileResourceLoader {
    fn load(&self, path: &str, type_name: &'static str) -> Option<serde_json::Value> {
        let file = self.path_for(path);
        let content = match fs::read_to_string(&file) {
            Ok(content) => content,
            Err(err) => {
                debug!(file = %file.display(), resource = type_name, error = %err, "Resource file not readable");
                return None;
            }
        };
        match self.format.parse(&content) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(file = %file.display(), resource = type_name, error = %err, "Resource file is malformed");
                None
            }
        }
    }
}

/// Keeps resource data in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceLoader {
    entries: HashMap<String, serde_json::Value>,
}

impl MemoryResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, path: impl Into<String>, value: serde_json::Value) -> Self {
        self.entries.insert(path.into(), value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceLoader for MemoryResourceLoader {
    fn load(&self, path: &str, _type_name: &'static str) -> Option<serde_json::Value> {
        self.entries.get(path).cloned()
    }
}
