//! # Engine Configuration
//!
//! Workspace settings for the file-backed editor, read from
//! `.refactor-engine.yaml`:
//!
//! ```yaml
//! include: ["**/*.js", "**/*.mjs"]
//! exclude: ["**/node_modules/**"]
//! maxFileSize: 1048576
//! maxConcurrency: 4
//! ```

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = ".refactor-engine.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Workspace root, relative paths in references resolve against it
    pub root_directory: PathBuf,
    /// Globs of files taking part in cross-file refactorings
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Files bigger than this (in bytes) are skipped when searching
    pub max_file_size: u64,
    /// Maximum number of files read at once
    pub max_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            include: vec![
                "**/*.js".to_string(),
                "**/*.jsx".to_string(),
                "**/*.mjs".to_string(),
                "**/*.cjs".to_string(),
            ],
            exclude: vec!["**/node_modules/**".to_string(), "**/.git/**".to_string()],
            max_file_size: 50 * 1024 * 1024, // 50MB
            max_concurrency: 10,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Configuration for the workspace at `root`: its own config file, else
    /// the user-wide one, else defaults. `root` always wins over any
    /// `rootDirectory` found in a file.
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let candidates = [
            Some(root.join(CONFIG_FILE_NAME)),
            dirs::config_dir().map(|dir| dir.join("refactor-engine").join("config.yaml")),
        ];
        let found = candidates.into_iter().flatten().find(|path| path.is_file());

        let mut config = match found {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.root_directory = root.to_path_buf();
        Ok(config)
    }

    /// Resolve `path` against the workspace root unless it is absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_directory.join(path)
        }
    }
}
