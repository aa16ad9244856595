use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings for workspace indexing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// File extensions (without the dot) treated as sources
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
    /// Directory names never descended into during discovery
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,
    /// Files larger than this are skipped during discovery
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,
    /// Upper bound on builds running at once in the background
    #[serde(default = "default_max_concurrent_builds")]
    pub max_concurrent_builds: usize,
    /// When a file fails to parse and has never been indexed, publish the
    /// names recovered around the error instead of leaving it out
    #[serde(default)]
    pub publish_partial_on_first_failure: bool,
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            source_extensions: default_source_extensions(),
            excluded_dirs: default_excluded_dirs(),
            max_file_size_bytes: default_max_file_size_bytes(),
            max_concurrent_builds: default_max_concurrent_builds(),
            publish_partial_on_first_failure: false,
            respect_gitignore: true,
        }
    }
}

impl IndexConfig {
    /// Does `path` have one of the configured source extensions?
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.source_extensions
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|dir| dir == name)
    }
}

fn default_source_extensions() -> Vec<String> {
    vec!["java".to_string()]
}

fn default_excluded_dirs() -> Vec<String> {
    ["target", "build", "out", "bin", "node_modules", ".git", ".gradle", ".idea"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_file_size_bytes() -> u64 {
    1024 * 1024
}

fn default_max_concurrent_builds() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Load the config at `path`, falling back to defaults when it is missing or
/// unreadable
pub fn load_index_config(path: &Path) -> IndexConfig {
    match try_load_index_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "using default index config");
            IndexConfig::default()
        }
    }
}

pub fn try_load_index_config(path: &Path) -> Result<IndexConfig, ConfigError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice::<IndexConfig>(&bytes)?)
}

pub fn save_index_config(path: &Path, cfg: &IndexConfig) -> Result<(), ConfigError> {
    let json = serde_json::to_vec_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    Ok(())
}
