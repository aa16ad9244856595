//! Workspace source discovery
//!
//! Finds the source files under a workspace root that should be indexed on
//! startup, honouring `.gitignore` and the configured exclusions.

use std::path::{Path, PathBuf};
use std::time::Instant;

use ignore::WalkBuilder;
use serde::Serialize;

use crate::config::IndexConfig;

/// Discovers indexable files under a workspace root
pub struct FileIndexer {
    workspace_root: PathBuf,
    config: IndexConfig,
}

impl FileIndexer {
    pub fn new(workspace_root: PathBuf, config: IndexConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    /// Every source file under the root, sorted
    pub fn discover_files(&self) -> Vec<PathBuf> {
        let filter_config = self.config.clone();
        let walker = WalkBuilder::new(&self.workspace_root)
            .hidden(true)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .require_git(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
                let excluded = entry
                    .file_name()
                    .to_str()
                    .map(|name| filter_config.is_excluded_dir(name))
                    .unwrap_or(false);
                !(is_dir && excluded)
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable workspace entry");
                    continue;
                }
            };

            let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
            if !is_file || !self.config.is_source_file(entry.path()) {
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > self.config.max_file_size_bytes {
                tracing::debug!(
                    path = %entry.path().display(),
                    size,
                    "skipping oversized source file"
                );
                continue;
            }

            files.push(entry.into_path());
        }

        files.sort();
        files
    }

    /// Path relative to the workspace root, with forward slashes
    pub fn to_relative(&self, abs_path: &Path) -> Option<String> {
        abs_path
            .strip_prefix(&self.workspace_root)
            .ok()
            .and_then(|p| p.to_str())
            .map(|s| s.replace('\\', "/"))
    }
}

/// Statistics from a batch indexing run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub files_discovered: usize,
    pub files_indexed: usize,
    /// Files whose build failed (their previous entry, if any, was kept)
    pub files_failed: usize,
    pub duration_ms: u64,
}

impl IndexStats {
    pub fn new(files_discovered: usize) -> Self {
        Self {
            files_discovered,
            ..Default::default()
        }
    }

    pub fn finish(mut self, started_at: Instant) -> Self {
        self.duration_ms = started_at.elapsed().as_millis() as u64;
        self
    }
}
