//! Unified Language Service
//!
//! Ties the index builder, the workspace index and the reference resolver
//! together behind the operations the request layer calls.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::builder::{BuildError, IndexBuilder};
use super::indexer::{FileIndexer, IndexStats};
use super::resolver::{Location, Position, ReferenceResolver, ResolveError, ResolveRequest};
use crate::config::IndexConfig;
use crate::symbol_index::{
    find_candidates, find_declaring_files, find_top_level_types, FileId, FileIndexEntry,
    PutOutcome, Stamp, TypeLocation, WorkspaceIndex,
};
use crate::tree_sitter::JavaIndexBuilder;

/// Error type for language service operations
#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),
    #[error("Background indexing task failed: {0}")]
    Task(String),
}

/// What happened to one `index` call
#[derive(Debug)]
pub enum IndexOutcome {
    Inserted,
    Replaced,
    /// A newer build or a forget landed first; this build was dropped
    Stale,
    /// The build failed; the previous entry stays in place
    RetainedPrevious(BuildError),
    /// The build failed and the file had no entry to fall back on
    Rejected(BuildError),
    /// The build failed, the file was new, and its partial names were published
    PublishedPartial(BuildError),
}

impl IndexOutcome {
    /// Did this call publish a new entry?
    pub fn is_published(&self) -> bool {
        matches!(
            self,
            IndexOutcome::Inserted | IndexOutcome::Replaced | IndexOutcome::PublishedPartial(_)
        )
    }

    pub fn error(&self) -> Option<&BuildError> {
        match self {
            IndexOutcome::RetainedPrevious(e)
            | IndexOutcome::Rejected(e)
            | IndexOutcome::PublishedPartial(e) => Some(e),
            IndexOutcome::Inserted | IndexOutcome::Replaced | IndexOutcome::Stale => None,
        }
    }
}

impl From<PutOutcome> for IndexOutcome {
    fn from(outcome: PutOutcome) -> Self {
        match outcome {
            PutOutcome::Inserted => IndexOutcome::Inserted,
            PutOutcome::Replaced => IndexOutcome::Replaced,
            PutOutcome::Stale => IndexOutcome::Stale,
        }
    }
}

/// Registration of a running build; retired on drop, including on unwind
struct InFlightBuild<'a> {
    service: &'a LanguageService,
    stamp: Stamp,
}

impl Drop for InFlightBuild<'_> {
    fn drop(&mut self) {
        self.service.finish_build(self.stamp);
    }
}

/// Unified language service
///
/// One instance lives for a workspace session. All methods take `&self`;
/// share it across request handlers and background tasks with an `Arc`.
pub struct LanguageService {
    index: WorkspaceIndex,
    builder: Arc<dyn IndexBuilder>,
    config: IndexConfig,
    /// Stamps of builds that have started but not yet published
    in_flight: Mutex<BTreeSet<Stamp>>,
    build_permits: Arc<Semaphore>,
}

impl LanguageService {
    /// Create a service that indexes Java with tree-sitter
    pub fn new(config: IndexConfig) -> Self {
        let builder = JavaIndexBuilder::with_extensions(config.source_extensions.clone());
        Self::with_builder(config, Arc::new(builder))
    }

    pub fn with_builder(config: IndexConfig, builder: Arc<dyn IndexBuilder>) -> Self {
        let permits = config.max_concurrent_builds.max(1);
        Self {
            index: WorkspaceIndex::new(),
            builder,
            config,
            in_flight: Mutex::new(BTreeSet::new()),
            build_permits: Arc::new(Semaphore::new(permits)),
        }
    }

    pub fn workspace_index(&self) -> &WorkspaceIndex {
        &self.index
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    // =========================================================================
    // Indexing
    // =========================================================================

    /// Rebuild the summary of `file` from `source` and publish it.
    ///
    /// Build failures never clear a file: the previous entry stays in place.
    pub fn index(&self, file: impl Into<FileId>, source: &str) -> IndexOutcome {
        let file = file.into();
        let build = self.begin_build();
        let stamp = build.stamp;
        let started = Instant::now();

        let outcome = match self.builder.build(&file, source) {
            Ok(summary) => {
                let entry = Arc::new(FileIndexEntry::seal(summary, stamp));
                IndexOutcome::from(self.index.put(file.clone(), entry))
            }
            Err(error) => self.on_build_failure(&file, stamp, error),
        };

        drop(build);

        match &outcome {
            IndexOutcome::Inserted | IndexOutcome::Replaced => tracing::debug!(
                file = %file,
                %stamp,
                elapsed_us = started.elapsed().as_micros() as u64,
                "indexed file"
            ),
            IndexOutcome::Stale => {
                tracing::debug!(file = %file, %stamp, "dropped stale build")
            }
            IndexOutcome::RetainedPrevious(e) => {
                tracing::warn!(file = %file, error = %e, "build failed, keeping previous entry")
            }
            IndexOutcome::Rejected(e) => {
                tracing::warn!(file = %file, error = %e, "build failed, file not indexed")
            }
            IndexOutcome::PublishedPartial(e) => {
                tracing::warn!(file = %file, error = %e, "build failed, published partial entry")
            }
        }

        outcome
    }

    fn on_build_failure(&self, file: &FileId, stamp: Stamp, error: BuildError) -> IndexOutcome {
        if self.index.contains(file) {
            return IndexOutcome::RetainedPrevious(error);
        }
        if !self.config.publish_partial_on_first_failure {
            return IndexOutcome::Rejected(error);
        }
        let Some(partial) = error.partial().cloned() else {
            return IndexOutcome::Rejected(error);
        };

        let entry = Arc::new(FileIndexEntry::seal(partial, stamp));
        match self.index.put(file.clone(), entry) {
            PutOutcome::Stale => IndexOutcome::Stale,
            PutOutcome::Inserted | PutOutcome::Replaced => IndexOutcome::PublishedPartial(error),
        }
    }

    /// Index `source` on the blocking pool, bounded by `max_concurrent_builds`
    pub fn spawn_index(
        self: &Arc<Self>,
        file: impl Into<FileId>,
        source: String,
    ) -> JoinHandle<Result<IndexOutcome, LanguageError>> {
        let service = Arc::clone(self);
        let file = file.into();
        tokio::spawn(async move {
            let _permit = Arc::clone(&service.build_permits)
                .acquire_owned()
                .await
                .map_err(|e| LanguageError::Task(e.to_string()))?;

            tokio::task::spawn_blocking(move || service.index(file, &source))
                .await
                .map_err(|e| LanguageError::Task(e.to_string()))
        })
    }

    /// Drop `file` from the index. Builds already running for it are discarded.
    pub fn forget(&self, file: &FileId) -> bool {
        let removed = self.index.remove(file);
        tracing::debug!(file = %file, removed, "forgot file");
        self.compact_tombstones();
        removed
    }

    /// Discover and index every source file under `root`
    pub fn index_workspace(&self, root: &Path) -> Result<IndexStats, LanguageError> {
        if !root.is_dir() {
            return Err(LanguageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("workspace root {} is not a directory", root.display()),
            )));
        }

        let started = Instant::now();
        let indexer = FileIndexer::new(root.to_path_buf(), self.config.clone());
        let files = indexer.discover_files();
        let mut stats = IndexStats::new(files.len());

        for path in files {
            let source = match std::fs::read_to_string(&path) {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read source");
                    stats.files_failed += 1;
                    continue;
                }
            };

            let file = indexer
                .to_relative(&path)
                .map(FileId::from)
                .unwrap_or_else(|| FileId::from_path(&path));
            let outcome = self.index(file, &source);
            if outcome.error().is_some() {
                stats.files_failed += 1;
            } else if outcome.is_published() {
                stats.files_indexed += 1;
            }
        }

        let stats = stats.finish(started);
        tracing::info!(
            root = %root.display(),
            files = stats.files_indexed,
            failed = stats.files_failed,
            duration_ms = stats.duration_ms,
            "indexed workspace"
        );
        Ok(stats)
    }

    fn begin_build(&self) -> InFlightBuild<'_> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let stamp = self.index.next_stamp();
        in_flight.insert(stamp);
        InFlightBuild {
            service: self,
            stamp,
        }
    }

    fn finish_build(&self, stamp: Stamp) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&stamp);
        self.compact_tombstones();
    }

    /// Purge tombstones no running build is older than
    fn compact_tombstones(&self) {
        let low_water = {
            let in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match in_flight.first() {
                Some(oldest) => *oldest,
                // Builds that start from here on are stamped after every tombstone.
                None => Stamp::new(self.index.current_stamp().get() + 1),
            }
        };

        let purged = self.index.purge_tombstones_before(low_water);
        if purged > 0 {
            tracing::trace!(purged, %low_water, "purged tombstones");
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get(&self, file: &FileId) -> Option<Arc<FileIndexEntry>> {
        self.index.get(file)
    }

    /// Files that may reference `name` (sound, not precise)
    pub fn find_reference_candidates(&self, name: &str) -> HashSet<FileId> {
        let candidates = find_candidates(&self.index, name);
        tracing::debug!(name, candidates = candidates.len(), "coarse reference search");
        candidates
    }

    /// Coarse search followed by precise resolution
    pub fn find_references(
        &self,
        resolver: &dyn ReferenceResolver,
        declaring_file: &FileId,
        name: &str,
        position: Position,
    ) -> Result<Vec<Location>, LanguageError> {
        let candidates = self.find_reference_candidates(name);
        let request = ResolveRequest {
            candidates: &candidates,
            declaring_file,
            name,
            position,
        };
        let locations = resolver.resolve(&request)?;
        tracing::debug!(
            name,
            candidates = candidates.len(),
            locations = locations.len(),
            "resolved references"
        );
        Ok(locations)
    }

    pub fn find_declaring_files(&self, name: &str) -> HashSet<FileId> {
        find_declaring_files(&self.index, name)
    }

    pub fn find_top_level_types(&self, name: &str) -> Vec<TypeLocation> {
        find_top_level_types(&self.index, name)
    }
}
