//! Symbol Index
//!
//! Per-file symbol summaries and the workspace-wide index over them.
//! Everything here is in memory; lookups never block on I/O or parsing.
//!
//! - `entry`: immutable per-file summaries
//! - `store`: the concurrent file -> entry map
//! - `search`: coarse candidate search for find-references

mod entry;
mod search;
mod store;

pub use entry::{FileId, FileIndexEntry, Stamp, SymbolSummary, TopLevelType, TypeKind};
pub use search::{
    explain_candidates, find_candidates, find_declaring_files, find_top_level_types, Candidate,
    MatchReason, TypeLocation,
};
pub use store::{PutOutcome, WorkspaceIndex};
