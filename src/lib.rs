//! Symbol indexing core for find-references over Java workspaces.
//!
//! Each source file is reduced to a small summary of the simple names it
//! declares and references. The workspace index answers "which files could
//! mention `name`?" in memory, and a [`ReferenceResolver`] narrows that
//! candidate set to exact locations.

pub mod config;
pub mod language_service;
pub mod symbol_index;
pub mod tree_sitter;

pub use config::{load_index_config, save_index_config, try_load_index_config, IndexConfig};
pub use language_service::{
    BuildError, IndexBuilder, IndexOutcome, LanguageError, LanguageService, Location, Position,
    Range, ReferenceResolver, ResolveError, ResolveRequest,
};
pub use symbol_index::{FileId, FileIndexEntry, Stamp, SymbolSummary, WorkspaceIndex};
pub use tree_sitter::JavaIndexBuilder;
