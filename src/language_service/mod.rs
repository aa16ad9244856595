//! Language Service
//!
//! Coordinates index builds, the workspace index and reference resolution.
//! This is the entry point the request layer talks to.
//!
//! Architecture:
//! - Builder: source text -> symbol summary (tree-sitter for Java)
//! - Symbol Index: in-memory per-file summaries, replaced wholesale
//! - Resolver: narrows coarse candidates to exact locations

mod builder;
mod indexer;
mod resolver;
mod service;

pub use builder::{BuildError, IndexBuilder};
pub use indexer::{FileIndexer, IndexStats};
pub use resolver::{Location, Position, Range, ReferenceResolver, ResolveError, ResolveRequest};
pub use service::{IndexOutcome, LanguageError, LanguageService};
