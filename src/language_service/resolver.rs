//! Reference resolver contract
//!
//! The precise half of find-references. The index hands a resolver a
//! candidate set that contains every file with a true reference, and the
//! resolver decides which occurrences actually bind to the declaration.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::symbol_index::FileId;

/// Position in source code (0-based line and character)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Range in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// An exact reference location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: FileId,
    pub range: Range,
}

/// Everything a resolver needs to answer one find-references request
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    /// Superset of the files holding a true reference
    pub candidates: &'a HashSet<FileId>,
    pub declaring_file: &'a FileId,
    pub name: &'a str,
    /// Position of the declaration in `declaring_file`
    pub position: Position,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot resolve {name} in {file}: {message}")]
    Unresolved {
        file: FileId,
        name: String,
        message: String,
    },
    #[error("resolver unavailable: {0}")]
    Unavailable(String),
}

/// Turns a candidate set into exact reference locations.
///
/// Implementations must drop false positives themselves; the candidate set
/// is sound but not precise.
pub trait ReferenceResolver: Send + Sync {
    fn resolve(&self, request: &ResolveRequest<'_>) -> Result<Vec<Location>, ResolveError>;
}
