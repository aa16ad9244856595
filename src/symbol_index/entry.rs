//! Per-file symbol summaries
//!
//! A [`FileIndexEntry`] is the immutable record of the simple names a single
//! source file declares and references. Builders accumulate names into a
//! [`SymbolSummary`], which is sealed into an entry exactly once.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a source file (URI or canonical path)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(Arc<str>);

impl FileId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Build an id from a filesystem path, normalizing separators
    pub fn from_path(path: &Path) -> Self {
        Self::new(path.to_string_lossy().replace('\\', "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FileId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl From<&Path> for FileId {
    fn from(path: &Path) -> Self {
        Self::from_path(path)
    }
}

impl AsRef<str> for FileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Logical timestamp handed out by the workspace index clock.
///
/// Stamps are unique and strictly increasing for the lifetime of one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stamp(u64);

impl Stamp {
    pub const ZERO: Stamp = Stamp(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kinds of top-level type declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
            TypeKind::Annotation => "annotation",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TypeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" => Ok(TypeKind::Class),
            "interface" => Ok(TypeKind::Interface),
            "enum" => Ok(TypeKind::Enum),
            "record" => Ok(TypeKind::Record),
            "annotation" => Ok(TypeKind::Annotation),
            _ => Err(format!("Unknown type kind: {}", s)),
        }
    }
}

/// A type declared at the top level of a file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopLevelType {
    pub name: String,
    pub kind: TypeKind,
}

impl TopLevelType {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Mutable accumulator filled in by an index builder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolSummary {
    pub package_name: String,
    pub top_level_types: HashSet<TopLevelType>,
    pub declared_names: HashSet<String>,
    pub referenced_names: HashSet<String>,
}

impl SymbolSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = package_name.into();
        self
    }

    /// Record a top-level type; its name also counts as a declaration
    pub fn add_top_level_type(&mut self, name: impl Into<String>, kind: TypeKind) {
        let name = name.into();
        self.declared_names.insert(name.clone());
        self.top_level_types.insert(TopLevelType::new(name, kind));
    }

    pub fn add_declaration(&mut self, name: impl Into<String>) {
        self.declared_names.insert(name.into());
    }

    pub fn add_reference(&mut self, name: impl Into<String>) {
        self.referenced_names.insert(name.into());
    }

    pub fn is_empty(&self) -> bool {
        self.package_name.is_empty()
            && self.top_level_types.is_empty()
            && self.declared_names.is_empty()
            && self.referenced_names.is_empty()
    }
}

/// Immutable summary of one file's symbol surface.
///
/// Entries are never mutated after [`FileIndexEntry::seal`]; a file edit
/// produces a new entry that replaces this one in the workspace index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIndexEntry {
    package_name: String,
    top_level_types: HashSet<TopLevelType>,
    declared_names: HashSet<String>,
    referenced_names: HashSet<String>,
    last_updated: Stamp,
    indexed_at: DateTime<Utc>,
}

impl FileIndexEntry {
    /// Seal a summary into an entry stamped with `stamp`
    pub fn seal(summary: SymbolSummary, stamp: Stamp) -> Self {
        let SymbolSummary {
            package_name,
            top_level_types,
            mut declared_names,
            referenced_names,
        } = summary;

        // Builders may fill the fields directly, so re-establish the superset here.
        declared_names.extend(top_level_types.iter().map(|t| t.name.clone()));

        Self {
            package_name,
            top_level_types,
            declared_names,
            referenced_names,
            last_updated: stamp,
            indexed_at: Utc::now(),
        }
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn top_level_types(&self) -> &HashSet<TopLevelType> {
        &self.top_level_types
    }

    pub fn declared_names(&self) -> &HashSet<String> {
        &self.declared_names
    }

    pub fn referenced_names(&self) -> &HashSet<String> {
        &self.referenced_names
    }

    pub fn last_updated(&self) -> Stamp {
        self.last_updated
    }

    pub fn indexed_at(&self) -> DateTime<Utc> {
        self.indexed_at
    }

    /// Is this file a possible declaration site for `name`?
    pub fn declares(&self, name: &str) -> bool {
        self.declared_names.contains(name)
    }

    pub fn references(&self, name: &str) -> bool {
        self.referenced_names.contains(name)
    }

    /// Coarse filter: the file declares or references `name`
    pub fn mentions(&self, name: &str) -> bool {
        self.references(name) || self.declares(name)
    }

    /// Fully qualified name of a type declared in this file
    pub fn qualified_name(&self, simple_name: &str) -> String {
        if self.package_name.is_empty() {
            simple_name.to_string()
        } else {
            format!("{}.{}", self.package_name, simple_name)
        }
    }
}
