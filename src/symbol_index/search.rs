//! Coarse reference search
//!
//! Narrows a workspace down to the files that could possibly reference a
//! symbol, using nothing but simple-name set membership. The result is a
//! superset of the true answer; a precise resolver filters it afterwards.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::entry::{FileId, TypeKind};
use super::store::WorkspaceIndex;

/// Why a file was selected as a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Declares,
    References,
    Both,
}

/// A candidate file and the reason it matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub file: FileId,
    pub reason: MatchReason,
}

/// A top-level type found by simple name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLocation {
    pub file: FileId,
    pub qualified_name: String,
    pub kind: TypeKind,
}

/// Files that declare or reference `name`.
///
/// Matching is exact and case-sensitive on the simple name. Files that
/// declare `name` are always included, since a declaration site usually
/// refers to itself (constructors, recursion).
pub fn find_candidates(index: &WorkspaceIndex, name: &str) -> HashSet<FileId> {
    index
        .snapshot_all()
        .into_iter()
        .filter(|(_, entry)| entry.mentions(name))
        .map(|(file, _)| file)
        .collect()
}

/// Like [`find_candidates`], but reports why each file matched
pub fn explain_candidates(index: &WorkspaceIndex, name: &str) -> Vec<Candidate> {
    index
        .snapshot_all()
        .into_iter()
        .filter_map(|(file, entry)| {
            let reason = match (entry.declares(name), entry.references(name)) {
                (true, true) => MatchReason::Both,
                (true, false) => MatchReason::Declares,
                (false, true) => MatchReason::References,
                (false, false) => return None,
            };
            Some(Candidate { file, reason })
        })
        .collect()
}

/// Files that may declare `name`
pub fn find_declaring_files(index: &WorkspaceIndex, name: &str) -> HashSet<FileId> {
    index
        .snapshot_all()
        .into_iter()
        .filter(|(_, entry)| entry.declares(name))
        .map(|(file, _)| file)
        .collect()
}

/// Top-level types named `name`, across all packages
pub fn find_top_level_types(index: &WorkspaceIndex, name: &str) -> Vec<TypeLocation> {
    let mut found: Vec<TypeLocation> = index
        .snapshot_all()
        .into_iter()
        .flat_map(|(file, entry)| {
            entry
                .top_level_types()
                .iter()
                .filter(|t| t.name == name)
                .map(|t| TypeLocation {
                    file: file.clone(),
                    qualified_name: entry.qualified_name(&t.name),
                    kind: t.kind,
                })
                .collect::<Vec<_>>()
        })
        .collect();

    found.sort_by(|a, b| {
        a.qualified_name
            .cmp(&b.qualified_name)
            .then_with(|| a.file.cmp(&b.file))
    });
    found
}
