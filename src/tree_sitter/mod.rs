//! Tree-sitter integration
//!
//! Parses Java sources with tree-sitter and reduces each compilation unit to
//! a symbol summary for the index. Parsing is syntax-only and tolerant of
//! errors: a broken file still yields the names around the damage.

mod parser;
mod summary;

pub use parser::{JavaParser, TreeSitterError};
pub use summary::{summarize_tree, JavaIndexBuilder, SummaryExtractor};
