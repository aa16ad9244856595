//! Java parser wrapper

use thiserror::Error;
use tree_sitter::{Parser, Tree};

#[derive(Debug, Error)]
pub enum TreeSitterError {
    #[error("Failed to load the Java grammar: {0}")]
    LanguageInitFailed(String),
    /// Parsing was cancelled or timed out inside tree-sitter
    #[error("Parser returned no tree")]
    ParseFailed,
}

/// A tree-sitter parser with the Java grammar loaded.
///
/// `Parser` is not `Sync`; share these through a pool, one per build.
pub struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    pub fn new() -> Result<Self, TreeSitterError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| TreeSitterError::LanguageInitFailed(e.to_string()))?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str) -> Result<Tree, TreeSitterError> {
        self.parser
            .parse(source, None)
            .ok_or(TreeSitterError::ParseFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_java() {
        let mut parser = JavaParser::new().unwrap();
        let tree = parser.parse("package p; class Foo { Foo() {} }").unwrap();

        assert!(!tree.root_node().has_error());
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn test_parse_java_with_error() {
        let mut parser = JavaParser::new().unwrap();
        let tree = parser.parse("class Foo { void f( }").unwrap();

        assert!(tree.root_node().has_error());
    }

    #[test]
    fn test_parser_is_reusable() {
        let mut parser = JavaParser::new().unwrap();
        parser.parse("class A { int x; }").unwrap();
        let tree = parser.parse("class B { int y; }").unwrap();

        assert_eq!(tree.root_node().child_count(), 1);
    }
}
