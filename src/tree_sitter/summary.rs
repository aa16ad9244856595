//! Java symbol summaries from tree-sitter trees
//!
//! Collects the package, the top-level types, every declared simple name and
//! every simple name used anywhere in a compilation unit. The walk is purely
//! syntactic: a use of `size` is recorded without deciding which `size` it
//! binds to.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use tree_sitter::{Node, Tree, TreeCursor};

use super::parser::JavaParser;
use crate::language_service::{BuildError, IndexBuilder};
use crate::symbol_index::{FileId, SymbolSummary, TypeKind};

/// Walks a Java tree and accumulates a [`SymbolSummary`]
pub struct SummaryExtractor<'a> {
    source: &'a [u8],
    summary: SymbolSummary,
    /// Ids of identifier nodes that name a declaration
    declaration_names: HashSet<usize>,
}

impl<'a> SummaryExtractor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            summary: SymbolSummary::new(),
            declaration_names: HashSet::new(),
        }
    }

    /// Extract the summary of a whole tree.
    ///
    /// Walks with a cursor rather than recursion; long expression chains
    /// nest thousands of levels deep.
    pub fn extract(mut self, tree: &Tree) -> SymbolSummary {
        let mut cursor = tree.walk();
        loop {
            let descend = self.visit(cursor.node());
            if descend && cursor.goto_first_child() {
                continue;
            }
            if !advance(&mut cursor) {
                return self.summary;
            }
        }
    }

    /// Record `node`. Returns whether its children should be visited.
    fn visit(&mut self, node: Node) -> bool {
        match node.kind() {
            "package_declaration" => {
                self.record_package(&node);
                return false;
            }
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration" => self.record_type(&node),
            "method_declaration"
            | "constructor_declaration"
            | "compact_constructor_declaration"
            | "annotation_type_element_declaration"
            | "enum_constant" => {
                self.record_named(&node);
            }
            "field_declaration" | "constant_declaration" => self.record_declarators(&node),
            "formal_parameter" if is_record_component(&node) => {
                self.record_named(&node);
            }
            "identifier" | "type_identifier" => {
                if !self.declaration_names.contains(&node.id()) {
                    if let Some(name) = self.text(&node) {
                        self.summary.add_reference(name);
                    }
                }
            }
            _ => {}
        }
        true
    }

    /// `package a.b.c;` with any comments between the segments dropped
    fn record_package(&mut self, node: &Node) {
        let mut segments = Vec::new();
        let mut cursor = node.walk();
        let mut children = node.named_children(&mut cursor);
        let Some(name) = children.find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
        else {
            return;
        };

        let mut walk = name.walk();
        loop {
            let current = walk.node();
            if current.kind() == "identifier" {
                if let Some(segment) = self.text(&current) {
                    segments.push(segment);
                }
            } else if walk.goto_first_child() {
                continue;
            }
            if !advance_within(&mut walk, name) {
                break;
            }
        }

        self.summary.package_name = segments.join(".");
    }

    fn record_type(&mut self, node: &Node) {
        let Some(name) = self.record_named(node) else {
            return;
        };

        let top_level = node.parent().map(|p| p.kind() == "program").unwrap_or(false);
        if top_level {
            if let Some(kind) = type_kind(node.kind()) {
                self.summary.add_top_level_type(name, kind);
            }
        }
    }

    /// Declare the `name` field of `node`, returning the name
    fn record_named(&mut self, node: &Node) -> Option<String> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.text(&name_node)?;
        self.declaration_names.insert(name_node.id());
        self.summary.add_declaration(name.clone());
        Some(name)
    }

    fn record_declarators(&mut self, node: &Node) {
        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        for declarator in declarators {
            self.record_named(&declarator);
        }
    }

    fn text(&self, node: &Node) -> Option<String> {
        node.utf8_text(self.source).ok().map(|s| s.to_string())
    }
}

/// Move to the next node in pre-order, skipping the current node's children.
/// Returns false once the walk is back at the root.
fn advance(cursor: &mut TreeCursor) -> bool {
    loop {
        if cursor.goto_next_sibling() {
            return true;
        }
        if !cursor.goto_parent() {
            return false;
        }
    }
}

/// Like [`advance`] for a cursor started at `root`, never leaving its subtree
fn advance_within(cursor: &mut TreeCursor, root: Node) -> bool {
    loop {
        if cursor.node().id() == root.id() {
            return false;
        }
        if cursor.goto_next_sibling() {
            return true;
        }
        if !cursor.goto_parent() {
            return false;
        }
    }
}

fn type_kind(node_kind: &str) -> Option<TypeKind> {
    match node_kind {
        "class_declaration" => Some(TypeKind::Class),
        "interface_declaration" => Some(TypeKind::Interface),
        "enum_declaration" => Some(TypeKind::Enum),
        "record_declaration" => Some(TypeKind::Record),
        "annotation_type_declaration" => Some(TypeKind::Annotation),
        _ => None,
    }
}

/// `record Point(int x, int y)`: the parameters are fields
fn is_record_component(node: &Node) -> bool {
    node.parent()
        .filter(|p| p.kind() == "formal_parameters")
        .and_then(|p| p.parent())
        .map(|gp| gp.kind() == "record_declaration")
        .unwrap_or(false)
}

/// First error or missing node in pre-order
fn first_error(tree: &Tree) -> Option<Node<'_>> {
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        if !advance(&mut cursor) {
            return None;
        }
    }
}

/// Convenience function to summarize a parsed Java tree
pub fn summarize_tree(tree: &Tree, source: &str) -> SymbolSummary {
    SummaryExtractor::new(source).extract(tree)
}

/// [`IndexBuilder`] backed by tree-sitter-java
pub struct JavaIndexBuilder {
    /// File extensions (without the dot) this builder accepts
    extensions: Vec<String>,
    /// Idle parsers; a build checks one out for its duration
    parsers: Mutex<Vec<JavaParser>>,
}

impl JavaIndexBuilder {
    pub fn new() -> Self {
        Self::with_extensions(vec!["java".to_string()])
    }

    pub fn with_extensions(extensions: Vec<String>) -> Self {
        Self {
            extensions,
            parsers: Mutex::new(Vec::new()),
        }
    }

    fn checkout(&self) -> Result<JavaParser, BuildError> {
        let idle = self
            .parsers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        match idle {
            Some(parser) => Ok(parser),
            None => JavaParser::new().map_err(|e| BuildError::Parser(e.to_string())),
        }
    }

    fn checkin(&self, parser: JavaParser) {
        self.parsers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(parser);
    }
}

impl Default for JavaIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuilder for JavaIndexBuilder {
    fn build(&self, file: &FileId, source: &str) -> Result<SymbolSummary, BuildError> {
        if !self.supports(file) {
            return Err(BuildError::Unsupported(file.clone()));
        }

        let mut parser = self.checkout()?;
        let parsed = parser.parse(source);
        self.checkin(parser);
        let tree = parsed.map_err(|e| BuildError::Parser(e.to_string()))?;

        let summary = summarize_tree(&tree, source);
        if let Some(error) = first_error(&tree) {
            return Err(BuildError::Syntax {
                file: file.clone(),
                message: format!(
                    "unexpected syntax at line {}",
                    error.start_position().row + 1
                ),
                partial: summary,
            });
        }

        Ok(summary)
    }

    fn supports(&self, file: &FileId) -> bool {
        Path::new(file.as_str())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(code: &str) -> SymbolSummary {
        JavaIndexBuilder::new()
            .build(&FileId::from("Test.java"), code)
            .unwrap()
    }

    #[test]
    fn test_package_and_top_level_types() {
        let summary = build(
            r#"
package org.javacs.example;

public class GotoOther {}
interface Shape {}
enum Color { RED, GREEN }
record Point(int x, int y) {}
@interface Marker {}
"#,
        );

        assert_eq!(summary.package_name, "org.javacs.example");
        let mut kinds: Vec<(String, TypeKind)> = summary
            .top_level_types
            .iter()
            .map(|t| (t.name.clone(), t.kind))
            .collect();
        kinds.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            kinds,
            vec![
                ("Color".to_string(), TypeKind::Enum),
                ("GotoOther".to_string(), TypeKind::Class),
                ("Marker".to_string(), TypeKind::Annotation),
                ("Point".to_string(), TypeKind::Record),
                ("Shape".to_string(), TypeKind::Interface),
            ]
        );
        assert!(summary.declared_names.contains("RED"));
        assert!(summary.declared_names.contains("x"));
    }

    #[test]
    fn test_default_package() {
        let summary = build("class Foo {}");
        assert_eq!(summary.package_name, "");
    }

    #[test]
    fn test_members_are_declared_locals_are_not() {
        let summary = build(
            r#"
class Account {
    private int balance, limit;
    static final String NAME = "x";

    Account() {}

    void deposit(int amount) {
        int next = balance + amount;
        balance = next;
    }

    class Ledger {}
}
"#,
        );

        for name in ["Account", "balance", "limit", "NAME", "deposit", "Ledger"] {
            assert!(summary.declared_names.contains(name), "{} not declared", name);
        }
        assert!(!summary.declared_names.contains("amount"));
        assert!(!summary.declared_names.contains("next"));
        // Nested types are declarations but not top-level types.
        assert_eq!(summary.top_level_types.len(), 1);
    }

    #[test]
    fn test_references() {
        let summary = build(
            r#"
package p;

import java.util.List;

class Client {
    List<Widget> widgets;

    void run() {
        Widget w = new Widget();
        w.render(Config.DEFAULT);
        helper();
    }
}
"#,
        );

        for name in ["List", "Widget", "render", "Config", "DEFAULT", "helper", "w"] {
            assert!(summary.referenced_names.contains(name), "{} not referenced", name);
        }
        // Declaration names are not uses.
        assert!(!summary.referenced_names.contains("Client"));
        assert!(!summary.referenced_names.contains("run"));
        // Package segments are not uses.
        assert!(!summary.referenced_names.contains("p"));
    }

    #[test]
    fn test_constructor_call_references_declaring_class() {
        let summary = build(
            r#"
package p;

class Foo {
    static Foo make() { return new Foo(); }
}
"#,
        );

        assert!(summary.declared_names.contains("Foo"));
        assert!(summary.referenced_names.contains("Foo"));
    }

    #[test]
    fn test_syntax_error_keeps_partial_summary() {
        let result = JavaIndexBuilder::new().build(
            &FileId::from("Broken.java"),
            "package p;\nclass Broken {\n  void ok() { Helper.run(); }\n  void bad( {\n}\n",
        );

        let err = result.unwrap_err();
        assert!(matches!(err, BuildError::Syntax { .. }));
        let partial = err.partial().unwrap();
        assert_eq!(partial.package_name, "p");
        assert!(partial.referenced_names.contains("Helper"));
        assert!(err.to_string().contains("Broken.java"));
    }

    #[test]
    fn test_unsupported_file() {
        let result = JavaIndexBuilder::new().build(&FileId::from("notes.txt"), "class A {}");
        assert!(matches!(result, Err(BuildError::Unsupported(_))));
    }

    #[test]
    fn test_parsers_are_reused() {
        let builder = JavaIndexBuilder::new();
        builder.build(&FileId::from("A.java"), "class A {}").unwrap();
        builder.build(&FileId::from("B.java"), "class B {}").unwrap();

        assert_eq!(builder.parsers.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_deeply_nested_expression() {
        let terms: Vec<String> = (0..20_000).map(|i| format!("\"s{}\"", i)).collect();
        let code = format!(
            "class Big {{ String s = {} + Tail.VALUE; }}",
            terms.join(" + ")
        );

        let summary = build(&code);
        assert!(summary.declared_names.contains("s"));
        assert!(summary.referenced_names.contains("Tail"));
        assert!(summary.referenced_names.contains("VALUE"));
    }

    #[test]
    fn test_deeply_nested_syntax_error() {
        let terms: Vec<String> = (0..10_000).map(|i| format!("v{}", i)).collect();
        let code = format!("class Big {{ int s = {} + ; }}", terms.join(" + "));

        let err = JavaIndexBuilder::new()
            .build(&FileId::from("Big.java"), &code)
            .unwrap_err();
        assert!(matches!(err, BuildError::Syntax { .. }));
    }

    #[test]
    fn test_package_name_ignores_comments() {
        let summary = build("package org./* legacy */demo\n  .app; // trailing\nclass A {}");
        assert_eq!(summary.package_name, "org.demo.app");
    }

    #[test]
    fn test_configured_extensions() {
        let builder = JavaIndexBuilder::with_extensions(vec!["java".into(), "jav".into()]);

        assert!(builder.supports(&FileId::from("src/A.jav")));
        assert!(builder.supports(&FileId::from("src/A.JAVA")));
        assert!(!builder.supports(&FileId::from("src/A.kt")));
        assert!(builder.build(&FileId::from("src/A.jav"), "class A {}").is_ok());
    }
}
