//! tree-sitter adapter for Java sources.

use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::errors::{GraphexError, Result};
use crate::features::parsing::syntax::{named_children, node_text};

/// One parsed source file: path, declared package, source text, tree.
pub struct SourceFile {
    pub path: String,
    pub package: String,
    pub source: String,
    pub tree: Tree,
}

impl SourceFile {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// File name without directories, used as per-file metadata
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Java parser wrapper
pub struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::language())
            .map_err(|e| GraphexError::parse_error(format!("failed to set language: {e}")))?;
        Ok(Self { parser })
    }

    /// Parse a file from disk. A malformed or unreadable file is fatal
    /// for that file only; callers continue with the rest of the batch.
    pub fn parse_file(&mut self, path: &Path) -> Result<SourceFile> {
        let source = std::fs::read_to_string(path)?;
        self.parse_source(&path.to_string_lossy(), source)
    }

    /// Parse in-memory source
    pub fn parse_source(&mut self, path: &str, source: String) -> Result<SourceFile> {
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or_else(|| GraphexError::parse_error(format!("{path}: parser returned no tree")))?;
        if tree.root_node().has_error() {
            return Err(GraphexError::parse_error(format!(
                "{path}: syntax errors in source"
            )));
        }
        let package = extract_package(tree.root_node(), &source);
        Ok(SourceFile {
            path: path.to_string(),
            package,
            source,
            tree,
        })
    }
}

/// Declared package of a compilation unit, or "" for the default package
fn extract_package(root: Node, source: &str) -> String {
    for child in named_children(&root) {
        if child.kind() == "package_declaration" {
            for part in named_children(&child) {
                if matches!(part.kind(), "identifier" | "scoped_identifier") {
                    return node_text(part, source).to_string();
                }
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extracts_package() {
        let mut parser = JavaParser::new().unwrap();
        let file = parser
            .parse_source(
                "A.java",
                "package com.example.app;\nclass A { void m() {} }\n".to_string(),
            )
            .unwrap();
        assert_eq!(file.package, "com.example.app");
        assert_eq!(file.file_name(), "A.java");
    }

    #[test]
    fn test_default_package_is_empty() {
        let mut parser = JavaParser::new().unwrap();
        let file = parser
            .parse_source("B.java", "class B {}".to_string())
            .unwrap();
        assert_eq!(file.package, "");
    }

    #[test]
    fn test_malformed_source_is_rejected() {
        let mut parser = JavaParser::new().unwrap();
        let result = parser.parse_source("Bad.java", "class { {{".to_string());
        assert!(result.is_err());
    }
}
