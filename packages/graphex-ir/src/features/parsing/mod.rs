//! Parsing front-end: tree-sitter over the Java grammar.
//!
//! Produces one immutable parse tree per source file. The core only
//! needs spans (verbatim-text extraction), children, and grammar-rule
//! kinds for dispatch.

pub mod java_parser;
pub mod syntax;

pub use java_parser::{JavaParser, SourceFile};
