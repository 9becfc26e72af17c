//! High-level operations over whole source sets.
//!
//! Callers hand this layer a list of files (or a directory root) and
//! get finished graphs back; per-feature builders stay usable on their
//! own for callers that want a single graph family.

pub mod extraction_service;

pub use extraction_service::{discover_sources, GraphExtractor, ProgramGraphs};
