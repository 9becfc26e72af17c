//! Serialization of finished graphs.
//!
//! Formatters read vertex sets, edge sets, and per-node link data; they
//! never write back into the graphs.

pub mod dot;
pub mod json;
