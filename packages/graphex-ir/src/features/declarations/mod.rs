//! Declaration Index: qualified types, fields, methods.
//!
//! Built once, fully, from all parse trees before any DDG/ICFG pass and
//! read-only thereafter. Consumed by identifier classification (DDG) and
//! call resolution (DDG heuristics, ICFG linking).

pub mod index;
pub mod resolver;
pub mod types;

pub use index::DeclarationIndex;
pub use resolver::{CallDesc, MethodResolver, ResolveCtx};
pub use types::{FieldRecord, MethodRecord, TypeRecord};
