//! Matching engine: fuzzy byte scanning over a firmware view, sub-pattern
//! verification through the instruction decoders, result decoding and
//! cross-reference search.

mod decode;
mod error;
mod matcher;
mod memory;
mod result;
mod search;
mod trace;
mod xref;

pub use decode::resolve_thunks;
pub use error::SearchError;
pub use memory::MemoryView;
pub use result::{SearchResult, XRefKind, XRefResult};
pub use search::find;
pub use trace::Trace;
pub use xref::find_xrefs;

use crate::pattern::PatternExpr;

/// Verify a pattern at a fixed buffer offset without scanning.
pub fn check(expr: &PatternExpr, offset: usize, memory: &MemoryView) -> bool {
    matcher::check(expr, offset, memory, Trace::root())
}
