//! Pattern finder for ARM firmware dumps: a fuzzy byte-pattern language
//! with instruction-aware sub-patterns, plus cross-reference search.

pub mod batch;
pub mod config;
pub mod decoder;
pub mod engine;
pub mod image;
pub mod output;
pub mod pattern;
pub mod utils;

pub use batch::BatchEntry;
pub use config::ScanConfig;
pub use engine::{
    check, find, find_xrefs, resolve_thunks, MemoryView, SearchError, SearchResult, XRefKind,
    XRefResult,
};
pub use image::FirmwareImage;
pub use pattern::{parse, stringify, ParseError, PatternExpr, PatternKind};
