pub mod report;

pub use report::{
    batch_json, batch_line, pattern_json, render_pattern_results, render_xref_results, xrefs_json,
};
