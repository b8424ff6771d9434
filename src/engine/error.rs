use thiserror::Error;

/// Usage errors surfaced by `find`. Everything that merely means "no match
/// at this position" is absorbed into the scan instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    #[error("pattern is empty, nothing to search for")]
    EmptyPattern,
    #[error("pattern is fully wildcard, nothing to search for")]
    AllWildcard,
}
