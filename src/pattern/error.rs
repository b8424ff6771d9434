use thiserror::Error;

use crate::utils::source::{code_frame, line_col};

/// Syntax error with the source location of the offending token and a
/// rendered context frame pointing at it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at line {line} column {column}.\n{frame}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub frame: String,
}

impl ParseError {
    pub fn new(input: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_col(input, offset);
        Self {
            message: message.into(),
            line,
            column,
            frame: code_frame(input, line, column),
        }
    }
}
