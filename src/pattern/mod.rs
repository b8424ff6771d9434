pub mod error;
pub mod expr;
pub mod parser;
pub mod stringify;
pub mod token;

pub use error::ParseError;
pub use expr::{PatternExpr, PatternKind, SubPattern, SubPatternKind};
pub use parser::Parser;
pub use stringify::stringify;

/// Compile pattern source text into a pattern tree.
pub fn parse(text: &str) -> Result<PatternExpr, ParseError> {
    Parser::new(text).parse()
}
