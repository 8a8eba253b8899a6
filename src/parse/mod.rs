mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::ParseResult;

/// Parse rule-file text into a [`ParseResult`].
///
/// This never fails as a whole: malformed lines become per-line
/// diagnostics and every other line still contributes its rule.
#[must_use]
pub fn parse(input: &str) -> ParseResult {
    parser::parse(input)
}
