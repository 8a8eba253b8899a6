use std::fmt;

use serde::Serialize;

/// A line-scoped diagnostic produced while parsing a rule file.
///
/// One bad line never aborts the file: the parser records a `ParseError`
/// for it and keeps going. Line numbers are 1-based and count blank and
/// comment lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    line_number: usize,
    line: String,
    message: String,
}

impl ParseError {
    pub(crate) fn new(
        line_number: usize,
        line: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            line_number,
            line: line.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// The offending source line, verbatim.
    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line_number, self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ParseError::new(33, "/admin/* 301", "a rule without a destination");
        assert_eq!(err.to_string(), "line 33: a rule without a destination");
        assert_eq!(err.line_number(), 33);
        assert_eq!(err.line(), "/admin/* 301");
    }
}
