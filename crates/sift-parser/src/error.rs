use std::fmt;

use sift_common::Span;

/// A hard parse failure.
///
/// The analyzer treats a failed parse as a null AST: the module is skipped,
/// a problem is recorded against the file, and analysis of other modules
/// proceeds. Only the first error is reported per file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_bare_message() {
        let err = ParseError::new("unexpected token", Span::new(4, 5));
        assert_eq!(err.to_string(), "unexpected token");
    }
}
