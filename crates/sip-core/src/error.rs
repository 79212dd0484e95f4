use std::fmt;
use thiserror::Error;

/// A type alias for handling `Result`s with `Error`
pub type Result<T> = std::result::Result<T, Error>;

/// A malformed character stream at a specific offset of the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalError {
    /// What the lexer expected or found
    pub message: String,
    /// The complete buffer being scanned
    pub buffer: String,
    /// Character offset of the failure
    pub position: usize,
}

impl LexicalError {
    pub fn new(message: impl Into<String>, buffer: impl Into<String>, position: usize) -> Self {
        LexicalError {
            message: message.into(),
            buffer: buffer.into(),
            position,
        }
    }
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at offset {} in \"{}\"",
            self.message,
            self.position,
            self.buffer.escape_debug()
        )
    }
}

impl std::error::Error for LexicalError {}

/// Errors that can occur in SIP and SDP handling
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed character stream
    #[error("Lexical error: {0}")]
    Lexical(#[from] LexicalError),

    /// A field or header does not match its expected structure
    #[error("Grammar error in {field}: {message} (offset {position})")]
    Grammar {
        field: String,
        message: String,
        position: usize,
    },

    /// Structurally valid but out-of-domain value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Mutation attempted on the `*` address
    #[error("Immutable wildcard address")]
    ImmutableWildcard,

    /// Operation invoked in a state that does not permit it
    #[error("Illegal state: {0}")]
    IllegalState(String),
}

impl Error {
    /// Wraps a lexical failure as a grammar error for the named field.
    pub fn grammar(field: impl Into<String>, err: LexicalError) -> Self {
        Error::Grammar {
            field: field.into(),
            position: err.position,
            message: err.message,
        }
    }

    /// Builds a grammar error that has no underlying lexical failure.
    pub fn grammar_at(field: impl Into<String>, message: impl Into<String>, position: usize) -> Self {
        Error::Grammar {
            field: field.into(),
            message: message.into(),
            position,
        }
    }

    /// Offset carried by lexical and grammar errors.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Lexical(e) => Some(e.position),
            Error::Grammar { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Rewrites a lexical error into a grammar error for `field`; other kinds pass through.
    pub fn in_field(self, field: &str) -> Self {
        match self {
            Error::Lexical(e) => Error::grammar(field, e),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_error_display_carries_position() {
        let err = LexicalError::new("expected ':'", "sip;x", 3);
        let text = err.to_string();
        assert!(text.contains("offset 3"));
        assert!(text.contains("sip;x"));
    }

    #[test]
    fn test_in_field_wraps_lexical() {
        let err = Error::from(LexicalError::new("expected digit", "b=AS:x", 5)).in_field("b");
        match err {
            Error::Grammar { field, position, .. } => {
                assert_eq!(field, "b");
                assert_eq!(position, 5);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(Error::ImmutableWildcard.in_field("c"), Error::ImmutableWildcard);
    }
}
