//! Parse failure values.
//!
//! A [`ParseError`] is an ordinary, expected outcome of running a parser: it
//! is delivered to the caller's failure continuation, never thrown. The
//! engine itself never drops a failure; every finished parse reduces to
//! either the success value or one of these.

use crate::state::Position;

/// A parse failure at a known input position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("parse error at {position}: {kind}")]
pub struct ParseError {
    /// Element index at which the failure was reported.
    pub position: Position,
    /// What went wrong.
    pub kind: ErrorKind,
}

/// The kinds of parse failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// The input ended before the parser was satisfied.
    #[error("unexpected end of input")]
    EndOfInput,

    /// An element was present but not acceptable, with no expectation named.
    #[error("unexpected {found}")]
    Unexpected { found: String },

    /// An element was required and something else (or nothing) was found.
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },

    /// A suspension escaped to a non-incremental run.
    ///
    /// Only states that request chunks can produce this; it indicates a
    /// chunk-aware state was run outside a session.
    #[error("parser suspended awaiting chunk {0}")]
    Suspended(usize),

    /// A free-form failure message.
    #[error("{0}")]
    Message(String),
}

impl ParseError {
    pub fn new(position: Position, kind: ErrorKind) -> Self {
        Self { position, kind }
    }

    pub fn end_of_input(position: Position) -> Self {
        Self::new(position, ErrorKind::EndOfInput)
    }

    pub fn unexpected(position: Position, found: impl Into<String>) -> Self {
        Self::new(
            position,
            ErrorKind::Unexpected {
                found: found.into(),
            },
        )
    }

    /// An expectation failure. `found` of `None` reads as end of input.
    pub fn expected(position: Position, expected: impl Into<String>, found: Option<String>) -> Self {
        Self::new(
            position,
            ErrorKind::Expected {
                expected: expected.into(),
                found: found.unwrap_or_else(|| "end of input".into()),
            },
        )
    }

    pub fn message(position: Position, message: impl Into<String>) -> Self {
        Self::new(position, ErrorKind::Message(message.into()))
    }

    /// Combines the failures of two alternatives.
    ///
    /// The failure that progressed furthest wins. At equal positions two
    /// expectation failures are joined (`expected 'a' or 'b'`); otherwise
    /// the later alternative's failure is kept.
    pub fn merge(self, other: ParseError) -> ParseError {
        use std::cmp::Ordering;

        match self.position.cmp(&other.position) {
            Ordering::Greater => self,
            Ordering::Less => other,
            Ordering::Equal => match (self.kind, other.kind) {
                (
                    ErrorKind::Expected { expected: a, found },
                    ErrorKind::Expected { expected: b, .. },
                ) => ParseError::new(
                    other.position,
                    ErrorKind::Expected {
                        expected: format!("{a} or {b}"),
                        found,
                    },
                ),
                (_, kind) => ParseError::new(other.position, kind),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_furthest() {
        let near = ParseError::end_of_input(Position::initial());
        let far = ParseError::unexpected(Position::initial().next(), "'x'");
        assert_eq!(near.clone().merge(far.clone()), far.clone().merge(near));
    }

    #[test]
    fn test_merge_joins_expectations_at_same_position() {
        let pos = Position::initial();
        let a = ParseError::expected(pos, "'a'", Some("'c'".into()));
        let b = ParseError::expected(pos, "'b'", Some("'c'".into()));
        let merged = a.merge(b);
        assert_eq!(
            merged.kind,
            ErrorKind::Expected {
                expected: "'a' or 'b'".into(),
                found: "'c'".into()
            }
        );
    }
}
