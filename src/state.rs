//! Parser state: the input cursor a parser runs against.
//!
//! All parsing goes through the [`ParseState`] trait so that the engine can
//! run the same parser over a plain in-memory state or over a chunk-indexed
//! incremental state. The trait's one interesting seam is
//! [`advance`](ParseState::advance): consuming an element is expressed as a
//! *parser*, which lets a state implementation decide how consumption
//! completes: immediately for [`ParserState`], or by suspending for the
//! next chunk in an incremental session.

use core::fmt;

use crate::parser::Parser;
use crate::stream::Stream;

/// A zero-based element index into the logical input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub index: usize,
}

impl Position {
    /// The position before any element has been consumed.
    #[inline]
    pub const fn initial() -> Self {
        Self { index: 0 }
    }

    /// The position after one more element.
    #[inline]
    pub const fn next(self) -> Self {
        Self {
            index: self.index + 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

/// The capabilities a parser requires of its state.
///
/// States are immutable values: every setter returns a new state and leaves
/// the receiver untouched, which is what makes backtracking (and suspension)
/// safe: an alternative can hold on to an earlier state and resume from it.
pub trait ParseState: Clone + 'static {
    /// The element type being consumed.
    type Token: Clone + fmt::Debug + 'static;
    /// Caller-defined state threaded through the parse.
    type User: Clone + 'static;

    /// The remaining input.
    fn input(&self) -> Stream<Self::Token>;

    /// The position of the next element to be consumed.
    fn position(&self) -> Position;

    /// The caller-defined state.
    fn user_state(&self) -> Self::User;

    /// A state reading from `input` instead, cursor semantics unchanged.
    fn set_input(&self, input: Stream<Self::Token>) -> Self;

    fn set_position(&self, position: Position) -> Self;

    fn set_user_state(&self, user: Self::User) -> Self;

    /// The state after consuming `x`: cursor moved past the last-matched
    /// value, position advanced.
    fn step(&self, x: &Self::Token) -> Self;

    #[inline]
    fn is_empty(&self) -> bool {
        self.input().is_empty()
    }

    /// The next element, without consuming it.
    #[inline]
    fn first(&self) -> Option<Self::Token> {
        self.input().first()
    }

    /// Consumption of `x`, expressed as a parser.
    ///
    /// The returned parser reports success with `x` and the successor state
    /// through the consumed-success continuation. Implementations may
    /// override this to defer completion; the incremental wrapper suspends
    /// here when the successor state has exhausted its chunk.
    fn advance<V: 'static>(&self, x: Self::Token) -> Parser<Self, Self::Token, V> {
        let next = self.step(&x);
        Parser::from_fn(move |_, k| k.cok(x.clone(), next.clone()))
    }
}

/// The base parser state: a lazy input stream, a position, and user state.
#[derive(Clone)]
pub struct ParserState<T: 'static, U> {
    input: Stream<T>,
    position: Position,
    user: U,
}

impl<T: Clone + 'static, U> ParserState<T, U> {
    pub fn new(input: Stream<T>, position: Position, user: U) -> Self {
        Self {
            input,
            position,
            user,
        }
    }

    /// A state at the initial position.
    pub fn initial(input: Stream<T>, user: U) -> Self {
        Self::new(input, Position::initial(), user)
    }
}

impl<T, U> ParseState for ParserState<T, U>
where
    T: Clone + fmt::Debug + 'static,
    U: Clone + 'static,
{
    type Token = T;
    type User = U;

    #[inline]
    fn input(&self) -> Stream<T> {
        self.input.clone()
    }

    #[inline]
    fn position(&self) -> Position {
        self.position
    }

    #[inline]
    fn user_state(&self) -> U {
        self.user.clone()
    }

    fn set_input(&self, input: Stream<T>) -> Self {
        Self::new(input, self.position, self.user.clone())
    }

    fn set_position(&self, position: Position) -> Self {
        Self::new(self.input.clone(), position, self.user.clone())
    }

    fn set_user_state(&self, user: U) -> Self {
        Self::new(self.input.clone(), self.position, user)
    }

    fn step(&self, _x: &T) -> Self {
        Self::new(self.input.rest(), self.position.next(), self.user.clone())
    }
}

/// States at the same position with the same user state are interchangeable
/// within one parse, so equality ignores the (lazy) input stream.
impl<T: 'static, U: PartialEq> PartialEq for ParserState<T, U> {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position && self.user == other.user
    }
}

impl<T: 'static, U: fmt::Debug> fmt::Debug for ParserState<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserState")
            .field("position", &self.position)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
