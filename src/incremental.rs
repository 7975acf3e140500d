//! Incremental (chunk-resumable) parsing.
//!
//! This module lets a parser consume input that is not fully available up
//! front. Input arrives as discrete chunks fed into a [`Session`]; when the
//! parser exhausts the current chunk it *suspends*, returning control to
//! the caller as a paused session, and resumes transparently once the next
//! chunk arrives, as if the whole input had been one contiguous stream.
//!
//! # Protocol
//!
//! - [`run_inc`] / [`parse_inc`] bootstrap a session from a parser.
//! - [`Session::provide`] feeds one chunk and advances the parse until it
//!   either finishes or needs a chunk it does not have yet.
//! - [`Session::finish`] signals that no more input will ever arrive and
//!   extracts the result.
//!
//! ```ignore
//! let session = run_inc(string("ab"), ());
//! let session = session.provide_str("a"); // suspended, needs more
//! let session = session.provide_str("b");
//! assert_eq!(session.finish(), Ok("ab".to_string()));
//! ```
//!
//! Suspension is cooperative and single-threaded: a paused session is an
//! inert value that can be resumed later or simply dropped. Sessions are
//! linear (feeding one consumes it and returns its successor), so the
//! pending continuation is consumed exactly once by construction, and two
//! independently-fed sessions are necessarily separate lineages.
//!
//! Chunks are indexed in arrival order and buffered for the life of the
//! session: a parser that backtracks across a chunk boundary is re-served
//! buffered chunks by the driver's catch-up loop without the caller ever
//! being asked for them again.

use core::fmt;
use std::cell::OnceCell;
use std::rc::Rc;

use crate::combinator::{bind, optional};
use crate::error::ParseError;
use crate::parser::{Conts, ErrCont, OkCont, Parser, Settled, Step, parse_state, trampoline};
use crate::state::{ParseState, ParserState, Position};
use crate::stream::Stream;

/// A paused computation: "stopped here, needs chunk `chunk`, call `resume`
/// with that chunk's content to continue."
///
/// Requests are inert descriptions; the session driver consumes each one
/// exactly once.
pub struct Request<S: ParseState, V: 'static> {
    chunk: usize,
    resume: Box<dyn FnOnce(Stream<S::Token>) -> Step<S, V>>,
}

impl<S: ParseState, V: 'static> Request<S, V> {
    pub fn new(
        chunk: usize,
        resume: impl FnOnce(Stream<S::Token>) -> Step<S, V> + 'static,
    ) -> Self {
        Self {
            chunk,
            resume: Box::new(resume),
        }
    }

    /// The index of the chunk this computation is waiting for.
    #[inline]
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    /// Resumes the computation with the requested chunk's content.
    #[inline]
    pub fn resume(self, input: Stream<S::Token>) -> Step<S, V> {
        (self.resume)(input)
    }
}

impl<S: ParseState, V: 'static> fmt::Debug for Request<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("chunk", &self.chunk)
            .finish_non_exhaustive()
    }
}

enum SessionKind<S: ParseState, R: 'static> {
    /// Waiting for the next chunk.
    Pending(Box<dyn FnOnce(Stream<S::Token>) -> Step<S, Session<S, R>>>),
    /// Terminal: the outcome is fixed and extraction is a zero-argument call.
    Finished(Box<dyn FnOnce() -> R>),
}

/// An incremental parse in progress: the buffered chunks plus the pending
/// continuation.
///
/// A session is either *pending* (the parser needs more input) or *done*
/// (the parse resolved to a success or failure; see [`is_done`]). Feeding a
/// terminal session is a no-op. The chunk buffer only ever grows, and index
/// `i` always refers to the same chunk once assigned.
///
/// [`is_done`]: Session::is_done
pub struct Session<S: ParseState, R: 'static> {
    kind: SessionKind<S, R>,
    chunks: Vec<Stream<S::Token>>,
}

impl<S: ParseState, R: 'static> Session<S, R> {
    fn pending(
        k: impl FnOnce(Stream<S::Token>) -> Step<S, Session<S, R>> + 'static,
        chunks: Vec<Stream<S::Token>>,
    ) -> Self {
        Self {
            kind: SessionKind::Pending(Box::new(k)),
            chunks,
        }
    }

    fn finished(k: impl FnOnce() -> R + 'static) -> Self {
        Self {
            kind: SessionKind::Finished(Box::new(k)),
            chunks: Vec::new(),
        }
    }

    /// True once the parse has resolved to a success or failure.
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self.kind, SessionKind::Finished(_))
    }

    /// Number of chunks delivered so far.
    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Feeds `chunk` unconditionally, even when it is empty.
    ///
    /// Appends the chunk, resumes the pending continuation, and drives the
    /// computation until it settles. While the settled result is a
    /// [`Request`] for a chunk that is already buffered (a parser
    /// backtracked across an earlier chunk boundary), the driver re-serves
    /// it locally; only a request for a genuinely new index re-suspends the
    /// session. Terminal sessions are returned unchanged.
    pub fn force_provide(self, chunk: Stream<S::Token>) -> Self {
        let (k, mut chunks) = match self.kind {
            SessionKind::Finished(_) => return self,
            SessionKind::Pending(k) => (k, self.chunks),
        };
        chunks.push(chunk.clone());
        let mut settled = trampoline(k(chunk));
        loop {
            match settled {
                Settled::Suspended(request) if request.chunk() < chunks.len() => {
                    let buffered = chunks[request.chunk()].clone();
                    settled = trampoline(request.resume(buffered));
                }
                Settled::Suspended(request) => {
                    let Request { resume, .. } = request;
                    return Session {
                        kind: SessionKind::Pending(resume),
                        chunks,
                    };
                }
                Settled::Done(terminal) => return terminal,
            }
        }
    }

    /// Feeds `chunk`; an empty chunk is a no-op.
    pub fn provide(self, chunk: Stream<S::Token>) -> Self {
        if chunk.is_empty() { self } else { self.force_provide(chunk) }
    }

    /// Signals end of input and extracts the result.
    ///
    /// Feeds the canonical empty terminal chunk, which forces any parser
    /// still waiting to see whether more input exists (an [`optional`], a
    /// pending element match) to resolve definitively. Safe on an
    /// already-terminal session: the stored result is returned.
    ///
    /// # Panics
    ///
    /// Panics if the parse still requests further input after end of input
    /// was signalled. No parser built from this crate's combinators does
    /// so; it would indicate a hand-written parser requesting chunks past
    /// the end.
    pub fn finish(self) -> R {
        match self.force_provide(Stream::nil()).kind {
            SessionKind::Finished(k) => k(),
            SessionKind::Pending(_) => {
                panic!("incremental parse did not settle after end of input")
            }
        }
    }
}

impl<S: ParseState<Token = char>, R: 'static> Session<S, R> {
    /// Feeds the characters of `input` as one chunk; `""` is a no-op.
    pub fn provide_str(self, input: &str) -> Self {
        self.provide(Stream::of_str(input))
    }
}

impl<S: ParseState, R: 'static> fmt::Debug for Session<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("done", &self.is_done())
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

/// A parser state decorated with the index of the chunk it is reading.
///
/// Delegates the read-only view (input cursor, position, user state) to the
/// wrapped state. The one behavioral difference is
/// [`advance`](ParseState::advance): when consuming an element exhausts the
/// current chunk, the returned parser suspends with a [`Request`] for chunk
/// `index + 1` instead of letting the exhaustion surface as a failure; its
/// resumption points the cursor at the new chunk and reports the originally
/// consumed element.
pub struct IncrementalState<S: ParseState> {
    chunk: usize,
    state: S,
    /// Successor base state, computed once per state instance.
    advanced: Rc<OnceCell<S>>,
}

impl<S: ParseState> IncrementalState<S> {
    pub fn new(chunk: usize, state: S) -> Self {
        Self {
            chunk,
            state,
            advanced: Rc::new(OnceCell::new()),
        }
    }

    /// The index of the chunk this state is reading.
    #[inline]
    pub fn chunk_index(&self) -> usize {
        self.chunk
    }

    /// The wrapped base state.
    #[inline]
    pub fn inner(&self) -> &S {
        &self.state
    }
}

impl<S: ParseState> Clone for IncrementalState<S> {
    fn clone(&self) -> Self {
        Self {
            chunk: self.chunk,
            state: self.state.clone(),
            advanced: self.advanced.clone(),
        }
    }
}

impl<S: ParseState + PartialEq> PartialEq for IncrementalState<S> {
    fn eq(&self, other: &Self) -> bool {
        self.chunk == other.chunk && self.state == other.state
    }
}

impl<S: ParseState + fmt::Debug> fmt::Debug for IncrementalState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncrementalState")
            .field("chunk", &self.chunk)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S: ParseState> ParseState for IncrementalState<S> {
    type Token = S::Token;
    type User = S::User;

    #[inline]
    fn input(&self) -> Stream<S::Token> {
        self.state.input()
    }

    #[inline]
    fn position(&self) -> Position {
        self.state.position()
    }

    #[inline]
    fn user_state(&self) -> S::User {
        self.state.user_state()
    }

    fn set_input(&self, input: Stream<S::Token>) -> Self {
        Self::new(self.chunk, self.state.set_input(input))
    }

    fn set_position(&self, position: Position) -> Self {
        Self::new(self.chunk, self.state.set_position(position))
    }

    fn set_user_state(&self, user: S::User) -> Self {
        Self::new(self.chunk, self.state.set_user_state(user))
    }

    fn step(&self, x: &S::Token) -> Self {
        Self::new(self.chunk, self.state.step(x))
    }

    fn advance<V: 'static>(&self, x: S::Token) -> Parser<Self, S::Token, V> {
        // Memoized per state instance (clones share the cell), so repeated
        // invocation within one resumption cycle is idempotent. The cell is
        // keyed by first call, not by argument; callers always pass the
        // state's own `first()` element, which cannot vary.
        let inner = self
            .advanced
            .get_or_init(|| self.state.step(&x))
            .clone();
        let chunk = self.chunk;
        if inner.is_empty() {
            Parser::from_fn(move |_, k: Conts<Self, S::Token, V>| {
                let x = x.clone();
                let inner = inner.clone();
                Step::Suspend(Request::new(chunk + 1, move |input: Stream<S::Token>| {
                    let resumed = IncrementalState::new(chunk + 1, inner.set_input(input));
                    k.cok(x, resumed)
                }))
            })
        } else {
            let successor = IncrementalState::new(chunk, inner);
            Parser::from_fn(move |_, k| k.cok(x.clone(), successor.clone()))
        }
    }
}

/// A parser runnable inside an incremental session over base state `S`,
/// yielding `A`, whose session resolves to `R`.
pub type IncParser<S, A, R> = Parser<IncrementalState<S>, A, Session<IncrementalState<S>, R>>;

/// Starts an incremental parse of `p` from `state`.
///
/// `ok` and `err` map the parse outcome (value or failure, with the final
/// state) to the session's result; [`Session::finish`] returns whatever
/// they produce. Any input already present on `state` is fed as the first
/// chunk before returning, so the session may come back already terminal.
pub fn parse_inc_state<S, A, R>(
    p: IncParser<S, A, R>,
    state: S,
    ok: impl Fn(A, IncrementalState<S>) -> R + 'static,
    err: impl Fn(ParseError, IncrementalState<S>) -> R + 'static,
) -> Session<IncrementalState<S>, R>
where
    S: ParseState,
    A: 'static,
    R: 'static,
{
    let ok = Rc::new(ok);
    let err = Rc::new(err);
    let pok: OkCont<IncrementalState<S>, A, Session<IncrementalState<S>, R>> = {
        let ok = ok.clone();
        Rc::new(move |x, s| {
            let ok = ok.clone();
            Step::Done(Session::finished(move || ok.as_ref()(x, s)))
        })
    };
    let perr: ErrCont<IncrementalState<S>, Session<IncrementalState<S>, R>> = {
        let err = err.clone();
        Rc::new(move |e, s| {
            let err = err.clone();
            Step::Done(Session::finished(move || err.as_ref()(e, s)))
        })
    };

    let input = state.input();
    let entry = move |first_chunk: Stream<S::Token>| {
        let start = IncrementalState::new(0, state.set_input(first_chunk));
        let conts = Conts::new(pok.clone(), perr.clone(), pok, perr);
        p.run(start, conts)
    };
    Session::pending(entry, Vec::new()).provide(input)
}

/// Starts an incremental parse with a fresh base state carrying `user`.
pub fn parse_inc<T, U, A, R>(
    p: IncParser<ParserState<T, U>, A, R>,
    user: U,
    ok: impl Fn(A, IncrementalState<ParserState<T, U>>) -> R + 'static,
    err: impl Fn(ParseError, IncrementalState<ParserState<T, U>>) -> R + 'static,
) -> Session<IncrementalState<ParserState<T, U>>, R>
where
    T: Clone + fmt::Debug + 'static,
    U: Clone + 'static,
    A: 'static,
    R: 'static,
{
    parse_inc_state(p, ParserState::initial(Stream::nil(), user), ok, err)
}

/// [`parse_inc_state`] with the outcome fixed to `Result`:
/// [`Session::finish`] returns the parsed value or the failure.
pub fn run_inc_state<S, A>(
    p: IncParser<S, A, Result<A, ParseError>>,
    state: S,
) -> Session<IncrementalState<S>, Result<A, ParseError>>
where
    S: ParseState,
    A: 'static,
{
    parse_inc_state(p, state, |x, _| Ok(x), |e, _| Err(e))
}

/// [`run_inc_state`] with a fresh base state carrying `user`.
pub fn run_inc<T, U, A>(
    p: IncParser<ParserState<T, U>, A, Result<A, ParseError>>,
    user: U,
) -> Session<IncrementalState<ParserState<T, U>>, Result<A, ParseError>>
where
    T: Clone + fmt::Debug + 'static,
    U: Clone + 'static,
    A: 'static,
{
    run_inc_state(p, ParserState::initial(Stream::nil(), user))
}

/// Runs zero-or-more occurrences of `p` from `state`, yielding the matches
/// as a lazy memoized stream.
///
/// Each element of the stream holds one match; forcing an element's tail
/// runs the parse one occurrence further from the state that followed it.
/// Consuming the first `k` elements therefore performs exactly `k` parse
/// steps and never buffers the remainder, so unbounded inputs yield
/// unbounded streams.
///
/// An occurrence that fails without consuming input ends the stream (classic
/// zero-or-more). An occurrence that fails *after* consuming input is an
/// unrecoverable parse error and panics with the rendered failure; wrap `p`
/// in [`attempt`](crate::combinator::attempt) to truncate instead. A parser
/// that succeeds without consuming anything yields an endless stream of the
/// same value.
pub fn run_many_state<S, A>(p: Parser<S, A, Stream<A>>, state: S) -> Stream<A>
where
    S: ParseState,
    A: Clone + 'static,
{
    let many = many_parser(p);
    let step = parse_state(&many, state, |xs, _| xs, |e, _| -> Stream<A> {
        panic!("parse failure during lazy repetition: {e}")
    });
    match trampoline(step) {
        Settled::Done(xs) => xs,
        Settled::Suspended(_) => {
            panic!("lazy repetition suspended outside an incremental session")
        }
    }
}

/// Zero-or-more of `p` as "one occurrence, then a lazily-continued stream",
/// falling back to the empty stream when no occurrence matches.
fn many_parser<S, A>(p: Parser<S, A, Stream<A>>) -> Parser<S, Stream<A>, Stream<A>>
where
    S: ParseState,
    A: Clone + 'static,
{
    let element = {
        let p = p.clone();
        bind(p.clone(), move |x| {
            let p = p.clone();
            Parser::from_fn(move |state: S, k: Conts<S, Stream<A>, Stream<A>>| {
                let tail_p = p.clone();
                let tail_state = state.clone();
                let matches = Stream::memo(x.clone(), move || run_many_state(tail_p, tail_state));
                k.eok(matches, state)
            })
        })
    };
    optional(Stream::nil(), element)
}

/// [`run_many_state`] over a lazy element stream.
pub fn run_many_stream<T, U, A>(
    p: Parser<ParserState<T, U>, A, Stream<A>>,
    input: Stream<T>,
    user: U,
) -> Stream<A>
where
    T: Clone + fmt::Debug + 'static,
    U: Clone + 'static,
    A: Clone + 'static,
{
    run_many_state(p, ParserState::initial(input, user))
}

/// [`run_many_state`] over a materialized input collection (or any owned
/// iterator, including unbounded ones).
pub fn run_many<T, U, A, I>(p: Parser<ParserState<T, U>, A, Stream<A>>, input: I, user: U) -> Stream<A>
where
    T: Clone + fmt::Debug + 'static,
    U: Clone + 'static,
    A: Clone + 'static,
    I: IntoIterator<Item = T>,
    I::IntoIter: 'static,
{
    run_many_stream(p, Stream::from_iter(input), user)
}

#[cfg(test)]
mod tests {
    use super::*;

    type CharState = ParserState<char, ()>;

    fn base(input: &str) -> CharState {
        ParserState::initial(Stream::of_str(input), ())
    }

    #[test]
    fn test_incremental_state_equality() {
        let a = IncrementalState::new(1, base("xy"));
        let b = IncrementalState::new(1, base("zw"));
        let c = IncrementalState::new(2, base("xy"));
        // Base-state equality is positional, so a == b; chunk indexes split c off.
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_setters_keep_chunk_index() {
        let st = IncrementalState::new(3, base("abc"));
        assert_eq!(st.set_input(Stream::of_str("z")).chunk_index(), 3);
        assert_eq!(st.set_position(Position { index: 9 }).chunk_index(), 3);
        assert_eq!(st.set_user_state(()).chunk_index(), 3);
        assert_eq!(st.step(&'a').chunk_index(), 3);
    }

    #[test]
    fn test_read_view_delegates() {
        let st = IncrementalState::new(0, base("abc").step(&'a'));
        assert_eq!(st.first(), Some('b'));
        assert_eq!(st.position(), Position { index: 1 });
        assert!(!st.is_empty());
    }
}
