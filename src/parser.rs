//! The continuation-passing parse machine and its trampoline.
//!
//! A [`Parser`] is a function from a state and four continuations to a
//! [`Step`]. Steps are the trampoline's alphabet: a finished answer, a
//! deferred piece of work, or a suspension awaiting an input chunk.
//! [`trampoline`] evaluates deferred work in a loop, so the host call stack
//! stays flat no matter how many bind steps or chunk boundaries a parse
//! crosses.
//!
//! The answer type `V` is fixed for a whole run and chosen by the entry
//! point: a `Result` for [`run_state`], a session for an incremental parse,
//! a stream for lazy repetition. Individual parsers stay generic in `V` and
//! simply thread it.

use std::rc::Rc;

use crate::error::{ErrorKind, ParseError};
use crate::incremental::Request;
use crate::state::{ParseState, Position};

/// A deferred unit of parse work.
pub type Thunk<S, V> = Box<dyn FnOnce() -> Step<S, V>>;

/// One move of the parse machine.
pub enum Step<S: ParseState, V: 'static> {
    /// The run's final answer.
    Done(V),
    /// More work; the trampoline will invoke it.
    Next(Thunk<S, V>),
    /// Paused: the computation needs an input chunk it does not have.
    Suspend(Request<S, V>),
}

/// A [`Step`] with the deferred work evaluated away.
pub enum Settled<S: ParseState, V: 'static> {
    Done(V),
    Suspended(Request<S, V>),
}

/// Evaluates deferred work until the step settles.
///
/// This is an explicit loop: logical recursion depth (bind chains, chunk
/// crossings) costs heap, never host stack.
pub fn trampoline<S: ParseState, V: 'static>(mut step: Step<S, V>) -> Settled<S, V> {
    loop {
        match step {
            Step::Next(thunk) => step = thunk(),
            Step::Done(value) => return Settled::Done(value),
            Step::Suspend(request) => return Settled::Suspended(request),
        }
    }
}

/// A success continuation: receives the yielded value and the state after it.
pub type OkCont<S, A, V> = Rc<dyn Fn(A, S) -> Step<S, V>>;
/// A failure continuation: receives the failure and the state it arose in.
pub type ErrCont<S, V> = Rc<dyn Fn(ParseError, S) -> Step<S, V>>;

/// The four continuations a parser is run with.
///
/// The consumed/empty split (`c*` vs `e*`) is what gives alternation its
/// semantics: `either` only falls through to its second branch on a failure
/// that consumed nothing, and `attempt` works by re-routing consumed
/// failures onto the empty-failure continuation.
pub struct Conts<S: ParseState, A: 'static, V: 'static> {
    /// Success after consuming input.
    pub cok: OkCont<S, A, V>,
    /// Failure after consuming input.
    pub cerr: ErrCont<S, V>,
    /// Success without consuming input.
    pub eok: OkCont<S, A, V>,
    /// Failure without consuming input.
    pub eerr: ErrCont<S, V>,
}

impl<S: ParseState, A: 'static, V: 'static> Conts<S, A, V> {
    pub fn new(
        cok: OkCont<S, A, V>,
        cerr: ErrCont<S, V>,
        eok: OkCont<S, A, V>,
        eerr: ErrCont<S, V>,
    ) -> Self {
        Self {
            cok,
            cerr,
            eok,
            eerr,
        }
    }

    /// Reports success after consuming input.
    #[inline]
    pub fn cok(&self, x: A, s: S) -> Step<S, V> {
        self.cok.as_ref()(x, s)
    }

    /// Reports failure after consuming input.
    #[inline]
    pub fn cerr(&self, e: ParseError, s: S) -> Step<S, V> {
        self.cerr.as_ref()(e, s)
    }

    /// Reports success without consuming input.
    #[inline]
    pub fn eok(&self, x: A, s: S) -> Step<S, V> {
        self.eok.as_ref()(x, s)
    }

    /// Reports failure without consuming input.
    #[inline]
    pub fn eerr(&self, e: ParseError, s: S) -> Step<S, V> {
        self.eerr.as_ref()(e, s)
    }

    /// The view of these continuations once input has already been consumed:
    /// an empty outcome downstream is still a consumed outcome overall.
    pub fn consumed(&self) -> Self {
        Self {
            cok: self.cok.clone(),
            cerr: self.cerr.clone(),
            eok: self.cok.clone(),
            eerr: self.cerr.clone(),
        }
    }
}

impl<S: ParseState, A: 'static, V: 'static> Clone for Conts<S, A, V> {
    fn clone(&self) -> Self {
        Self {
            cok: self.cok.clone(),
            cerr: self.cerr.clone(),
            eok: self.eok.clone(),
            eerr: self.eerr.clone(),
        }
    }
}

/// A parser over states `S`, yielding `A`, inside a run whose answer is `V`.
pub struct Parser<S: ParseState, A: 'static, V: 'static> {
    run: Rc<dyn Fn(S, Conts<S, A, V>) -> Step<S, V>>,
}

impl<S: ParseState, A: 'static, V: 'static> Clone for Parser<S, A, V> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            run: self.run.clone(),
        }
    }
}

impl<S: ParseState, A: 'static, V: 'static> Parser<S, A, V> {
    /// Wraps a raw continuation-passing function.
    pub fn from_fn(f: impl Fn(S, Conts<S, A, V>) -> Step<S, V> + 'static) -> Self {
        Self { run: Rc::new(f) }
    }

    /// Runs one step of this parser. Callers are expected to [`trampoline`]
    /// the result.
    #[inline]
    pub fn run(&self, state: S, conts: Conts<S, A, V>) -> Step<S, V> {
        self.run.as_ref()(state, conts)
    }
}

/// Runs `p` against `state`, mapping the outcome through `ok`/`err`.
///
/// Returns the first [`Step`] untrampolined so callers can drive it
/// themselves; the incremental session driver relies on this to interleave
/// chunk delivery with evaluation.
pub fn parse_state<S, A, V>(
    p: &Parser<S, A, V>,
    state: S,
    ok: impl Fn(A, S) -> V + 'static,
    err: impl Fn(ParseError, S) -> V + 'static,
) -> Step<S, V>
where
    S: ParseState,
    A: 'static,
    V: 'static,
{
    let ok = Rc::new(ok);
    let err = Rc::new(err);
    let cok: OkCont<S, A, V> = {
        let ok = ok.clone();
        Rc::new(move |x, s| Step::Done(ok.as_ref()(x, s)))
    };
    let eok: OkCont<S, A, V> = Rc::new(move |x, s| Step::Done(ok.as_ref()(x, s)));
    let cerr: ErrCont<S, V> = {
        let err = err.clone();
        Rc::new(move |e, s| Step::Done(err.as_ref()(e, s)))
    };
    let eerr: ErrCont<S, V> = Rc::new(move |e, s| Step::Done(err.as_ref()(e, s)));
    p.run(state, Conts::new(cok, cerr, eok, eerr))
}

/// Runs `p` to completion against `state`.
///
/// A suspension cannot settle here (there is no session to feed it), so it
/// is reported as [`ErrorKind::Suspended`] rather than resumed.
pub fn run_state<S, A>(
    p: &Parser<S, A, Result<A, ParseError>>,
    state: S,
) -> Result<A, ParseError>
where
    S: ParseState,
    A: 'static,
{
    match trampoline(parse_state(p, state, |x, _| Ok(x), |e, _| Err(e))) {
        Settled::Done(result) => result,
        Settled::Suspended(request) => Err(ParseError::new(
            Position::initial(),
            ErrorKind::Suspended(request.chunk()),
        )),
    }
}
