//! The base combinator algebra.
//!
//! Everything here is a plain CPS parser over any [`ParseState`]; none of it
//! knows about chunks or sessions. The incremental engine reuses this
//! algebra unchanged; suspension enters through the state's
//! [`advance`](ParseState::advance), not through any combinator.

use std::rc::Rc;

use crate::error::{ErrorKind, ParseError};
use crate::parser::{Conts, ErrCont, OkCont, Parser, Step};
use crate::state::{ParseState, Position};

/// Succeeds with `x` without consuming input.
pub fn always<S, A, V>(x: A) -> Parser<S, A, V>
where
    S: ParseState,
    A: Clone + 'static,
    V: 'static,
{
    Parser::from_fn(move |s, k| k.eok(x.clone(), s))
}

/// Fails with `message` without consuming input.
pub fn fail<S, A, V>(message: impl Into<String>) -> Parser<S, A, V>
where
    S: ParseState,
    A: 'static,
    V: 'static,
{
    let message: String = message.into();
    Parser::from_fn(move |s: S, k| k.eerr(ParseError::message(s.position(), message.clone()), s))
}

/// Sequences `p` with a parser computed from its value.
pub fn bind<S, A, B, V>(
    p: Parser<S, A, V>,
    f: impl Fn(A) -> Parser<S, B, V> + 'static,
) -> Parser<S, B, V>
where
    S: ParseState,
    A: 'static,
    B: 'static,
    V: 'static,
{
    let f = Rc::new(f);
    Parser::from_fn(move |s, k: Conts<S, B, V>| {
        let cok: OkCont<S, A, V> = {
            let f = f.clone();
            let k = k.consumed();
            Rc::new(move |x, s2| {
                let q = f(x);
                let k = k.clone();
                Step::Next(Box::new(move || q.run(s2, k)))
            })
        };
        let eok: OkCont<S, A, V> = {
            let f = f.clone();
            let k = k.clone();
            Rc::new(move |x, s2| {
                let q = f(x);
                let k = k.clone();
                Step::Next(Box::new(move || q.run(s2, k)))
            })
        };
        p.run(s, Conts::new(cok, k.cerr.clone(), eok, k.eerr.clone()))
    })
}

/// Applies `f` to the value `p` yields.
pub fn map<S, A, B, V>(p: Parser<S, A, V>, f: impl Fn(A) -> B + 'static) -> Parser<S, B, V>
where
    S: ParseState,
    A: 'static,
    B: 'static,
    V: 'static,
{
    let f = Rc::new(f);
    Parser::from_fn(move |s, k: Conts<S, B, V>| {
        let cok: OkCont<S, A, V> = {
            let f = f.clone();
            let c = k.cok.clone();
            Rc::new(move |x, s2| c.as_ref()(f(x), s2))
        };
        let eok: OkCont<S, A, V> = {
            let f = f.clone();
            let c = k.eok.clone();
            Rc::new(move |x, s2| c.as_ref()(f(x), s2))
        };
        p.run(s, Conts::new(cok, k.cerr.clone(), eok, k.eerr.clone()))
    })
}

/// Runs `p` then `q`, yielding `q`'s value.
pub fn next<S, A, B, V>(p: Parser<S, A, V>, q: Parser<S, B, V>) -> Parser<S, B, V>
where
    S: ParseState,
    A: 'static,
    B: 'static,
    V: 'static,
{
    bind(p, move |_| q.clone())
}

/// Tries `p`; if it fails without consuming input, tries `q` from the same
/// state. Failures at the same depth are merged into one report.
pub fn either<S, A, V>(p: Parser<S, A, V>, q: Parser<S, A, V>) -> Parser<S, A, V>
where
    S: ParseState,
    A: 'static,
    V: 'static,
{
    Parser::from_fn(move |s, k: Conts<S, A, V>| {
        let q = q.clone();
        let eerr: ErrCont<S, V> = {
            let k = k.clone();
            Rc::new(move |e1: ParseError, s2| {
                let q = q.clone();
                let qeerr: ErrCont<S, V> = {
                    let eerr = k.eerr.clone();
                    let e1 = e1.clone();
                    Rc::new(move |e2, s3| eerr.as_ref()(e1.clone().merge(e2), s3))
                };
                let k2 = Conts::new(k.cok.clone(), k.cerr.clone(), k.eok.clone(), qeerr);
                Step::Next(Box::new(move || q.run(s2, k2)))
            })
        };
        let k1 = Conts::new(k.cok.clone(), k.cerr.clone(), k.eok.clone(), eerr);
        p.run(s, k1)
    })
}

/// Runs `p` with backtracking: a failure that consumed input is re-reported
/// as an empty failure at the state `p` started from, so an enclosing
/// [`either`] can try its other branch.
pub fn attempt<S, A, V>(p: Parser<S, A, V>) -> Parser<S, A, V>
where
    S: ParseState,
    A: 'static,
    V: 'static,
{
    Parser::from_fn(move |s: S, k: Conts<S, A, V>| {
        let origin = s.clone();
        let eerr = k.eerr.clone();
        let cerr: ErrCont<S, V> = Rc::new(move |e, _| eerr.as_ref()(e, origin.clone()));
        p.run(s, Conts::new(k.cok, cerr, k.eok, k.eerr))
    })
}

/// Tries `p`; yields `default` if it fails without consuming input.
pub fn optional<S, A, V>(default: A, p: Parser<S, A, V>) -> Parser<S, A, V>
where
    S: ParseState,
    A: Clone + 'static,
    V: 'static,
{
    either(p, always(default))
}

/// Consumes one element satisfying `pred`.
///
/// On mismatch or exhausted input the error is built by `on_err`, which
/// receives the current position and the offending element (`None` at end
/// of input).
pub fn token<S, V>(
    pred: impl Fn(&S::Token) -> bool + 'static,
    on_err: impl Fn(Position, Option<&S::Token>) -> ParseError + 'static,
) -> Parser<S, S::Token, V>
where
    S: ParseState,
    V: 'static,
{
    Parser::from_fn(move |s: S, k| match s.first() {
        Some(x) if pred(&x) => {
            let p = s.advance::<V>(x);
            Step::Next(Box::new(move || p.run(s, k)))
        }
        Some(x) => k.eerr(on_err(s.position(), Some(&x)), s),
        None => k.eerr(on_err(s.position(), None), s),
    })
}

/// Consumes any one element; fails only at end of input.
pub fn any_token<S, V>() -> Parser<S, S::Token, V>
where
    S: ParseState,
    V: 'static,
{
    token(|_| true, |position, _| ParseError::end_of_input(position))
}

/// Succeeds only when no input remains.
pub fn eof<S, V>() -> Parser<S, (), V>
where
    S: ParseState,
    V: 'static,
{
    Parser::from_fn(|s: S, k| {
        if s.is_empty() {
            k.eok((), s)
        } else {
            let found = s.first().map(|t| format!("{t:?}"));
            k.eerr(ParseError::expected(s.position(), "end of input", found), s)
        }
    })
}

/// Relabels `p`'s empty failures with `label` as the expectation.
///
/// Failures that consumed input keep their original report, as do free-form
/// message failures.
pub fn expected<S, A, V>(label: impl Into<String>, p: Parser<S, A, V>) -> Parser<S, A, V>
where
    S: ParseState,
    A: 'static,
    V: 'static,
{
    let label: Rc<str> = Rc::from(label.into());
    Parser::from_fn(move |s, k: Conts<S, A, V>| {
        let eerr: ErrCont<S, V> = {
            let inner = k.eerr.clone();
            let label = label.clone();
            Rc::new(move |e: ParseError, s2| {
                let found = match e.kind {
                    ErrorKind::Expected { found, .. } => found,
                    ErrorKind::Unexpected { found } => found,
                    ErrorKind::EndOfInput => "end of input".into(),
                    other => {
                        return inner.as_ref()(ParseError::new(e.position, other), s2);
                    }
                };
                inner.as_ref()(ParseError::expected(e.position, label.to_string(), Some(found)), s2)
            })
        };
        p.run(s, Conts::new(k.cok, k.cerr, k.eok, eerr))
    })
}

/// Yields the current parser state without consuming input.
pub fn get_parser_state<S, V>() -> Parser<S, S, V>
where
    S: ParseState,
    V: 'static,
{
    Parser::from_fn(|s: S, k| k.eok(s.clone(), s))
}

/// Yields the current user state.
pub fn get_user_state<S, V>() -> Parser<S, S::User, V>
where
    S: ParseState,
    V: 'static,
{
    Parser::from_fn(|s: S, k| k.eok(s.user_state(), s))
}

/// Replaces the user state.
pub fn set_user_state<S, V>(user: S::User) -> Parser<S, (), V>
where
    S: ParseState,
    V: 'static,
{
    Parser::from_fn(move |s: S, k| k.eok((), s.set_user_state(user.clone())))
}

/// Applies `f` to the user state.
pub fn modify_user_state<S, V>(f: impl Fn(S::User) -> S::User + 'static) -> Parser<S, (), V>
where
    S: ParseState,
    V: 'static,
{
    Parser::from_fn(move |s: S, k| k.eok((), s.set_user_state(f(s.user_state()))))
}

impl<S: ParseState, A: 'static, V: 'static> Parser<S, A, V> {
    /// Method form of [`map`].
    pub fn map<B: 'static>(self, f: impl Fn(A) -> B + 'static) -> Parser<S, B, V> {
        map(self, f)
    }

    /// Method form of [`bind`].
    pub fn and_then<B: 'static>(
        self,
        f: impl Fn(A) -> Parser<S, B, V> + 'static,
    ) -> Parser<S, B, V> {
        bind(self, f)
    }

    /// Method form of [`either`].
    pub fn or(self, other: Parser<S, A, V>) -> Parser<S, A, V> {
        either(self, other)
    }

    /// Method form of [`attempt`].
    pub fn attempt(self) -> Parser<S, A, V> {
        attempt(self)
    }
}
