//! Chunk-resumable monadic parser combinators.
//!
//! `sipkit` runs a parser over input that arrives in pieces. When the parser
//! exhausts the data delivered so far it suspends, handing an inert
//! [`Session`] value back to the caller, and resumes exactly where it
//! stopped once the next chunk is fed in. Chunk boundaries are invisible to
//! parse semantics: feeding `"ab"` at once or `"a"` then `"b"` yields the
//! same result.
//!
//! # Architecture
//!
//! - [`Stream`] / [`Lazy`]: memoized lazy sequences, the input representation.
//! - [`ParseState`] / [`ParserState`]: the immutable cursor a parser runs
//!   against; the trait seam through which suspension is injected.
//! - [`Parser`] + [`trampoline`]: a continuation-passing machine driven by an
//!   explicit work loop, so arbitrarily deep parses never grow the call stack.
//! - [`combinator`]: the base algebra (`bind`, `either`, `attempt`, `token`, …).
//! - [`Session`] / [`IncrementalState`]: the chunk-indexed suspend/resume
//!   protocol, plus lazy unbounded repetition ([`run_many`]).
//! - [`text`]: character-level helpers (`character`, `string`, `trie`, …).
//!
//! # Example
//!
//! ```ignore
//! use sipkit::{run_inc, text::string};
//!
//! let session = run_inc(string("ab"), ());
//! let session = session.provide_str("a"); // not enough yet: suspended
//! let session = session.provide_str("b");
//! assert_eq!(session.finish(), Ok("ab".to_string()));
//! ```

pub mod combinator;
mod error;
mod incremental;
mod parser;
mod state;
mod stream;
pub mod text;

pub use error::{ErrorKind, ParseError};
pub use incremental::{
    IncParser, IncrementalState, Request, Session, parse_inc, parse_inc_state, run_inc,
    run_inc_state, run_many, run_many_state, run_many_stream,
};
pub use parser::{Conts, ErrCont, OkCont, Parser, Settled, Step, Thunk, parse_state, run_state, trampoline};
pub use state::{ParseState, ParserState, Position};
pub use stream::{Lazy, Stream};
