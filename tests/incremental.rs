//! The suspend/resume protocol: sessions, chunk boundaries, catch-up
//! resumption, and lazy repetition.

use sipkit::combinator::{eof, modify_user_state, next, optional};
use sipkit::text::{any_char, character, digit, string, trie};
use sipkit::{
    ErrorKind, ParseError, ParseState, ParserState, Position, Stream, parse_inc, run_inc,
    run_inc_state, run_many, run_many_stream,
};

#[test]
fn test_parse_across_chunk_boundary() {
    let session = run_inc(string("ab"), ());
    let session = session.provide_str("a");
    assert!(!session.is_done(), "still needs the second chunk");
    let session = session.provide_str("b");
    assert_eq!(session.finish(), Ok("ab".to_string()));
}

#[test]
fn test_missing_chunk_fails_at_finish() {
    let session = run_inc(string("ab"), ()).provide_str("a");
    let err = session.finish().unwrap_err();
    assert_eq!(err.position, Position { index: 1 });
    insta::assert_snapshot!(
        err,
        @r#"parse error at 1: expected 'b' in string "ab", found end of input"#
    );
}

#[test]
fn test_empty_chunk_is_a_no_op() {
    let session = run_inc(string("ab"), ());
    let session = session.provide_str("");
    assert_eq!(session.chunk_count(), 0);

    let session = session.provide_str("a").provide_str("").provide_str("b");
    assert_eq!(session.chunk_count(), 2);
    assert_eq!(session.finish(), Ok("ab".to_string()));
}

#[test]
fn test_terminal_session_ignores_further_chunks() {
    // The parse resolves mid-chunk, before end of input is ever signalled.
    let session = run_inc(string("ab"), ()).provide_str("abc");
    assert!(session.is_done());

    let session = session.force_provide(Stream::of_str("zzz"));
    assert!(session.is_done());
    assert_eq!(session.finish(), Ok("ab".to_string()));
}

#[test_case::test_case(&["abc"]; "single chunk")]
#[test_case::test_case(&["a", "bc"]; "split after one")]
#[test_case::test_case(&["ab", "c"]; "split after two")]
#[test_case::test_case(&["a", "b", "c"]; "one element per chunk")]
#[test_case::test_case(&["", "a", "", "bc", ""]; "empty chunks interleaved")]
fn test_chunk_boundaries_are_invisible(chunks: &[&str]) {
    let mut session = run_inc(string("abc"), ());
    for chunk in chunks {
        session = session.provide_str(chunk);
    }
    assert_eq!(session.finish(), Ok("abc".to_string()));
}

#[test]
fn test_backtracking_reuses_buffered_chunks() {
    // The first branch needs chunks 0 and 1 before failing at end of input;
    // the second branch then re-reads both from the session's buffer. Two
    // provides are all the driver ever gets.
    let p = string("aab").or(string("aa"));
    let session = run_inc(p, ()).provide_str("a");
    assert!(!session.is_done());
    let session = session.provide_str("a");
    assert!(!session.is_done());
    assert_eq!(session.finish(), Ok("aa".to_string()));
}

#[test]
fn test_backtracking_within_a_resumed_chunk() {
    // Longest-match falls back to "cat" after "ara" rules out "cataract";
    // the fallback state lives inside chunk 1 and needs no re-delivery.
    let p = trie(&["cat", "cataract"]);
    let session = run_inc(p, ()).provide_str("cat").provide_str("ara");
    assert_eq!(session.finish(), Ok("cat".to_string()));
}

#[test]
fn test_optional_resolves_at_end_of_input() {
    let p = character('a').and_then(|_| optional('z', character('b')));
    let session = run_inc(p, ()).provide_str("a");
    assert!(!session.is_done(), "optional must wait for more input");
    assert_eq!(session.finish(), Ok('z'));
}

#[test]
fn test_eof_parser_finishes_with_no_chunks() {
    let session = run_inc::<char, (), ()>(eof(), ());
    assert_eq!(session.finish(), Ok(()));
}

#[test]
fn test_seeded_state_feeds_initial_input() {
    let state = ParserState::initial(Stream::of_str("abc"), ());
    let session = run_inc_state(string("ab"), state);
    assert!(session.is_done(), "seeded input resolves before any provide");
    assert_eq!(session.finish(), Ok("ab".to_string()));
}

#[test]
fn test_failure_is_an_ordinary_outcome() {
    let session = run_inc(string("ab"), ()).provide_str("ax");
    assert!(session.is_done());
    let err = session.finish().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Expected { .. }));
}

#[test]
fn test_parse_inc_maps_outcomes_through_callbacks() {
    let session = parse_inc(
        character('x'),
        (),
        |c, _| format!("ok:{c}"),
        |e: ParseError, _| format!("err:{}", e.kind),
    );
    let outcome = session.provide_str("x").finish();
    assert_eq!(outcome, "ok:x");

    let session = parse_inc(
        character('x'),
        (),
        |c, _| format!("ok:{c}"),
        |e: ParseError, _| format!("err:{}", e.kind),
    );
    assert_eq!(session.finish(), "err:expected 'x', found end of input");
}

#[test]
fn test_user_state_survives_suspension() {
    let count_one = || next(any_char(), modify_user_state(|n: u32| n + 1));
    let p = next(count_one(), count_one());
    let session = parse_inc(p, 0u32, |_, s| s.user_state(), |_, _| u32::MAX);
    let session = session.provide_str("a").provide_str("b");
    assert_eq!(session.finish(), 2);
}

#[test]
fn test_run_many_is_lazy_over_unbounded_input() {
    // The input never ends; only the forced prefix is ever parsed.
    let matches = run_many(digit(), std::iter::repeat('1'), ());
    let prefix: String = matches.iter().take(5).collect();
    assert_eq!(prefix, "11111");
}

#[test]
fn test_run_many_stops_at_first_non_match() {
    let matches = run_many(digit(), "12x34".chars().collect::<Vec<_>>(), ());
    let all: String = matches.iter().collect();
    assert_eq!(all, "12");
}

#[test]
fn test_run_many_stream_memoizes_elements() {
    let matches = run_many_stream(digit(), Stream::of_str("123"), ());
    let first: String = matches.iter().take(2).collect();
    let again: String = matches.iter().collect();
    assert_eq!(first, "12");
    assert_eq!(again, "123");
}

#[test]
#[should_panic(expected = "parse failure during lazy repetition")]
fn test_run_many_raises_consumed_failures() {
    let pair = character('a').and_then(|_| character('b'));
    let matches = run_many(pair, "abac".chars().collect::<Vec<_>>(), ());
    let _ = matches.iter().count();
}

#[test]
fn test_run_many_with_attempt_truncates_instead() {
    let pair = character('a').and_then(|_| character('b')).attempt();
    let matches = run_many(pair, "abac".chars().collect::<Vec<_>>(), ());
    assert_eq!(matches.iter().count(), 1);
}
