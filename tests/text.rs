//! Character-level combinator behavior.

use sipkit::combinator::either;
use sipkit::text::{any_char, character, letter, one_of, satisfy, space, string, trie};
use sipkit::{ErrorKind, ParseError, Parser, ParserState, Stream, run_state};

type CharState = ParserState<char, ()>;

fn run<A: 'static>(
    p: &Parser<CharState, A, Result<A, ParseError>>,
    input: &str,
) -> Result<A, ParseError> {
    run_state(p, ParserState::initial(Stream::of_str(input), ()))
}

#[test]
fn test_character() {
    assert_eq!(run(&character('q'), "q"), Ok('q'));
    let err = run(&character('q'), "r").unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::Expected {
            expected: "'q'".into(),
            found: "'r'".into()
        }
    );
}

#[test]
fn test_one_of() {
    let p = one_of("+-*/");
    assert_eq!(run(&p, "*"), Ok('*'));
    let err = run(&p, "%").unwrap_err();
    insta::assert_snapshot!(err, @r#"parse error at 0: expected one of "+-*/", found '%'"#);
}

#[test]
fn test_string_matches_literally() {
    assert_eq!(run(&string("let"), "let x"), Ok("let".to_string()));
}

#[test]
fn test_string_is_atomic() {
    // A shared prefix must not poison the second alternative.
    let p = either(string("foo"), string("fob"));
    assert_eq!(run(&p, "fob"), Ok("fob".to_string()));
}

#[test]
fn test_string_reports_end_of_input() {
    let err = run(&string("let"), "le").unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::Expected {
            expected: "'t' in string \"let\"".into(),
            found: "end of input".into()
        }
    );
}

#[test_case::test_case("iff", Ok("iff"); "longest word wins")]
#[test_case::test_case("if", Ok("if"); "exact shorter word")]
#[test_case::test_case("ifx", Ok("if"); "falls back to completed prefix")]
#[test_case::test_case("for", Ok("for"); "disjoint word")]
#[test_case::test_case("fox", Err(()); "incomplete word fails")]
fn test_trie_longest_match(input: &str, outcome: Result<&str, ()>) {
    let p = trie(&["if", "iff", "for"]);
    let got = run(&p, input);
    match outcome {
        Ok(word) => assert_eq!(got, Ok(word.to_string())),
        Err(()) => assert!(got.is_err()),
    }
}

#[test]
fn test_trie_leaves_cursor_after_match() {
    let p = trie(&["if", "iff"]).and_then(|word| character('!').map(move |_| word.clone()));
    assert_eq!(run(&p, "if!"), Ok("if".to_string()));
}

#[test_case::test_case('x', true; "ascii letter")]
#[test_case::test_case('é', true; "accented letter")]
#[test_case::test_case('3', false; "digit is not a letter")]
fn test_letter(c: char, ok: bool) {
    assert_eq!(run(&letter(), &c.to_string()).is_ok(), ok);
}

#[test]
fn test_space_and_any_char() {
    assert_eq!(run(&space(), " "), Ok(' '));
    assert_eq!(run(&any_char(), "\u{1F980}"), Ok('\u{1F980}'));
    let err = run(&any_char(), "").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Expected { .. }));
}

#[test]
fn test_satisfy_uses_label() {
    let p = satisfy(|c| c == '_' || c.is_alphanumeric(), "an identifier character");
    let err = run(&p, "-").unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::Expected {
            expected: "an identifier character".into(),
            found: "'-'".into()
        }
    );
}
