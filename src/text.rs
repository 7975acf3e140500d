//! Character-level combinators.
//!
//! Plain usages of the base algebra over `char` streams; none of these know
//! about chunks, so all of them work unchanged inside an incremental
//! session fed via [`Session::provide_str`](crate::Session::provide_str).

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::combinator::{always, attempt, bind, either, fail, next, token};
use crate::error::ParseError;
use crate::parser::Parser;
use crate::state::ParseState;

/// Consumes one character satisfying `pred`, reported as `expected` on
/// failure.
pub fn satisfy<S, V>(
    pred: impl Fn(char) -> bool + 'static,
    expected: impl Into<String>,
) -> Parser<S, char, V>
where
    S: ParseState<Token = char>,
    V: 'static,
{
    let expected: String = expected.into();
    token(
        move |c: &char| pred(*c),
        move |position, found| {
            ParseError::expected(position, expected.clone(), found.map(|c| format!("{c:?}")))
        },
    )
}

/// Consumes exactly the character `c`.
pub fn character<S, V>(c: char) -> Parser<S, char, V>
where
    S: ParseState<Token = char>,
    V: 'static,
{
    satisfy(move |x| x == c, format!("{c:?}"))
}

/// Consumes any one of the characters in `chars`.
pub fn one_of<S, V>(chars: &str) -> Parser<S, char, V>
where
    S: ParseState<Token = char>,
    V: 'static,
{
    let lookup: String = chars.to_string();
    let expected = format!("one of {chars:?}");
    satisfy(move |x| lookup.contains(x), expected)
}

/// Consumes the literal sequence `s`, yielding it as an owned `String`.
///
/// Atomic: a partial match backtracks to where the string started, so
/// alternatives with a shared prefix compose directly.
pub fn string<S, V>(s: &str) -> Parser<S, String, V>
where
    S: ParseState<Token = char>,
    V: 'static,
{
    let full = s.to_string();
    let mut p: Parser<S, String, V> = always(full.clone());
    let chars: Vec<char> = s.chars().collect();
    for c in chars.into_iter().rev() {
        let label = format!("{c:?} in string {full:?}");
        let element = token(
            move |t: &char| *t == c,
            move |position, found| {
                ParseError::expected(position, label.clone(), found.map(|t| format!("{t:?}")))
            },
        );
        p = next(element, p);
    }
    attempt(p)
}

/// Consumes any character; fails only at end of input.
pub fn any_char<S, V>() -> Parser<S, char, V>
where
    S: ParseState<Token = char>,
    V: 'static,
{
    satisfy(|_| true, "any character")
}

/// Consumes any alphabetic character.
pub fn letter<S, V>() -> Parser<S, char, V>
where
    S: ParseState<Token = char>,
    V: 'static,
{
    satisfy(char::is_alphabetic, "any letter character")
}

/// Consumes any whitespace character.
pub fn space<S, V>() -> Parser<S, char, V>
where
    S: ParseState<Token = char>,
    V: 'static,
{
    satisfy(char::is_whitespace, "any space character")
}

/// Consumes any ASCII digit.
pub fn digit<S, V>() -> Parser<S, char, V>
where
    S: ParseState<Token = char>,
    V: 'static,
{
    satisfy(|c| c.is_ascii_digit(), "any digit character")
}

#[derive(Default)]
struct TrieNode {
    word: Option<String>,
    children: BTreeMap<char, TrieNode>,
}

impl TrieNode {
    fn insert(&mut self, word: &str) {
        let mut node = self;
        for c in word.chars() {
            node = node.children.entry(c).or_default();
        }
        node.word = Some(word.to_string());
    }
}

/// Matches the longest of `words` present at the cursor.
///
/// Built as nested alternation over the words' prefix tree: at each node the
/// parser first tries to extend the match one character deeper, then falls
/// back to the longest word completed so far. Atomic like [`string`].
pub fn trie<S, V>(words: &[&str]) -> Parser<S, String, V>
where
    S: ParseState<Token = char>,
    V: 'static,
{
    let mut root = TrieNode::default();
    for word in words {
        root.insert(word);
    }
    attempt(node_parser(&root))
}

fn node_parser<S, V>(node: &TrieNode) -> Parser<S, String, V>
where
    S: ParseState<Token = char>,
    V: 'static,
{
    let select = if node.children.is_empty() {
        None
    } else {
        let keys: String = node.children.keys().collect();
        let table: Rc<BTreeMap<char, Parser<S, String, V>>> = Rc::new(
            node.children
                .iter()
                .map(|(c, child)| (*c, node_parser(child)))
                .collect(),
        );
        Some(attempt(bind(one_of(&keys), move |c| {
            match table.get(&c) {
                Some(p) => p.clone(),
                None => fail("no such branch"),
            }
        })))
    };
    match (&node.word, select) {
        (Some(word), Some(select)) => either(select, always(word.clone())),
        (Some(word), None) => always(word.clone()),
        (None, Some(select)) => select,
        (None, None) => fail("empty word set"),
    }
}
