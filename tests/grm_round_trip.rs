//! A grammar printed and re-parsed through the `grm` front end is not
//! just textually stable (see the unit tests in `src/grm/mod.rs`) — the
//! two `Grammar`s also accept exactly the same language, because a table
//! built from the reconstructed grammar behaves the same as the original.

use lr1gen::{build_table, grm, Grammar, Parser, Rule, Symbol};

fn original() -> Grammar {
    Grammar::new(
        vec![
            Rule::new(
                "S",
                vec![
                    Symbol::terminal("a"),
                    Symbol::nonterminal("S"),
                    Symbol::terminal("a"),
                ],
            ),
            Rule::new(
                "S",
                vec![
                    Symbol::terminal("b"),
                    Symbol::nonterminal("S"),
                    Symbol::terminal("b"),
                ],
            ),
            Rule::new("S", vec![Symbol::terminal("c")]),
        ],
        None,
    )
    .unwrap()
}

fn identity_callbacks() -> Vec<Box<dyn Fn(Vec<String>) -> String>> {
    vec![
        Box::new(|a: Vec<String>| format!("a{}a", a[1])),
        Box::new(|a: Vec<String>| format!("b{}b", a[1])),
        Box::new(|a: Vec<String>| a[0].clone()),
    ]
}

#[test]
fn reconstructed_grammar_is_structurally_equal() {
    let original = original();
    let text = original.to_string();
    let reconstructed = grm::parse(&text).unwrap();
    assert_eq!(reconstructed, original);
}

#[test]
fn reconstructed_grammar_parses_the_same_language() {
    let text = original().to_string();
    let reconstructed = grm::parse(&text).unwrap();
    let table = build_table(&reconstructed).unwrap();
    let parser = Parser::new(reconstructed, table, identity_callbacks()).unwrap();
    assert_eq!(parser.parse("abcba").unwrap(), "abcba");
    assert!(parser.parse("abca").is_err());
}

#[test]
fn malformed_text_is_a_parse_error() {
    let err = grm::parse("S => \"a\"\n").unwrap_err();
    assert!(matches!(err, grm::GrmError::Parse(_)));
}
