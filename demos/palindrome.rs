//! Recognizes strings of the form `a^n c b^n` / `b^n c a^n` and extracts
//! the innermost `"c"`, peeling one matched layer of `a`/`b` off each
//! side as it reduces.

use lr1gen::{build_table, Grammar, Parser, Rule, Symbol};

fn grammar() -> Grammar {
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
    .expect("palindrome grammar is fixed and known-valid")
}

fn callbacks() -> Vec<Box<dyn Fn(Vec<String>) -> String>> {
    vec![
        Box::new(|a: Vec<String>| format!("a{}a", a[1])),
        Box::new(|a: Vec<String>| format!("b{}b", a[1])),
        Box::new(|a: Vec<String>| a[0].clone()),
    ]
}

fn main() {
    let grammar = grammar();
    let table = build_table(&grammar).expect("palindrome grammar is LR(1) with no conflicts");
    let parser = Parser::new(grammar, table, callbacks()).expect("one callback per rule");

    for input in ["c", "aca", "abacaba"] {
        match parser.parse(input) {
            Ok(v) => println!("{} => {}", input, v),
            Err(e) => println!("{} => error: {}", input, e),
        }
    }
}
