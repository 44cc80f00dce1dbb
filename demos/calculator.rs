//! A four-function calculator, built directly on this crate's public API.
//!
//! Grounded in the canonical `expr`/`term`/`factor` precedence grammar
//! (left-associative `+`/`-` over `*`/`/` over parenthesized
//! sub-expressions). This demo's grammar has no whitespace terminal, so
//! input must not contain spaces.

use lr1gen::{build_table, Grammar, Parser, Rule, Symbol};

#[derive(Debug, Clone, Copy)]
struct Num(f64);

impl From<String> for Num {
    fn from(text: String) -> Self {
        // Only ever meaningfully read for the NUMBER terminal; operator
        // and parenthesis tokens are shifted too (every terminal needs
        // some V), but no callback below looks at their content.
        Num(text.parse().unwrap_or(0.0))
    }
}

fn grammar() -> Grammar {
    Grammar::new(
        vec![
            Rule::new(
                "expr",
                vec![
                    Symbol::nonterminal("expr"),
                    Symbol::terminal(r"\+"),
                    Symbol::nonterminal("term"),
                ],
            ),
            Rule::new(
                "expr",
                vec![
                    Symbol::nonterminal("expr"),
                    Symbol::terminal(r"-"),
                    Symbol::nonterminal("term"),
                ],
            ),
            Rule::new("expr", vec![Symbol::nonterminal("term")]),
            Rule::new(
                "term",
                vec![
                    Symbol::nonterminal("term"),
                    Symbol::terminal(r"\*"),
                    Symbol::nonterminal("factor"),
                ],
            ),
            Rule::new(
                "term",
                vec![
                    Symbol::nonterminal("term"),
                    Symbol::terminal(r"/"),
                    Symbol::nonterminal("factor"),
                ],
            ),
            Rule::new("term", vec![Symbol::nonterminal("factor")]),
            Rule::new("factor", vec![Symbol::terminal(r"[0-9]+(\.[0-9]+)?")]),
            Rule::new(
                "factor",
                vec![
                    Symbol::terminal(r"\("),
                    Symbol::nonterminal("expr"),
                    Symbol::terminal(r"\)"),
                ],
            ),
        ],
        None,
    )
    .expect("calculator grammar is fixed and known-valid")
}

fn callbacks() -> Vec<Box<dyn Fn(Vec<Num>) -> Num>> {
    vec![
        Box::new(|a: Vec<Num>| Num(a[0].0 + a[2].0)),
        Box::new(|a: Vec<Num>| Num(a[0].0 - a[2].0)),
        Box::new(|a: Vec<Num>| a[0]),
        Box::new(|a: Vec<Num>| Num(a[0].0 * a[2].0)),
        Box::new(|a: Vec<Num>| Num(a[0].0 / a[2].0)),
        Box::new(|a: Vec<Num>| a[0]),
        Box::new(|a: Vec<Num>| a[0]),
        Box::new(|a: Vec<Num>| a[1]),
    ]
}

fn main() {
    let grammar = grammar();
    let table = build_table(&grammar).expect("calculator grammar is LR(1) with no conflicts");
    let parser = Parser::new(grammar, table, callbacks()).expect("one callback per rule");

    for expr in ["2+3*4", "(2+3)*4", "10-2-3", "2*(3+4)/7"] {
        match parser.parse(expr) {
            Ok(Num(v)) => println!("{} = {}", expr, v),
            Err(e) => println!("{} => error: {}", expr, e),
        }
    }
}
