//! The `grm` front end: a parser, built out of this crate's own machinery,
//! for the textual grammar format that [`crate::grammar::Grammar`]'s
//! `Display` impl produces. Parsing the output of printing a grammar and
//! getting an equal `Grammar` back is this crate's self-hosting sanity
//! check (see the `grm_round_trip` integration test).
//!
//! Textual form, one rule per line:
//!
//! ```text
//! lhs -> sym sym sym
//! lhs -> ϵ
//! ```
//!
//! where `sym` is either a bare identifier (a nonterminal) or a
//! double-quoted regex pattern (a terminal), with `\` and `"` inside the
//! quotes backslash-escaped (see [`crate::symbol::escape_quoted`]).
//! Whitespace is itself an explicit terminal in this grammar rather than
//! something the lexer skips silently (see [`crate::lexer::Lexer`]),
//! which is what keeps this tiny grammar genuinely LR(1): a run of spaces
//! means "another symbol follows", a newline means "this rule is
//! finished".

use crate::grammar::{Grammar, GrammarError};
use crate::parser::{ParseError, Parser, ParserError};
use crate::rule::Rule;
use crate::symbol::{unescape_quoted, Symbol};

const WS_PATTERN: &str = r"[ \t]+";
const NL_PATTERN: &str = r"\n+";
const ARROW_PATTERN: &str = r"->";
const EPS_PATTERN: &str = "ϵ";
const IDENT_PATTERN: &str = r"[A-Za-z_][A-Za-z0-9_]*";
// Matches a quoted string allowing backslash-escaped characters, so a
// pattern containing a literal `"` or `\` (this constant's own pattern
// text is itself such an example, once printed by `Display`) can
// round-trip instead of the closing quote matching the first `"` it
// meets.
const QSTRING_PATTERN: &str = r#""(?:\\.|[^"\\])*""#;

fn ws() -> Symbol {
    Symbol::terminal(WS_PATTERN)
}
fn nl() -> Symbol {
    Symbol::terminal(NL_PATTERN)
}
fn arrow() -> Symbol {
    Symbol::terminal(ARROW_PATTERN)
}
fn eps() -> Symbol {
    Symbol::terminal(EPS_PATTERN)
}
fn ident() -> Symbol {
    Symbol::terminal(IDENT_PATTERN)
}
fn qstring() -> Symbol {
    Symbol::terminal(QSTRING_PATTERN)
}

/// The semantic value built up while parsing grm text: either a raw
/// lexed fragment, or one of the grammar fragments assembled from it.
#[derive(Debug, Clone)]
enum GrmValue {
    /// Raw text straight off the lexer (an identifier, `->`, a run of
    /// whitespace, or a quoted pattern including its quotes).
    Text(String),
    Symbol(Symbol),
    Rhs(Vec<Symbol>),
    Rule(Rule),
    Grammar(Vec<Rule>),
}

impl From<String> for GrmValue {
    fn from(text: String) -> Self {
        GrmValue::Text(text)
    }
}

impl GrmValue {
    fn into_text(self) -> String {
        match self {
            GrmValue::Text(t) => t,
            other => panic!("expected Text, found {:?}", other),
        }
    }
    fn into_symbol(self) -> Symbol {
        match self {
            GrmValue::Symbol(s) => s,
            other => panic!("expected Symbol, found {:?}", other),
        }
    }
    fn into_rhs(self) -> Vec<Symbol> {
        match self {
            GrmValue::Rhs(r) => r,
            other => panic!("expected Rhs, found {:?}", other),
        }
    }
    fn into_rule(self) -> Rule {
        match self {
            GrmValue::Rule(r) => r,
            other => panic!("expected Rule, found {:?}", other),
        }
    }
    fn into_rules(self) -> Vec<Rule> {
        match self {
            GrmValue::Grammar(g) => g,
            other => panic!("expected Grammar, found {:?}", other),
        }
    }
}

/// Strips the surrounding quotes from a matched `QSTRING` and reverses
/// `Symbol`'s `Display` escaping, the inverse of the `escape_quoted` call
/// that produced this text in the first place.
fn unquote(raw: &str) -> String {
    unescape_quoted(&raw[1..raw.len() - 1])
}

/// Builds the meta-grammar this module's parser runs. Constructed fresh
/// per call rather than cached in a `lazy_static`: [`Grammar`] carries a
/// `RefCell` memo table and so is not `Sync`, and an eight-rule grammar is
/// cheap enough to build that caching it would not be worth losing that
/// simplicity.
fn meta_grammar() -> Grammar {
    Grammar::new(
        vec![
            // 0: grm -> stmt NL
            Rule::new("grm", vec![Symbol::nonterminal("stmt"), nl()]),
            // 1: grm -> grm stmt NL
            Rule::new(
                "grm",
                vec![
                    Symbol::nonterminal("grm"),
                    Symbol::nonterminal("stmt"),
                    nl(),
                ],
            ),
            // 2: stmt -> IDENT WS ARROW WS rhs
            Rule::new(
                "stmt",
                vec![ident(), ws(), arrow(), ws(), Symbol::nonterminal("rhs")],
            ),
            // 3: rhs -> EPS
            Rule::new("rhs", vec![eps()]),
            // 4: rhs -> sym
            Rule::new("rhs", vec![Symbol::nonterminal("sym")]),
            // 5: rhs -> rhs WS sym
            Rule::new(
                "rhs",
                vec![
                    Symbol::nonterminal("rhs"),
                    ws(),
                    Symbol::nonterminal("sym"),
                ],
            ),
            // 6: sym -> IDENT
            Rule::new("sym", vec![ident()]),
            // 7: sym -> QSTRING
            Rule::new("sym", vec![qstring()]),
        ],
        Some("grm".to_string()),
    )
    .expect("the grm meta-grammar is fixed and known-valid")
}

fn meta_callbacks() -> Vec<Box<dyn Fn(Vec<GrmValue>) -> GrmValue>> {
    vec![
        // grm -> stmt NL
        Box::new(|mut a: Vec<GrmValue>| {
            let stmt = a.remove(0).into_rule();
            GrmValue::Grammar(vec![stmt])
        }),
        // grm -> grm stmt NL
        Box::new(|mut a: Vec<GrmValue>| {
            let mut rules = a.remove(0).into_rules();
            let stmt = a.remove(0).into_rule();
            rules.push(stmt);
            GrmValue::Grammar(rules)
        }),
        // stmt -> IDENT WS ARROW WS rhs
        Box::new(|mut a: Vec<GrmValue>| {
            let lhs = a.remove(0).into_text();
            a.remove(0); // WS
            a.remove(0); // ARROW
            a.remove(0); // WS
            let rhs = a.remove(0).into_rhs();
            GrmValue::Rule(Rule::new(lhs, rhs))
        }),
        // rhs -> EPS
        Box::new(|_a: Vec<GrmValue>| GrmValue::Rhs(vec![])),
        // rhs -> sym
        Box::new(|mut a: Vec<GrmValue>| GrmValue::Rhs(vec![a.remove(0).into_symbol()])),
        // rhs -> rhs WS sym
        Box::new(|mut a: Vec<GrmValue>| {
            let mut rhs = a.remove(0).into_rhs();
            a.remove(0); // WS
            rhs.push(a.remove(0).into_symbol());
            GrmValue::Rhs(rhs)
        }),
        // sym -> IDENT
        Box::new(|mut a: Vec<GrmValue>| {
            GrmValue::Symbol(Symbol::nonterminal(a.remove(0).into_text()))
        }),
        // sym -> QSTRING
        Box::new(|mut a: Vec<GrmValue>| {
            let raw = a.remove(0).into_text();
            GrmValue::Symbol(Symbol::terminal(unquote(&raw)))
        }),
    ]
}

#[derive(Debug)]
pub enum GrmError {
    Parse(String),
    Grammar(GrammarError),
}

impl std::fmt::Display for GrmError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            GrmError::Parse(msg) => write!(f, "{}", msg),
            GrmError::Grammar(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GrmError {}

impl From<GrammarError> for GrmError {
    fn from(e: GrammarError) -> Self {
        GrmError::Grammar(e)
    }
}

/// Parses `text` (the form [`Grammar`]'s `Display` impl produces) back
/// into a `Grammar`.
pub fn parse(text: &str) -> Result<Grammar, GrmError> {
    let grammar = meta_grammar();
    let table = crate::automaton::build_table(&grammar)
        .expect("the grm meta-grammar is fixed and known to be conflict-free");
    let parser: Parser<GrmValue> = Parser::new(grammar, table, meta_callbacks())
        .map_err(|e: ParserError| GrmError::Parse(e.to_string()))?;
    let value = parser
        .parse(text)
        // `GrmValue` has no `Display` impl (it is an internal parse-tree
        // fragment, not user-facing data), so `ParseError<GrmValue>`
        // is not `Display` either (`parser.rs`'s impl requires `V:
        // Display`) — render the error via `Debug` instead.
        .map_err(|e: ParseError<GrmValue>| GrmError::Parse(format!("{:?}", e)))?;
    let rules = value.into_rules();
    Ok(Grammar::new(rules, None)?)
}
