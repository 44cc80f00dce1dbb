use std::fmt;

use crate::automaton::{Action, Table};
use crate::grammar::Grammar;
use crate::lexer::{LexError, Lexer};
use crate::symbol::Symbol;
use crate::token::Token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    /// One callback is required per grammar rule, in rule order; a reduce
    /// looks its callback up by rule index.
    CallbackArityMismatch { expected: usize, found: usize },
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParserError::CallbackArityMismatch { expected, found } => write!(
                f,
                "grammar has {} rules but {} callbacks were given",
                expected, found
            ),
        }
    }
}

impl std::error::Error for ParserError {}

#[derive(Debug)]
pub enum ParseError<V> {
    /// A terminal's pattern is not a valid regex.
    InvalidPattern(String),
    Lex(LexError),
    UnexpectedToken {
        found: Token<V>,
        expected: Vec<Symbol>,
    },
}

impl<V: fmt::Display> fmt::Display for ParseError<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::InvalidPattern(msg) => write!(f, "invalid terminal pattern: {}", msg),
            ParseError::Lex(e) => write!(f, "{}", e),
            ParseError::UnexpectedToken { found, expected } => {
                let expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
                write!(
                    f,
                    "unexpected {}, expected one of: {}",
                    found,
                    expected.join(", ")
                )
            }
        }
    }
}

impl<V: fmt::Debug + fmt::Display> std::error::Error for ParseError<V> {}

/// A shift/reduce driver over a prebuilt [`Table`], generic over the
/// semantic value type `V` that reductions build up.
///
/// `V` must be buildable from the raw text a terminal matched
/// (`V: From<String>`) so the same driver serves any attribute type: a
/// calculator uses `f64`, a grammar-describing-itself front end uses an
/// enum of grammar fragments. One callback is registered per rule, in
/// rule order, and a reduce dispatches to it by rule index.
pub struct Parser<V> {
    grammar: Grammar,
    table: Table,
    callbacks: Vec<Box<dyn Fn(Vec<V>) -> V>>,
}

impl<V> Parser<V>
where
    V: From<String>,
{
    pub fn new(
        grammar: Grammar,
        table: Table,
        callbacks: Vec<Box<dyn Fn(Vec<V>) -> V>>,
    ) -> Result<Self, ParserError> {
        if callbacks.len() != grammar.len() {
            return Err(ParserError::CallbackArityMismatch {
                expected: grammar.len(),
                found: callbacks.len(),
            });
        }
        Ok(Self {
            grammar,
            table,
            callbacks,
        })
    }

    /// Parses `input` to completion and returns the value the accepting
    /// reduction produced.
    pub fn parse(&self, input: &str) -> Result<V, ParseError<V>> {
        let mut lexer = Lexer::new(self.grammar.terminals(), input)
            .map_err(|e| ParseError::InvalidPattern(e.to_string()))?;

        let mut states: Vec<usize> = vec![0];
        let mut values: Vec<V> = Vec::new();

        lexer
            .set_active(self.table.active_terminals(0))
            .map_err(ParseError::Lex)?;
        let mut lookahead = lexer.next_token().map_err(ParseError::Lex)?;

        loop {
            let state = *states.last().expect("state stack is never empty");
            match self.table.action(state, &lookahead.kind).copied() {
                Some(Action::Shift(next)) => {
                    values.push(V::from(lookahead.content));
                    states.push(next);
                    lexer
                        .set_active(self.table.active_terminals(next))
                        .map_err(ParseError::Lex)?;
                    lookahead = lexer.next_token().map_err(ParseError::Lex)?;
                }
                Some(Action::Reduce(rule_idx)) => {
                    let rule = self.grammar.rule(rule_idx);
                    let n = rule.rhs.len();
                    let args = values.split_off(values.len() - n);
                    states.truncate(states.len() - n);

                    let result = (self.callbacks[rule_idx])(args);

                    let top = *states.last().expect("state stack is never empty");
                    let goto_sym = Symbol::nonterminal(rule.lhs.clone());
                    let next = match self.table.action(top, &goto_sym) {
                        Some(Action::Shift(j)) => *j,
                        _ => unreachable!("a valid table always has a goto after this reduce"),
                    };
                    values.push(result);
                    states.push(next);
                }
                Some(Action::Accept) => {
                    return Ok(values.pop().expect("accept follows reducing the start symbol"));
                }
                None => {
                    let expected = self.table.active_terminals(state);
                    return Err(ParseError::UnexpectedToken {
                        found: Token::new(lookahead.kind, V::from(lookahead.content)),
                        expected,
                    });
                }
            }
        }
    }
}
