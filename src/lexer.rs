use std::collections::HashMap;
use std::fmt;

use regex::Regex;

use crate::symbol::Symbol;
use crate::token::Token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// `active` names a terminal this lexer was never given a pattern for.
    UnregisteredTerminal(Symbol),
    /// None of the currently active patterns matched at `pos`.
    UnexpectedCharacter { pos: usize, found: char },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LexError::UnregisteredTerminal(sym) => {
                write!(f, "{} is not a registered terminal", sym)
            }
            LexError::UnexpectedCharacter { pos, found } => {
                write!(f, "unexpected character '{}' at position {}", found, pos)
            }
        }
    }
}

impl std::error::Error for LexError {}

/// A regex-driven, context-sensitive lexer.
///
/// The whole input is read once at construction and held as a `String`;
/// `next_token` advances a cursor over it. Unlike a conventional lexer,
/// matching is restricted at any moment to the `active` subset of
/// terminals, which the parser reconfigures between tokens (see
/// [`crate::parser`]). Within that subset, patterns are tried in the exact
/// order given — first match wins, not longest match — so ordering active
/// lets a grammar resolve what would otherwise be an ambiguous lexical
/// choice.
pub struct Lexer {
    patterns: HashMap<Symbol, Regex>,
    input: String,
    pos: usize,
    active: Vec<Symbol>,
}

impl Lexer {
    /// Builds a lexer over `input`, compiling one anchored regex per
    /// terminal in `terminals`. `active` starts empty; call
    /// [`Lexer::set_active`] before the first [`Lexer::next_token`].
    pub fn new(
        terminals: impl IntoIterator<Item = Symbol>,
        input: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        let mut patterns = HashMap::new();
        for sym in terminals {
            if let Some(pattern) = sym.pattern() {
                let anchored = format!("^(?:{})", pattern);
                patterns.insert(sym, Regex::new(&anchored)?);
            }
        }
        Ok(Self {
            patterns,
            input: input.into(),
            pos: 0,
            active: Vec::new(),
        })
    }

    /// Reconfigures the active terminal subset, in try-order. Rejects any
    /// terminal this lexer has no pattern for, before replacing the old
    /// set.
    pub fn set_active(&mut self, active: Vec<Symbol>) -> Result<(), LexError> {
        for sym in &active {
            if !self.patterns.contains_key(sym) {
                return Err(LexError::UnregisteredTerminal(sym.clone()));
            }
        }
        self.active = active;
        Ok(())
    }

    pub fn active(&self) -> &[Symbol] {
        &self.active
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the next token, trying `active` patterns in order against
    /// the remaining input. Returns a [`Symbol::End`] token once the input
    /// is exhausted, without consulting `active` at all.
    pub fn next_token(&mut self) -> Result<Token<String>, LexError> {
        if self.at_end() {
            return Ok(Token::new(Symbol::End, String::new()));
        }
        let rest = &self.input[self.pos..];
        for sym in &self.active {
            let re = self
                .patterns
                .get(sym)
                .expect("active was validated by set_active");
            if let Some(m) = re.find(rest) {
                let text = m.as_str().to_string();
                self.pos += text.len();
                return Ok(Token::new(sym.clone(), text));
            }
        }
        let found = rest.chars().next().expect("checked not at_end above");
        Err(LexError::UnexpectedCharacter {
            pos: self.pos,
            found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits() -> Symbol {
        Symbol::terminal("[0-9]+")
    }
    fn plus() -> Symbol {
        Symbol::terminal(r"\+")
    }

    #[test]
    fn first_match_wins_not_longest() {
        // Both "a" and "a|ab" can match the start of "ab"; with "a" first
        // in `active` it wins even though "a|ab" could match more.
        let a = Symbol::terminal("a");
        let ab = Symbol::terminal("a|ab");
        let mut lexer = Lexer::new([a.clone(), ab.clone()], "ab").unwrap();
        lexer.set_active(vec![a.clone(), ab.clone()]).unwrap();
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, a);
        assert_eq!(tok.content, "a");
    }

    #[test]
    fn end_token_at_exhaustion() {
        let mut lexer = Lexer::new([digits()], "12").unwrap();
        lexer.set_active(vec![digits()]).unwrap();
        assert_eq!(lexer.next_token().unwrap().content, "12");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, Symbol::End);
    }

    #[test]
    fn active_reconfiguration_switches_what_matches() {
        let mut lexer = Lexer::new([digits(), plus()], "1+2").unwrap();
        lexer.set_active(vec![digits()]).unwrap();
        assert_eq!(lexer.next_token().unwrap().content, "1");
        lexer.set_active(vec![plus()]).unwrap();
        assert_eq!(lexer.next_token().unwrap().content, "+");
        lexer.set_active(vec![digits()]).unwrap();
        assert_eq!(lexer.next_token().unwrap().content, "2");
    }

    #[test]
    fn unregistered_terminal_in_active_is_rejected() {
        let mut lexer = Lexer::new([digits()], "1").unwrap();
        let err = lexer.set_active(vec![plus()]).unwrap_err();
        assert_eq!(err, LexError::UnregisteredTerminal(plus()));
    }

    #[test]
    fn unexpected_character_reports_position() {
        let mut lexer = Lexer::new([digits()], "1!2").unwrap();
        lexer.set_active(vec![digits()]).unwrap();
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                pos: 1,
                found: '!'
            }
        );
    }
}
