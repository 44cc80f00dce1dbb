use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::rule::Rule;
use crate::symbol::{Symbol, ROOT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// `__root__` is reserved for the internally-augmented start rule and
    /// must not appear as any rule's lhs.
    ReservedNonTerminal,
    /// An explicit start symbol was given that is not the lhs of any rule.
    InvalidStart(String),
    /// The grammar has no rules, so `start()` has nothing to return.
    NoRules,
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GrammarError::ReservedNonTerminal => {
                write!(f, "\"{}\" is reserved and may not be used as a rule's lhs", ROOT)
            }
            GrammarError::InvalidStart(start) => {
                write!(f, "start symbol \"{}\" is not the lhs of any rule", start)
            }
            GrammarError::NoRules => write!(f, "no rules added to the grammar yet"),
        }
    }
}

impl std::error::Error for GrammarError {}

/// An ordered sequence of [`Rule`]s plus an optional explicit start symbol.
///
/// Order is semantically significant: reduce actions identify a rule by its
/// index in this sequence. FIRST sets are computed once, by a whole-grammar
/// fixpoint (see [`Grammar::first`]), and then memoized per queried
/// sequence; the memo is an implementation detail, not part of a
/// `Grammar`'s identity (`PartialEq` compares only the rule list and the
/// explicit start, matching the source's list-equality semantics).
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Vec<Rule>,
    start: Option<String>,
    first_cache: RefCell<HashMap<Vec<Symbol>, HashSet<Symbol>>>,
}

impl PartialEq for Grammar {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules && self.start == other.start
    }
}
impl Eq for Grammar {}

impl Grammar {
    pub fn new(rules: Vec<Rule>, start: Option<String>) -> Result<Self, GrammarError> {
        if rules.iter().any(|r| r.lhs == ROOT) {
            return Err(GrammarError::ReservedNonTerminal);
        }
        if let Some(ref start) = start {
            if !rules.iter().any(|r| &r.lhs == start) {
                return Err(GrammarError::InvalidStart(start.clone()));
            }
        }
        Ok(Self {
            rules,
            start,
            first_cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> &Rule {
        &self.rules[index]
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn start(&self) -> Result<&str, GrammarError> {
        if let Some(ref start) = self.start {
            Ok(start)
        } else {
            self.rules
                .first()
                .map(|r| r.lhs.as_str())
                .ok_or(GrammarError::NoRules)
        }
    }

    pub fn terminals(&self) -> HashSet<Symbol> {
        let mut terms = HashSet::new();
        for rule in &self.rules {
            for sym in &rule.rhs {
                if sym.is_terminal() {
                    terms.insert(sym.clone());
                }
            }
        }
        terms
    }

    pub fn nonterminals(&self) -> HashSet<Symbol> {
        self.rules
            .iter()
            .map(|r| Symbol::nonterminal(r.lhs.clone()))
            .collect()
    }

    fn rules_for<'a>(&'a self, lhs: &'a str) -> impl Iterator<Item = &'a Rule> {
        self.rules.iter().filter(move |r| r.lhs == lhs)
    }

    /// Nonterminals that can derive the empty string, found by fixpoint
    /// iteration over the whole grammar (not a recursive-descent guard on
    /// direct left recursion only — see Design Notes in SPEC_FULL.md).
    fn nullable_set(&self) -> HashSet<String> {
        let mut nullable: HashSet<String> = HashSet::new();
        loop {
            let mut changed = false;
            for rule in &self.rules {
                if nullable.contains(&rule.lhs) {
                    continue;
                }
                let is_nullable = rule.rhs.iter().all(|sym| match sym {
                    Symbol::NonTerminal(name) => nullable.contains(name),
                    _ => false,
                });
                if is_nullable {
                    nullable.insert(rule.lhs.clone());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        nullable
    }

    /// FIRST(X) for every symbol X that appears in the grammar, by
    /// whole-grammar fixpoint.
    fn first_sets(&self, nullable: &HashSet<String>) -> HashMap<String, HashSet<Symbol>> {
        let mut firsts: HashMap<String, HashSet<Symbol>> = HashMap::new();
        for nt in self.nonterminals() {
            if let Symbol::NonTerminal(name) = nt {
                firsts.insert(name, HashSet::new());
            }
        }
        loop {
            let mut changed = false;
            for rule in &self.rules {
                let mut added = HashSet::new();
                for sym in &rule.rhs {
                    match sym {
                        Symbol::Terminal(_) => {
                            added.insert(sym.clone());
                            break;
                        }
                        Symbol::NonTerminal(name) => {
                            if let Some(set) = firsts.get(name) {
                                added.extend(set.iter().cloned());
                            }
                            if nullable.contains(name) {
                                continue;
                            } else {
                                break;
                            }
                        }
                        Symbol::End | Symbol::Epsilon => break,
                    }
                }
                let entry = firsts
                    .get_mut(&rule.lhs)
                    .expect("every lhs was seeded into firsts above");
                let before = entry.len();
                entry.extend(added);
                if entry.len() != before {
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        firsts
    }

    /// FIRST(α): the set of terminals that can begin a derivation of the
    /// symbol sequence `tokens`, plus `ϵ` if `tokens` can derive empty
    /// (including the case where `tokens` is itself empty).
    pub fn first(&self, tokens: &[Symbol]) -> HashSet<Symbol> {
        let key = tokens.to_vec();
        if let Some(cached) = self.first_cache.borrow().get(&key) {
            return cached.clone();
        }

        let nullable = self.nullable_set();
        let per_symbol = self.first_sets(&nullable);

        let mut result = HashSet::new();
        let mut all_nullable = true;
        for sym in tokens {
            match sym {
                Symbol::Terminal(_) => {
                    result.insert(sym.clone());
                    all_nullable = false;
                    break;
                }
                Symbol::End => {
                    result.insert(Symbol::End);
                    all_nullable = false;
                    break;
                }
                Symbol::NonTerminal(name) => {
                    if let Some(set) = per_symbol.get(name) {
                        result.extend(set.iter().cloned());
                    }
                    if nullable.contains(name) {
                        continue;
                    } else {
                        all_nullable = false;
                        break;
                    }
                }
                Symbol::Epsilon => continue,
            }
        }
        if all_nullable {
            result.insert(Symbol::Epsilon);
        }

        self.first_cache.borrow_mut().insert(key, result.clone());
        result
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}
