use std::collections::HashMap;
use std::fmt;

use crate::grammar::{Grammar, GrammarError};
use crate::item::{Item, ItemSet};
use crate::rule::Rule;
use crate::symbol::{Symbol, ROOT};

/// One parse-table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Shift the lookahead and move to this state (also used for the goto
    /// transition taken immediately after a reduce).
    Shift(usize),
    Reduce(usize),
    Accept,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    ShiftReduceConflict { items: Vec<Item>, lookahead: Symbol },
    ReduceReduceConflict { rule_a: Rule, rule_b: Rule },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TableError::ShiftReduceConflict { items, lookahead } => {
                writeln!(f, "Shift/Reduce Conflict:")?;
                for item in items {
                    writeln!(f, "{}", item)?;
                }
                write!(f, "{}", lookahead)
            }
            TableError::ReduceReduceConflict { rule_a, rule_b } => {
                writeln!(f, "Reduce/Reduce Conflict:")?;
                writeln!(f, "{}", rule_a)?;
                write!(f, "{}", rule_b)
            }
        }
    }
}

impl std::error::Error for TableError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    Grammar(GrammarError),
    Table(TableError),
}

impl From<GrammarError> for BuildError {
    fn from(e: GrammarError) -> Self {
        BuildError::Grammar(e)
    }
}

impl From<TableError> for BuildError {
    fn from(e: TableError) -> Self {
        BuildError::Table(e)
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BuildError::Grammar(e) => write!(f, "{}", e),
            BuildError::Table(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BuildError {}

/// The completion of `items` under nonterminal expansion: for every item
/// `[A -> α . B β, a]` with `B` a nonterminal, and every rule `B -> γ`, and
/// every `b` in `FIRST(β a)` with `b != ϵ`, add `[B -> . γ, b]`. Repeats to
/// a fixed point.
pub fn closure(grammar: &Grammar, items: ItemSet) -> ItemSet {
    let mut closure_items = items;
    loop {
        let mut new_items = ItemSet::new();
        for item in &closure_items {
            let Some(Symbol::NonTerminal(name)) = item.symbol_at_dot() else {
                continue;
            };
            let mut seq: Vec<Symbol> = item.rest_after_dot().to_vec();
            seq.push(item.lookahead.clone());
            let lookaheads = grammar.first(&seq);
            for rule in grammar.rules().iter().filter(|r| &r.lhs == name) {
                for la in &lookaheads {
                    if !la.is_epsilon() {
                        new_items.insert(Item::new(
                            rule.lhs.clone(),
                            rule.rhs.clone(),
                            0,
                            la.clone(),
                        ));
                    }
                }
            }
        }
        if new_items.is_subset(&closure_items) {
            break;
        }
        closure_items.extend(new_items);
    }
    closure_items
}

/// The item set reached from `items` by shifting `symbol`, already closed.
pub fn goto(grammar: &Grammar, items: &ItemSet, symbol: &Symbol) -> ItemSet {
    let moved: ItemSet = items
        .iter()
        .filter(|item| !item.done() && item.symbol_at_dot() == Some(symbol))
        .map(|item| item.advanced())
        .collect();
    if moved.is_empty() {
        moved
    } else {
        closure(grammar, moved)
    }
}

/// The canonical collection of LR(1) item sets for the grammar, augmented
/// internally with `__root__ -> start $`. Item-set identity is set
/// equality; a newly computed set equal to one already in the collection
/// is not re-added. Interned with a hash map (see Design Notes) rather
/// than the source's O(n^2) linear rescan.
pub fn canonical_collection(grammar: &Grammar) -> Result<Vec<ItemSet>, GrammarError> {
    let start = grammar.start()?.to_string();
    // The lookahead carries the end-of-input requirement; it is never part
    // of the augmented rhs itself, so this item is done (and Accept fires)
    // as soon as `start` has been reduced, with $ still the lookahead.
    let root_item = Item::new(ROOT, vec![Symbol::nonterminal(start)], 0, Symbol::End);
    let initial = closure(grammar, [root_item].into_iter().collect());

    let mut sets: Vec<ItemSet> = vec![initial.clone()];
    let mut index: HashMap<ItemSet, usize> = HashMap::new();
    index.insert(initial, 0);

    let universe: Vec<Symbol> = grammar
        .terminals()
        .into_iter()
        .chain(grammar.nonterminals())
        .collect();

    let mut i = 0;
    while i < sets.len() {
        for sym in &universe {
            let g = goto(grammar, &sets[i], sym);
            if !g.is_empty() && !index.contains_key(&g) {
                index.insert(g.clone(), sets.len());
                sets.push(g);
            }
        }
        i += 1;
    }
    Ok(sets)
}

/// A completed LR(1) parse table: one `symbol -> action` map per state.
#[derive(Debug, Clone)]
pub struct Table {
    states: Vec<HashMap<Symbol, Action>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn action(&self, state: usize, symbol: &Symbol) -> Option<&Action> {
        self.states[state].get(symbol)
    }

    /// Every terminal that appears as a key in this state, in a
    /// deterministic (sorted) order — the set the lexer's `active` list
    /// is reconfigured to on entering this state.
    pub fn active_terminals(&self, state: usize) -> Vec<Symbol> {
        let mut terms: Vec<Symbol> = self.states[state]
            .keys()
            .filter(|s| s.is_terminal())
            .cloned()
            .collect();
        terms.sort();
        terms
    }
}

/// Builds the LR(1) parse table for `grammar`: goto entries first, then
/// reduce entries, raising on the first shift/reduce or reduce/reduce
/// conflict encountered (conflicts are detected before any cell is
/// overwritten, never silently).
pub fn build_table(grammar: &Grammar) -> Result<Table, BuildError> {
    let sets = canonical_collection(grammar)?;
    let index: HashMap<&ItemSet, usize> = sets.iter().enumerate().map(|(i, s)| (s, i)).collect();

    let universe: Vec<Symbol> = grammar
        .terminals()
        .into_iter()
        .chain(grammar.nonterminals())
        .collect();

    let mut states: Vec<HashMap<Symbol, Action>> = vec![HashMap::new(); sets.len()];

    for (i, items) in sets.iter().enumerate() {
        for sym in &universe {
            let g = goto(grammar, items, sym);
            if !g.is_empty() {
                let j = *index
                    .get(&g)
                    .expect("goto target must already be in the canonical collection");
                states[i].insert(sym.clone(), Action::Shift(j));
            }
        }
    }

    for (i, items) in sets.iter().enumerate() {
        for item in items {
            if !item.done() {
                continue;
            }
            if item.lhs == ROOT && item.lookahead == Symbol::End {
                match states[i].get(&Symbol::End) {
                    None | Some(Action::Accept) => {
                        states[i].insert(Symbol::End, Action::Accept);
                    }
                    Some(Action::Shift(_)) => {
                        let conflicting: Vec<Item> = items
                            .iter()
                            .filter(|it| {
                                it.symbol_at_dot() == Some(&Symbol::End)
                                    || (it.done() && it.lookahead == Symbol::End)
                            })
                            .cloned()
                            .collect();
                        return Err(TableError::ShiftReduceConflict {
                            items: conflicting,
                            lookahead: Symbol::End,
                        }
                        .into());
                    }
                    Some(Action::Reduce(other_idx)) => {
                        let root_rule =
                            Rule::new(ROOT, vec![Symbol::nonterminal(grammar.start()?.to_string())]);
                        return Err(TableError::ReduceReduceConflict {
                            rule_a: grammar.rule(*other_idx).clone(),
                            rule_b: root_rule,
                        }
                        .into());
                    }
                }
                continue;
            }
            let rule_idx = grammar
                .rules()
                .iter()
                .position(|r| r.lhs == item.lhs && r.rhs == item.rhs)
                .expect("every completed item corresponds to a grammar rule");

            match states[i].get(&item.lookahead) {
                Some(Action::Shift(_)) | Some(Action::Accept) => {
                    let conflicting: Vec<Item> = items
                        .iter()
                        .filter(|it| {
                            it.symbol_at_dot() == Some(&item.lookahead)
                                || (it.done() && it.lookahead == item.lookahead)
                        })
                        .cloned()
                        .collect();
                    return Err(TableError::ShiftReduceConflict {
                        items: conflicting,
                        lookahead: item.lookahead.clone(),
                    }
                    .into());
                }
                Some(Action::Reduce(other_idx)) if *other_idx != rule_idx => {
                    return Err(TableError::ReduceReduceConflict {
                        rule_a: grammar.rule(*other_idx).clone(),
                        rule_b: grammar.rule(rule_idx).clone(),
                    }
                    .into());
                }
                _ => {
                    states[i].insert(item.lookahead.clone(), Action::Reduce(rule_idx));
                }
            }
        }
    }

    Ok(Table { states })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn palindrome() -> Grammar {
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

    #[test]
    fn closure_of_initial_item() {
        let g = palindrome();
        let item = Item::new(
            "S",
            vec![
                Symbol::terminal("a"),
                Symbol::nonterminal("S"),
                Symbol::terminal("a"),
            ],
            1,
            Symbol::terminal("a"),
        );
        let items: ItemSet = [item].into_iter().collect();
        let closed = closure(&g, items.clone());

        let mut expected = items;
        expected.insert(Item::new(
            "S",
            vec![
                Symbol::terminal("a"),
                Symbol::nonterminal("S"),
                Symbol::terminal("a"),
            ],
            0,
            Symbol::terminal("a"),
        ));
        expected.insert(Item::new(
            "S",
            vec![
                Symbol::terminal("b"),
                Symbol::nonterminal("S"),
                Symbol::terminal("b"),
            ],
            0,
            Symbol::terminal("a"),
        ));
        expected.insert(Item::new(
            "S",
            vec![Symbol::terminal("c")],
            0,
            Symbol::terminal("a"),
        ));
        assert_eq!(closed, expected);
    }

    #[test]
    fn closure_is_idempotent() {
        let g = palindrome();
        let item = Item::new(
            "S",
            vec![
                Symbol::terminal("a"),
                Symbol::nonterminal("S"),
                Symbol::terminal("a"),
            ],
            1,
            Symbol::terminal("a"),
        );
        let items: ItemSet = [item].into_iter().collect();
        let once = closure(&g, items);
        let twice = closure(&g, once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn goto_on_exhausted_item_is_empty() {
        let g = palindrome();
        let item = Item::new(
            "S",
            vec![
                Symbol::terminal("a"),
                Symbol::nonterminal("S"),
                Symbol::terminal("a"),
            ],
            3,
            Symbol::terminal("a"),
        );
        let items: ItemSet = [item].into_iter().collect();
        assert!(goto(&g, &items, &Symbol::terminal("a")).is_empty());
    }

    #[test]
    fn build_table_for_palindrome_has_accept() {
        let g = palindrome();
        let table = build_table(&g).unwrap();
        assert!(table
            .action(0, &Symbol::terminal("c"))
            .map(|a| matches!(a, Action::Shift(_)))
            .unwrap_or(false));
    }

    #[test]
    fn accept_action_is_inserted_only_once_per_state() {
        // A well-formed grammar's accept state holds only the completed
        // augmented item, so the accept guard (which checks for a prior
        // occupant before inserting, like the reduce path does) must not
        // turn this into a spurious conflict against itself, and exactly
        // one state must end up with `$ -> Accept`.
        let g = palindrome();
        let table = build_table(&g).unwrap();
        let accept_states: Vec<usize> = (0..table.len())
            .filter(|&s| table.action(s, &Symbol::End) == Some(&Action::Accept))
            .collect();
        assert_eq!(accept_states.len(), 1);
    }

    #[test]
    fn dangling_else_is_a_shift_reduce_conflict() {
        // stmt -> "if" expr "then" stmt
        //       | "if" expr "then" stmt "else" stmt
        //       | "other"
        let g = Grammar::new(
            vec![
                Rule::new(
                    "stmt",
                    vec![
                        Symbol::terminal("if"),
                        Symbol::nonterminal("expr"),
                        Symbol::terminal("then"),
                        Symbol::nonterminal("stmt"),
                    ],
                ),
                Rule::new(
                    "stmt",
                    vec![
                        Symbol::terminal("if"),
                        Symbol::nonterminal("expr"),
                        Symbol::terminal("then"),
                        Symbol::nonterminal("stmt"),
                        Symbol::terminal("else"),
                        Symbol::nonterminal("stmt"),
                    ],
                ),
                Rule::new("stmt", vec![Symbol::terminal("other")]),
                Rule::new("expr", vec![Symbol::terminal("cond")]),
            ],
            None,
        )
        .unwrap();
        let err = build_table(&g).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Table(TableError::ShiftReduceConflict { .. })
        ));
    }

    #[test]
    fn ambiguous_reduction_is_a_reduce_reduce_conflict() {
        // S -> A "end" | B "end"
        // A -> "x"
        // B -> "x"
        // After shifting "x" nothing distinguishes which of A or B it
        // should reduce to: both are done with the same lookahead "end".
        let g = Grammar::new(
            vec![
                Rule::new(
                    "S",
                    vec![Symbol::nonterminal("A"), Symbol::terminal("end")],
                ),
                Rule::new(
                    "S",
                    vec![Symbol::nonterminal("B"), Symbol::terminal("end")],
                ),
                Rule::new("A", vec![Symbol::terminal("x")]),
                Rule::new("B", vec![Symbol::terminal("x")]),
            ],
            None,
        )
        .unwrap();
        let err = build_table(&g).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Table(TableError::ReduceReduceConflict { .. })
        ));
    }
}
