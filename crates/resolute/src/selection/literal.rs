//! Literal selection strategies.
//!
//! Selection restricts which literals of a clause may participate in
//! generating inferences. The strategies follow Hoder et al., "Selecting the
//! selection" (2016); the numbering matches the classic option values:
//! - sel0: select all literals
//! - sel20: select all maximal literals
//! - sel21: unique maximal, else max-weight negative, else all maximal
//! - sel22: max-weight negative, else all maximal

use crate::logic::clause::Clause;
use crate::logic::literal::LiteralBank;
use crate::logic::ordering::{Kbo, Ordering};
use crate::logic::term::TermBank;

/// Picks the set of literal positions eligible for inferences
pub trait LiteralSelector {
    /// Indices of selected literals (never empty for a non-empty clause)
    fn select(&self, clause: &Clause, lits: &LiteralBank, terms: &TermBank) -> Vec<usize>;

    fn name(&self) -> &'static str;
}

/// Positions of all maximal literals under the clause ordering
pub fn maximal_literals(
    clause: &Clause,
    kbo: &Kbo,
    lits: &LiteralBank,
    terms: &TermBank,
) -> Vec<usize> {
    let n = clause.literals.len();
    let mut maximal = Vec::new();
    for i in 0..n {
        let mut is_maximal = true;
        for j in 0..n {
            if i != j
                && kbo.compare_literals(clause.literals[j], clause.literals[i], lits, terms)
                    == Ordering::Greater
            {
                is_maximal = false;
                break;
            }
        }
        if is_maximal {
            maximal.push(i);
        }
    }
    maximal
}

/// Position of the heaviest negative literal, if any. Ties break towards the
/// earliest position, keeping selection deterministic.
fn max_weight_negative(clause: &Clause, lits: &LiteralBank) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (pos, &lit) in clause.literals.iter().enumerate() {
        if lits.polarity(lit) {
            continue;
        }
        let weight = lits.weight(lit);
        match best {
            Some((_, best_weight)) if best_weight >= weight => {}
            _ => best = Some((pos, weight)),
        }
    }
    best.map(|(pos, _)| pos)
}

/// sel0: no selection, every literal participates
pub struct SelectAll;

impl LiteralSelector for SelectAll {
    fn select(&self, clause: &Clause, _lits: &LiteralBank, _terms: &TermBank) -> Vec<usize> {
        (0..clause.literals.len()).collect()
    }

    fn name(&self) -> &'static str {
        "sel0"
    }
}

/// sel20: all maximal literals
pub struct SelectMaximal {
    kbo: Kbo,
}

impl SelectMaximal {
    pub fn new(kbo: Kbo) -> Self {
        SelectMaximal { kbo }
    }
}

impl LiteralSelector for SelectMaximal {
    fn select(&self, clause: &Clause, lits: &LiteralBank, terms: &TermBank) -> Vec<usize> {
        maximal_literals(clause, &self.kbo, lits, terms)
    }

    fn name(&self) -> &'static str {
        "sel20"
    }
}

/// sel21: unique maximal, else max-weight negative, else all maximal
pub struct SelectUniqueMaximalOrNegOrMaximal {
    kbo: Kbo,
}

impl SelectUniqueMaximalOrNegOrMaximal {
    pub fn new(kbo: Kbo) -> Self {
        SelectUniqueMaximalOrNegOrMaximal { kbo }
    }
}

impl LiteralSelector for SelectUniqueMaximalOrNegOrMaximal {
    fn select(&self, clause: &Clause, lits: &LiteralBank, terms: &TermBank) -> Vec<usize> {
        let maximal = maximal_literals(clause, &self.kbo, lits, terms);
        if maximal.len() == 1 {
            return maximal;
        }
        if let Some(neg) = max_weight_negative(clause, lits) {
            return vec![neg];
        }
        maximal
    }

    fn name(&self) -> &'static str {
        "sel21"
    }
}

/// sel22: max-weight negative literal, else all maximal
pub struct SelectNegMaxWeightOrMaximal {
    kbo: Kbo,
}

impl SelectNegMaxWeightOrMaximal {
    pub fn new(kbo: Kbo) -> Self {
        SelectNegMaxWeightOrMaximal { kbo }
    }
}

impl LiteralSelector for SelectNegMaxWeightOrMaximal {
    fn select(&self, clause: &Clause, lits: &LiteralBank, terms: &TermBank) -> Vec<usize> {
        if let Some(neg) = max_weight_negative(clause, lits) {
            return vec![neg];
        }
        maximal_literals(clause, &self.kbo, lits, terms)
    }

    fn name(&self) -> &'static str {
        "sel22"
    }
}
