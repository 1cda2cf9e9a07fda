//! Clauses and their prover-side metadata.

use super::literal::{Literal, LiteralBank, LiteralDisplay};
use super::signature::Signature;
use super::term::TermBank;
use serde::Serialize;
use std::fmt;

/// Where a clause currently lives in the saturation loop
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub enum Store {
    Unprocessed,
    Passive,
    Active,
    /// Picked as the given clause, not yet activated
    Selected,
    #[default]
    None,
}

/// Origin of a clause in the input problem
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub enum InputType {
    #[default]
    Axiom,
    Conjecture,
    NegatedConjecture,
}

/// How a clause came to be: rule name plus premise indices into the clause
/// arena. Premise indices are always smaller than the clause's own index, so
/// the derivation graph is acyclic by construction.
#[derive(Debug, Clone, Serialize)]
pub struct Inference {
    pub rule: &'static str,
    pub premises: Vec<usize>,
}

impl Inference {
    pub const INPUT_RULE: &'static str = "input";

    pub fn input() -> Self {
        Inference {
            rule: Self::INPUT_RULE,
            premises: vec![],
        }
    }

    pub fn new(rule: &'static str, premises: Vec<usize>) -> Self {
        Inference { rule, premises }
    }
}

/// A clause: an ordered sequence of literals plus metadata.
///
/// The first `selected` literals form the selected prefix once literal
/// selection has run (at activation); before that all literals count as
/// selected.
#[derive(Debug, Clone, Serialize)]
pub struct Clause {
    pub literals: Vec<Literal>,
    pub store: Store,
    /// Generation distance from the input; saturating
    pub age: u32,
    /// Cached sum of literal weights; saturating
    pub weight: u32,
    /// Length of the selected prefix
    pub selected: usize,
    /// Opaque split-component set, unioned across premises; never interpreted
    /// by the core
    pub splits: u64,
    pub input_type: InputType,
    pub inference: Inference,
    /// References held by indices and containers; guards slot reuse
    #[serde(skip)]
    pub refs: u32,
}

impl Clause {
    pub fn new(literals: Vec<Literal>, input_type: InputType, inference: Inference, lits: &LiteralBank) -> Self {
        let weight = literals
            .iter()
            .fold(0u32, |acc, &l| acc.saturating_add(lits.weight(l)));
        let selected = literals.len();
        Clause {
            literals,
            store: Store::None,
            age: 0,
            weight,
            selected,
            splits: 0,
            input_type,
            inference,
            refs: 0,
        }
    }

    /// The empty clause: the refutation witness
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Is this a single positive equality (a rewrite rule candidate)?
    pub fn is_unit_equality(&self, lits: &LiteralBank) -> bool {
        self.literals.len() == 1 && lits.is_positive_equality(self.literals[0])
    }

    /// Indices of the selected prefix
    pub fn selected_range(&self) -> std::ops::Range<usize> {
        0..self.selected
    }

    /// Tautology: a reflexive equality literal, or a complementary pair
    pub fn is_tautology(&self, lits: &LiteralBank) -> bool {
        for (i, &li) in self.literals.iter().enumerate() {
            if lits.is_reflexive_equality(li) {
                return true;
            }
            for &lj in &self.literals[i + 1..] {
                if lits.are_complementary(li, lj) {
                    return true;
                }
            }
        }
        false
    }

    /// All variables occurring in the clause
    pub fn variables(&self, lits: &LiteralBank, terms: &TermBank) -> std::collections::HashSet<u32> {
        let mut vars = std::collections::HashSet::new();
        for &lit in &self.literals {
            for &arg in lits.args(lit) {
                vars.extend(terms.vars(arg));
            }
        }
        vars
    }

    /// Recompute the cached weight (after in-place literal replacement)
    pub fn recompute_weight(&mut self, lits: &LiteralBank) {
        self.weight = self
            .literals
            .iter()
            .fold(0u32, |acc, &l| acc.saturating_add(lits.weight(l)));
    }

    pub fn display<'a>(
        &'a self,
        lits: &'a LiteralBank,
        terms: &'a TermBank,
        signature: &'a Signature,
    ) -> ClauseDisplay<'a> {
        ClauseDisplay {
            clause: self,
            lits,
            terms,
            signature,
        }
    }
}

pub struct ClauseDisplay<'a> {
    clause: &'a Clause,
    lits: &'a LiteralBank,
    terms: &'a TermBank,
    signature: &'a Signature,
}

impl<'a> fmt::Display for ClauseDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clause.is_empty() {
            return write!(f, "$false");
        }
        for (i, &lit) in self.clause.literals.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(
                f,
                "{}",
                LiteralDisplay {
                    bank: self.lits,
                    terms: self.terms,
                    signature: self.signature,
                    literal: lit,
                }
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::signature::Signature;
    use crate::logic::sorts::SortId;
    use crate::logic::term::Term;

    struct Ctx {
        sig: Signature,
        terms: TermBank,
        lits: LiteralBank,
    }

    impl Ctx {
        fn new() -> Self {
            Ctx {
                sig: Signature::new(),
                terms: TermBank::new(),
                lits: LiteralBank::new(),
            }
        }

        fn const_(&mut self, name: &str) -> Term {
            let id = self.sig.intern_function(name, 0, SortId::DEFAULT);
            self.terms.intern(id, vec![], SortId::DEFAULT)
        }

        fn lit(&mut self, name: &str, polarity: bool, args: Vec<Term>) -> Literal {
            let p = self.sig.intern_predicate(name, args.len() as u8);
            self.lits.intern(p, polarity, args, SortId::DEFAULT, &self.terms)
        }
    }

    #[test]
    fn test_empty_clause() {
        let ctx = Ctx::new();
        let c = Clause::new(vec![], InputType::Axiom, Inference::input(), &ctx.lits);
        assert!(c.is_empty());
        assert_eq!(c.weight, 0);
    }

    #[test]
    fn test_tautology_complementary_pair() {
        let mut ctx = Ctx::new();
        let a = ctx.const_("a");
        let pos = ctx.lit("p", true, vec![a]);
        let neg = ctx.lit("p", false, vec![a]);
        let q = ctx.lit("q", true, vec![a]);

        let taut = Clause::new(vec![pos, q, neg], InputType::Axiom, Inference::input(), &ctx.lits);
        assert!(taut.is_tautology(&ctx.lits));

        let plain = Clause::new(vec![pos, q], InputType::Axiom, Inference::input(), &ctx.lits);
        assert!(!plain.is_tautology(&ctx.lits));
    }

    #[test]
    fn test_tautology_reflexive_equality() {
        let mut ctx = Ctx::new();
        let a = ctx.const_("a");
        let refl = ctx.lits.equality(true, a, a, SortId::DEFAULT, &ctx.terms);
        let c = Clause::new(vec![refl], InputType::Axiom, Inference::input(), &ctx.lits);
        assert!(c.is_tautology(&ctx.lits));
    }

    #[test]
    fn test_weight_saturates() {
        let mut ctx = Ctx::new();
        let a = ctx.const_("a");
        let l = ctx.lit("p", true, vec![a]);
        let mut c = Clause::new(vec![l], InputType::Axiom, Inference::input(), &ctx.lits);
        c.weight = u32::MAX - 1;
        c.age = c.age.saturating_add(u32::MAX);
        assert_eq!(c.age, u32::MAX);
    }

    #[test]
    fn test_unit_equality() {
        let mut ctx = Ctx::new();
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let eq = ctx.lits.equality(true, a, b, SortId::DEFAULT, &ctx.terms);
        let neq = ctx.lits.equality(false, a, b, SortId::DEFAULT, &ctx.terms);

        let unit = Clause::new(vec![eq], InputType::Axiom, Inference::input(), &ctx.lits);
        assert!(unit.is_unit_equality(&ctx.lits));

        let neg_unit = Clause::new(vec![neq], InputType::Axiom, Inference::input(), &ctx.lits);
        assert!(!neg_unit.is_unit_equality(&ctx.lits));
    }
}
