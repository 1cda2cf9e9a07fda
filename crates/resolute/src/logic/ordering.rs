//! Knuth-Bendix ordering on terms and literals.
//!
//! The comparison runs one simultaneous traversal of both terms,
//! accumulating the weight difference and per-variable signed multiplicity
//! differences, and applies the decision table afterwards: variable
//! conditions first, then weight, then precedence, then the lexicographic
//! verdict for equal top functors.

use super::context::Context;
use super::clause::Clause;
use super::literal::{Literal, LiteralBank};
use super::signature::{FunctionId, PredicateId};
use super::term::{Term, TermBank};
use std::cell::RefCell;
use std::collections::HashMap;

/// Result of comparing two terms or literals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    Greater,
    Less,
    Equal,
    Incomparable,
}

impl Ordering {
    pub fn reverse(self) -> Ordering {
        match self {
            Ordering::Greater => Ordering::Less,
            Ordering::Less => Ordering::Greater,
            other => other,
        }
    }
}

/// Configuration of the ordering
#[derive(Debug, Clone)]
pub struct KboConfig {
    /// Weight of each function symbol (default 1)
    pub function_weights: HashMap<FunctionId, u32>,
    /// Uniform weight of variables (must be positive)
    pub variable_weight: u32,
    /// Precedence of function symbols (default: interning order)
    pub function_precedence: HashMap<FunctionId, u32>,
    /// Precedence of predicate symbols (default: interning order)
    pub predicate_precedence: HashMap<PredicateId, u32>,
    /// Predicate levels; equality is fixed at the lowest level
    pub predicate_levels: HashMap<PredicateId, u32>,
    /// Invert polarity handling so negative literals become larger
    pub reverse_polarity: bool,
}

impl Default for KboConfig {
    fn default() -> Self {
        KboConfig {
            function_weights: HashMap::new(),
            variable_weight: 1,
            function_precedence: HashMap::new(),
            predicate_precedence: HashMap::new(),
            predicate_levels: HashMap::new(),
            reverse_polarity: false,
        }
    }
}

/// Knuth-Bendix ordering
pub struct Kbo {
    config: KboConfig,
    /// Lazily computed orientation of equality literals
    eq_orientation: RefCell<HashMap<Literal, Ordering>>,
}

impl Kbo {
    pub fn new(config: KboConfig) -> Self {
        Kbo {
            config,
            eq_orientation: RefCell::new(HashMap::new()),
        }
    }

    fn function_weight(&self, id: FunctionId) -> u32 {
        self.config.function_weights.get(&id).copied().unwrap_or(1)
    }

    fn function_precedence(&self, id: FunctionId) -> u32 {
        self.config
            .function_precedence
            .get(&id)
            .copied()
            .unwrap_or(id.as_u32())
    }

    fn predicate_precedence(&self, id: PredicateId) -> u32 {
        self.config
            .predicate_precedence
            .get(&id)
            .copied()
            .unwrap_or(id.as_u32())
    }

    /// Predicate level: equality is the lowest, everything else above it
    fn predicate_level(&self, id: PredicateId) -> u32 {
        if id == PredicateId::EQUALITY {
            return 0;
        }
        self.config.predicate_levels.get(&id).copied().unwrap_or(1)
    }

    /// Are all symbol weights at their defaults? Enables the cached-weight
    /// shortcut over ground subtrees.
    fn uniform_weights(&self) -> bool {
        self.config.function_weights.is_empty() && self.config.variable_weight == 1
    }

    /// Add `sign` times the weight and variable multiplicities of `term`
    fn accumulate(
        &self,
        term: Term,
        sign: i64,
        bank: &TermBank,
        weight_diff: &mut i64,
        var_diff: &mut HashMap<u32, i64>,
    ) {
        let uniform = self.uniform_weights();
        let mut stack = vec![term];
        while let Some(t) = stack.pop() {
            match t {
                Term::Var(v) => {
                    *weight_diff += sign * self.config.variable_weight as i64;
                    *var_diff.entry(v).or_insert(0) += sign;
                }
                Term::App(id) => {
                    if uniform && bank.is_ground(t) {
                        *weight_diff += sign * bank.weight(t) as i64;
                    } else {
                        *weight_diff += sign * self.function_weight(bank.functor(id)) as i64;
                        stack.extend(bank.args(id).iter().copied());
                    }
                }
            }
        }
    }

    /// Compare two terms
    pub fn compare(&self, s: Term, t: Term, bank: &TermBank) -> Ordering {
        if s == t {
            return Ordering::Equal;
        }

        let mut weight_diff = 0i64;
        let mut var_diff = HashMap::new();
        self.accumulate(s, 1, bank, &mut weight_diff, &mut var_diff);
        self.accumulate(t, -1, bank, &mut weight_diff, &mut var_diff);

        let has_pos = var_diff.values().any(|&d| d > 0);
        let has_neg = var_diff.values().any(|&d| d < 0);

        let candidate = if weight_diff > 0 {
            Ordering::Greater
        } else if weight_diff < 0 {
            Ordering::Less
        } else {
            self.compare_tops(s, t, bank)
        };

        match candidate {
            Ordering::Greater if has_neg => Ordering::Incomparable,
            Ordering::Less if has_pos => Ordering::Incomparable,
            other => other,
        }
    }

    /// Weight-equal comparison: precedence of top functors, else lexicographic
    fn compare_tops(&self, s: Term, t: Term, bank: &TermBank) -> Ordering {
        match (s, t) {
            (Term::Var(_), Term::Var(_)) => Ordering::Incomparable,
            // Weight-equal var vs. application: the variable conditions veto
            // whichever claim this seeds
            (Term::Var(_), Term::App(_)) => Ordering::Less,
            (Term::App(_), Term::Var(_)) => Ordering::Greater,
            (Term::App(si), Term::App(ti)) => {
                let sf = bank.functor(si);
                let tf = bank.functor(ti);
                if sf != tf {
                    return self.precedence_cmp(sf, tf);
                }
                self.compare_lex(bank.args(si), bank.args(ti), bank)
            }
        }
    }

    fn precedence_cmp(&self, f: FunctionId, g: FunctionId) -> Ordering {
        let pf = self.function_precedence(f);
        let pg = self.function_precedence(g);
        if pf > pg || (pf == pg && f > g) {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    }

    fn compare_lex(&self, s_args: &[Term], t_args: &[Term], bank: &TermBank) -> Ordering {
        for (&sa, &ta) in s_args.iter().zip(t_args.iter()) {
            match self.compare(sa, ta, bank) {
                Ordering::Equal => continue,
                decisive => return decisive,
            }
        }
        Ordering::Equal
    }

    /// Orientation of an equality literal's arguments, cached per literal.
    ///
    /// The cache is sound because interned literals are immutable.
    pub fn eq_orientation(&self, lit: Literal, lits: &LiteralBank, terms: &TermBank) -> Ordering {
        if let Some(&cached) = self.eq_orientation.borrow().get(&lit) {
            return cached;
        }
        let args = lits.args(lit);
        let result = self.compare(args[0], args[1], terms);
        self.eq_orientation.borrow_mut().insert(lit, result);
        result
    }

    /// Compare two literals: predicate level, then predicate precedence,
    /// then argument-wise, with polarity as the final tiebreak.
    pub fn compare_literals(
        &self,
        l1: Literal,
        l2: Literal,
        lits: &LiteralBank,
        terms: &TermBank,
    ) -> Ordering {
        if l1 == l2 {
            return Ordering::Equal;
        }

        let p1 = lits.predicate(l1);
        let p2 = lits.predicate(l2);

        let lv1 = self.predicate_level(p1);
        let lv2 = self.predicate_level(p2);
        if lv1 != lv2 {
            return if lv1 > lv2 { Ordering::Greater } else { Ordering::Less };
        }

        if p1 != p2 {
            let pr1 = self.predicate_precedence(p1);
            let pr2 = self.predicate_precedence(p2);
            return if pr1 > pr2 || (pr1 == pr2 && p1 > p2) {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let args1 = lits.args(l1);
        let args2 = lits.args(l2);

        let atom_cmp = if p1 == PredicateId::EQUALITY {
            self.compare_eq_atoms(args1, args2, terms)
        } else {
            self.compare_lex(args1, args2, terms)
        };

        match atom_cmp {
            Ordering::Equal => {
                // Same atom, different polarity (or different equality sort)
                let pol1 = lits.polarity(l1);
                let pol2 = lits.polarity(l2);
                if pol1 == pol2 {
                    return Ordering::Equal;
                }
                let negative_larger = self.config.reverse_polarity;
                if (pol1 && !negative_larger) || (!pol1 && negative_larger) {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            other => other,
        }
    }

    /// Two-element multiset comparison of equality arguments
    fn compare_eq_atoms(&self, a: &[Term], b: &[Term], terms: &TermBank) -> Ordering {
        let (a1, a2) = (a[0], a[1]);
        let (b1, b2) = (b[0], b[1]);

        if (a1 == b1 && a2 == b2) || (a1 == b2 && a2 == b1) {
            return Ordering::Equal;
        }
        // Cancel one common element and compare the remainder
        if a1 == b1 {
            return self.compare(a2, b2, terms);
        }
        if a1 == b2 {
            return self.compare(a2, b1, terms);
        }
        if a2 == b1 {
            return self.compare(a1, b2, terms);
        }
        if a2 == b2 {
            return self.compare(a1, b1, terms);
        }

        // No common element: every element of the smaller multiset must be
        // dominated by some element of the larger (Dershowitz-Manna)
        let gt = |x: Term, y: Term| self.compare(x, y, terms) == Ordering::Greater;
        let a_dominates =
            (gt(a1, b1) || gt(a2, b1)) && (gt(a1, b2) || gt(a2, b2));
        let b_dominates =
            (gt(b1, a1) || gt(b2, a1)) && (gt(b1, a2) || gt(b2, a2));
        match (a_dominates, b_dominates) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => Ordering::Incomparable,
        }
    }

    /// Rewrite each orientable equality literal of a clause into canonical
    /// greater-first argument order.
    pub fn orient_equalities(&self, clause: &mut Clause, ctx: &mut Context) {
        for lit in clause.literals.iter_mut() {
            if !ctx.literals.is_equality(*lit) {
                continue;
            }
            if self.eq_orientation(*lit, &ctx.literals, &ctx.terms) == Ordering::Less {
                let args = ctx.literals.args(*lit);
                let (lhs, rhs) = (args[0], args[1]);
                let polarity = ctx.literals.polarity(*lit);
                let sort = ctx.literals.eq_sort(*lit);
                let swapped = ctx.equality(polarity, rhs, lhs, sort);
                self.eq_orientation
                    .borrow_mut()
                    .insert(swapped, Ordering::Greater);
                *lit = swapped;
            }
        }
        clause.recompute_weight(&ctx.literals);
    }
}

impl Default for Kbo {
    fn default() -> Self {
        Kbo::new(KboConfig::default())
    }
}

#[cfg(test)]
mod proptest_tests;
