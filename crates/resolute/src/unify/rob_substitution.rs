//! Backtrackable substitution over banked variables.
//!
//! Variables from different clauses share integer identifiers; a bank tag
//! keeps them apart inside one substitution, so partner clauses never need
//! renaming before a unification attempt. Every binding is recorded on a
//! trail; `mark`/`rollback` give exact undo, and a failed unification leaves
//! no partial state behind.

use crate::logic::term::{Term, TermBank, TermId};
use std::collections::{HashMap, HashSet};

/// Variable bank tag
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bank(pub u8);

impl Bank {
    /// Query-side clause variables
    pub const QUERY: Bank = Bank(0);
    /// Result-side (indexed) clause variables
    pub const RESULT: Bank = Bank(1);
    /// Normalized variables (canonically renamed entries)
    pub const NORM: Bank = Bank(2);
    /// Auxiliary bank: the substitution tree's special variables
    pub const SPECIAL: Bank = Bank(3);
}

/// A variable paired with its bank
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VarSpec {
    pub var: u32,
    pub bank: Bank,
}

/// A term paired with the bank its variables belong to
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TermSpec {
    pub term: Term,
    pub bank: Bank,
}

impl TermSpec {
    pub fn new(term: Term, bank: Bank) -> Self {
        TermSpec { term, bank }
    }
}

/// Which ordinary variables a retrieval step may bind.
///
/// The Special bank always binds: special variables are internal bookkeeping
/// of the substitution tree, not part of either clause.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BindPolicy {
    /// Full unification: both sides bind
    Both,
    /// One-way matching: only the given bank binds
    Only(Bank),
    /// Variant check: ordinary variables alias injectively, never to
    /// non-variable terms
    Renaming,
}

/// Undo point returned by `mark`
#[derive(Debug, Copy, Clone)]
pub struct Mark(usize);

/// Fresh-variable renaming shared across `apply` calls, so all literals of
/// one conclusion agree on output variable names.
#[derive(Debug, Default)]
pub struct Renaming {
    map: HashMap<VarSpec, u32>,
    next: u32,
}

impl Renaming {
    pub fn new() -> Self {
        Renaming::default()
    }

    fn fresh(&mut self, spec: VarSpec) -> u32 {
        if let Some(&v) = self.map.get(&spec) {
            return v;
        }
        let v = self.next;
        self.next += 1;
        self.map.insert(spec, v);
        v
    }

    /// Pre-map the given bank's variables to themselves, so application
    /// rebuilds a clause's own terms verbatim (in-place simplification).
    pub fn keep(&mut self, bank: Bank, vars: impl IntoIterator<Item = u32>) {
        for v in vars {
            self.map.insert(VarSpec { var: v, bank }, v);
            self.next = self.next.max(v + 1);
        }
    }
}

/// The banked, trail-backtracked substitution
#[derive(Debug, Clone, Default)]
pub struct RobSubstitution {
    bindings: HashMap<VarSpec, TermSpec>,
    trail: Vec<VarSpec>,
}

impl RobSubstitution {
    pub fn new() -> Self {
        RobSubstitution::default()
    }

    pub fn mark(&self) -> Mark {
        Mark(self.trail.len())
    }

    /// Undo all bindings added since `mark`
    pub fn rollback(&mut self, mark: Mark) {
        while self.trail.len() > mark.0 {
            let spec = self.trail.pop().unwrap();
            self.bindings.remove(&spec);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn bind(&mut self, var: VarSpec, to: TermSpec) {
        debug_assert!(!self.bindings.contains_key(&var));
        self.bindings.insert(var, to);
        self.trail.push(var);
    }

    /// Follow variable bindings to an unbound variable or an application
    fn deref(&self, mut spec: TermSpec) -> TermSpec {
        loop {
            match spec.term {
                Term::Var(v) => {
                    let vs = VarSpec { var: v, bank: spec.bank };
                    match self.bindings.get(&vs) {
                        Some(&next) => spec = next,
                        None => return spec,
                    }
                }
                Term::App(_) => return spec,
            }
        }
    }

    /// Binding of a variable spec after chasing aliases, if any
    pub fn lookup(&self, var: VarSpec) -> Option<TermSpec> {
        self.bindings.get(&var).map(|&first| self.deref(first))
    }

    /// Is the variable directly bound (no alias chasing)?
    pub fn is_bound(&self, var: VarSpec) -> bool {
        self.bindings.contains_key(&var)
    }

    /// Record a binding directly, without unification.
    ///
    /// Used by the index to seed special variables and to translate leaf
    /// entries back to their original variables. The variable must be unbound.
    pub fn alias(&mut self, var: VarSpec, to: TermSpec) {
        self.bind(var, to);
    }

    /// Unify two term specs; on failure every binding made during the
    /// attempt is undone.
    pub fn unify(&mut self, a: TermSpec, b: TermSpec, terms: &TermBank) -> bool {
        self.unify_with(a, b, BindPolicy::Both, terms)
    }

    /// One-way matching: only pattern-bank variables bind
    pub fn match_terms(&mut self, pattern: TermSpec, target: TermSpec, terms: &TermBank) -> bool {
        self.unify_with(pattern, target, BindPolicy::Only(pattern.bank), terms)
    }

    /// Unification under a bind policy (used by index retrieval modes)
    pub fn unify_with(
        &mut self,
        a: TermSpec,
        b: TermSpec,
        policy: BindPolicy,
        terms: &TermBank,
    ) -> bool {
        let mark = self.mark();
        if self.solve(a, b, policy, terms) {
            true
        } else {
            self.rollback(mark);
            false
        }
    }

    fn may_bind(&self, bank: Bank, policy: BindPolicy) -> bool {
        if bank == Bank::SPECIAL {
            return true;
        }
        match policy {
            BindPolicy::Both => true,
            BindPolicy::Only(b) => bank == b,
            BindPolicy::Renaming => false,
        }
    }

    fn solve(&mut self, a: TermSpec, b: TermSpec, policy: BindPolicy, terms: &TermBank) -> bool {
        let mut todo = vec![(a, b)];
        while let Some((a, b)) = todo.pop() {
            let a = self.deref(a);
            let b = self.deref(b);

            if a == b {
                continue;
            }
            // Ground terms are bank-independent
            if a.term == b.term && terms.is_ground(a.term) {
                continue;
            }

            match (a.term, b.term) {
                (Term::Var(_), Term::Var(_)) => {
                    let va = VarSpec { var: a.term.as_var().unwrap(), bank: a.bank };
                    let vb = VarSpec { var: b.term.as_var().unwrap(), bank: b.bank };
                    if policy == BindPolicy::Renaming
                        && a.bank != Bank::SPECIAL
                        && b.bank != Bank::SPECIAL
                    {
                        // A renaming never identifies two variables of one
                        // side; across sides the lower bank binds, so the
                        // codomain check below sees a consistent direction.
                        if a.bank == b.bank {
                            return false;
                        }
                        let (from, to) = if a.bank < b.bank { (va, b) } else { (vb, a) };
                        if !self.bind_renaming(from, to) {
                            return false;
                        }
                    } else if self.may_bind(a.bank, policy) {
                        self.bind(va, b);
                    } else if self.may_bind(b.bank, policy) {
                        self.bind(vb, a);
                    } else {
                        return false;
                    }
                }
                (Term::Var(v), Term::App(_)) => {
                    let va = VarSpec { var: v, bank: a.bank };
                    if !self.may_bind(a.bank, policy)
                        || (policy == BindPolicy::Renaming && a.bank != Bank::SPECIAL)
                        || self.occurs(va, b, terms)
                    {
                        return false;
                    }
                    self.bind(va, b);
                }
                (Term::App(_), Term::Var(v)) => {
                    let vb = VarSpec { var: v, bank: b.bank };
                    if !self.may_bind(b.bank, policy)
                        || (policy == BindPolicy::Renaming && b.bank != Bank::SPECIAL)
                        || self.occurs(vb, a, terms)
                    {
                        return false;
                    }
                    self.bind(vb, a);
                }
                (Term::App(ia), Term::App(ib)) => {
                    if terms.functor(ia) != terms.functor(ib) {
                        return false;
                    }
                    for (&arga, &argb) in terms.args(ia).iter().zip(terms.args(ib).iter()) {
                        todo.push((TermSpec::new(arga, a.bank), TermSpec::new(argb, b.bank)));
                    }
                }
            }
        }
        true
    }

    /// Injective variable-to-variable aliasing for variant retrieval
    fn bind_renaming(&mut self, var: VarSpec, to: TermSpec) -> bool {
        // Injectivity: no other variable may already map to the same target
        let taken = self
            .bindings
            .values()
            .any(|&bound| bound == to);
        if taken {
            return false;
        }
        self.bind(var, to);
        true
    }

    /// Occurs check: does `var` occur in `spec` under the current bindings?
    ///
    /// The visited set prunes shared subterms so hash-consed DAGs are walked
    /// once per node; ground subtrees are skipped outright.
    fn occurs(&self, var: VarSpec, spec: TermSpec, terms: &TermBank) -> bool {
        let mut visited: HashSet<(TermId, Bank)> = HashSet::new();
        let mut stack = vec![spec];
        while let Some(s) = stack.pop() {
            let s = self.deref(s);
            match s.term {
                Term::Var(v) => {
                    if (VarSpec { var: v, bank: s.bank }) == var {
                        return true;
                    }
                }
                Term::App(id) => {
                    if terms.is_ground(s.term) {
                        continue;
                    }
                    if !visited.insert((id, s.bank)) {
                        continue;
                    }
                    for &arg in terms.args(id) {
                        stack.push(TermSpec::new(arg, s.bank));
                    }
                }
            }
        }
        false
    }

    /// Materialize a term under the current bindings.
    ///
    /// Unbound variables are renamed through the shared `renaming` so that
    /// separate applications within one conclusion agree.
    pub fn apply(&self, spec: TermSpec, renaming: &mut Renaming, terms: &mut TermBank) -> Term {
        let spec = self.deref(spec);
        match spec.term {
            Term::Var(v) => {
                let fresh = renaming.fresh(VarSpec { var: v, bank: spec.bank });
                Term::Var(fresh)
            }
            Term::App(id) => {
                if terms.is_ground(spec.term) {
                    return spec.term;
                }
                let functor = terms.functor(id);
                let sort = terms.sort_of(spec.term);
                let args: Vec<Term> = terms.args(id).to_vec();
                let new_args: Vec<Term> = args
                    .into_iter()
                    .map(|arg| self.apply(TermSpec::new(arg, spec.bank), renaming, terms))
                    .collect();
                terms.intern(functor, new_args, sort)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::signature::Signature;
    use crate::logic::sorts::SortId;

    struct Ctx {
        sig: Signature,
        terms: TermBank,
    }

    impl Ctx {
        fn new() -> Self {
            Ctx {
                sig: Signature::new(),
                terms: TermBank::new(),
            }
        }

        fn func(&mut self, name: &str, args: Vec<Term>) -> Term {
            let id = self.sig.intern_function(name, args.len() as u8, SortId::DEFAULT);
            self.terms.intern(id, args, SortId::DEFAULT)
        }
    }

    fn q(term: Term) -> TermSpec {
        TermSpec::new(term, Bank::QUERY)
    }

    fn r(term: Term) -> TermSpec {
        TermSpec::new(term, Bank::RESULT)
    }

    #[test]
    fn test_unify_var_with_constant() {
        let mut ctx = Ctx::new();
        let a = ctx.func("a", vec![]);
        let x = Term::Var(0);

        let mut subst = RobSubstitution::new();
        assert!(subst.unify(q(x), r(a), &ctx.terms));

        let mut renaming = Renaming::new();
        assert_eq!(subst.apply(q(x), &mut renaming, &mut ctx.terms), a);
    }

    #[test]
    fn test_same_var_different_banks_are_distinct() {
        let mut ctx = Ctx::new();
        let a = ctx.func("a", vec![]);
        let x = Term::Var(0);
        // f(X, a) at QUERY vs f(a, X) at RESULT
        let t1 = ctx.func("f", vec![x, a]);
        let t2 = ctx.func("f", vec![a, x]);

        let mut subst = RobSubstitution::new();
        assert!(subst.unify(q(t1), r(t2), &ctx.terms));

        let mut renaming = Renaming::new();
        assert_eq!(subst.apply(q(t1), &mut renaming, &mut ctx.terms), ctx.func("f", vec![a, a]));
    }

    #[test]
    fn test_occurs_check_same_bank() {
        let mut ctx = Ctx::new();
        let x = Term::Var(0);
        let fx = ctx.func("f", vec![x]);

        let mut subst = RobSubstitution::new();
        assert!(!subst.unify(q(x), q(fx), &ctx.terms));
        // Failure leaves no partial state
        assert!(subst.is_empty());
    }

    #[test]
    fn test_occurs_check_across_banks_succeeds() {
        let mut ctx = Ctx::new();
        let x = Term::Var(0);
        let fx = ctx.func("f", vec![x]);

        // X@query vs f(X)@result is fine: the two X are different variables
        let mut subst = RobSubstitution::new();
        assert!(subst.unify(q(x), r(fx), &ctx.terms));
    }

    #[test]
    fn test_unify_propagates_through_chain() {
        let mut ctx = Ctx::new();
        let a = ctx.func("a", vec![]);
        let x = Term::Var(0);
        let y = Term::Var(1);

        let mut subst = RobSubstitution::new();
        // X = Y, then Y = a: X must resolve to a
        assert!(subst.unify(q(x), q(y), &ctx.terms));
        assert!(subst.unify(q(y), q(a), &ctx.terms));

        let mut renaming = Renaming::new();
        assert_eq!(subst.apply(q(x), &mut renaming, &mut ctx.terms), a);
    }

    #[test]
    fn test_rollback_restores_state() {
        let mut ctx = Ctx::new();
        let a = ctx.func("a", vec![]);
        let b = ctx.func("b", vec![]);
        let x = Term::Var(0);
        let y = Term::Var(1);

        let mut subst = RobSubstitution::new();
        assert!(subst.unify(q(x), r(a), &ctx.terms));
        let mark = subst.mark();
        assert!(subst.unify(q(y), r(b), &ctx.terms));
        subst.rollback(mark);

        assert!(subst.lookup(VarSpec { var: 0, bank: Bank::QUERY }).is_some());
        assert!(subst.lookup(VarSpec { var: 1, bank: Bank::QUERY }).is_none());
    }

    #[test]
    fn test_failed_unify_rolls_back_partial_bindings() {
        let mut ctx = Ctx::new();
        let a = ctx.func("a", vec![]);
        let b = ctx.func("b", vec![]);
        let x = Term::Var(0);
        // f(X, a) vs f(b, b): X binds to b, then a vs b fails
        let t1 = ctx.func("f", vec![x, a]);
        let t2 = ctx.func("f", vec![b, b]);

        let mut subst = RobSubstitution::new();
        assert!(!subst.unify(q(t1), r(t2), &ctx.terms));
        assert!(subst.is_empty());
    }

    #[test]
    fn test_matching_is_one_way() {
        let mut ctx = Ctx::new();
        let a = ctx.func("a", vec![]);
        let x = Term::Var(0);
        let fx = ctx.func("f", vec![x]);
        let fa = ctx.func("f", vec![a]);

        // Pattern f(X) matches target f(a)
        let mut subst = RobSubstitution::new();
        assert!(subst.match_terms(q(fx), r(fa), &ctx.terms));

        // Target-side variables never bind: f(a) does not match f(X)
        let mut subst = RobSubstitution::new();
        assert!(!subst.match_terms(q(fa), r(fx), &ctx.terms));
    }

    #[test]
    fn test_matching_consistency_across_occurrences() {
        let mut ctx = Ctx::new();
        let a = ctx.func("a", vec![]);
        let b = ctx.func("b", vec![]);
        let x = Term::Var(0);
        let fxx = ctx.func("f", vec![x, x]);
        let fab = ctx.func("f", vec![a, b]);
        let faa = ctx.func("f", vec![a, a]);

        let mut subst = RobSubstitution::new();
        assert!(subst.match_terms(q(fxx), r(faa), &ctx.terms));

        let mut subst = RobSubstitution::new();
        assert!(!subst.match_terms(q(fxx), r(fab), &ctx.terms));
    }

    #[test]
    fn test_renaming_policy_injective() {
        let mut ctx = Ctx::new();
        let x = Term::Var(0);
        let y = Term::Var(1);
        let fxy = ctx.func("f", vec![x, y]);
        let fyx = ctx.func("f", vec![y, x]);
        let fxx = ctx.func("f", vec![x, x]);

        // f(X,Y) and f(Y,X) are variants
        let mut subst = RobSubstitution::new();
        assert!(subst.unify_with(q(fxy), r(fyx), BindPolicy::Renaming, &ctx.terms));

        // f(X,Y) and f(X,X) are not: the renaming would not be injective
        let mut subst = RobSubstitution::new();
        assert!(!subst.unify_with(q(fxy), r(fxx), BindPolicy::Renaming, &ctx.terms));

        // Neither is f(X,X) vs f(X,Y): one variable cannot map to two
        let mut subst = RobSubstitution::new();
        assert!(!subst.unify_with(q(fxx), r(fxy), BindPolicy::Renaming, &ctx.terms));
    }

    #[test]
    fn test_apply_shares_renaming() {
        let mut ctx = Ctx::new();
        let x = Term::Var(0);
        let y = Term::Var(1);
        let fxy = ctx.func("f", vec![x, y]);

        let subst = RobSubstitution::new();
        let mut renaming = Renaming::new();
        let t1 = subst.apply(q(fxy), &mut renaming, &mut ctx.terms);
        let t2 = subst.apply(q(x), &mut renaming, &mut ctx.terms);
        // X got the same fresh name in both applications
        if let Term::App(id) = t1 {
            assert_eq!(ctx.terms.args(id)[0], t2);
        } else {
            panic!("expected application");
        }
    }

    #[test]
    fn test_mgu_not_overly_specific() {
        let mut ctx = Ctx::new();
        let x = Term::Var(0);
        let y = Term::Var(1);
        let gx = ctx.func("g", vec![x]);
        // f(g(X)) vs f(Y): Y binds to g(X), X stays free
        let t1 = ctx.func("f", vec![gx]);
        let t2 = ctx.func("f", vec![y]);

        let mut subst = RobSubstitution::new();
        assert!(subst.unify(q(t1), r(t2), &ctx.terms));

        let mut renaming = Renaming::new();
        let applied = subst.apply(r(y), &mut renaming, &mut ctx.terms);
        match applied {
            Term::App(id) => {
                assert_eq!(ctx.sig.function_name(ctx.terms.functor(id)), "g");
                assert!(ctx.terms.args(id)[0].is_var());
            }
            _ => panic!("expected g(_)"),
        }
    }
}
