//! Term and literal indexing for the saturation loop.
//!
//! The substitution tree answers unification, generalization, instance, and
//! variant queries; this module wraps it into the concrete indices the
//! inference rules need and routes clause lifecycle events to them.
//!
//! Equality literals are commutative: they are stored once, in canonical
//! orientation, and queried twice with swapped argument orders.

pub mod substitution_tree;

pub use substitution_tree::{Entry, Retrieved, RetrievalMode, RootKey, SubstitutionTree};

use crate::logic::clause::Clause;
use crate::logic::literal::{Literal, LiteralBank};
use crate::logic::ordering::{Kbo, Ordering};
use crate::logic::term::{Term, TermBank};
use std::collections::HashSet;

// =============================================================================
// LiteralIndex
// =============================================================================

/// Index over whole literals, keyed by header
#[derive(Debug, Default)]
pub struct LiteralIndex {
    tree: SubstitutionTree,
}

impl LiteralIndex {
    pub fn new() -> Self {
        LiteralIndex::default()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn insert(
        &mut self,
        clause: usize,
        lit_pos: usize,
        lit: Literal,
        lits: &LiteralBank,
        terms: &mut TermBank,
    ) {
        let root = RootKey::Literal(lits.header(lit));
        let args = lits.args(lit).to_vec();
        let entry = Entry {
            clause,
            literal: lit,
            lit_pos,
            term: None,
        };
        self.tree.insert(root, &args, entry, terms);
    }

    pub fn remove(
        &mut self,
        clause: usize,
        lit_pos: usize,
        lit: Literal,
        lits: &LiteralBank,
        terms: &mut TermBank,
    ) {
        let root = RootKey::Literal(lits.header(lit));
        let args = lits.args(lit).to_vec();
        let entry = Entry {
            clause,
            literal: lit,
            lit_pos,
            term: None,
        };
        self.tree.remove(root, &args, entry, terms);
    }

    fn query(
        &self,
        root: RootKey,
        args: &[Term],
        mode: RetrievalMode,
        commutative: bool,
        terms: &TermBank,
    ) -> Vec<Retrieved> {
        let mut results = self.tree.retrieve(root, args, mode, terms);
        if commutative && args.len() == 2 && args[0] != args[1] {
            let swapped = [args[1], args[0]];
            results.extend(self.tree.retrieve(root, &swapped, mode, terms));
        }
        results
    }

    /// Indexed literals with the complementary header, unifiable with `lit`
    pub fn unifiable_complements(
        &self,
        lit: Literal,
        lits: &LiteralBank,
        terms: &TermBank,
    ) -> Vec<Retrieved> {
        let root = RootKey::Literal(lits.header(lit).complementary());
        self.query(
            root,
            lits.args(lit),
            RetrievalMode::Unifiers,
            lits.is_equality(lit),
            terms,
        )
    }

    /// Indexed literals that generalize `lit` (same header)
    pub fn generalizations(
        &self,
        lit: Literal,
        lits: &LiteralBank,
        terms: &TermBank,
    ) -> Vec<Retrieved> {
        let root = RootKey::Literal(lits.header(lit));
        self.query(
            root,
            lits.args(lit),
            RetrievalMode::Generalizations,
            lits.is_equality(lit),
            terms,
        )
    }

    /// Indexed literals that are instances of `lit` (same header)
    pub fn instances(&self, lit: Literal, lits: &LiteralBank, terms: &TermBank) -> Vec<Retrieved> {
        let root = RootKey::Literal(lits.header(lit));
        self.query(
            root,
            lits.args(lit),
            RetrievalMode::Instances,
            lits.is_equality(lit),
            terms,
        )
    }

    /// Indexed literals equal to `lit` up to renaming; equality results are
    /// filtered to the query's argument sort
    pub fn variants(&self, lit: Literal, lits: &LiteralBank, terms: &TermBank) -> Vec<Retrieved> {
        let root = RootKey::Literal(lits.header(lit));
        let is_eq = lits.is_equality(lit);
        let mut results = self.query(root, lits.args(lit), RetrievalMode::Variants, is_eq, terms);
        if is_eq {
            let sort = lits.eq_sort(lit);
            results.retain(|r| lits.eq_sort(r.entry.literal) == sort);
        }
        results
    }
}

// =============================================================================
// TermIndex
// =============================================================================

/// Index over terms (equality sides, rewritable subterms), keyed by functor.
/// Variables are never indexed.
#[derive(Debug, Default)]
pub struct TermIndex {
    tree: SubstitutionTree,
}

impl TermIndex {
    pub fn new() -> Self {
        TermIndex::default()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn insert(
        &mut self,
        clause: usize,
        lit_pos: usize,
        lit: Literal,
        term: Term,
        terms: &mut TermBank,
    ) {
        let id = match term {
            Term::App(id) => id,
            Term::Var(_) => return,
        };
        let root = RootKey::Term(terms.functor(id));
        let args = terms.args(id).to_vec();
        let entry = Entry {
            clause,
            literal: lit,
            lit_pos,
            term: Some(term),
        };
        self.tree.insert(root, &args, entry, terms);
    }

    pub fn remove(
        &mut self,
        clause: usize,
        lit_pos: usize,
        lit: Literal,
        term: Term,
        terms: &mut TermBank,
    ) {
        let id = match term {
            Term::App(id) => id,
            Term::Var(_) => return,
        };
        let root = RootKey::Term(terms.functor(id));
        let args = terms.args(id).to_vec();
        let entry = Entry {
            clause,
            literal: lit,
            lit_pos,
            term: Some(term),
        };
        self.tree.remove(root, &args, entry, terms);
    }

    fn query(&self, term: Term, mode: RetrievalMode, terms: &TermBank) -> Vec<Retrieved> {
        let id = match term {
            Term::App(id) => id,
            Term::Var(_) => return Vec::new(),
        };
        let root = RootKey::Term(terms.functor(id));
        self.tree.retrieve(root, terms.args(id), mode, terms)
    }

    /// Indexed terms unifiable with `term`
    pub fn unifiers(&self, term: Term, terms: &TermBank) -> Vec<Retrieved> {
        self.query(term, RetrievalMode::Unifiers, terms)
    }

    /// Indexed terms that generalize `term`
    pub fn generalizations(&self, term: Term, terms: &TermBank) -> Vec<Retrieved> {
        self.query(term, RetrievalMode::Generalizations, terms)
    }

    /// Indexed terms that are instances of `term`
    pub fn instances(&self, term: Term, terms: &TermBank) -> Vec<Retrieved> {
        self.query(term, RetrievalMode::Instances, terms)
    }
}

// =============================================================================
// IndexRegistry
// =============================================================================

/// Owns the generating indices and routes Active-set lifecycle events.
///
/// A clause must be registered exactly when it is in Active; whoever moves a
/// clause out of Active must de-register it before the clause storage can be
/// reused.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    /// Selected literals of active clauses (resolution partners)
    pub literals: LiteralIndex,
    /// Sides of selected positive equalities usable as superposition sources
    pub superposition_lhs: TermIndex,
    /// Non-variable subterms of selected literals (superposition targets)
    pub rewritable: TermIndex,
    /// Unit positive equality sides usable for demodulation
    pub demodulators: TermIndex,
    /// Every literal of every clause in Passive or Active, for subsumption
    pub simplification: LiteralIndex,
}

impl IndexRegistry {
    pub fn new() -> Self {
        IndexRegistry::default()
    }

    /// Register a clause entering the Passive store with the simplification
    /// index (all literals, not just selected ones)
    pub fn on_passive(&mut self, idx: usize, clause: &Clause, lits: &LiteralBank, terms: &mut TermBank) {
        for (pos, &lit) in clause.literals.iter().enumerate() {
            self.simplification.insert(idx, pos, lit, lits, terms);
        }
    }

    /// Remove a clause from the simplification index (when it leaves the
    /// search space, or right before its literals are permuted at
    /// activation)
    pub fn on_passive_removed(
        &mut self,
        idx: usize,
        clause: &Clause,
        lits: &LiteralBank,
        terms: &mut TermBank,
    ) {
        for (pos, &lit) in clause.literals.iter().enumerate() {
            self.simplification.remove(idx, pos, lit, lits, terms);
        }
    }

    /// Register an activated clause with all indices
    pub fn on_activated(
        &mut self,
        idx: usize,
        clause: &Clause,
        kbo: &Kbo,
        lits: &LiteralBank,
        terms: &mut TermBank,
    ) {
        self.route(idx, clause, kbo, lits, terms, true);
    }

    /// De-register a clause leaving the Active store
    pub fn on_removed(
        &mut self,
        idx: usize,
        clause: &Clause,
        kbo: &Kbo,
        lits: &LiteralBank,
        terms: &mut TermBank,
    ) {
        self.route(idx, clause, kbo, lits, terms, false);
    }

    fn route(
        &mut self,
        idx: usize,
        clause: &Clause,
        kbo: &Kbo,
        lits: &LiteralBank,
        terms: &mut TermBank,
        add: bool,
    ) {
        // Active clauses stay visible to the subsumption machinery
        for (pos, &lit) in clause.literals.iter().enumerate() {
            if add {
                self.simplification.insert(idx, pos, lit, lits, terms);
            } else {
                self.simplification.remove(idx, pos, lit, lits, terms);
            }
        }

        for pos in clause.selected_range() {
            let lit = clause.literals[pos];
            if add {
                self.literals.insert(idx, pos, lit, lits, terms);
            } else {
                self.literals.remove(idx, pos, lit, lits, terms);
            }

            // Non-variable subterms of the literal, each indexed once
            let mut seen = HashSet::new();
            let mut subterms = Vec::new();
            for &arg in lits.args(lit) {
                for sub in terms.subterms(arg) {
                    if seen.insert(sub) {
                        subterms.push(sub);
                    }
                }
            }
            for sub in subterms {
                if add {
                    self.rewritable.insert(idx, pos, lit, sub, terms);
                } else {
                    self.rewritable.remove(idx, pos, lit, sub, terms);
                }
            }

            if lits.is_positive_equality(lit) {
                for side in self.equation_sides(lit, kbo, lits, terms) {
                    if add {
                        self.superposition_lhs.insert(idx, pos, lit, side, terms);
                    } else {
                        self.superposition_lhs.remove(idx, pos, lit, side, terms);
                    }
                }
            }
        }

        if clause.is_unit_equality(lits) {
            let lit = clause.literals[0];
            for side in self.equation_sides(lit, kbo, lits, terms) {
                if add {
                    self.demodulators.insert(idx, 0, lit, side, terms);
                } else {
                    self.demodulators.remove(idx, 0, lit, side, terms);
                }
            }
        }
    }

    /// Which sides of a positive equality can rewrite: the greater side when
    /// oriented, both when the ordering cannot decide.
    fn equation_sides(
        &self,
        lit: Literal,
        kbo: &Kbo,
        lits: &LiteralBank,
        terms: &TermBank,
    ) -> Vec<Term> {
        let args = lits.args(lit);
        let (lhs, rhs) = (args[0], args[1]);
        match kbo.eq_orientation(lit, lits, terms) {
            Ordering::Greater => vec![lhs],
            Ordering::Less => vec![rhs],
            Ordering::Incomparable => vec![lhs, rhs],
            Ordering::Equal => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::clause::{Inference, InputType};
    use crate::logic::context::Context;
    use crate::logic::sorts::SortId;

    struct TestContext {
        ctx: Context,
    }

    impl TestContext {
        fn new() -> Self {
            TestContext { ctx: Context::new() }
        }

        fn const_(&mut self, name: &str) -> Term {
            let id = self.ctx.signature.intern_function(name, 0, SortId::DEFAULT);
            self.ctx.term(id, vec![])
        }

        fn func(&mut self, name: &str, args: Vec<Term>) -> Term {
            let id = self
                .ctx
                .signature
                .intern_function(name, args.len() as u8, SortId::DEFAULT);
            self.ctx.term(id, args)
        }

        fn lit(&mut self, name: &str, polarity: bool, args: Vec<Term>) -> Literal {
            let p = self.ctx.signature.intern_predicate(name, args.len() as u8);
            if p == crate::logic::signature::PredicateId::EQUALITY {
                panic!("use eq()");
            }
            self.ctx.literal(p, polarity, args)
        }

        fn eq(&mut self, polarity: bool, lhs: Term, rhs: Term) -> Literal {
            self.ctx.equality(polarity, lhs, rhs, SortId::DEFAULT)
        }

        fn clause(&mut self, literals: Vec<Literal>) -> Clause {
            Clause::new(literals, InputType::Axiom, Inference::input(), &self.ctx.literals)
        }
    }

    #[test]
    fn test_complement_retrieval() {
        let mut t = TestContext::new();
        let a = t.const_("a");
        let x = Term::Var(0);
        let px = t.lit("p", true, vec![x]);
        let not_pa = t.lit("p", false, vec![a]);

        let mut index = LiteralIndex::new();
        index.insert(0, 0, px, &t.ctx.literals, &mut t.ctx.terms);

        // ~p(a) unifies with the indexed p(X)
        let hits = index.unifiable_complements(not_pa, &t.ctx.literals, &t.ctx.terms);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry.clause, 0);

        // p(a) itself has no complement in the index
        let pa = t.lit("p", true, vec![a]);
        let hits = index.unifiable_complements(pa, &t.ctx.literals, &t.ctx.terms);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_equality_queried_in_both_orientations() {
        let mut t = TestContext::new();
        let a = t.const_("a");
        let b = t.const_("b");
        let x = Term::Var(0);

        // Index a != X
        let neq = t.eq(false, a, x);
        let mut index = LiteralIndex::new();
        index.insert(0, 0, neq, &t.ctx.literals, &mut t.ctx.terms);

        // Query with b = a: the swapped orientation a = b must also reach
        // the entry keyed by (a, X)
        let eq_ba = t.eq(true, b, a);
        let hits = index.unifiable_complements(eq_ba, &t.ctx.literals, &t.ctx.terms);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_variant_sort_filter() {
        let mut t = TestContext::new();
        let a = t.const_("a");
        let x = Term::Var(0);
        let int_eq = t.ctx.equality(true, x, a, SortId::INTEGER);
        let def_eq = t.ctx.equality(true, x, a, SortId::DEFAULT);

        let mut index = LiteralIndex::new();
        index.insert(0, 0, int_eq, &t.ctx.literals, &mut t.ctx.terms);

        let hits = index.variants(def_eq, &t.ctx.literals, &t.ctx.terms);
        assert!(hits.is_empty(), "sorts must match for equality variants");

        let y = Term::Var(5);
        let int_eq_variant = t.ctx.equality(true, y, a, SortId::INTEGER);
        let hits = index.variants(int_eq_variant, &t.ctx.literals, &t.ctx.terms);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_term_index_generalizations() {
        let mut t = TestContext::new();
        let a = t.const_("a");
        let x = Term::Var(0);
        let fx = t.func("f", vec![x]);
        let fa = t.func("f", vec![a]);
        let lit = t.eq(true, fx, x);

        let mut index = TermIndex::new();
        index.insert(0, 0, lit, fx, &mut t.ctx.terms);

        let hits = index.generalizations(fa, &t.ctx.terms);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry.term, Some(fx));

        let ga = t.func("g", vec![a]);
        assert!(index.generalizations(ga, &t.ctx.terms).is_empty());
    }

    #[test]
    fn test_registry_roundtrip() {
        let mut t = TestContext::new();
        let a = t.const_("a");
        let fa = t.func("f", vec![a]);
        let eq = t.eq(true, fa, a);
        let clause = t.clause(vec![eq]);

        let kbo = Kbo::default();
        let mut registry = IndexRegistry::new();
        registry.on_activated(0, &clause, &kbo, &t.ctx.literals, &mut t.ctx.terms);

        // Oriented f(a) = a: only f(a) is a demodulator side
        assert_eq!(registry.demodulators.len(), 1);
        assert_eq!(registry.superposition_lhs.len(), 1);
        assert_eq!(registry.literals.len(), 1);
        // Subterms of the literal: f(a) and a
        assert_eq!(registry.rewritable.len(), 2);

        registry.on_removed(0, &clause, &kbo, &t.ctx.literals, &mut t.ctx.terms);
        assert!(registry.demodulators.is_empty());
        assert!(registry.superposition_lhs.is_empty());
        assert!(registry.literals.is_empty());
        assert!(registry.rewritable.is_empty());
    }

    #[test]
    fn test_registry_unoriented_equation_indexes_both_sides() {
        let mut t = TestContext::new();
        let x = Term::Var(0);
        let y = Term::Var(1);
        let fx = t.func("f", vec![x]);
        let gy = t.func("g", vec![y]);
        // f(X) = g(Y) is unorientable (variable conditions fail both ways)
        let eq = t.eq(true, fx, gy);
        let clause = t.clause(vec![eq]);

        let kbo = Kbo::default();
        let mut registry = IndexRegistry::new();
        registry.on_activated(0, &clause, &kbo, &t.ctx.literals, &mut t.ctx.terms);

        assert_eq!(registry.demodulators.len(), 2);
        assert_eq!(registry.superposition_lhs.len(), 2);
    }
}
