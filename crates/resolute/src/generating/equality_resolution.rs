//! Equality resolution: a selected negative equality s != t whose sides
//! unify is dropped under the unifier.

use super::common::{collect_side_literals, dedup_literals, passes_maximality_aftercheck};
use crate::index::IndexRegistry;
use crate::logic::context::Context;
use crate::logic::ordering::Kbo;
use crate::saturation::state::{Generated, GeneratingInference, SaturationState};
use crate::unify::{Bank, Renaming, RobSubstitution, TermSpec};

pub struct EqualityResolutionRule;

impl GeneratingInference for EqualityResolutionRule {
    fn name(&self) -> &'static str {
        "equality_resolution"
    }

    fn generate(
        &self,
        given_idx: usize,
        state: &SaturationState,
        ctx: &mut Context,
        kbo: &Kbo,
        _indices: &IndexRegistry,
    ) -> Vec<Generated> {
        let mut out = Vec::new();
        let given = &state.clauses[given_idx];

        for pos in given.selected_range() {
            let lit = given.literals[pos];
            if !ctx.literals.is_equality(lit) || ctx.literals.polarity(lit) {
                continue;
            }

            let args = ctx.literals.args(lit).to_vec();
            let mut subst = RobSubstitution::new();
            if !subst.unify(
                TermSpec::new(args[0], Bank::QUERY),
                TermSpec::new(args[1], Bank::QUERY),
                &ctx.terms,
            ) {
                continue;
            }

            if !passes_maximality_aftercheck(given, pos, Bank::QUERY, &subst, ctx, kbo) {
                continue;
            }

            let mut renaming = Renaming::new();
            let mut literals = Vec::new();
            collect_side_literals(
                given,
                &[pos],
                Bank::QUERY,
                &subst,
                &mut renaming,
                ctx,
                &mut literals,
            );

            out.push(Generated {
                literals: dedup_literals(literals),
                rule: self.name(),
                premises: vec![given_idx],
            });
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::clause::{Clause, Inference, InputType};
    use crate::logic::literal::Literal;
    use crate::logic::sorts::SortId;
    use crate::logic::term::Term;
    use crate::selection::{LiteralSelector, SelectAll};

    struct Harness {
        ctx: Context,
        kbo: Kbo,
        state: SaturationState,
        indices: IndexRegistry,
    }

    impl Harness {
        fn new() -> Self {
            Harness {
                ctx: Context::new(),
                kbo: Kbo::default(),
                state: SaturationState::new(1, 1),
                indices: IndexRegistry::new(),
            }
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

        fn add(&mut self, literals: Vec<Literal>) -> usize {
            let mut clause =
                Clause::new(literals, InputType::Axiom, Inference::input(), &self.ctx.literals);
            clause.selected = SelectAll
                .select(&clause, &self.ctx.literals, &self.ctx.terms)
                .len();
            let idx = self.state.clauses.len();
            self.state.clauses.push(clause);
            idx
        }
    }

    #[test]
    fn test_unifiable_disequality_resolves() {
        let mut h = Harness::new();
        let a = h.const_("a");
        let b = h.const_("b");
        let x = Term::Var(0);
        // g interned before h: h has the higher precedence, so the literal
        // resolved on stays maximal under the unifier
        let gx = h.func("g", vec![x]);
        let hx = h.func("h", vec![x]);
        let ha = h.func("h", vec![a]);
        // h(X) != h(a) | g(X) != b
        let resolved = h.ctx.equality(false, hx, ha, SortId::DEFAULT);
        let side = h.ctx.equality(false, gx, b, SortId::DEFAULT);
        let given = h.add(vec![resolved, side]);

        let results =
            EqualityResolutionRule.generate(given, &h.state, &mut h.ctx, &h.kbo, &h.indices);
        assert_eq!(results.len(), 1);
        // Remaining literal is g(a) != b
        let ga = h.func("g", vec![a]);
        let expected = h.ctx.equality(false, ga, b, SortId::DEFAULT);
        assert_eq!(results[0].literals, vec![expected]);
    }

    #[test]
    fn test_trivial_disequality_yields_empty_clause() {
        let mut h = Harness::new();
        let a = h.const_("a");
        let neq = h.ctx.equality(false, a, a, SortId::DEFAULT);
        let given = h.add(vec![neq]);

        let results =
            EqualityResolutionRule.generate(given, &h.state, &mut h.ctx, &h.kbo, &h.indices);
        assert_eq!(results.len(), 1);
        assert!(results[0].literals.is_empty());
    }

    #[test]
    fn test_positive_equality_ignored() {
        let mut h = Harness::new();
        let a = h.const_("a");
        let eq = h.ctx.equality(true, a, a, SortId::DEFAULT);
        let given = h.add(vec![eq]);

        let results =
            EqualityResolutionRule.generate(given, &h.state, &mut h.ctx, &h.kbo, &h.indices);
        assert!(results.is_empty());
    }

    #[test]
    fn test_clashing_sides_ignored() {
        let mut h = Harness::new();
        let a = h.const_("a");
        let b = h.const_("b");
        let neq = h.ctx.equality(false, a, b, SortId::DEFAULT);
        let given = h.add(vec![neq]);

        let results =
            EqualityResolutionRule.generate(given, &h.state, &mut h.ctx, &h.kbo, &h.indices);
        assert!(results.is_empty());
    }
}
