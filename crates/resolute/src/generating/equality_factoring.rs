//! Equality factoring.
//!
//! From s = t | u = v | C with a unifier of s and u, derive
//! (t != v | u = v | C) under the unifier, provided s is not smaller than t
//! after the unifier is applied and the factored literal stays maximal.

use super::common::{
    collect_side_literals, dedup_literals, not_smaller, passes_maximality_aftercheck,
};
use crate::index::IndexRegistry;
use crate::logic::context::Context;
use crate::logic::ordering::Kbo;
use crate::logic::term::Term;
use crate::saturation::state::{Generated, GeneratingInference, SaturationState};
use crate::unify::{Bank, Renaming, RobSubstitution, TermSpec};

pub struct EqualityFactoringRule;

impl GeneratingInference for EqualityFactoringRule {
    fn name(&self) -> &'static str {
        "equality_factoring"
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
        if given.literals.len() < 2 {
            return out;
        }

        for i in given.selected_range() {
            let li = given.literals[i];
            if !ctx.literals.is_positive_equality(li) {
                continue;
            }
            let args_i = ctx.literals.args(li).to_vec();
            let sort = ctx.literals.eq_sort(li);

            for j in 0..given.literals.len() {
                if j == i {
                    continue;
                }
                let lj = given.literals[j];
                if !ctx.literals.is_positive_equality(lj) || ctx.literals.eq_sort(lj) != sort {
                    continue;
                }
                let args_j = ctx.literals.args(lj).to_vec();

                for (s, t) in [(args_i[0], args_i[1]), (args_i[1], args_i[0])] {
                    for (u, v) in [(args_j[0], args_j[1]), (args_j[1], args_j[0])] {
                        if let Some(generated) = self.factor(
                            given_idx, given, i, j, s, t, u, v, sort, ctx, kbo,
                        ) {
                            out.push(generated);
                        }
                    }
                }
            }
        }

        out
    }
}

impl EqualityFactoringRule {
    #[allow(clippy::too_many_arguments)]
    fn factor(
        &self,
        given_idx: usize,
        given: &crate::logic::clause::Clause,
        i: usize,
        j: usize,
        s: Term,
        t: Term,
        u: Term,
        v: Term,
        sort: crate::logic::sorts::SortId,
        ctx: &mut Context,
        kbo: &Kbo,
    ) -> Option<Generated> {
        let mut subst = RobSubstitution::new();
        if !subst.unify(
            TermSpec::new(s, Bank::QUERY),
            TermSpec::new(u, Bank::QUERY),
            &ctx.terms,
        ) {
            return None;
        }

        let mut renaming = Renaming::new();
        let s_sigma = subst.apply(TermSpec::new(s, Bank::QUERY), &mut renaming, &mut ctx.terms);
        let t_sigma = subst.apply(TermSpec::new(t, Bank::QUERY), &mut renaming, &mut ctx.terms);
        if !not_smaller(kbo, s_sigma, t_sigma, &ctx.terms) {
            return None;
        }

        if !passes_maximality_aftercheck(given, i, Bank::QUERY, &subst, ctx, kbo) {
            return None;
        }

        let v_sigma = subst.apply(TermSpec::new(v, Bank::QUERY), &mut renaming, &mut ctx.terms);
        let u_sigma = subst.apply(TermSpec::new(u, Bank::QUERY), &mut renaming, &mut ctx.terms);

        let mut literals = vec![
            ctx.literals.equality(false, t_sigma, v_sigma, sort, &ctx.terms),
            ctx.literals.equality(true, u_sigma, v_sigma, sort, &ctx.terms),
        ];
        // The factored literal j is re-added above in its (u, v) orientation;
        // exclude both equalities from the side literals
        collect_side_literals(given, &[i, j], Bank::QUERY, &subst, &mut renaming, ctx, &mut literals);

        Some(Generated {
            literals: dedup_literals(literals),
            rule: self.name(),
            premises: vec![given_idx],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::clause::{Clause, Inference, InputType};
    use crate::logic::literal::Literal;
    use crate::logic::sorts::SortId;
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
    fn test_equality_factoring_basic() {
        let mut h = Harness::new();
        let a = h.const_("a");
        let b = h.const_("b");
        let x = Term::Var(0);
        let fx = h.func("f", vec![x]);
        let fa = h.func("f", vec![a]);
        // f(X) = b | f(a) = b
        let e1 = h.ctx.equality(true, fx, b, SortId::DEFAULT);
        let e2 = h.ctx.equality(true, fa, b, SortId::DEFAULT);
        let given = h.add(vec![e1, e2]);

        let results =
            EqualityFactoringRule.generate(given, &h.state, &mut h.ctx, &h.kbo, &h.indices);
        // Expect a factor with b != b | f(a) = b among the results
        let bb = h.ctx.equality(false, b, b, SortId::DEFAULT);
        let found = results.iter().any(|g| g.literals.contains(&bb));
        assert!(found, "expected a factor containing b != b");
        for g in &results {
            assert_eq!(g.premises, vec![given]);
        }
    }

    #[test]
    fn test_no_factoring_without_unifier() {
        let mut h = Harness::new();
        let a = h.const_("a");
        let b = h.const_("b");
        let c = h.const_("c");
        let d = h.const_("d");
        let e1 = h.ctx.equality(true, a, b, SortId::DEFAULT);
        let e2 = h.ctx.equality(true, c, d, SortId::DEFAULT);
        let given = h.add(vec![e1, e2]);

        let results =
            EqualityFactoringRule.generate(given, &h.state, &mut h.ctx, &h.kbo, &h.indices);
        assert!(results.is_empty());
    }

    #[test]
    fn test_single_literal_no_factoring() {
        let mut h = Harness::new();
        let a = h.const_("a");
        let b = h.const_("b");
        let e1 = h.ctx.equality(true, a, b, SortId::DEFAULT);
        let given = h.add(vec![e1]);

        let results =
            EqualityFactoringRule.generate(given, &h.state, &mut h.ctx, &h.kbo, &h.indices);
        assert!(results.is_empty());
    }
}
