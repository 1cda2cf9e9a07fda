//! Factoring: collapse two unifiable same-polarity literals into one.
//!
//! Equality literals are excluded here; equality factoring has its own rule
//! with the proper ordering side conditions.

use super::common::{collect_side_literals, dedup_literals, passes_maximality_aftercheck};
use crate::index::IndexRegistry;
use crate::logic::context::Context;
use crate::logic::ordering::Kbo;
use crate::saturation::state::{Generated, GeneratingInference, SaturationState};
use crate::unify::{Bank, Renaming, RobSubstitution, TermSpec};

pub struct FactoringRule;

impl GeneratingInference for FactoringRule {
    fn name(&self) -> &'static str {
        "factoring"
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
            if ctx.literals.is_equality(li) {
                continue;
            }
            for j in given.selected_range() {
                if j <= i {
                    continue;
                }
                let lj = given.literals[j];
                if ctx.literals.header(li) != ctx.literals.header(lj) {
                    continue;
                }

                let mut subst = RobSubstitution::new();
                let args_i = ctx.literals.args(li).to_vec();
                let args_j = ctx.literals.args(lj).to_vec();
                let unified = args_i.iter().zip(args_j.iter()).all(|(&ai, &aj)| {
                    subst.unify(
                        TermSpec::new(ai, Bank::QUERY),
                        TermSpec::new(aj, Bank::QUERY),
                        &ctx.terms,
                    )
                });
                if !unified {
                    continue;
                }

                if !passes_maximality_aftercheck(given, i, Bank::QUERY, &subst, ctx, kbo) {
                    continue;
                }

                let mut renaming = Renaming::new();
                let mut literals = Vec::new();
                collect_side_literals(
                    given,
                    &[j],
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
        }

        out
    }
}
