//! Binary resolution.
//!
//! For each selected literal of the given clause, the literal index supplies
//! active literals with the complementary header that unify with it. The
//! resolvent joins both clauses' side literals under the unifier. Equality
//! literals are left to the equality rules.

use super::common::{collect_side_literals, dedup_literals, passes_maximality_aftercheck};
use crate::index::IndexRegistry;
use crate::logic::context::Context;
use crate::logic::ordering::Kbo;
use crate::saturation::state::{Generated, GeneratingInference, SaturationState};
use crate::unify::{Bank, Renaming};

pub struct ResolutionRule;

impl GeneratingInference for ResolutionRule {
    fn name(&self) -> &'static str {
        "resolution"
    }

    fn generate(
        &self,
        given_idx: usize,
        state: &SaturationState,
        ctx: &mut Context,
        kbo: &Kbo,
        indices: &IndexRegistry,
    ) -> Vec<Generated> {
        let mut out = Vec::new();
        let given = &state.clauses[given_idx];

        for pos in given.selected_range() {
            let lit = given.literals[pos];
            if ctx.literals.is_equality(lit) {
                continue;
            }

            let partners = indices
                .literals
                .unifiable_complements(lit, &ctx.literals, &ctx.terms);

            for hit in partners {
                let partner = &state.clauses[hit.entry.clause];

                if !passes_maximality_aftercheck(given, pos, Bank::QUERY, &hit.subst, ctx, kbo) {
                    continue;
                }
                if !passes_maximality_aftercheck(
                    partner,
                    hit.entry.lit_pos,
                    Bank::RESULT,
                    &hit.subst,
                    ctx,
                    kbo,
                ) {
                    continue;
                }

                let mut renaming = Renaming::new();
                let mut literals = Vec::new();
                collect_side_literals(
                    given,
                    &[pos],
                    Bank::QUERY,
                    &hit.subst,
                    &mut renaming,
                    ctx,
                    &mut literals,
                );
                collect_side_literals(
                    partner,
                    &[hit.entry.lit_pos],
                    Bank::RESULT,
                    &hit.subst,
                    &mut renaming,
                    ctx,
                    &mut literals,
                );

                out.push(Generated {
                    literals: dedup_literals(literals),
                    rule: self.name(),
                    premises: vec![given_idx, hit.entry.clause],
                });
            }
        }

        out
    }
}
