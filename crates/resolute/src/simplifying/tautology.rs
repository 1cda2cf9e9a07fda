//! Tautology deletion: clauses containing t = t or a complementary literal
//! pair are discarded eagerly.

use crate::index::IndexRegistry;
use crate::logic::context::Context;
use crate::logic::ordering::Kbo;
use crate::saturation::state::{SaturationState, Simplification, SimplifyingInference};

pub struct TautologyRule;

impl SimplifyingInference for TautologyRule {
    fn name(&self) -> &'static str {
        "tautology_deletion"
    }

    fn simplify_forward(
        &mut self,
        clause_idx: usize,
        state: &SaturationState,
        ctx: &mut Context,
        _kbo: &Kbo,
        _indices: &IndexRegistry,
    ) -> Simplification {
        let clause = &state.clauses[clause_idx];
        if clause.is_tautology(&ctx.literals) {
            Simplification::Discarded {
                rule: self.name(),
                premises: vec![],
            }
        } else {
            Simplification::Unchanged
        }
    }
}
