//! Superposition.
//!
//! From l = r | C and L[u] | D with sigma = mgu(l, u), u not a variable and
//! l*sigma not smaller than r*sigma, derive (L[r] | C | D)*sigma. Rewriting
//! is simultaneous: every occurrence of u*sigma in the second premise is
//! replaced, which is sound and keeps conclusions smaller.
//!
//! Both premise roles of the given clause are covered by symmetric index
//! queries: its equality sides probe the rewritable-subterm index, and its
//! subterms probe the superposition-LHS index.

use super::common::{
    apply_literal, collect_side_literals, dedup_literals, not_smaller,
    passes_maximality_aftercheck, rewritable_subterms,
};
use crate::index::IndexRegistry;
use crate::logic::clause::Clause;
use crate::logic::context::Context;
use crate::logic::literal::Literal;
use crate::logic::ordering::{Kbo, Ordering};
use crate::logic::term::Term;
use crate::saturation::state::{Generated, GeneratingInference, SaturationState};
use crate::unify::{Bank, Renaming, RobSubstitution, TermSpec};

pub struct SuperpositionRule;

impl GeneratingInference for SuperpositionRule {
    fn name(&self) -> &'static str {
        "superposition"
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

        // Given as equality source: rewrite indexed subterms
        for pos in given.selected_range() {
            let lit = given.literals[pos];
            if !ctx.literals.is_positive_equality(lit) {
                continue;
            }
            for (lhs, rhs) in usable_sides(lit, kbo, ctx) {
                let hits = indices.rewritable.unifiers(lhs, &ctx.terms);
                for hit in hits {
                    let target_idx = hit.entry.clause;
                    let target = &state.clauses[target_idx];
                    let u = hit.entry.term.expect("term index entry");
                    if let Some(literals) = superpose(
                        given,
                        pos,
                        lhs,
                        rhs,
                        Bank::QUERY,
                        target,
                        hit.entry.lit_pos,
                        u,
                        Bank::RESULT,
                        &hit.subst,
                        ctx,
                        kbo,
                    ) {
                        out.push(Generated {
                            literals,
                            rule: self.name(),
                            premises: vec![given_idx, target_idx],
                        });
                    }
                }
            }
        }

        // Given as rewrite target: indexed equality sides rewrite its subterms
        for pos in given.selected_range() {
            let lit = given.literals[pos];
            for u in rewritable_subterms(lit, ctx) {
                let hits = indices.superposition_lhs.unifiers(u, &ctx.terms);
                for hit in hits {
                    let eq_idx = hit.entry.clause;
                    if eq_idx == given_idx {
                        // The self-pairing is covered by the first pass
                        continue;
                    }
                    let eq_clause = &state.clauses[eq_idx];
                    let eq_lit = hit.entry.literal;
                    let lhs = hit.entry.term.expect("term index entry");
                    let eq_args = ctx.literals.args(eq_lit);
                    let rhs = if eq_args[0] == lhs { eq_args[1] } else { eq_args[0] };
                    if let Some(literals) = superpose(
                        eq_clause,
                        hit.entry.lit_pos,
                        lhs,
                        rhs,
                        Bank::RESULT,
                        given,
                        pos,
                        u,
                        Bank::QUERY,
                        &hit.subst,
                        ctx,
                        kbo,
                    ) {
                        out.push(Generated {
                            literals,
                            rule: self.name(),
                            premises: vec![given_idx, eq_idx],
                        });
                    }
                }
            }
        }

        out
    }
}

/// Which sides of a canonical positive equality may act as rewrite source
fn usable_sides(lit: Literal, kbo: &Kbo, ctx: &Context) -> Vec<(Term, Term)> {
    let args = ctx.literals.args(lit);
    let (a, b) = (args[0], args[1]);
    match kbo.eq_orientation(lit, &ctx.literals, &ctx.terms) {
        Ordering::Greater => vec![(a, b)],
        Ordering::Less => vec![(b, a)],
        Ordering::Incomparable => vec![(a, b), (b, a)],
        Ordering::Equal => vec![],
    }
}

/// Build one superposition conclusion, or None if a side condition fails
#[allow(clippy::too_many_arguments)]
fn superpose(
    eq_clause: &Clause,
    eq_pos: usize,
    lhs: Term,
    rhs: Term,
    eq_bank: Bank,
    target: &Clause,
    target_pos: usize,
    u: Term,
    target_bank: Bank,
    subst: &RobSubstitution,
    ctx: &mut Context,
    kbo: &Kbo,
) -> Option<Vec<Literal>> {
    debug_assert!(!u.is_var(), "rewritten subterm must not be a variable");

    let mut renaming = Renaming::new();
    let l_sigma = subst.apply(TermSpec::new(lhs, eq_bank), &mut renaming, &mut ctx.terms);
    let r_sigma = subst.apply(TermSpec::new(rhs, eq_bank), &mut renaming, &mut ctx.terms);
    if !not_smaller(kbo, l_sigma, r_sigma, &ctx.terms) {
        return None;
    }

    if !passes_maximality_aftercheck(eq_clause, eq_pos, eq_bank, subst, ctx, kbo) {
        return None;
    }
    if !passes_maximality_aftercheck(target, target_pos, target_bank, subst, ctx, kbo) {
        return None;
    }

    // sigma unified u with lhs, so sigma(u) is exactly l_sigma
    let u_sigma = l_sigma;

    // When rewriting inside an equality literal, the side holding the
    // occurrence must not be the strictly smaller one; dropping this check
    // loses orientation witnesses and with them completeness
    let tlit = target.literals[target_pos];
    if ctx.literals.is_equality(tlit) {
        let t_args: Vec<Term> = ctx.literals.args(tlit).to_vec();
        let s_side = subst.apply(TermSpec::new(t_args[0], target_bank), &mut renaming, &mut ctx.terms);
        let t_side = subst.apply(TermSpec::new(t_args[1], target_bank), &mut renaming, &mut ctx.terms);
        let s_cmp = kbo.compare(s_side, t_side, &ctx.terms);
        let in_s = ctx.terms.contains(s_side, u_sigma);
        let in_t = ctx.terms.contains(t_side, u_sigma);
        let ok = (in_s && s_cmp != Ordering::Less) || (in_t && s_cmp != Ordering::Greater);
        if !ok {
            return None;
        }
    }

    let mut literals = Vec::new();
    collect_side_literals(eq_clause, &[eq_pos], eq_bank, subst, &mut renaming, ctx, &mut literals);

    for &lit in &target.literals {
        let applied = apply_literal(lit, target_bank, subst, &mut renaming, ctx);
        literals.push(rewrite_literal(applied, u_sigma, r_sigma, ctx));
    }

    Some(dedup_literals(literals))
}

/// Replace every occurrence of `from` by `to` in the literal's arguments
fn rewrite_literal(lit: Literal, from: Term, to: Term, ctx: &mut Context) -> Literal {
    let predicate = ctx.literals.predicate(lit);
    let polarity = ctx.literals.polarity(lit);
    let sort = ctx.literals.eq_sort(lit);
    let args: Vec<Term> = ctx.literals.args(lit).to_vec();
    let new_args: Vec<Term> = args
        .into_iter()
        .map(|arg| ctx.terms.replace(arg, from, to))
        .collect();
    ctx.literals.intern(predicate, polarity, new_args, sort, &ctx.terms)
}
