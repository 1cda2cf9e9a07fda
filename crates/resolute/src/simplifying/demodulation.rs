//! Demodulation: rewriting with unit equalities, left to right.
//!
//! Forward demodulation rewrites a candidate clause with active
//! demodulators; backward demodulation lets a newly activated unit equality
//! rewrite older active clauses. Every application requires the rewrite
//! instance to be strictly decreasing, and rewriting the top of an equality
//! side carries an extra check that keeps the orientation witness.

use crate::index::IndexRegistry;
use crate::logic::clause::Clause;
use crate::logic::context::Context;
use crate::logic::literal::Literal;
use crate::logic::ordering::{Kbo, Ordering};
use crate::logic::term::Term;
use crate::saturation::state::{SaturationState, Simplification, SimplifyingInference};
use crate::unify::{Bank, Renaming, RobSubstitution, TermSpec};
use std::collections::HashSet;

pub struct DemodulationRule;

impl DemodulationRule {
    /// Try to rewrite `r` (a subterm of `clause`) with the demodulator
    /// instance sigma(lhs) = r, sigma(rhs) = rho. Returns the replacement
    /// term on success.
    #[allow(clippy::too_many_arguments)]
    fn rewrite_with(
        &self,
        clause: &Clause,
        lit_pos: usize,
        r: Term,
        eq_lit: Literal,
        lhs: Term,
        subst: &RobSubstitution,
        clause_bank: Bank,
        eq_bank: Bank,
        ctx: &mut Context,
        kbo: &Kbo,
    ) -> Option<Term> {
        let eq_args = ctx.literals.args(eq_lit);
        let rhs = if eq_args[0] == lhs { eq_args[1] } else { eq_args[0] };

        // Keep the rewritten clause's variables verbatim
        let mut renaming = Renaming::new();
        renaming.keep(clause_bank, clause.variables(&ctx.literals, &ctx.terms));
        let rho = subst.apply(TermSpec::new(rhs, eq_bank), &mut renaming, &mut ctx.terms);

        // The instance must be strictly decreasing. Pre-oriented equalities
        // stay oriented on instances, so only the unoriented ones pay a
        // comparison here.
        let pre_oriented = lhs == eq_args[0]
            && kbo.eq_orientation(eq_lit, &ctx.literals, &ctx.terms) == Ordering::Greater;
        if !pre_oriented && kbo.compare(r, rho, &ctx.terms) != Ordering::Greater {
            return None;
        }

        // Rewriting the whole top of an equality side may lose the witness
        // that oriented the equation; require the result to stay above the
        // other side in that case
        let lit = clause.literals[lit_pos];
        if ctx.literals.is_positive_equality(lit) {
            let args = ctx.literals.args(lit);
            let other = if args[0] == r {
                Some(args[1])
            } else if args[1] == r {
                Some(args[0])
            } else {
                None
            };
            if let Some(other) = other {
                if kbo.compare(rho, other, &ctx.terms) != Ordering::Greater {
                    return None;
                }
            }
        }

        Some(rho)
    }

    /// Rebuild the clause with every occurrence of `r` replaced by `rho`
    fn rewritten_literals(&self, clause: &Clause, r: Term, rho: Term, ctx: &mut Context) -> Vec<Literal> {
        clause
            .literals
            .iter()
            .map(|&lit| {
                let predicate = ctx.literals.predicate(lit);
                let polarity = ctx.literals.polarity(lit);
                let sort = ctx.literals.eq_sort(lit);
                let args: Vec<Term> = ctx.literals.args(lit).to_vec();
                let new_args: Vec<Term> = args
                    .into_iter()
                    .map(|arg| ctx.terms.replace(arg, r, rho))
                    .collect();
                ctx.literals.intern(predicate, polarity, new_args, sort, &ctx.terms)
            })
            .collect()
    }
}

impl SimplifyingInference for DemodulationRule {
    fn name(&self) -> &'static str {
        "demodulation"
    }

    fn simplify_forward(
        &mut self,
        clause_idx: usize,
        state: &SaturationState,
        ctx: &mut Context,
        kbo: &Kbo,
        indices: &IndexRegistry,
    ) -> Simplification {
        let clause = &state.clauses[clause_idx];

        for (lit_pos, &lit) in clause.literals.iter().enumerate() {
            let args: Vec<Term> = ctx.literals.args(lit).to_vec();
            for &arg in &args {
                let subterms: Vec<Term> = ctx.terms.subterms(arg).collect();
                for r in subterms {
                    let hits = indices.demodulators.generalizations(r, &ctx.terms);
                    for hit in hits {
                        if hit.entry.clause == clause_idx {
                            continue;
                        }
                        let lhs = hit.entry.term.expect("term index entry");
                        if let Some(rho) = self.rewrite_with(
                            clause,
                            lit_pos,
                            r,
                            hit.entry.literal,
                            lhs,
                            &hit.subst,
                            Bank::QUERY,
                            Bank::RESULT,
                            ctx,
                            kbo,
                        ) {
                            return Simplification::Replaced {
                                literals: self.rewritten_literals(clause, r, rho, ctx),
                                rule: self.name(),
                                premises: vec![hit.entry.clause],
                            };
                        }
                    }
                }
            }
        }

        Simplification::Unchanged
    }

    fn simplify_backward(
        &mut self,
        clause_idx: usize,
        state: &SaturationState,
        ctx: &mut Context,
        kbo: &Kbo,
        indices: &IndexRegistry,
    ) -> Vec<(usize, Simplification)> {
        let given = &state.clauses[clause_idx];
        if !given.is_unit_equality(&ctx.literals) {
            return Vec::new();
        }
        let eq_lit = given.literals[0];
        let eq_args = ctx.literals.args(eq_lit).to_vec();

        let sides: Vec<Term> = match kbo.eq_orientation(eq_lit, &ctx.literals, &ctx.terms) {
            Ordering::Greater => vec![eq_args[0]],
            Ordering::Less => vec![eq_args[1]],
            Ordering::Incomparable => vec![eq_args[0], eq_args[1]],
            Ordering::Equal => vec![],
        };

        let mut out = Vec::new();
        let mut rewritten: HashSet<usize> = HashSet::new();

        for side in sides {
            let hits = indices.rewritable.instances(side, &ctx.terms);
            for hit in hits {
                let victim_idx = hit.entry.clause;
                if victim_idx == clause_idx || rewritten.contains(&victim_idx) {
                    continue;
                }
                let victim = &state.clauses[victim_idx];
                let r = hit.entry.term.expect("term index entry");
                // The victim's subterm r is an instance of the side: here
                // the demodulator is the query, the victim the result side
                if let Some(rho) = self.rewrite_with(
                    victim,
                    hit.entry.lit_pos,
                    r,
                    eq_lit,
                    side,
                    &hit.subst,
                    Bank::RESULT,
                    Bank::QUERY,
                    ctx,
                    kbo,
                ) {
                    rewritten.insert(victim_idx);
                    out.push((
                        victim_idx,
                        Simplification::Replaced {
                            literals: self.rewritten_literals(victim, r, rho, ctx),
                            rule: self.name(),
                            premises: vec![clause_idx],
                        },
                    ));
                }
            }
        }

        out
    }
}
