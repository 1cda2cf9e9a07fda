//! Shared helpers for inference rules.

use crate::logic::clause::Clause;
use crate::logic::context::Context;
use crate::logic::literal::Literal;
use crate::logic::ordering::{Kbo, Ordering};
use crate::logic::term::{Term, TermBank};
use crate::unify::{Bank, Renaming, RobSubstitution, TermSpec};
use std::collections::HashSet;

/// Apply the substitution to one literal, interning the result.
///
/// All applications building one conclusion must share the same `renaming`
/// so unbound variables agree across literals.
pub fn apply_literal(
    lit: Literal,
    bank: Bank,
    subst: &RobSubstitution,
    renaming: &mut Renaming,
    ctx: &mut Context,
) -> Literal {
    let predicate = ctx.literals.predicate(lit);
    let polarity = ctx.literals.polarity(lit);
    let sort = ctx.literals.eq_sort(lit);
    let args: Vec<Term> = ctx.literals.args(lit).to_vec();
    let new_args: Vec<Term> = args
        .into_iter()
        .map(|arg| subst.apply(TermSpec::new(arg, bank), renaming, &mut ctx.terms))
        .collect();
    ctx.literals.intern(predicate, polarity, new_args, sort, &ctx.terms)
}

/// Collect the clause's literals except the excluded positions, with the
/// substitution applied
pub fn collect_side_literals(
    clause: &Clause,
    exclude: &[usize],
    bank: Bank,
    subst: &RobSubstitution,
    renaming: &mut Renaming,
    ctx: &mut Context,
    out: &mut Vec<Literal>,
) {
    for (pos, &lit) in clause.literals.iter().enumerate() {
        if exclude.contains(&pos) {
            continue;
        }
        out.push(apply_literal(lit, bank, subst, renaming, ctx));
    }
}

/// Remove duplicate literals, preserving first-occurrence order
pub fn dedup_literals(literals: Vec<Literal>) -> Vec<Literal> {
    let mut seen = HashSet::new();
    literals.into_iter().filter(|&l| seen.insert(l)).collect()
}

/// Is `a` usable as the larger side of a rewrite after substitution?
/// Greater is ordered; Incomparable is allowed and re-checked on instances.
pub fn not_smaller(kbo: &Kbo, a: Term, b: Term, terms: &TermBank) -> bool {
    matches!(
        kbo.compare(a, b, terms),
        Ordering::Greater | Ordering::Incomparable
    )
}

/// Completeness aftercheck: with several simultaneously selected literals,
/// the literal an inference fired on must still be maximal among the
/// selected literals after the unifier is applied. Inferences failing this
/// would not exist under an exact selection and are dropped.
pub fn passes_maximality_aftercheck(
    clause: &Clause,
    pos: usize,
    bank: Bank,
    subst: &RobSubstitution,
    ctx: &mut Context,
    kbo: &Kbo,
) -> bool {
    if clause.selected <= 1 {
        return true;
    }
    let mut renaming = Renaming::new();
    let target = apply_literal(clause.literals[pos], bank, subst, &mut renaming, ctx);
    for other_pos in clause.selected_range() {
        if other_pos == pos {
            continue;
        }
        let other = apply_literal(clause.literals[other_pos], bank, subst, &mut renaming, ctx);
        if kbo.compare_literals(other, target, &ctx.literals, &ctx.terms) == Ordering::Greater {
            return false;
        }
    }
    true
}

/// Non-variable subterms of a literal's arguments, each once
pub fn rewritable_subterms(lit: Literal, ctx: &Context) -> Vec<Term> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for &arg in ctx.literals.args(lit) {
        for sub in ctx.terms.subterms(arg) {
            if seen.insert(sub) {
                out.push(sub);
            }
        }
    }
    out
}
