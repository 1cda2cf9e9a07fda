//! Subsumption and subsumption resolution.
//!
//! A clause S subsumes C when one substitution maps every literal of S onto
//! a distinct literal of C. Candidates come from the simplification literal
//! index (clauses with at least one literal generalizing a literal of the
//! target); the full check is a backtracking multi-literal match over a
//! flat, trail-backtracked binding array.

use crate::index::IndexRegistry;
use crate::logic::clause::Clause;
use crate::logic::context::Context;
use crate::logic::literal::{Literal, LiteralBank};
use crate::logic::ordering::Kbo;
use crate::logic::term::{Term, TermBank};
use crate::saturation::state::{SaturationState, Simplification, SimplifyingInference};
use std::collections::HashSet;

// =============================================================================
// Flat matching substitution
// =============================================================================

/// One-way matching bindings over the subsumer's variables.
///
/// A flat array indexed by variable id with a trail for O(1)
/// bind/lookup/backtrack; subsumption tries many candidate mappings and
/// throws most away.
struct MatchSubst {
    bindings: Vec<Option<Term>>,
    trail: Vec<u32>,
}

impl MatchSubst {
    fn for_clause(clause: &Clause, lits: &LiteralBank, terms: &TermBank) -> Self {
        let max_var = clause
            .variables(lits, terms)
            .into_iter()
            .max()
            .unwrap_or(0);
        MatchSubst {
            bindings: vec![None; max_var as usize + 1],
            trail: Vec::new(),
        }
    }

    #[inline]
    fn get(&self, var: u32) -> Option<Term> {
        self.bindings.get(var as usize).copied().flatten()
    }

    #[inline]
    fn bind(&mut self, var: u32, term: Term) {
        self.bindings[var as usize] = Some(term);
        self.trail.push(var);
    }

    #[inline]
    fn mark(&self) -> usize {
        self.trail.len()
    }

    #[inline]
    fn backtrack(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let var = self.trail.pop().unwrap();
            self.bindings[var as usize] = None;
        }
    }
}

/// Match a pattern term onto a target term; only pattern variables bind
fn match_terms(pattern: Term, target: Term, subst: &mut MatchSubst, terms: &TermBank) -> bool {
    match pattern {
        Term::Var(v) => match subst.get(v) {
            Some(bound) => bound == target,
            None => {
                subst.bind(v, target);
                true
            }
        },
        Term::App(pid) => match target {
            Term::Var(_) => false,
            Term::App(tid) => {
                if pattern == target && terms.is_ground(pattern) {
                    return true;
                }
                terms.functor(pid) == terms.functor(tid)
                    && terms
                        .args(pid)
                        .iter()
                        .zip(terms.args(tid).iter())
                        .all(|(&p, &t)| match_terms(p, t, subst, terms))
            }
        },
    }
}

/// Match two literals; equality literals are tried in both argument orders.
/// `flip_polarity` matches the pattern against the target's complement
/// (subsumption resolution).
fn match_literals(
    pattern: Literal,
    target: Literal,
    flip_polarity: bool,
    subst: &mut MatchSubst,
    lits: &LiteralBank,
    terms: &TermBank,
) -> bool {
    let want_polarity = lits.polarity(target) != flip_polarity;
    if lits.polarity(pattern) != want_polarity
        || lits.predicate(pattern) != lits.predicate(target)
        || lits.eq_sort(pattern) != lits.eq_sort(target)
    {
        return false;
    }
    let p_args = lits.args(pattern);
    let t_args = lits.args(target);
    if p_args.len() != t_args.len() {
        return false;
    }

    let mark = subst.mark();
    if p_args
        .iter()
        .zip(t_args.iter())
        .all(|(&p, &t)| match_terms(p, t, subst, terms))
    {
        return true;
    }
    subst.backtrack(mark);

    // Commutative retry for equality literals
    if lits.is_equality(pattern) && p_args.len() == 2 {
        let mark = subst.mark();
        if match_terms(p_args[0], t_args[1], subst, terms)
            && match_terms(p_args[1], t_args[0], subst, terms)
        {
            return true;
        }
        subst.backtrack(mark);
    }

    false
}

/// Backtracking search for an injective literal mapping.
///
/// `complement_at`: position in the subsumer whose literal must match a
/// target literal complementarily (subsumption resolution); the matched
/// target position is reported through `complement_target`.
fn find_mapping(
    subsumer: &Clause,
    target: &Clause,
    lit_idx: usize,
    complement_at: Option<usize>,
    complement_target: &mut Option<usize>,
    used: &mut [bool],
    subst: &mut MatchSubst,
    lits: &LiteralBank,
    terms: &TermBank,
) -> bool {
    if lit_idx >= subsumer.literals.len() {
        return true;
    }
    let pattern = subsumer.literals[lit_idx];
    let flip = complement_at == Some(lit_idx);

    for (t_idx, &t_lit) in target.literals.iter().enumerate() {
        if used[t_idx] {
            continue;
        }
        let mark = subst.mark();
        if match_literals(pattern, t_lit, flip, subst, lits, terms) {
            used[t_idx] = true;
            if flip {
                *complement_target = Some(t_idx);
            }
            if find_mapping(
                subsumer,
                target,
                lit_idx + 1,
                complement_at,
                complement_target,
                used,
                subst,
                lits,
                terms,
            ) {
                return true;
            }
            used[t_idx] = false;
            if flip {
                *complement_target = None;
            }
        }
        subst.backtrack(mark);
    }
    false
}

/// Does `subsumer` subsume `target`?
pub fn subsumes(subsumer: &Clause, target: &Clause, lits: &LiteralBank, terms: &TermBank) -> bool {
    if subsumer.literals.len() > target.literals.len() {
        return false;
    }
    let mut subst = MatchSubst::for_clause(subsumer, lits, terms);
    let mut used = vec![false; target.literals.len()];
    find_mapping(
        subsumer,
        target,
        0,
        None,
        &mut None,
        &mut used,
        &mut subst,
        lits,
        terms,
    )
}

/// Subsumption resolution: if one literal of `subsumer` matches the
/// complement of a target literal and the rest subsume normally, the matched
/// target literal is redundant. Returns its position.
pub fn subsumption_resolution_target(
    subsumer: &Clause,
    target: &Clause,
    lits: &LiteralBank,
    terms: &TermBank,
) -> Option<usize> {
    if subsumer.literals.len() > target.literals.len() {
        return None;
    }
    for complement_at in 0..subsumer.literals.len() {
        let mut subst = MatchSubst::for_clause(subsumer, lits, terms);
        let mut used = vec![false; target.literals.len()];
        let mut complement_target = None;
        if find_mapping(
            subsumer,
            target,
            0,
            Some(complement_at),
            &mut complement_target,
            &mut used,
            &mut subst,
            lits,
            terms,
        ) {
            return complement_target;
        }
    }
    None
}

// =============================================================================
// Rule adapter
// =============================================================================

pub struct SubsumptionRule;

impl SubsumptionRule {
    /// Candidate subsumer clauses: anything in the simplification index with
    /// a literal generalizing a literal of the target
    fn forward_candidates(
        &self,
        clause_idx: usize,
        clause: &Clause,
        indices: &IndexRegistry,
        lits: &LiteralBank,
        terms: &TermBank,
    ) -> Vec<usize> {
        let mut candidates = HashSet::new();
        for &lit in &clause.literals {
            for hit in indices.simplification.generalizations(lit, lits, terms) {
                if hit.entry.clause != clause_idx {
                    candidates.insert(hit.entry.clause);
                }
            }
        }
        let mut sorted: Vec<usize> = candidates.into_iter().collect();
        sorted.sort_unstable();
        sorted
    }
}

impl SimplifyingInference for SubsumptionRule {
    fn name(&self) -> &'static str {
        "subsumption"
    }

    fn simplify_forward(
        &mut self,
        clause_idx: usize,
        state: &SaturationState,
        ctx: &mut Context,
        _kbo: &Kbo,
        indices: &IndexRegistry,
    ) -> Simplification {
        let clause = &state.clauses[clause_idx];

        for cand_idx in
            self.forward_candidates(clause_idx, clause, indices, &ctx.literals, &ctx.terms)
        {
            let candidate = &state.clauses[cand_idx];
            if subsumes(candidate, clause, &ctx.literals, &ctx.terms) {
                return Simplification::Discarded {
                    rule: self.name(),
                    premises: vec![cand_idx],
                };
            }
        }

        // Subsumption resolution: candidates whose literal generalizes the
        // complement of one of ours
        let mut res_candidates = HashSet::new();
        let clause_literals = clause.literals.clone();
        for lit in clause_literals {
            let complement = ctx.literals.complementary(lit, &ctx.terms);
            for hit in indices
                .simplification
                .generalizations(complement, &ctx.literals, &ctx.terms)
            {
                if hit.entry.clause != clause_idx {
                    res_candidates.insert(hit.entry.clause);
                }
            }
        }
        let mut res_candidates: Vec<usize> = res_candidates.into_iter().collect();
        res_candidates.sort_unstable();

        for cand_idx in res_candidates {
            let candidate = &state.clauses[cand_idx];
            if let Some(drop_pos) =
                subsumption_resolution_target(candidate, clause, &ctx.literals, &ctx.terms)
            {
                let literals: Vec<Literal> = clause
                    .literals
                    .iter()
                    .enumerate()
                    .filter(|&(pos, _)| pos != drop_pos)
                    .map(|(_, &l)| l)
                    .collect();
                return Simplification::Replaced {
                    literals,
                    rule: "subsumption_resolution",
                    premises: vec![cand_idx],
                };
            }
        }

        Simplification::Unchanged
    }

    fn simplify_backward(
        &mut self,
        clause_idx: usize,
        state: &SaturationState,
        ctx: &mut Context,
        _kbo: &Kbo,
        indices: &IndexRegistry,
    ) -> Vec<(usize, Simplification)> {
        let clause = &state.clauses[clause_idx];

        let mut victims = HashSet::new();
        for &lit in &clause.literals {
            for hit in indices.simplification.instances(lit, &ctx.literals, &ctx.terms) {
                if hit.entry.clause != clause_idx {
                    victims.insert(hit.entry.clause);
                }
            }
        }
        let mut victims: Vec<usize> = victims.into_iter().collect();
        victims.sort_unstable();

        victims
            .into_iter()
            .filter(|&victim_idx| {
                subsumes(clause, &state.clauses[victim_idx], &ctx.literals, &ctx.terms)
            })
            .map(|victim_idx| {
                (
                    victim_idx,
                    Simplification::Discarded {
                        rule: self.name(),
                        premises: vec![clause_idx],
                    },
                )
            })
            .collect()
    }
}
