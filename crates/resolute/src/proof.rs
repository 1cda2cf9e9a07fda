//! Proof extraction from the derivation DAG.
//!
//! Every clause records its rule and premise indices; premises always have
//! smaller indices, so the DAG is acyclic by construction and ancestor
//! collection terminates.

use crate::logic::clause::Clause;
use crate::logic::literal::Literal;
use serde::Serialize;
use std::collections::HashSet;

/// One node of the refutation: a clause with its justification
#[derive(Debug, Clone, Serialize)]
pub struct ProofStep {
    pub clause_idx: usize,
    pub rule: &'static str,
    pub premises: Vec<usize>,
    pub literals: Vec<Literal>,
}

/// A refutation: the empty clause and all its ancestors, in derivation order
#[derive(Debug, Clone, Serialize)]
pub struct Proof {
    pub steps: Vec<ProofStep>,
    pub empty_clause_idx: usize,
}

impl Proof {
    /// Walk the inference DAG backwards from `empty_clause_idx`
    pub fn extract(clauses: &[Clause], empty_clause_idx: usize) -> Proof {
        debug_assert!(clauses[empty_clause_idx].is_empty());

        let mut needed: HashSet<usize> = HashSet::new();
        let mut stack = vec![empty_clause_idx];
        while let Some(idx) = stack.pop() {
            if needed.insert(idx) {
                for &p in &clauses[idx].inference.premises {
                    debug_assert!(p < idx, "inference DAG must be acyclic");
                    stack.push(p);
                }
            }
        }

        let mut indices: Vec<usize> = needed.into_iter().collect();
        indices.sort_unstable();

        let steps = indices
            .into_iter()
            .map(|idx| {
                let clause = &clauses[idx];
                ProofStep {
                    clause_idx: idx,
                    rule: clause.inference.rule,
                    premises: clause.inference.premises.clone(),
                    literals: clause.literals.clone(),
                }
            })
            .collect();

        Proof {
            steps,
            empty_clause_idx,
        }
    }

    /// Number of nodes in the refutation DAG
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Every premise of every step must itself be a step
    pub fn is_closed(&self) -> bool {
        let present: HashSet<usize> = self.steps.iter().map(|s| s.clause_idx).collect();
        self.steps
            .iter()
            .all(|s| s.premises.iter().all(|p| present.contains(p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::clause::{Inference, InputType};
    use crate::logic::context::Context;

    #[test]
    fn test_extract_collects_ancestors_only() {
        let mut ctx = Context::new();
        let p = ctx.signature.intern_predicate("p", 0);
        let q = ctx.signature.intern_predicate("q", 0);
        let lp = ctx.literal(p, true, vec![]);
        let lnp = ctx.literal(p, false, vec![]);
        let lq = ctx.literal(q, true, vec![]);

        let clauses = vec![
            Clause::new(vec![lp], InputType::Axiom, Inference::input(), &ctx.literals),
            Clause::new(vec![lnp], InputType::NegatedConjecture, Inference::input(), &ctx.literals),
            // An unrelated clause that must not appear in the proof
            Clause::new(vec![lq], InputType::Axiom, Inference::input(), &ctx.literals),
            Clause::new(
                vec![],
                InputType::Axiom,
                Inference::new("resolution", vec![0, 1]),
                &ctx.literals,
            ),
        ];

        let proof = Proof::extract(&clauses, 3);
        assert_eq!(proof.len(), 3);
        assert!(proof.is_closed());
        let ids: Vec<usize> = proof.steps.iter().map(|s| s.clause_idx).collect();
        assert_eq!(ids, vec![0, 1, 3]);
    }

    #[test]
    fn test_shared_premises_collected_once() {
        let mut ctx = Context::new();
        let p = ctx.signature.intern_predicate("p", 0);
        let lp = ctx.literal(p, true, vec![]);

        let clauses = vec![
            Clause::new(vec![lp], InputType::Axiom, Inference::input(), &ctx.literals),
            Clause::new(vec![lp], InputType::Axiom, Inference::new("factoring", vec![0]), &ctx.literals),
            Clause::new(vec![lp], InputType::Axiom, Inference::new("factoring", vec![0]), &ctx.literals),
            Clause::new(
                vec![],
                InputType::Axiom,
                Inference::new("resolution", vec![1, 2]),
                &ctx.literals,
            ),
        ];

        let proof = Proof::extract(&clauses, 3);
        assert_eq!(proof.len(), 4);
    }
}
