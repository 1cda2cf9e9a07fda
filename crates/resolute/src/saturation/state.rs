//! Core state of the saturation loop: the clause arena, the three clause
//! containers, the event log, and the inference rule traits.

use crate::index::IndexRegistry;
use crate::logic::clause::{Clause, Store};
use crate::logic::context::Context;
use crate::logic::literal::Literal;
use crate::logic::ordering::Kbo;
use crate::selection::AgeWeightQueue;
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::VecDeque;

/// Atomic operations on the proof state, recorded in the event log.
///
/// The log doubles as the derivation trace: every clause ever created
/// appears in an `Add` or `Replace` event with its rule and premises.
#[derive(Debug, Clone, Serialize)]
pub enum StateChange {
    /// Clause entered the arena (input or generated)
    Add {
        clause_idx: usize,
        rule: &'static str,
        premises: Vec<usize>,
    },
    /// Clause discarded (tautology, subsumed, over limits)
    Delete {
        clause_idx: usize,
        rule: &'static str,
        premises: Vec<usize>,
    },
    /// Clause replaced by a simplified form
    Replace {
        clause_idx: usize,
        replacement_idx: usize,
        rule: &'static str,
        premises: Vec<usize>,
    },
    /// Clause survived forward simplification: Unprocessed -> Passive
    Transfer { clause_idx: usize },
    /// Clause picked as the given clause: Passive -> Selected
    Select { clause_idx: usize },
    /// Given clause passed retention and was indexed: Selected -> Active
    Activate { clause_idx: usize },
}

/// The event log type
pub type EventLog = Vec<StateChange>;

/// Clause containers and storage of one saturation run
pub struct SaturationState {
    /// Arena of every clause ever created; premises index into this
    pub clauses: Vec<Clause>,
    /// Newly created clauses awaiting forward simplification
    pub unprocessed: VecDeque<usize>,
    /// Simplified clauses eligible for selection
    pub passive: AgeWeightQueue,
    /// Clauses participating in generating inferences
    pub active: IndexSet<usize>,
    pub event_log: EventLog,
    /// Given-clause iterations so far
    pub iteration: u32,
    pub initial_clause_count: usize,
}

impl SaturationState {
    pub fn new(age_ratio: u32, weight_ratio: u32) -> Self {
        SaturationState {
            clauses: Vec::new(),
            unprocessed: VecDeque::new(),
            passive: AgeWeightQueue::new(age_ratio, weight_ratio),
            active: IndexSet::new(),
            event_log: Vec::new(),
            iteration: 0,
            initial_clause_count: 0,
        }
    }

    /// Add a clause to the arena and the Unprocessed queue
    pub fn add_clause(
        &mut self,
        mut clause: Clause,
        rule: &'static str,
        premises: Vec<usize>,
    ) -> usize {
        debug_assert!(
            premises.iter().all(|&p| p < self.clauses.len()),
            "premise indices must precede the clause"
        );
        let idx = self.clauses.len();
        clause.store = Store::Unprocessed;
        self.clauses.push(clause);
        self.unprocessed.push_back(idx);
        self.event_log.push(StateChange::Add {
            clause_idx: idx,
            rule,
            premises,
        });
        idx
    }

    /// Effective weight for retention: literal weight plus a penalty per
    /// split component the clause depends on
    pub fn effective_weight(&self, idx: usize) -> u32 {
        let clause = &self.clauses[idx];
        clause.weight.saturating_add(clause.splits.count_ones())
    }
}

/// A clause produced by a generating rule, before it enters the arena
#[derive(Debug)]
pub struct Generated {
    pub literals: Vec<Literal>,
    pub rule: &'static str,
    pub premises: Vec<usize>,
}

/// Verdict of a simplifying rule on one clause
#[derive(Debug)]
pub enum Simplification {
    Unchanged,
    /// Replace the clause with these literals
    Replaced {
        literals: Vec<Literal>,
        rule: &'static str,
        premises: Vec<usize>,
    },
    /// Delete the clause outright
    Discarded {
        rule: &'static str,
        premises: Vec<usize>,
    },
}

impl Simplification {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Simplification::Unchanged)
    }
}

/// Rules that produce new clauses from the given clause and the indexed
/// Active set
pub trait GeneratingInference {
    fn name(&self) -> &'static str;

    fn generate(
        &self,
        given_idx: usize,
        state: &SaturationState,
        ctx: &mut Context,
        kbo: &Kbo,
        indices: &IndexRegistry,
    ) -> Vec<Generated>;
}

/// Rules that discard or replace clauses.
///
/// `simplify_forward` judges a new clause against the indexed search state;
/// `simplify_backward` lets a freshly activated clause demote older ones and
/// returns (victim, verdict) pairs.
pub trait SimplifyingInference {
    fn name(&self) -> &'static str;

    fn simplify_forward(
        &mut self,
        clause_idx: usize,
        state: &SaturationState,
        ctx: &mut Context,
        kbo: &Kbo,
        indices: &IndexRegistry,
    ) -> Simplification;

    fn simplify_backward(
        &mut self,
        _clause_idx: usize,
        _state: &SaturationState,
        _ctx: &mut Context,
        _kbo: &Kbo,
        _indices: &IndexRegistry,
    ) -> Vec<(usize, Simplification)> {
        Vec::new()
    }
}
