//! The given-clause saturation loop.
//!
//! New clauses drain through forward simplification into Passive; one given
//! clause at a time passes retention, gets its literal selection computed,
//! is activated into the indices, backward-simplifies the older clauses,
//! and generates inferences against the Active set. The timer and the stop
//! flag are polled every iteration and between generating rules.

use super::limits::Limits;
use super::profile::SaturationProfile;
use super::state::{
    EventLog, Generated, GeneratingInference, SaturationState, Simplification, SimplifyingInference,
    StateChange,
};
use crate::config::{process_memory_mb, LiteralSelectionStrategy, ProverConfig};
use crate::generating::{
    EqualityFactoringRule, EqualityResolutionRule, FactoringRule, ResolutionRule, SuperpositionRule,
};
use crate::index::IndexRegistry;
use crate::logic::clause::{Clause, Inference, Store};
use crate::logic::context::Context;
use crate::logic::literal::Literal;
use crate::logic::ordering::{Kbo, KboConfig};
use crate::proof::Proof;
use crate::selection::{
    LiteralSelector, SelectAll, SelectMaximal, SelectNegMaxWeightOrMaximal,
    SelectUniqueMaximalOrNegOrMaximal,
};
use crate::simplifying::{DemodulationRule, GlobalSubsumptionRule, SatSolver, SubsumptionRule, TautologyRule};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a saturation run
#[derive(Debug)]
pub enum SaturationResult {
    /// The empty clause was derived
    Refutation(Proof),
    /// No new non-redundant clause can be generated. Incomplete whenever
    /// limits discarded clauses along the way.
    Saturated,
    /// Clause or iteration budget exhausted
    ResourceLimit,
    /// Wall-clock budget exhausted; a normal outcome, not an error
    Timeout,
    /// The external stop flag was raised
    Cancelled,
}

impl SaturationResult {
    /// Conventional process exit code: 0 refutation, 1 saturation, 2 limits
    pub fn exit_code(&self) -> i32 {
        match self {
            SaturationResult::Refutation(_) => 0,
            SaturationResult::Saturated => 1,
            _ => 2,
        }
    }
}

/// The saturation prover
pub struct Prover {
    pub config: ProverConfig,
    pub ctx: Context,
    pub state: SaturationState,
    kbo: Kbo,
    literal_selector: Box<dyn LiteralSelector>,
    simplifying: Vec<Box<dyn SimplifyingInference>>,
    generating: Vec<Box<dyn GeneratingInference>>,
    indices: IndexRegistry,
    limits: Limits,
    profile: Option<SaturationProfile>,
    cancel: Arc<AtomicBool>,
    start: Option<Instant>,
}

impl Prover {
    /// Build a prover over pre-interned input clauses.
    ///
    /// The clauses must have been built against `ctx`; input equalities are
    /// oriented here.
    pub fn new(initial_clauses: Vec<Clause>, config: ProverConfig, mut ctx: Context) -> Self {
        let kbo = Kbo::new(KboConfig::default());

        let literal_selector: Box<dyn LiteralSelector> = match config.literal_selection {
            LiteralSelectionStrategy::Sel0 => Box::new(SelectAll),
            LiteralSelectionStrategy::Sel20 => {
                Box::new(SelectMaximal::new(Kbo::new(KboConfig::default())))
            }
            LiteralSelectionStrategy::Sel21 => Box::new(SelectUniqueMaximalOrNegOrMaximal::new(
                Kbo::new(KboConfig::default()),
            )),
            LiteralSelectionStrategy::Sel22 => Box::new(SelectNegMaxWeightOrMaximal::new(
                Kbo::new(KboConfig::default()),
            )),
        };

        let simplifying: Vec<Box<dyn SimplifyingInference>> = vec![
            Box::new(TautologyRule),
            Box::new(DemodulationRule),
            Box::new(SubsumptionRule),
        ];
        let generating: Vec<Box<dyn GeneratingInference>> = vec![
            Box::new(FactoringRule),
            Box::new(EqualityResolutionRule),
            Box::new(EqualityFactoringRule),
            Box::new(ResolutionRule),
            Box::new(SuperpositionRule),
        ];

        let limits = Limits::from_config(&config);
        let profile = config.enable_profiling.then(SaturationProfile::default);

        let mut state = SaturationState::new(config.age_ratio, config.weight_ratio);
        state.initial_clause_count = initial_clauses.len();
        for mut clause in initial_clauses {
            kbo.orient_equalities(&mut clause, &mut ctx);
            state.add_clause(clause, Inference::INPUT_RULE, vec![]);
        }

        Prover {
            config,
            ctx,
            state,
            kbo,
            literal_selector,
            simplifying,
            generating,
            indices: IndexRegistry::new(),
            limits,
            profile,
            cancel: Arc::new(AtomicBool::new(false)),
            start: None,
        }
    }

    /// Enable global subsumption against the given SAT backend
    pub fn with_sat_solver(mut self, solver: Box<dyn SatSolver>) -> Self {
        self.simplifying.push(Box::new(GlobalSubsumptionRule::new(solver)));
        self
    }

    /// Shared stop flag; raising it terminates the run cooperatively
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Run to completion
    pub fn prove(mut self) -> (SaturationResult, Option<SaturationProfile>, EventLog, Context) {
        let start = Instant::now();
        self.start = Some(start);

        let result = loop {
            if let Some(result) = self.step() {
                break result;
            }
        };

        if let Some(profile) = self.profile.as_mut() {
            profile.total_time = start.elapsed();
        }

        (result, self.profile, self.state.event_log, self.ctx)
    }

    /// One iteration of the outer loop. Returns `Some` when finished.
    pub fn step(&mut self) -> Option<SaturationResult> {
        let start = *self.start.get_or_insert_with(Instant::now);

        // Drain new clauses through forward simplification
        while let Some(idx) = self.state.unprocessed.pop_front() {
            if self.state.clauses[idx].is_empty() {
                return Some(SaturationResult::Refutation(Proof::extract(
                    &self.state.clauses,
                    idx,
                )));
            }

            match self.forward_simplify(idx) {
                Simplification::Discarded { rule, premises } => {
                    self.state.clauses[idx].store = Store::None;
                    self.state.event_log.push(StateChange::Delete {
                        clause_idx: idx,
                        rule,
                        premises,
                    });
                    if let Some(p) = self.profile.as_mut() {
                        p.clauses_discarded += 1;
                    }
                }
                Simplification::Replaced { literals, rule, premises } => {
                    let new_idx = self.add_simplified(idx, literals, rule, premises.clone());
                    self.state.clauses[idx].store = Store::None;
                    self.state.event_log.push(StateChange::Replace {
                        clause_idx: idx,
                        replacement_idx: new_idx,
                        rule,
                        premises,
                    });
                }
                Simplification::Unchanged => {
                    let clause = &mut self.state.clauses[idx];
                    clause.store = Store::Passive;
                    let age = clause.age;
                    clause.refs += 1;
                    let weight = self.state.effective_weight(idx);
                    self.state.passive.insert(idx, age, weight);
                    self.indices.on_passive(
                        idx,
                        &self.state.clauses[idx],
                        &self.ctx.literals,
                        &mut self.ctx.terms,
                    );
                    self.state.event_log.push(StateChange::Transfer { clause_idx: idx });
                }
            }
        }

        // Saturation?
        if self.state.passive.is_empty() {
            return Some(SaturationResult::Saturated);
        }

        // Limits, timer, stop flag
        if let Some(result) = self.check_limits(start) {
            return Some(result);
        }

        // Limited resource strategy: tighten and sweep
        if self.config.limited_resource_strategy && !self.config.timeout.is_zero() {
            let fraction = start.elapsed().as_secs_f64() / self.config.timeout.as_secs_f64();
            if self.limits.tighten(fraction) {
                self.sweep_over_limit();
                if let Some(p) = self.profile.as_mut() {
                    p.limit_sweeps += 1;
                }
            }
        }

        self.state.iteration = self.state.iteration.saturating_add(1);
        if let Some(p) = self.profile.as_mut() {
            p.iterations = self.state.iteration;
            p.note_container_sizes(self.state.passive.len(), self.state.active.len());
        }

        // Select the given clause
        let given_idx = match self.state.passive.select() {
            Some(idx) => idx,
            None => return Some(SaturationResult::Saturated),
        };
        self.state.clauses[given_idx].store = Store::Selected;
        self.state
            .event_log
            .push(StateChange::Select { clause_idx: given_idx });

        // Retention: rejects happen here, not after insertion
        let age = self.state.clauses[given_idx].age;
        if !self
            .limits
            .passes_retention(self.state.effective_weight(given_idx), age)
        {
            self.indices.on_passive_removed(
                given_idx,
                &self.state.clauses[given_idx],
                &self.ctx.literals,
                &mut self.ctx.terms,
            );
            let clause = &mut self.state.clauses[given_idx];
            clause.store = Store::None;
            debug_assert!(clause.refs > 0);
            clause.refs -= 1;
            self.state.event_log.push(StateChange::Delete {
                clause_idx: given_idx,
                rule: "retention",
                premises: vec![],
            });
            if let Some(p) = self.profile.as_mut() {
                p.retention_rejects += 1;
            }
            return None;
        }

        // Activate: compute literal selection, permute the selected prefix
        // to the front, register with the indices. The simplification index
        // entries are keyed by position, so they come out before the permute
        // and go back in with the rest.
        self.indices.on_passive_removed(
            given_idx,
            &self.state.clauses[given_idx],
            &self.ctx.literals,
            &mut self.ctx.terms,
        );
        let positions = self.literal_selector.select(
            &self.state.clauses[given_idx],
            &self.ctx.literals,
            &self.ctx.terms,
        );
        {
            let clause = &mut self.state.clauses[given_idx];
            let mut ordered: Vec<Literal> = positions.iter().map(|&p| clause.literals[p]).collect();
            for (pos, &lit) in clause.literals.iter().enumerate() {
                if !positions.contains(&pos) {
                    ordered.push(lit);
                }
            }
            clause.literals = ordered;
            clause.selected = positions.len();
            clause.store = Store::Active;
        }
        self.state.active.insert(given_idx);
        self.indices.on_activated(
            given_idx,
            &self.state.clauses[given_idx],
            &self.kbo,
            &self.ctx.literals,
            &mut self.ctx.terms,
        );
        self.state
            .event_log
            .push(StateChange::Activate { clause_idx: given_idx });

        // Backward simplification may demote actives and passives
        let victims = self.backward_simplify(given_idx);
        for (victim_idx, verdict) in victims {
            if victim_idx == given_idx || self.state.clauses[victim_idx].store == Store::None {
                continue;
            }
            match verdict {
                Simplification::Discarded { rule, premises } => {
                    self.remove_from_search(victim_idx);
                    self.state.event_log.push(StateChange::Delete {
                        clause_idx: victim_idx,
                        rule,
                        premises,
                    });
                    if let Some(p) = self.profile.as_mut() {
                        p.clauses_discarded += 1;
                    }
                }
                Simplification::Replaced { literals, rule, premises } => {
                    self.remove_from_search(victim_idx);
                    let new_idx = self.add_simplified(victim_idx, literals, rule, premises.clone());
                    self.state.event_log.push(StateChange::Replace {
                        clause_idx: victim_idx,
                        replacement_idx: new_idx,
                        rule,
                        premises,
                    });
                }
                Simplification::Unchanged => {}
            }
        }

        // Generate new clauses against the Active set
        let generated = self.generate(given_idx);
        for g in generated {
            self.add_generated(g);
        }

        None
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(AtomicOrdering::Relaxed)
    }

    fn check_limits(&self, start: Instant) -> Option<SaturationResult> {
        if self.cancelled() {
            return Some(SaturationResult::Cancelled);
        }
        if !self.config.timeout.is_zero() && start.elapsed() > self.config.timeout {
            return Some(SaturationResult::Timeout);
        }
        if self.config.max_clauses > 0 && self.state.clauses.len() >= self.config.max_clauses {
            return Some(SaturationResult::ResourceLimit);
        }
        if self.config.max_iterations > 0
            && self.state.iteration as usize >= self.config.max_iterations
        {
            return Some(SaturationResult::ResourceLimit);
        }
        if let Some(limit_mb) = self.config.memory_limit_mb {
            if let Some(rss) = process_memory_mb() {
                if rss >= limit_mb {
                    return Some(SaturationResult::ResourceLimit);
                }
            }
        }
        None
    }

    /// Run forward simplification rules until one fires
    fn forward_simplify(&mut self, idx: usize) -> Simplification {
        let mut rules = std::mem::take(&mut self.simplifying);
        let mut verdict = Simplification::Unchanged;
        for rule in rules.iter_mut() {
            let t0 = self.profile.as_ref().map(|_| Instant::now());
            let v = rule.simplify_forward(idx, &self.state, &mut self.ctx, &self.kbo, &self.indices);
            if let (Some(p), Some(t)) = (self.profile.as_mut(), t0) {
                p.record_simplifying(rule.name(), !v.is_unchanged(), t.elapsed());
            }
            if !v.is_unchanged() {
                verdict = v;
                break;
            }
        }
        self.simplifying = rules;
        verdict
    }

    /// Run backward simplification rules for a freshly activated clause
    fn backward_simplify(&mut self, given_idx: usize) -> Vec<(usize, Simplification)> {
        let mut rules = std::mem::take(&mut self.simplifying);
        let mut victims = Vec::new();
        for rule in rules.iter_mut() {
            let t0 = self.profile.as_ref().map(|_| Instant::now());
            let found =
                rule.simplify_backward(given_idx, &self.state, &mut self.ctx, &self.kbo, &self.indices);
            if let (Some(p), Some(t)) = (self.profile.as_mut(), t0) {
                p.record_simplifying(rule.name(), !found.is_empty(), t.elapsed());
            }
            victims.extend(found);
        }
        self.simplifying = rules;
        victims
    }

    /// Run generating rules; polls the stop flag between rules
    fn generate(&mut self, given_idx: usize) -> Vec<Generated> {
        let generating = std::mem::take(&mut self.generating);
        let mut out = Vec::new();
        for rule in &generating {
            if self.cancelled() {
                break;
            }
            let t0 = self.profile.as_ref().map(|_| Instant::now());
            let produced =
                rule.generate(given_idx, &self.state, &mut self.ctx, &self.kbo, &self.indices);
            if let (Some(p), Some(t)) = (self.profile.as_mut(), t0) {
                p.record_generating(rule.name(), produced.len(), t.elapsed());
            }
            out.extend(produced);
        }
        self.generating = generating;
        out
    }

    /// Enter a simplified clause into the arena; it inherits the original's
    /// age and records the original plus the simplifier as premises
    fn add_simplified(
        &mut self,
        old_idx: usize,
        literals: Vec<Literal>,
        rule: &'static str,
        premises: Vec<usize>,
    ) -> usize {
        let mut all_premises = vec![old_idx];
        all_premises.extend(premises);

        let old = &self.state.clauses[old_idx];
        let age = old.age;
        let input_type = old.input_type;
        let splits = all_premises
            .iter()
            .fold(0u64, |acc, &p| acc | self.state.clauses[p].splits);

        let mut clause = Clause::new(
            literals,
            input_type,
            Inference::new(rule, all_premises.clone()),
            &self.ctx.literals,
        );
        clause.age = age;
        clause.splits = splits;
        self.kbo.orient_equalities(&mut clause, &mut self.ctx);
        self.state.add_clause(clause, rule, all_premises)
    }

    /// Enter a generated clause into the arena: age is one past the oldest
    /// premise, split sets union
    fn add_generated(&mut self, g: Generated) {
        let age = g
            .premises
            .iter()
            .map(|&p| self.state.clauses[p].age)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        let input_type = g
            .premises
            .iter()
            .map(|&p| self.state.clauses[p].input_type)
            .max()
            .unwrap_or_default();
        let splits = g
            .premises
            .iter()
            .fold(0u64, |acc, &p| acc | self.state.clauses[p].splits);

        let mut clause = Clause::new(
            g.literals,
            input_type,
            Inference::new(g.rule, g.premises.clone()),
            &self.ctx.literals,
        );
        clause.age = age;
        clause.splits = splits;
        self.kbo.orient_equalities(&mut clause, &mut self.ctx);
        self.state.add_clause(clause, g.rule, g.premises);
    }

    /// Remove a clause from whichever container holds it, de-indexing it
    /// before its storage could ever be reused
    fn remove_from_search(&mut self, idx: usize) {
        match self.state.clauses[idx].store {
            Store::Passive | Store::Selected => {
                self.state.passive.remove(idx);
                self.indices.on_passive_removed(
                    idx,
                    &self.state.clauses[idx],
                    &self.ctx.literals,
                    &mut self.ctx.terms,
                );
            }
            Store::Active => {
                self.state.active.shift_remove(&idx);
                self.indices.on_removed(
                    idx,
                    &self.state.clauses[idx],
                    &self.kbo,
                    &self.ctx.literals,
                    &mut self.ctx.terms,
                );
            }
            Store::Unprocessed | Store::None => {}
        }
        let clause = &mut self.state.clauses[idx];
        if clause.refs > 0 {
            clause.refs -= 1;
        }
        clause.store = Store::None;
    }

    /// Discard every Active or Passive clause that no longer passes the
    /// tightened limits
    fn sweep_over_limit(&mut self) {
        let mut over: Vec<usize> = self
            .state
            .passive
            .members()
            .chain(self.state.active.iter().copied())
            .filter(|&idx| {
                let age = self.state.clauses[idx].age;
                !self
                    .limits
                    .passes_retention(self.state.effective_weight(idx), age)
            })
            .collect();
        over.sort_unstable();

        for idx in over {
            self.remove_from_search(idx);
            self.state.event_log.push(StateChange::Delete {
                clause_idx: idx,
                rule: "limit_sweep",
                premises: vec![],
            });
        }
    }
}

/// Run saturation on pre-interned clauses
pub fn saturate(
    initial_clauses: Vec<Clause>,
    config: ProverConfig,
    ctx: Context,
) -> (SaturationResult, Option<SaturationProfile>, EventLog, Context) {
    Prover::new(initial_clauses, config, ctx).prove()
}
