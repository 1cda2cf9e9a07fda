//! Opt-in statistics for a saturation run.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Counters for one inference rule
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleStats {
    pub attempts: u64,
    pub successes: u64,
    /// Clauses produced (generating rules only)
    pub generated: u64,
    /// Total time spent in the rule, seconds
    #[serde(serialize_with = "duration_secs")]
    pub time: Duration,
}

fn duration_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Statistics collected when profiling is enabled
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaturationProfile {
    pub iterations: u32,
    pub clauses_generated: u64,
    pub clauses_discarded: u64,
    pub retention_rejects: u64,
    pub limit_sweeps: u64,
    pub max_passive_size: usize,
    pub max_active_size: usize,
    pub generating_rules: BTreeMap<&'static str, RuleStats>,
    pub simplifying_rules: BTreeMap<&'static str, RuleStats>,
    #[serde(serialize_with = "duration_secs")]
    pub total_time: Duration,
}

impl SaturationProfile {
    pub fn record_generating(&mut self, rule: &'static str, produced: usize, time: Duration) {
        let stats = self.generating_rules.entry(rule).or_default();
        stats.attempts += 1;
        if produced > 0 {
            stats.successes += 1;
        }
        stats.generated += produced as u64;
        stats.time += time;
        self.clauses_generated += produced as u64;
    }

    pub fn record_simplifying(&mut self, rule: &'static str, success: bool, time: Duration) {
        let stats = self.simplifying_rules.entry(rule).or_default();
        stats.attempts += 1;
        if success {
            stats.successes += 1;
        }
        stats.time += time;
    }

    pub fn note_container_sizes(&mut self, passive: usize, active: usize) {
        self.max_passive_size = self.max_passive_size.max(passive);
        self.max_active_size = self.max_active_size.max(active);
    }
}
