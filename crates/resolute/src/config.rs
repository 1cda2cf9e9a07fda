//! Prover configuration types.

use std::time::Duration;

/// Literal selection strategies (numbers match the classic --selection values)
///
/// From Hoder et al. "Selecting the selection" (2016):
/// - Sel0: select all literals
/// - Sel20: select all maximal literals
/// - Sel21: unique maximal, else max-weight negative, else all maximal
/// - Sel22: max-weight negative literal, else all maximal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralSelectionStrategy {
    Sel0,
    Sel20,
    Sel21,
    Sel22,
}

/// Configuration for the saturation loop
#[derive(Debug, Clone)]
pub struct ProverConfig {
    /// Wall-clock budget; exceeding it is a normal outcome, not an error
    pub timeout: Duration,
    /// Maximum number of clauses ever created (0 means no limit)
    pub max_clauses: usize,
    /// Maximum number of given-clause iterations (0 means no limit)
    pub max_iterations: usize,
    /// Initial retention weight limit; may tighten under LRS
    pub weight_limit: u32,
    /// Initial retention age limit; may tighten under LRS
    pub age_limit: u32,
    /// Out of every `age_ratio + weight_ratio` selections, how many pick the
    /// oldest passive clause
    pub age_ratio: u32,
    /// ... and how many pick the lightest
    pub weight_ratio: u32,
    pub literal_selection: LiteralSelectionStrategy,
    /// Tighten retention limits as the time budget runs out
    pub limited_resource_strategy: bool,
    /// Memory limit for the whole process in MB (Linux only)
    pub memory_limit_mb: Option<usize>,
    /// Collect per-rule statistics (zero overhead when off)
    pub enable_profiling: bool,
}

impl Default for ProverConfig {
    fn default() -> Self {
        ProverConfig {
            timeout: Duration::from_secs(60),
            max_clauses: 0,
            max_iterations: 0,
            weight_limit: u32::MAX,
            age_limit: u32::MAX,
            age_ratio: 1,
            weight_ratio: 4,
            literal_selection: LiteralSelectionStrategy::Sel21,
            limited_resource_strategy: false,
            memory_limit_mb: None,
            enable_profiling: false,
        }
    }
}

/// Current process RSS in MB. Returns None where unavailable.
pub fn process_memory_mb() -> Option<usize> {
    #[cfg(target_os = "linux")]
    {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let rss_pages: usize = statm.split_whitespace().nth(1)?.parse().ok()?;
        let page_size = 4096usize;
        Some(rss_pages * page_size / (1024 * 1024))
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}
