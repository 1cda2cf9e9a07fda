//! Simplifying inference rules: redundancy elimination and rewriting.

pub mod demodulation;
pub mod global_subsumption;
pub mod subsumption;
pub mod tautology;

pub use demodulation::DemodulationRule;
pub use global_subsumption::{GlobalSubsumptionRule, SatResult, SatSolver};
pub use subsumption::{subsumes, subsumption_resolution_target, SubsumptionRule};
pub use tautology::TautologyRule;
