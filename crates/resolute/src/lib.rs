//! resolute: a saturation-based theorem prover core for first-order logic
//! with equality.
//!
//! The crate implements the given-clause algorithm over a superposition
//! calculus: hash-consed terms and literals, a Knuth-Bendix simplification
//! ordering, a banked backtrackable substitution, substitution-tree
//! indexing, and the standard generating and simplifying inference rules.
//! Parsing and clausification are the caller's concern: clauses enter
//! pre-interned through a [`logic::Context`].

pub mod config;
pub mod error;
pub mod generating;
pub mod index;
pub mod logic;
pub mod proof;
pub mod saturation;
pub mod selection;
pub mod simplifying;
pub mod unify;

// Re-export the commonly used types
pub use config::{LiteralSelectionStrategy, ProverConfig};
pub use error::{ProverError, Result};
pub use logic::{
    Clause, Context, Inference, InputType, Kbo, KboConfig, LitHeader, Literal, Ordering,
    PredicateId, Signature, SortId, Store, Term, TermBank,
};
pub use proof::{Proof, ProofStep};
pub use saturation::{
    saturate, EventLog, Prover, SaturationProfile, SaturationResult, StateChange,
};
pub use simplifying::{SatResult, SatSolver};
pub use unify::{Bank, BindPolicy, Renaming, RobSubstitution, TermSpec, VarSpec};
