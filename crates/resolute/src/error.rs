//! Error types.
//!
//! Resource and time exhaustion are not errors: they are normal saturation
//! outcomes reported through `SaturationResult`. This type covers input
//! problems and external interruption only; internal invariant violations
//! assert in debug builds and abort with a diagnostic otherwise.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProverError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("arity mismatch for symbol '{symbol}': declared {declared}, applied to {applied}")]
    ArityMismatch {
        symbol: String,
        declared: usize,
        applied: usize,
    },

    #[error("interrupted")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, ProverError>;
