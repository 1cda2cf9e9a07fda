//! Unification, matching, and substitution application over banked variables.

pub mod rob_substitution;


pub use rob_substitution::{Bank, BindPolicy, Mark, Renaming, RobSubstitution, TermSpec, VarSpec};
