//! First-order logic data structures: sorts, signature, hash-consed terms
//! and literals, clauses, and the simplification ordering.

pub mod clause;
pub mod context;
pub mod literal;
pub mod ordering;
pub mod signature;
pub mod sorts;
pub mod term;

pub use clause::{Clause, ClauseDisplay, Inference, InputType, Store};
pub use context::Context;
pub use literal::{LitHeader, Literal, LiteralBank, LiteralDisplay};
pub use ordering::{Kbo, KboConfig, Ordering};
pub use signature::{FunctionId, OperatorType, PredicateId, Signature, SymbolFlags};
pub use sorts::{SortId, Sorts};
pub use term::{Term, TermBank, TermDisplay, TermId};
