//! The prover context: all shared interning state in one explicit value.
//!
//! Every component that may intern a symbol, term, or literal takes the
//! context (or the relevant bank) by mutable handle; there is no global
//! state, and tests build independent contexts.

use super::literal::{Literal, LiteralBank};
use super::signature::{FunctionId, PredicateId, Signature};
use super::sorts::{SortId, Sorts};
use super::term::{Term, TermBank};
use crate::error::ProverError;

/// Shared interning state of a proving run
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub sorts: Sorts,
    pub signature: Signature,
    pub terms: TermBank,
    pub literals: LiteralBank,
}

impl Context {
    pub fn new() -> Self {
        Context {
            sorts: Sorts::new(),
            signature: Signature::new(),
            terms: TermBank::new(),
            literals: LiteralBank::new(),
        }
    }

    /// Intern an application term; bumps the functor's usage count
    pub fn term(&mut self, functor: FunctionId, args: Vec<Term>) -> Term {
        debug_assert_eq!(
            self.signature.function_arity(functor) as usize,
            args.len(),
            "arity mismatch for {}",
            self.signature.function_name(functor)
        );
        self.signature.note_function_use(functor);
        let sort = self.signature.function_type(functor).result;
        self.terms.intern(functor, args, sort)
    }

    /// Intern a non-equality literal; bumps the predicate's usage count
    pub fn literal(&mut self, predicate: PredicateId, polarity: bool, args: Vec<Term>) -> Literal {
        debug_assert_ne!(predicate, PredicateId::EQUALITY, "use Context::equality");
        debug_assert_eq!(self.signature.predicate_arity(predicate) as usize, args.len());
        self.signature.note_predicate_use(predicate);
        self.literals
            .intern(predicate, polarity, args, SortId::DEFAULT, &self.terms)
    }

    /// Intern an equality literal over the given sort
    pub fn equality(&mut self, polarity: bool, lhs: Term, rhs: Term, sort: SortId) -> Literal {
        self.signature.note_predicate_use(PredicateId::EQUALITY);
        self.literals.equality(polarity, lhs, rhs, sort, &self.terms)
    }

    /// Checked term interning for the input boundary. Rule code uses the
    /// unchecked `term` on symbols it read back out of the banks.
    pub fn try_term(&mut self, functor: FunctionId, args: Vec<Term>) -> Result<Term, ProverError> {
        let declared = self.signature.function_arity(functor) as usize;
        if declared != args.len() {
            return Err(ProverError::ArityMismatch {
                symbol: self.signature.function_name(functor).to_string(),
                declared,
                applied: args.len(),
            });
        }
        Ok(self.term(functor, args))
    }

    /// Checked literal interning for the input boundary
    pub fn try_literal(
        &mut self,
        predicate: PredicateId,
        polarity: bool,
        args: Vec<Term>,
    ) -> Result<Literal, ProverError> {
        if predicate == PredicateId::EQUALITY {
            return Err(ProverError::InvalidInput(
                "equality literals carry a sort; use Context::equality".into(),
            ));
        }
        let declared = self.signature.predicate_arity(predicate) as usize;
        if declared != args.len() {
            return Err(ProverError::ArityMismatch {
                symbol: self.signature.predicate_name(predicate).to_string(),
                declared,
                applied: args.len(),
            });
        }
        Ok(self.literal(predicate, polarity, args))
    }
}
