//! Hash-consed terms.
//!
//! Variables are plain integers and need no interning. Applications are
//! interned in a `TermBank`: structurally equal terms share one `TermId`, so
//! a `Term` is a copyable 8-byte handle, equality on handles is structural
//! equality, and weight and groundness are cached per shared node.

use super::signature::FunctionId;
use super::sorts::SortId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// ID of an interned application node
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TermId(pub(crate) u32);

impl TermId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// A term: a variable or a shared application node
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// Variable, identified by a non-negative integer
    Var(u32),
    /// Application of a function symbol, interned in the bank
    App(TermId),
}

impl Term {
    pub fn is_var(self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn as_var(self) -> Option<u32> {
        match self {
            Term::Var(v) => Some(v),
            Term::App(_) => None,
        }
    }

    pub fn as_app(self) -> Option<TermId> {
        match self {
            Term::Var(_) => None,
            Term::App(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone)]
struct TermNode {
    functor: FunctionId,
    args: Vec<Term>,
    weight: u32,
    ground: bool,
    sort: SortId,
}

/// Sharing structure for terms.
///
/// Append-only for the lifetime of a proving run; interned nodes are
/// immutable.
#[derive(Debug, Clone, Default)]
pub struct TermBank {
    nodes: Vec<TermNode>,
    lookup: HashMap<(FunctionId, Vec<Term>), u32>,
}

impl TermBank {
    pub fn new() -> Self {
        TermBank::default()
    }

    /// Intern an application. Two calls with equal keys return the same handle.
    pub fn intern(&mut self, functor: FunctionId, args: Vec<Term>, sort: SortId) -> Term {
        if let Some(&id) = self.lookup.get(&(functor, args.clone())) {
            return Term::App(TermId(id));
        }
        let mut weight: u32 = 1;
        let mut ground = true;
        for &arg in &args {
            weight = weight.saturating_add(self.weight(arg));
            ground &= self.is_ground(arg);
        }
        let id = self.nodes.len() as u32;
        self.nodes.push(TermNode {
            functor,
            args: args.clone(),
            weight,
            ground,
            sort,
        });
        self.lookup.insert((functor, args), id);
        Term::App(TermId(id))
    }

    pub fn functor(&self, id: TermId) -> FunctionId {
        self.nodes[id.0 as usize].functor
    }

    pub fn args(&self, id: TermId) -> &[Term] {
        &self.nodes[id.0 as usize].args
    }

    pub fn sort_of(&self, term: Term) -> SortId {
        match term {
            Term::Var(_) => SortId::DEFAULT,
            Term::App(id) => self.nodes[id.0 as usize].sort,
        }
    }

    /// Cached term weight: 1 per symbol and per variable occurrence. O(1).
    pub fn weight(&self, term: Term) -> u32 {
        match term {
            Term::Var(_) => 1,
            Term::App(id) => self.nodes[id.0 as usize].weight,
        }
    }

    /// Cached groundness. O(1).
    pub fn is_ground(&self, term: Term) -> bool {
        match term {
            Term::Var(_) => false,
            Term::App(id) => self.nodes[id.0 as usize].ground,
        }
    }

    /// Iterator over variable occurrences (with multiplicity)
    pub fn vars(&self, term: Term) -> VarIter<'_> {
        VarIter {
            bank: self,
            stack: vec![term],
        }
    }

    /// Collect variables with their occurrence counts
    pub fn var_counts(&self, term: Term) -> HashMap<u32, u32> {
        let mut counts = HashMap::new();
        for v in self.vars(term) {
            *counts.entry(v).or_insert(0) += 1;
        }
        counts
    }

    /// Depth-first iterator over non-variable subterms, including `term`
    /// itself when it is an application. Supports skipping the subtree of the
    /// most recently yielded term.
    pub fn subterms(&self, term: Term) -> SubtermIter<'_> {
        SubtermIter {
            bank: self,
            stack: vec![term],
            expand: None,
        }
    }

    /// Does `sub` occur in `term` (as a shared node or variable)?
    pub fn contains(&self, term: Term, sub: Term) -> bool {
        if term == sub {
            return true;
        }
        match term {
            Term::Var(_) => false,
            Term::App(id) => {
                if self.is_ground(Term::App(id)) && !self.is_ground(sub) {
                    return false;
                }
                self.args(id).iter().any(|&arg| self.contains(arg, sub))
            }
        }
    }

    /// Build a new term with every occurrence of `from` replaced by `to`
    pub fn replace(&mut self, term: Term, from: Term, to: Term) -> Term {
        let mut memo = HashMap::new();
        self.replace_memo(term, from, to, &mut memo)
    }

    fn replace_memo(
        &mut self,
        term: Term,
        from: Term,
        to: Term,
        memo: &mut HashMap<Term, Term>,
    ) -> Term {
        if term == from {
            return to;
        }
        if let Some(&cached) = memo.get(&term) {
            return cached;
        }
        let result = match term {
            Term::Var(_) => term,
            Term::App(id) => {
                if !self.contains(term, from) {
                    term
                } else {
                    let functor = self.functor(id);
                    let sort = self.nodes[id.0 as usize].sort;
                    let args: Vec<Term> = self
                        .args(id)
                        .to_vec()
                        .into_iter()
                        .map(|arg| self.replace_memo(arg, from, to, memo))
                        .collect();
                    self.intern(functor, args, sort)
                }
            }
        };
        memo.insert(term, result);
        result
    }

    /// Number of interned application nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Iterator over variable occurrences of a term
pub struct VarIter<'a> {
    bank: &'a TermBank,
    stack: Vec<Term>,
}

impl<'a> Iterator for VarIter<'a> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        while let Some(term) = self.stack.pop() {
            match term {
                Term::Var(v) => return Some(v),
                Term::App(id) => {
                    // Ground subtrees contain no variables
                    if !self.bank.is_ground(term) {
                        self.stack.extend(self.bank.args(id).iter().rev());
                    }
                }
            }
        }
        None
    }
}

/// Depth-first iterator over non-variable subterms
pub struct SubtermIter<'a> {
    bank: &'a TermBank,
    stack: Vec<Term>,
    expand: Option<TermId>,
}

impl<'a> SubtermIter<'a> {
    /// Do not descend into the subtree of the most recently yielded term
    pub fn skip_subtree(&mut self) {
        self.expand = None;
    }
}

impl<'a> Iterator for SubtermIter<'a> {
    type Item = Term;

    fn next(&mut self) -> Option<Term> {
        if let Some(id) = self.expand.take() {
            self.stack.extend(self.bank.args(id).iter().rev());
        }
        while let Some(term) = self.stack.pop() {
            if let Term::App(id) = term {
                self.expand = Some(id);
                return Some(term);
            }
        }
        None
    }
}

// === Display ===

/// Display wrapper resolving symbol names through a signature
pub struct TermDisplay<'a> {
    pub(crate) bank: &'a TermBank,
    pub(crate) signature: &'a super::signature::Signature,
    pub(crate) term: Term,
}

impl<'a> fmt::Display for TermDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.term {
            Term::Var(v) => write!(f, "X{}", v),
            Term::App(id) => {
                write!(f, "{}", self.signature.function_name(self.bank.functor(id)))?;
                let args = self.bank.args(id);
                if !args.is_empty() {
                    write!(f, "(")?;
                    for (i, &arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(
                            f,
                            "{}",
                            TermDisplay {
                                bank: self.bank,
                                signature: self.signature,
                                term: arg
                            }
                        )?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}
