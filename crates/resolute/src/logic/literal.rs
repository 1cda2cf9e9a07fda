//! Hash-consed literals.
//!
//! A literal is a predicate application with a polarity bit. Equality
//! literals additionally carry their argument sort. Like terms, literals are
//! interned: structurally equal literals share one handle.

use super::signature::{PredicateId, Signature};
use super::sorts::SortId;
use super::term::{Term, TermBank, TermDisplay};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Handle of an interned literal
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal(pub(crate) u32);

impl Literal {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Functor and polarity of a literal; the key of the literal index forest.
///
/// `complementary` gives the header a resolution partner must have.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LitHeader {
    pub predicate: PredicateId,
    pub polarity: bool,
}

impl LitHeader {
    pub fn complementary(self) -> LitHeader {
        LitHeader {
            predicate: self.predicate,
            polarity: !self.polarity,
        }
    }
}

#[derive(Debug, Clone)]
struct LiteralNode {
    predicate: PredicateId,
    polarity: bool,
    args: Vec<Term>,
    /// Argument sort for equality literals; DEFAULT otherwise
    sort: SortId,
    weight: u32,
    ground: bool,
}

type LiteralKey = (PredicateId, bool, Vec<Term>, SortId);

/// Sharing structure for literals
#[derive(Debug, Clone, Default)]
pub struct LiteralBank {
    nodes: Vec<LiteralNode>,
    lookup: HashMap<LiteralKey, u32>,
}

impl LiteralBank {
    pub fn new() -> Self {
        LiteralBank::default()
    }

    /// Intern a literal; idempotent by (predicate, polarity, args, sort)
    pub fn intern(
        &mut self,
        predicate: PredicateId,
        polarity: bool,
        args: Vec<Term>,
        sort: SortId,
        terms: &TermBank,
    ) -> Literal {
        let key = (predicate, polarity, args.clone(), sort);
        if let Some(&id) = self.lookup.get(&key) {
            return Literal(id);
        }
        let mut weight: u32 = 1;
        let mut ground = true;
        for &arg in &args {
            weight = weight.saturating_add(terms.weight(arg));
            ground &= terms.is_ground(arg);
        }
        let id = self.nodes.len() as u32;
        self.nodes.push(LiteralNode {
            predicate,
            polarity,
            args,
            sort,
            weight,
            ground,
        });
        self.lookup.insert(key, id);
        Literal(id)
    }

    /// Intern an equality literal with its argument sort
    pub fn equality(
        &mut self,
        polarity: bool,
        lhs: Term,
        rhs: Term,
        sort: SortId,
        terms: &TermBank,
    ) -> Literal {
        self.intern(PredicateId::EQUALITY, polarity, vec![lhs, rhs], sort, terms)
    }

    /// Same atom, flipped polarity; the sort tag is preserved
    pub fn complementary(&mut self, lit: Literal, terms: &TermBank) -> Literal {
        let node = &self.nodes[lit.0 as usize];
        let (predicate, polarity, args, sort) =
            (node.predicate, !node.polarity, node.args.clone(), node.sort);
        self.intern(predicate, polarity, args, sort, terms)
    }

    pub fn predicate(&self, lit: Literal) -> PredicateId {
        self.nodes[lit.0 as usize].predicate
    }

    pub fn polarity(&self, lit: Literal) -> bool {
        self.nodes[lit.0 as usize].polarity
    }

    pub fn args(&self, lit: Literal) -> &[Term] {
        &self.nodes[lit.0 as usize].args
    }

    pub fn header(&self, lit: Literal) -> LitHeader {
        let node = &self.nodes[lit.0 as usize];
        LitHeader {
            predicate: node.predicate,
            polarity: node.polarity,
        }
    }

    pub fn is_equality(&self, lit: Literal) -> bool {
        self.nodes[lit.0 as usize].predicate == PredicateId::EQUALITY
    }

    pub fn is_positive_equality(&self, lit: Literal) -> bool {
        let node = &self.nodes[lit.0 as usize];
        node.predicate == PredicateId::EQUALITY && node.polarity
    }

    /// Argument sort of an equality literal (DEFAULT for other predicates)
    pub fn eq_sort(&self, lit: Literal) -> SortId {
        self.nodes[lit.0 as usize].sort
    }

    /// Cached literal weight (predicate symbol plus argument weights). O(1).
    pub fn weight(&self, lit: Literal) -> u32 {
        self.nodes[lit.0 as usize].weight
    }

    /// Cached groundness. O(1).
    pub fn is_ground(&self, lit: Literal) -> bool {
        self.nodes[lit.0 as usize].ground
    }

    /// Are the two literals the same atom with opposite polarity?
    pub fn are_complementary(&self, a: Literal, b: Literal) -> bool {
        let na = &self.nodes[a.0 as usize];
        let nb = &self.nodes[b.0 as usize];
        na.polarity != nb.polarity
            && na.predicate == nb.predicate
            && na.sort == nb.sort
            && na.args == nb.args
    }

    /// Is this literal of the shape t = t?
    pub fn is_reflexive_equality(&self, lit: Literal) -> bool {
        let node = &self.nodes[lit.0 as usize];
        node.predicate == PredicateId::EQUALITY
            && node.polarity
            && node.args.len() == 2
            && node.args[0] == node.args[1]
    }

    /// Number of interned literals
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Display wrapper resolving names through a signature
pub struct LiteralDisplay<'a> {
    pub(crate) bank: &'a LiteralBank,
    pub(crate) terms: &'a TermBank,
    pub(crate) signature: &'a Signature,
    pub(crate) literal: Literal,
}

impl<'a> fmt::Display for LiteralDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit = self.literal;
        let args = self.bank.args(lit);
        let term = |t: Term| TermDisplay {
            bank: self.terms,
            signature: self.signature,
            term: t,
        };
        if self.bank.is_equality(lit) && args.len() == 2 {
            let op = if self.bank.polarity(lit) { "=" } else { "!=" };
            return write!(f, "{} {} {}", term(args[0]), op, term(args[1]));
        }
        if !self.bank.polarity(lit) {
            write!(f, "~")?;
        }
        write!(
            f,
            "{}",
            self.signature.predicate_name(self.bank.predicate(lit))
        )?;
        if !args.is_empty() {
            write!(f, "(")?;
            for (i, &arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", term(arg))?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
