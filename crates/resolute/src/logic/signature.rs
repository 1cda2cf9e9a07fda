//! Symbol signature: interned function and predicate symbols.
//!
//! Every symbol carries its arity, typed signature, and a set of flags used
//! by heuristics and statistics. Interning is idempotent by (name, arity) and
//! append-only: symbols are never deleted during a run.

use super::sorts::SortId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// ID for an interned function symbol
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub(crate) u32);

/// ID for an interned predicate symbol
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredicateId(pub(crate) u32);

impl FunctionId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl PredicateId {
    /// The distinguished equality predicate, pre-interned at construction
    pub const EQUALITY: PredicateId = PredicateId(0);

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Typed signature of a symbol: argument sorts and result sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorType {
    pub args: Vec<SortId>,
    pub result: SortId,
}

impl OperatorType {
    /// All arguments and the result share one sort
    pub fn uniform(arity: usize, sort: SortId) -> Self {
        OperatorType {
            args: vec![sort; arity],
            result: sort,
        }
    }

    /// A predicate type: boolean result
    pub fn predicate(args: Vec<SortId>) -> Self {
        OperatorType {
            args,
            result: SortId::BOOL,
        }
    }
}

/// Per-symbol flags maintained by the prover and its collaborators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolFlags {
    /// Symbol has an interpretation in a theory
    pub interpreted: bool,
    /// Symbol stands proxy for equality (produced by an equality-proxy transform)
    pub equality_proxy: bool,
    /// Symbol is a term-algebra constructor
    pub term_algebra: bool,
    /// Symbol was introduced by preprocessing (Skolem, definition, fresh)
    pub introduced: bool,
    /// Symbol occurs in the goal
    pub in_goal: bool,
    /// Symbol occurs in a unit clause
    pub in_unit: bool,
}

#[derive(Debug, Clone)]
struct SymbolEntry {
    name: String,
    arity: u8,
    typ: OperatorType,
    flags: SymbolFlags,
    usages: u32,
}

/// The shared signature of a proving run.
///
/// Equality is pre-interned as predicate 0; equality literals additionally
/// carry their argument sort, so one predicate serves all sorts.
#[derive(Debug, Clone)]
pub struct Signature {
    functions: Vec<SymbolEntry>,
    fn_lookup: HashMap<(String, u8), u32>,
    predicates: Vec<SymbolEntry>,
    pred_lookup: HashMap<(String, u8), u32>,
    fresh_counter: u32,
}

impl Signature {
    pub fn new() -> Self {
        let mut sig = Signature {
            functions: Vec::new(),
            fn_lookup: HashMap::new(),
            predicates: Vec::new(),
            pred_lookup: HashMap::new(),
            fresh_counter: 0,
        };
        let eq = sig.intern_predicate("=", 2);
        debug_assert_eq!(eq, PredicateId::EQUALITY);
        sig.predicates[0].flags.interpreted = true;
        sig
    }

    /// Intern a function symbol, idempotent by (name, arity).
    ///
    /// The sort is recorded uniformly over arguments and result on first
    /// intern; later calls with the same key ignore it.
    pub fn intern_function(&mut self, name: &str, arity: u8, sort: SortId) -> FunctionId {
        let key = (name.to_string(), arity);
        if let Some(&id) = self.fn_lookup.get(&key) {
            return FunctionId(id);
        }
        let id = self.functions.len() as u32;
        self.functions.push(SymbolEntry {
            name: name.to_string(),
            arity,
            typ: OperatorType::uniform(arity as usize, sort),
            flags: SymbolFlags::default(),
            usages: 0,
        });
        self.fn_lookup.insert(key, id);
        FunctionId(id)
    }

    /// Intern a function symbol with an explicit operator type
    pub fn intern_function_typed(&mut self, name: &str, typ: OperatorType) -> FunctionId {
        let arity = typ.args.len() as u8;
        let id = self.intern_function(name, arity, typ.result);
        self.functions[id.0 as usize].typ = typ;
        id
    }

    /// Intern a predicate symbol, idempotent by (name, arity)
    pub fn intern_predicate(&mut self, name: &str, arity: u8) -> PredicateId {
        let key = (name.to_string(), arity);
        if let Some(&id) = self.pred_lookup.get(&key) {
            return PredicateId(id);
        }
        let id = self.predicates.len() as u32;
        self.predicates.push(SymbolEntry {
            name: name.to_string(),
            arity,
            typ: OperatorType::predicate(vec![SortId::DEFAULT; arity as usize]),
            flags: SymbolFlags::default(),
            usages: 0,
        });
        self.pred_lookup.insert(key, id);
        PredicateId(id)
    }

    /// Reserve a globally unique function name with the requested prefix
    pub fn fresh_function(&mut self, prefix: &str, arity: u8, sort: SortId) -> FunctionId {
        loop {
            let name = format!("{}{}", prefix, self.fresh_counter);
            self.fresh_counter += 1;
            if !self.fn_lookup.contains_key(&(name.clone(), arity)) {
                let id = self.intern_function(&name, arity, sort);
                self.functions[id.0 as usize].flags.introduced = true;
                return id;
            }
        }
    }

    /// Reserve a globally unique predicate name with the requested prefix
    pub fn fresh_predicate(&mut self, prefix: &str, arity: u8) -> PredicateId {
        loop {
            let name = format!("{}{}", prefix, self.fresh_counter);
            self.fresh_counter += 1;
            if !self.pred_lookup.contains_key(&(name.clone(), arity)) {
                let id = self.intern_predicate(&name, arity);
                self.predicates[id.0 as usize].flags.introduced = true;
                return id;
            }
        }
    }

    // === Accessors ===

    pub fn function_name(&self, id: FunctionId) -> &str {
        &self.functions[id.0 as usize].name
    }

    pub fn function_arity(&self, id: FunctionId) -> u8 {
        self.functions[id.0 as usize].arity
    }

    pub fn function_type(&self, id: FunctionId) -> &OperatorType {
        &self.functions[id.0 as usize].typ
    }

    pub fn function_flags(&self, id: FunctionId) -> SymbolFlags {
        self.functions[id.0 as usize].flags
    }

    pub fn function_flags_mut(&mut self, id: FunctionId) -> &mut SymbolFlags {
        &mut self.functions[id.0 as usize].flags
    }

    pub fn predicate_name(&self, id: PredicateId) -> &str {
        &self.predicates[id.0 as usize].name
    }

    pub fn predicate_arity(&self, id: PredicateId) -> u8 {
        self.predicates[id.0 as usize].arity
    }

    pub fn predicate_flags(&self, id: PredicateId) -> SymbolFlags {
        self.predicates[id.0 as usize].flags
    }

    pub fn predicate_flags_mut(&mut self, id: PredicateId) -> &mut SymbolFlags {
        &mut self.predicates[id.0 as usize].flags
    }

    pub fn get_function(&self, name: &str, arity: u8) -> Option<FunctionId> {
        self.fn_lookup
            .get(&(name.to_string(), arity))
            .map(|&id| FunctionId(id))
    }

    pub fn get_predicate(&self, name: &str, arity: u8) -> Option<PredicateId> {
        self.pred_lookup
            .get(&(name.to_string(), arity))
            .map(|&id| PredicateId(id))
    }

    /// Bump the usage counter of a function symbol (saturating)
    pub fn note_function_use(&mut self, id: FunctionId) {
        let entry = &mut self.functions[id.0 as usize];
        entry.usages = entry.usages.saturating_add(1);
    }

    /// Bump the usage counter of a predicate symbol (saturating)
    pub fn note_predicate_use(&mut self, id: PredicateId) {
        let entry = &mut self.predicates[id.0 as usize];
        entry.usages = entry.usages.saturating_add(1);
    }

    pub fn function_usages(&self, id: FunctionId) -> u32 {
        self.functions[id.0 as usize].usages
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::new()
    }
}

// === Display implementations for debugging ===

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

impl fmt::Display for PredicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

// === Serde implementations ===
// IDs serialize as bare u32; name resolution is a presentation concern.

impl Serialize for FunctionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FunctionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(FunctionId)
    }
}

impl Serialize for PredicateId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PredicateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(PredicateId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_preinterned() {
        let sig = Signature::new();
        assert_eq!(sig.get_predicate("=", 2), Some(PredicateId::EQUALITY));
        assert_eq!(sig.predicate_arity(PredicateId::EQUALITY), 2);
        assert!(sig.predicate_flags(PredicateId::EQUALITY).interpreted);
    }

    #[test]
    fn test_function_interning_idempotent() {
        let mut sig = Signature::new();
        let f1 = sig.intern_function("f", 2, SortId::DEFAULT);
        let f2 = sig.intern_function("f", 2, SortId::DEFAULT);
        let g = sig.intern_function("g", 2, SortId::DEFAULT);
        assert_eq!(f1, f2);
        assert_ne!(f1, g);
        assert_eq!(sig.function_name(f1), "f");
        assert_eq!(sig.function_arity(f1), 2);
    }

    #[test]
    fn test_same_name_different_arity() {
        let mut sig = Signature::new();
        let f1 = sig.intern_function("f", 1, SortId::DEFAULT);
        let f2 = sig.intern_function("f", 2, SortId::DEFAULT);
        assert_ne!(f1, f2);
    }

    #[test]
    fn test_fresh_function_unique() {
        let mut sig = Signature::new();
        sig.intern_function("sk0", 0, SortId::DEFAULT);
        let fresh = sig.fresh_function("sk", 0, SortId::DEFAULT);
        assert_ne!(sig.function_name(fresh), "sk0");
        assert!(sig.function_flags(fresh).introduced);
    }

    #[test]
    fn test_usage_counter() {
        let mut sig = Signature::new();
        let f = sig.intern_function("f", 1, SortId::DEFAULT);
        assert_eq!(sig.function_usages(f), 0);
        sig.note_function_use(f);
        sig.note_function_use(f);
        assert_eq!(sig.function_usages(f), 2);
    }
}
