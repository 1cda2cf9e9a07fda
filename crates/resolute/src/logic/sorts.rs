//! Sort registry.
//!
//! Sorts are small integer identifiers. The built-in sorts are pre-interned
//! at construction; user sorts (including array and algebraic sorts produced
//! by a preprocessor) are added through `intern`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// ID for an interned sort
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SortId(pub(crate) u32);

impl SortId {
    /// The default (uninterpreted individual) sort
    pub const DEFAULT: SortId = SortId(0);
    /// The boolean sort
    pub const BOOL: SortId = SortId(1);
    /// The integer sort
    pub const INTEGER: SortId = SortId(2);
    /// The rational sort
    pub const RATIONAL: SortId = SortId(3);
    /// The real sort
    pub const REAL: SortId = SortId(4);

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Registry of sorts, with the built-ins pre-interned
#[derive(Debug, Clone)]
pub struct Sorts {
    names: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl Sorts {
    pub fn new() -> Self {
        let mut sorts = Sorts {
            names: Vec::new(),
            lookup: HashMap::new(),
        };
        // Order must match the SortId constants
        for builtin in ["$i", "$o", "$int", "$rat", "$real"] {
            sorts.intern(builtin);
        }
        sorts
    }

    /// Intern a sort name, returning its ID (get-or-create)
    pub fn intern(&mut self, name: &str) -> SortId {
        if let Some(&id) = self.lookup.get(name) {
            return SortId(id);
        }
        let id = self.names.len() as u32;
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), id);
        SortId(id)
    }

    /// Resolve a sort ID to its name
    pub fn resolve(&self, id: SortId) -> &str {
        &self.names[id.0 as usize]
    }

    /// Get the ID for an already-interned sort
    pub fn get(&self, name: &str) -> Option<SortId> {
        self.lookup.get(name).map(|&id| SortId(id))
    }

    /// Number of interned sorts
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for Sorts {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_preinterned() {
        let sorts = Sorts::new();
        assert_eq!(sorts.get("$i"), Some(SortId::DEFAULT));
        assert_eq!(sorts.get("$o"), Some(SortId::BOOL));
        assert_eq!(sorts.get("$int"), Some(SortId::INTEGER));
        assert_eq!(sorts.get("$rat"), Some(SortId::RATIONAL));
        assert_eq!(sorts.get("$real"), Some(SortId::REAL));
        assert_eq!(sorts.len(), 5);
    }

    #[test]
    fn test_user_sort_interning() {
        let mut sorts = Sorts::new();
        let list = sorts.intern("list");
        let list2 = sorts.intern("list");
        assert_eq!(list, list2);
        assert_eq!(sorts.resolve(list), "list");
        assert!(list > SortId::REAL);
    }
}
