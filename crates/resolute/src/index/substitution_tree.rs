//! Substitution-tree indexing.
//!
//! A forest keyed at the root by literal header or term functor. Internal
//! nodes carry a designated special variable; edges are labeled with shallow
//! patterns (a functor applied to fresh special variables, or a normalized
//! ordinary variable). Entries with a common prefix share the corresponding
//! path, so N equal-prefixed keys cost far less than N full walks.
//!
//! Retrieval is a backtracking search driven by a `RobSubstitution`: the
//! query's arguments seed the special variables, and each edge is solved
//! against the current binding of the node's special variable under the
//! bind policy of the retrieval mode (unification, generalization,
//! instance, variant).

use crate::logic::literal::LitHeader;
use crate::logic::signature::FunctionId;
use crate::logic::term::{Term, TermBank};
use crate::unify::{Bank, BindPolicy, RobSubstitution, TermSpec, VarSpec};
use std::collections::{BTreeMap, HashMap};

/// Root of one tree in the forest
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RootKey {
    Literal(LitHeader),
    Term(FunctionId),
}

/// What a retrieval should enumerate, relative to the query
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Entries unifiable with the query
    Unifiers,
    /// Entries that generalize the query (entry matches onto query)
    Generalizations,
    /// Entries that are instances of the query (query matches onto entry)
    Instances,
    /// Entries equal to the query up to variable renaming
    Variants,
}

impl RetrievalMode {
    fn policy(self) -> BindPolicy {
        match self {
            RetrievalMode::Unifiers => BindPolicy::Both,
            RetrievalMode::Generalizations => BindPolicy::Only(Bank::NORM),
            RetrievalMode::Instances => BindPolicy::Only(Bank::QUERY),
            RetrievalMode::Variants => BindPolicy::Renaming,
        }
    }
}

/// What a leaf record points at: the clause, the literal within it, and for
/// term trees the indexed subterm.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Index of the owning clause in the clause arena
    pub clause: usize,
    /// The indexed literal
    pub literal: crate::logic::literal::Literal,
    /// Position of the literal within the clause
    pub lit_pos: usize,
    /// The indexed term, for term trees
    pub term: Option<Term>,
}

/// One record stored at a leaf
#[derive(Debug, Clone)]
pub struct LeafData {
    pub entry: Entry,
    /// Normalized variable index -> original variable id
    backmap: Vec<u32>,
}

/// A successful retrieval: the leaf record plus a snapshot of the unifier.
///
/// The substitution binds query-bank variables of the query and result-bank
/// variables of the entry's original clause; applying it materializes
/// conclusions. Results are frozen: the tree may not be mutated while they
/// are alive, which the borrow on the snapshot makes impossible to violate.
#[derive(Debug, Clone)]
pub struct Retrieved {
    pub entry: Entry,
    pub subst: RobSubstitution,
}

/// Top symbol of an edge pattern
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum EdgeKey {
    Sym(FunctionId),
    Var(u32),
}

#[derive(Debug, Clone)]
struct Edge {
    key: EdgeKey,
    /// Interned pattern: `f(sv_i, ...)` read in the Special bank, or a
    /// normalized variable read in the Norm bank
    pattern: Term,
    /// Special variables standing for the pattern's argument positions
    arg_svars: Vec<u32>,
    child: usize,
}

/// Child collection: a plain vector until it grows, then an ordered map.
/// Both iterate deterministically.
#[derive(Debug)]
enum Children {
    Few(Vec<Edge>),
    Many(BTreeMap<EdgeKey, Edge>),
}

const CHILDREN_SWITCH_THRESHOLD: usize = 8;

impl Children {
    fn new() -> Self {
        Children::Few(Vec::new())
    }

    fn get(&self, key: EdgeKey) -> Option<&Edge> {
        match self {
            Children::Few(edges) => edges.iter().find(|e| e.key == key),
            Children::Many(map) => map.get(&key),
        }
    }

    fn insert(&mut self, edge: Edge) {
        match self {
            Children::Few(edges) => edges.push(edge),
            Children::Many(map) => {
                map.insert(edge.key, edge);
            }
        }
    }

    fn remove(&mut self, key: EdgeKey) {
        match self {
            Children::Few(edges) => edges.retain(|e| e.key != key),
            Children::Many(map) => {
                map.remove(&key);
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Children::Few(edges) => edges.len(),
            Children::Many(map) => map.len(),
        }
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter(&self) -> ChildIter<'_> {
        match self {
            Children::Few(edges) => ChildIter::Few(edges.iter()),
            Children::Many(map) => ChildIter::Many(map.values()),
        }
    }

    /// Switch to the map representation once the vector gets large
    fn ensure_efficient(&mut self) {
        if let Children::Few(edges) = self {
            if edges.len() > CHILDREN_SWITCH_THRESHOLD {
                let map = edges.drain(..).map(|e| (e.key, e)).collect();
                *self = Children::Many(map);
            }
        }
    }
}

enum ChildIter<'a> {
    Few(std::slice::Iter<'a, Edge>),
    Many(std::collections::btree_map::Values<'a, EdgeKey, Edge>),
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = &'a Edge;

    fn next(&mut self) -> Option<&'a Edge> {
        match self {
            ChildIter::Few(it) => it.next(),
            ChildIter::Many(it) => it.next(),
        }
    }
}

#[derive(Debug)]
enum NodeKind {
    Inner(Children),
    Leaf(Vec<LeafData>),
}

#[derive(Debug)]
struct Node {
    /// Designated special variable this node resolves (unused for leaves)
    svar: u32,
    kind: NodeKind,
}

/// The substitution-tree forest
#[derive(Debug, Default)]
pub struct SubstitutionTree {
    nodes: Vec<Node>,
    roots: HashMap<RootKey, usize>,
    entry_count: usize,
}

impl SubstitutionTree {
    pub fn new() -> Self {
        SubstitutionTree::default()
    }

    /// Total number of stored leaf records
    pub fn len(&self) -> usize {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    fn alloc(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Canonically rename the key's variables to 0,1,... in first-occurrence
    /// order. Returns the renamed terms and the inverse map.
    fn normalize(args: &[Term], terms: &mut TermBank) -> (Vec<Term>, Vec<u32>) {
        let mut map: HashMap<u32, u32> = HashMap::new();
        let mut backmap: Vec<u32> = Vec::new();
        let norm = args
            .iter()
            .map(|&arg| Self::normalize_term(arg, &mut map, &mut backmap, terms))
            .collect();
        (norm, backmap)
    }

    fn normalize_term(
        term: Term,
        map: &mut HashMap<u32, u32>,
        backmap: &mut Vec<u32>,
        terms: &mut TermBank,
    ) -> Term {
        match term {
            Term::Var(v) => {
                let n = *map.entry(v).or_insert_with(|| {
                    backmap.push(v);
                    (backmap.len() - 1) as u32
                });
                Term::Var(n)
            }
            Term::App(id) => {
                if terms.is_ground(term) {
                    return term;
                }
                let functor = terms.functor(id);
                let sort = terms.sort_of(term);
                let args: Vec<Term> = terms.args(id).to_vec();
                let norm_args = args
                    .into_iter()
                    .map(|a| Self::normalize_term(a, map, backmap, terms))
                    .collect();
                terms.intern(functor, norm_args, sort)
            }
        }
    }

    /// Insert a key under a root, storing the entry at the leaf
    pub fn insert(&mut self, root: RootKey, key_args: &[Term], entry: Entry, terms: &mut TermBank) {
        let (norm_args, backmap) = Self::normalize(key_args, terms);

        // Pending bindings: special variable -> normalized term
        let mut pending: BTreeMap<u32, Term> = norm_args
            .iter()
            .enumerate()
            .map(|(i, &t)| (i as u32, t))
            .collect();
        let mut next_svar = norm_args.len() as u32;

        let mut current = match self.roots.get(&root) {
            Some(&idx) => idx,
            None => {
                let kind = if pending.is_empty() {
                    NodeKind::Leaf(Vec::new())
                } else {
                    NodeKind::Inner(Children::new())
                };
                let svar = pending.keys().next().copied().unwrap_or(u32::MAX);
                let idx = self.alloc(Node { svar, kind });
                self.roots.insert(root, idx);
                idx
            }
        };

        loop {
            if pending.is_empty() {
                match &mut self.nodes[current].kind {
                    NodeKind::Leaf(entries) => {
                        entries.push(LeafData { entry, backmap });
                        self.entry_count += 1;
                        return;
                    }
                    NodeKind::Inner(_) => unreachable!("key exhausted at inner node"),
                }
            }

            let svar = self.nodes[current].svar;
            debug_assert_eq!(Some(&svar), pending.keys().next());
            let binding = pending.remove(&svar).expect("pending binding for node svar");

            let key = match binding {
                Term::Var(v) => EdgeKey::Var(v),
                Term::App(id) => EdgeKey::Sym(terms.functor(id)),
            };

            let children = match &mut self.nodes[current].kind {
                NodeKind::Inner(children) => children,
                NodeKind::Leaf(_) => unreachable!("pending bindings at leaf node"),
            };

            if let Some(edge) = children.get(key) {
                // Shared prefix: reuse the edge's argument special variables
                let arg_svars = edge.arg_svars.clone();
                let child = edge.child;
                if let Term::App(id) = binding {
                    for (&sv, &arg) in arg_svars.iter().zip(terms.args(id).iter()) {
                        pending.insert(sv, arg);
                        next_svar = next_svar.max(sv + 1);
                    }
                }
                current = child;
            } else {
                // New branch: allocate argument special variables and the
                // pattern term, then create the child
                let (pattern, arg_svars) = match binding {
                    Term::Var(v) => (Term::Var(v), Vec::new()),
                    Term::App(id) => {
                        let functor = terms.functor(id);
                        let sort = terms.sort_of(binding);
                        let args: Vec<Term> = terms.args(id).to_vec();
                        let svars: Vec<u32> =
                            (0..args.len()).map(|i| next_svar + i as u32).collect();
                        next_svar += args.len() as u32;
                        for (&sv, &arg) in svars.iter().zip(args.iter()) {
                            pending.insert(sv, arg);
                        }
                        let pattern_args = svars.iter().map(|&sv| Term::Var(sv)).collect();
                        (terms.intern(functor, pattern_args, sort), svars)
                    }
                };

                let child_kind = if pending.is_empty() {
                    NodeKind::Leaf(Vec::new())
                } else {
                    NodeKind::Inner(Children::new())
                };
                let child_svar = pending.keys().next().copied().unwrap_or(u32::MAX);
                let child = self.alloc(Node {
                    svar: child_svar,
                    kind: child_kind,
                });

                let children = match &mut self.nodes[current].kind {
                    NodeKind::Inner(children) => children,
                    NodeKind::Leaf(_) => unreachable!(),
                };
                children.insert(Edge {
                    key,
                    pattern,
                    arg_svars,
                    child,
                });
                children.ensure_efficient();
                current = child;
            }
        }
    }

    /// Remove a previously inserted record; prunes emptied subtrees
    pub fn remove(
        &mut self,
        root: RootKey,
        key_args: &[Term],
        entry: Entry,
        terms: &mut TermBank,
    ) -> bool {
        let (norm_args, _) = Self::normalize(key_args, terms);

        let root_idx = match self.roots.get(&root) {
            Some(&idx) => idx,
            None => return false,
        };

        let mut pending: BTreeMap<u32, Term> = norm_args
            .iter()
            .enumerate()
            .map(|(i, &t)| (i as u32, t))
            .collect();

        // Walk down, recording the path of (node, edge key) taken
        let mut path: Vec<(usize, EdgeKey)> = Vec::new();
        let mut current = root_idx;

        loop {
            if pending.is_empty() {
                break;
            }
            let svar = self.nodes[current].svar;
            let binding = match pending.remove(&svar) {
                Some(b) => b,
                None => return false,
            };
            let key = match binding {
                Term::Var(v) => EdgeKey::Var(v),
                Term::App(id) => EdgeKey::Sym(terms.functor(id)),
            };
            let children = match &self.nodes[current].kind {
                NodeKind::Inner(children) => children,
                NodeKind::Leaf(_) => return false,
            };
            let edge = match children.get(key) {
                Some(edge) => edge,
                None => return false,
            };
            if let Term::App(id) = binding {
                for (&sv, &arg) in edge.arg_svars.iter().zip(terms.args(id).iter()) {
                    pending.insert(sv, arg);
                }
            }
            path.push((current, key));
            current = edge.child;
        }

        let removed = match &mut self.nodes[current].kind {
            NodeKind::Leaf(entries) => {
                let before = entries.len();
                entries.retain(|e| e.entry != entry);
                before - entries.len()
            }
            NodeKind::Inner(_) => 0,
        };
        if removed == 0 {
            return false;
        }
        self.entry_count -= removed;

        // Prune emptied nodes bottom-up
        let mut doomed = match &self.nodes[current].kind {
            NodeKind::Leaf(entries) => entries.is_empty(),
            NodeKind::Inner(children) => children.is_empty(),
        };
        while doomed {
            match path.pop() {
                Some((parent, key)) => {
                    if let NodeKind::Inner(children) = &mut self.nodes[parent].kind {
                        children.remove(key);
                        doomed = children.is_empty();
                    }
                }
                None => {
                    self.roots.remove(&root);
                    return true;
                }
            }
        }
        true
    }

    /// Enumerate entries related to the query per the retrieval mode.
    ///
    /// Each result carries a substitution snapshot binding query-bank
    /// variables of `query_args` and result-bank variables of the entry's
    /// original clause.
    pub fn retrieve(
        &self,
        root: RootKey,
        query_args: &[Term],
        mode: RetrievalMode,
        terms: &TermBank,
    ) -> Vec<Retrieved> {
        let mut results = Vec::new();
        let root_idx = match self.roots.get(&root) {
            Some(&idx) => idx,
            None => return results,
        };

        let mut subst = RobSubstitution::new();
        for (i, &arg) in query_args.iter().enumerate() {
            subst.alias(
                VarSpec { var: i as u32, bank: Bank::SPECIAL },
                TermSpec::new(arg, Bank::QUERY),
            );
        }

        self.search(root_idx, &mut subst, mode.policy(), terms, &mut results);
        results
    }

    fn search(
        &self,
        node_idx: usize,
        subst: &mut RobSubstitution,
        policy: BindPolicy,
        terms: &TermBank,
        results: &mut Vec<Retrieved>,
    ) {
        match &self.nodes[node_idx].kind {
            NodeKind::Leaf(entries) => {
                for leaf in entries {
                    let mark = subst.mark();
                    // Tie normalized variables to the entry's original
                    // variables so callers can apply the substitution to the
                    // owning clause directly. A bound normalized variable is
                    // reached from the original; an unbound one (instance
                    // and variant retrieval leave the entry side rigid)
                    // resolves to the original instead.
                    for (norm, &orig) in leaf.backmap.iter().enumerate() {
                        let norm_spec = VarSpec { var: norm as u32, bank: Bank::NORM };
                        let orig_spec = VarSpec { var: orig, bank: Bank::RESULT };
                        if subst.is_bound(norm_spec) {
                            subst.alias(
                                orig_spec,
                                TermSpec::new(Term::Var(norm as u32), Bank::NORM),
                            );
                        } else {
                            subst.alias(norm_spec, TermSpec::new(Term::Var(orig), Bank::RESULT));
                        }
                    }
                    results.push(Retrieved {
                        entry: leaf.entry,
                        subst: subst.clone(),
                    });
                    subst.rollback(mark);
                }
            }
            NodeKind::Inner(children) => {
                let svar = self.nodes[node_idx].svar;
                let spec = VarSpec { var: svar, bank: Bank::SPECIAL };
                let value = subst
                    .lookup(spec)
                    .unwrap_or(TermSpec::new(Term::Var(svar), Bank::SPECIAL));

                for edge in children.iter() {
                    let pattern = match edge.key {
                        EdgeKey::Sym(_) => TermSpec::new(edge.pattern, Bank::SPECIAL),
                        EdgeKey::Var(_) => TermSpec::new(edge.pattern, Bank::NORM),
                    };
                    let mark = subst.mark();
                    if subst.unify_with(pattern, value, policy, terms) {
                        self.search(edge.child, subst, policy, terms, results);
                    }
                    subst.rollback(mark);
                }
            }
        }
    }
}
