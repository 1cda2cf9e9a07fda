//! Global subsumption against an external SAT solver.
//!
//! Every clause is grounded (variables collapse to one fresh constant) and
//! its propositional abstraction accumulates in the solver. A clause whose
//! grounding has a proper subset already unsatisfiable together with the
//! accumulated abstraction is replaced by that subset. An Unknown answer
//! from the solver skips the clause and nothing else; soundness never
//! depends on the solver saying Unsat wrongly being impossible only for
//! Unsat answers we act on.

use crate::index::IndexRegistry;
use crate::logic::context::Context;
use crate::logic::literal::Literal;
use crate::logic::ordering::Kbo;
use crate::logic::sorts::SortId;
use crate::logic::term::Term;
use crate::saturation::state::{SaturationState, Simplification, SimplifyingInference};
use std::collections::HashMap;

/// Answer from the SAT collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatResult {
    Satisfiable,
    Unsatisfiable,
    Unknown,
}

/// External SAT backend contract.
///
/// Clauses and assumptions use the DIMACS convention: positive integers are
/// variables, negation is sign flip, zero never appears.
pub trait SatSolver {
    fn add_clause(&mut self, clause: &[i32]);

    /// Solve the accumulated clauses under unit assumptions
    fn solve(&mut self, assumptions: &[i32]) -> SatResult;

    /// After Unsatisfiable: a subset of the assumptions sufficient for the
    /// conflict
    fn unsat_core(&self) -> Vec<i32>;
}

/// Bijection between ground atoms and propositional variables
#[derive(Debug, Default)]
struct PropMap {
    atoms: HashMap<Literal, i32>,
    next: i32,
}

impl PropMap {
    fn new() -> Self {
        PropMap {
            atoms: HashMap::new(),
            next: 1,
        }
    }

    /// Encode a ground literal as a signed propositional variable
    fn encode(&mut self, lit: Literal, ctx: &mut Context) -> i32 {
        let (atom, sign) = if ctx.literals.polarity(lit) {
            (lit, 1)
        } else {
            (ctx.literals.complementary(lit, &ctx.terms), -1)
        };
        let var = *self.atoms.entry(atom).or_insert_with(|| {
            let v = self.next;
            self.next += 1;
            v
        });
        sign * var
    }
}

pub struct GlobalSubsumptionRule {
    solver: Box<dyn SatSolver>,
    prop: PropMap,
    /// Fresh constant all variables are grounded to
    grounding_constant: Option<Term>,
}

impl GlobalSubsumptionRule {
    pub fn new(solver: Box<dyn SatSolver>) -> Self {
        GlobalSubsumptionRule {
            solver,
            prop: PropMap::new(),
            grounding_constant: None,
        }
    }

    fn grounding_constant(&mut self, ctx: &mut Context) -> Term {
        if let Some(gc) = self.grounding_constant {
            return gc;
        }
        let f = ctx.signature.fresh_function("gnd", 0, SortId::DEFAULT);
        let gc = ctx.term(f, vec![]);
        self.grounding_constant = Some(gc);
        gc
    }

    fn ground_term(&self, term: Term, gc: Term, ctx: &mut Context) -> Term {
        match term {
            Term::Var(_) => gc,
            Term::App(id) => {
                if ctx.terms.is_ground(term) {
                    return term;
                }
                let functor = ctx.terms.functor(id);
                let sort = ctx.terms.sort_of(term);
                let args: Vec<Term> = ctx.terms.args(id).to_vec();
                let new_args: Vec<Term> = args
                    .into_iter()
                    .map(|arg| self.ground_term(arg, gc, ctx))
                    .collect();
                ctx.terms.intern(functor, new_args, sort)
            }
        }
    }

    fn ground_literal(&self, lit: Literal, gc: Term, ctx: &mut Context) -> Literal {
        let predicate = ctx.literals.predicate(lit);
        let polarity = ctx.literals.polarity(lit);
        let sort = ctx.literals.eq_sort(lit);
        let args: Vec<Term> = ctx.literals.args(lit).to_vec();
        let new_args: Vec<Term> = args
            .into_iter()
            .map(|arg| self.ground_term(arg, gc, ctx))
            .collect();
        ctx.literals.intern(predicate, polarity, new_args, sort, &ctx.terms)
    }
}

impl SimplifyingInference for GlobalSubsumptionRule {
    fn name(&self) -> &'static str {
        "global_subsumption"
    }

    fn simplify_forward(
        &mut self,
        clause_idx: usize,
        state: &SaturationState,
        ctx: &mut Context,
        _kbo: &Kbo,
        _indices: &IndexRegistry,
    ) -> Simplification {
        let clause = &state.clauses[clause_idx];
        if clause.is_empty() {
            return Simplification::Unchanged;
        }

        let gc = self.grounding_constant(ctx);
        let encoded: Vec<i32> = clause
            .literals
            .iter()
            .map(|&lit| {
                let ground = self.ground_literal(lit, gc, ctx);
                self.prop.encode(ground, ctx)
            })
            .collect();

        let mut verdict = Simplification::Unchanged;

        // Only multi-literal clauses can shrink to a proper subset
        if clause.literals.len() >= 2 {
            let assumptions: Vec<i32> = encoded.iter().map(|&e| -e).collect();
            if self.solver.solve(&assumptions) == SatResult::Unsatisfiable {
                let core = self.solver.unsat_core();
                let kept: Vec<Literal> = clause
                    .literals
                    .iter()
                    .zip(assumptions.iter())
                    .filter(|&(_, a)| core.contains(a))
                    .map(|(&lit, _)| lit)
                    .collect();
                if !kept.is_empty() && kept.len() < clause.literals.len() {
                    verdict = Simplification::Replaced {
                        literals: kept,
                        rule: self.name(),
                        premises: vec![],
                    };
                }
            }
        }

        // Accumulate the grounding after the check, so a clause never
        // trivially subsumes itself
        self.solver.add_clause(&encoded);

        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::clause::{Clause, Inference, InputType};
    use std::collections::HashSet;

    /// Exhaustive test-double solver with deletion-minimized cores
    #[derive(Default)]
    struct MiniSolver {
        clauses: Vec<Vec<i32>>,
        core: Vec<i32>,
    }

    impl MiniSolver {
        fn satisfiable(clauses: &[Vec<i32>], assumptions: &[i32]) -> bool {
            let mut vars: Vec<i32> = clauses
                .iter()
                .flatten()
                .chain(assumptions.iter())
                .map(|l| l.abs())
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            vars.sort_unstable();

            let mut assignment: HashMap<i32, bool> = HashMap::new();
            for &a in assumptions {
                let val = a > 0;
                if let Some(&prev) = assignment.get(&a.abs()) {
                    if prev != val {
                        return false;
                    }
                }
                assignment.insert(a.abs(), val);
            }
            Self::search(clauses, &vars, 0, &mut assignment)
        }

        fn search(
            clauses: &[Vec<i32>],
            vars: &[i32],
            depth: usize,
            assignment: &mut HashMap<i32, bool>,
        ) -> bool {
            if clauses.iter().any(|c| {
                c.iter().all(|&l| {
                    assignment
                        .get(&l.abs())
                        .map(|&v| v != (l > 0))
                        .unwrap_or(false)
                })
            }) {
                return false;
            }
            if depth == vars.len() {
                return clauses.iter().all(|c| {
                    c.iter()
                        .any(|&l| assignment.get(&l.abs()).map(|&v| v == (l > 0)).unwrap_or(false))
                });
            }
            let var = vars[depth];
            if assignment.contains_key(&var) {
                return Self::search(clauses, vars, depth + 1, assignment);
            }
            for val in [true, false] {
                assignment.insert(var, val);
                if Self::search(clauses, vars, depth + 1, assignment) {
                    assignment.remove(&var);
                    return true;
                }
            }
            assignment.remove(&var);
            false
        }
    }

    impl SatSolver for MiniSolver {
        fn add_clause(&mut self, clause: &[i32]) {
            self.clauses.push(clause.to_vec());
        }

        fn solve(&mut self, assumptions: &[i32]) -> SatResult {
            if Self::satisfiable(&self.clauses, assumptions) {
                SatResult::Satisfiable
            } else {
                // Deletion-based core minimization
                let mut core: Vec<i32> = assumptions.to_vec();
                let mut i = 0;
                while i < core.len() {
                    let mut reduced = core.clone();
                    reduced.remove(i);
                    if !Self::satisfiable(&self.clauses, &reduced) {
                        core = reduced;
                    } else {
                        i += 1;
                    }
                }
                self.core = core;
                SatResult::Unsatisfiable
            }
        }

        fn unsat_core(&self) -> Vec<i32> {
            self.core.clone()
        }
    }

    struct Harness {
        ctx: Context,
        state: SaturationState,
        rule: GlobalSubsumptionRule,
    }

    impl Harness {
        fn new() -> Self {
            Harness {
                ctx: Context::new(),
                state: SaturationState::new(1, 1),
                rule: GlobalSubsumptionRule::new(Box::<MiniSolver>::default()),
            }
        }

        fn lit(&mut self, name: &str, polarity: bool, args: Vec<Term>) -> Literal {
            let p = self.ctx.signature.intern_predicate(name, args.len() as u8);
            self.ctx.literal(p, polarity, args)
        }

        fn add(&mut self, literals: Vec<Literal>) -> usize {
            let clause =
                Clause::new(literals, InputType::Axiom, Inference::input(), &self.ctx.literals);
            let idx = self.state.clauses.len();
            self.state.clauses.push(clause);
            idx
        }

        fn simplify(&mut self, idx: usize) -> Simplification {
            self.rule.simplify_forward(
                idx,
                &self.state,
                &mut self.ctx,
                &Kbo::default(),
                &IndexRegistry::new(),
            )
        }
    }

    #[test]
    fn test_shrinks_clause_with_implied_subset() {
        let mut h = Harness::new();
        let q = h.lit("q", true, vec![]);
        let p = h.lit("p", true, vec![]);

        // Teach the solver q, then p | q shrinks to q
        let unit = h.add(vec![q]);
        assert!(h.simplify(unit).is_unchanged());

        let target = h.add(vec![p, q]);
        match h.simplify(target) {
            Simplification::Replaced { literals, .. } => assert_eq!(literals, vec![q]),
            other => panic!("expected replacement, got {:?}", other),
        }
    }

    #[test]
    fn test_unrelated_clause_unchanged() {
        let mut h = Harness::new();
        let q = h.lit("q", true, vec![]);
        let p = h.lit("p", true, vec![]);
        let r = h.lit("r", true, vec![]);

        let unit = h.add(vec![r]);
        assert!(h.simplify(unit).is_unchanged());

        let target = h.add(vec![p, q]);
        assert!(h.simplify(target).is_unchanged());
    }

    #[test]
    fn test_variables_ground_to_shared_constant() {
        let mut h = Harness::new();
        // p(X) grounds to p(gnd); then p(a)... different atoms stay apart,
        // but p(Y) | q(Y) shrinks against the grounding of p(X)
        let x = Term::Var(0);
        let y = Term::Var(1);
        let px = h.lit("p", true, vec![x]);
        let unit = h.add(vec![px]);
        assert!(h.simplify(unit).is_unchanged());

        let py = h.lit("p", true, vec![y]);
        let qy = h.lit("q", true, vec![y]);
        let target = h.add(vec![py, qy]);
        match h.simplify(target) {
            Simplification::Replaced { literals, .. } => {
                assert_eq!(literals.len(), 1);
            }
            other => panic!("expected replacement, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_solver_skips() {
        struct UnknownSolver;
        impl SatSolver for UnknownSolver {
            fn add_clause(&mut self, _clause: &[i32]) {}
            fn solve(&mut self, _assumptions: &[i32]) -> SatResult {
                SatResult::Unknown
            }
            fn unsat_core(&self) -> Vec<i32> {
                Vec::new()
            }
        }

        let mut h = Harness::new();
        h.rule = GlobalSubsumptionRule::new(Box::new(UnknownSolver));
        let p = h.lit("p", true, vec![]);
        let q = h.lit("q", true, vec![]);
        let a = h.add(vec![p, q]);
        let b = h.add(vec![p, q]);
        assert!(h.simplify(a).is_unchanged());
        assert!(h.simplify(b).is_unchanged());
    }
}
