//! Group theory: from associativity, left identity, and left inverse,
//! refute the negation of the right-inverse property.

use resolute::logic::clause::{Clause, Inference, InputType};
use resolute::logic::literal::Literal;
use resolute::logic::sorts::SortId;
use resolute::logic::term::Term;
use resolute::{saturate, Context, ProverConfig, SaturationResult};
use std::time::Duration;

struct ProblemBuilder {
    ctx: Context,
    clauses: Vec<Clause>,
}

impl ProblemBuilder {
    fn new() -> Self {
        ProblemBuilder {
            ctx: Context::new(),
            clauses: Vec::new(),
        }
    }

    fn const_(&mut self, name: &str) -> Term {
        let id = self.ctx.signature.intern_function(name, 0, SortId::DEFAULT);
        self.ctx.term(id, vec![])
    }

    fn func(&mut self, name: &str, args: Vec<Term>) -> Term {
        let id = self
            .ctx
            .signature
            .intern_function(name, args.len() as u8, SortId::DEFAULT);
        self.ctx.term(id, args)
    }

    fn eq(&mut self, lhs: Term, rhs: Term) -> Literal {
        self.ctx.equality(true, lhs, rhs, SortId::DEFAULT)
    }

    fn neq(&mut self, lhs: Term, rhs: Term) -> Literal {
        self.ctx.equality(false, lhs, rhs, SortId::DEFAULT)
    }

    fn axiom(&mut self, literals: Vec<Literal>) {
        self.clauses.push(Clause::new(
            literals,
            InputType::Axiom,
            Inference::input(),
            &self.ctx.literals,
        ));
    }

    fn negated_conjecture(&mut self, literals: Vec<Literal>) {
        self.clauses.push(Clause::new(
            literals,
            InputType::NegatedConjecture,
            Inference::input(),
            &self.ctx.literals,
        ));
    }
}

#[test]
fn test_left_inverse_gives_right_inverse() {
    let mut b = ProblemBuilder::new();
    let x = Term::Var(0);
    let y = Term::Var(1);
    let z = Term::Var(2);

    // (X*Y)*Z = X*(Y*Z)
    let xy = b.func("mult", vec![x, y]);
    let yz = b.func("mult", vec![y, z]);
    let xy_z = b.func("mult", vec![xy, z]);
    let x_yz = b.func("mult", vec![x, yz]);
    let assoc = b.eq(xy_z, x_yz);
    b.axiom(vec![assoc]);

    // e*X = X
    let e = b.const_("e");
    let ex = b.func("mult", vec![e, x]);
    let left_identity = b.eq(ex, x);
    b.axiom(vec![left_identity]);

    // i(X)*X = e
    let ix = b.func("inv", vec![x]);
    let ix_x = b.func("mult", vec![ix, x]);
    let left_inverse = b.eq(ix_x, e);
    b.axiom(vec![left_inverse]);

    // Negated conjecture: a*i(a) != e
    let a = b.const_("a");
    let ia = b.func("inv", vec![a]);
    let a_ia = b.func("mult", vec![a, ia]);
    let goal = b.neq(a_ia, e);
    b.negated_conjecture(vec![goal]);

    let mut config = ProverConfig::default();
    config.timeout = Duration::from_secs(60);

    let ProblemBuilder { ctx, clauses } = b;
    let (result, _, _, _) = saturate(clauses, config, ctx);
    match result {
        SaturationResult::Refutation(proof) => {
            assert!(proof.is_closed());
            // The refutation must actually use the negated conjecture
            assert!(proof.steps.iter().any(|s| s.clause_idx == 3));
        }
        other => panic!("expected refutation, got {:?}", other),
    }
}

#[test]
fn test_left_identity_instance() {
    // A one-step instance of the identity axiom: e*c != c is refutable
    let mut b = ProblemBuilder::new();
    let x = Term::Var(0);
    let e = b.const_("e");
    let c = b.const_("c");
    let ex = b.func("mult", vec![e, x]);
    let identity = b.eq(ex, x);
    b.axiom(vec![identity]);

    let ec = b.func("mult", vec![e, c]);
    let goal = b.neq(ec, c);
    b.negated_conjecture(vec![goal]);

    let ProblemBuilder { ctx, clauses } = b;
    let (result, _, _, _) = saturate(clauses, ProverConfig::default(), ctx);
    assert!(matches!(result, SaturationResult::Refutation(_)));
}
