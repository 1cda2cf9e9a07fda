//! Property-based tests for the KBO term ordering.

use super::{Kbo, Ordering};
use crate::logic::context::Context;
use crate::logic::sorts::SortId;
use crate::logic::term::Term;
use proptest::prelude::*;

/// Term description before interning
#[derive(Debug, Clone)]
enum TermDesc {
    Var(u8),
    Const(u8),
    Func(u8, Vec<TermDesc>),
}

fn arb_term_desc(max_depth: u32) -> BoxedStrategy<TermDesc> {
    if max_depth == 0 {
        prop_oneof![
            (0..3u8).prop_map(TermDesc::Var),
            (0..4u8).prop_map(TermDesc::Const),
        ]
        .boxed()
    } else {
        prop_oneof![
            2 => (0..3u8).prop_map(TermDesc::Var),
            3 => (0..4u8).prop_map(TermDesc::Const),
            2 => (0..2u8, proptest::collection::vec(arb_term_desc(max_depth - 1), 1..=2))
                .prop_map(|(f, args)| TermDesc::Func(f, args)),
        ]
        .boxed()
    }
}

fn arb_ground_term_desc(max_depth: u32) -> BoxedStrategy<TermDesc> {
    if max_depth == 0 {
        (0..4u8).prop_map(TermDesc::Const).boxed()
    } else {
        prop_oneof![
            3 => (0..4u8).prop_map(TermDesc::Const),
            2 => (0..2u8, proptest::collection::vec(arb_ground_term_desc(max_depth - 1), 1..=2))
                .prop_map(|(f, args)| TermDesc::Func(f, args)),
        ]
        .boxed()
    }
}

fn build_term(desc: &TermDesc, ctx: &mut Context) -> Term {
    match desc {
        TermDesc::Var(v) => Term::Var(*v as u32),
        TermDesc::Const(c) => {
            let name = format!("c{}", c);
            let id = ctx.signature.intern_function(&name, 0, SortId::DEFAULT);
            ctx.term(id, vec![])
        }
        TermDesc::Func(f, args) => {
            let built: Vec<Term> = args.iter().map(|a| build_term(a, ctx)).collect();
            let name = format!("f{}", f);
            let id = ctx
                .signature
                .intern_function(&name, built.len() as u8, SortId::DEFAULT);
            ctx.term(id, built)
        }
    }
}

proptest! {
    /// KBO is reflexive as equality: t compared to itself is Equal
    #[test]
    fn kbo_reflexive(desc in arb_term_desc(3)) {
        let mut ctx = Context::new();
        let t = build_term(&desc, &mut ctx);
        let kbo = Kbo::default();
        prop_assert_eq!(kbo.compare(t, t, &ctx.terms), Ordering::Equal);
    }

    /// Antisymmetry: compare(s, t) is the reverse of compare(t, s)
    #[test]
    fn kbo_antisymmetric(d1 in arb_term_desc(3), d2 in arb_term_desc(3)) {
        let mut ctx = Context::new();
        let s = build_term(&d1, &mut ctx);
        let t = build_term(&d2, &mut ctx);
        let kbo = Kbo::default();
        prop_assert_eq!(kbo.compare(s, t, &ctx.terms), kbo.compare(t, s, &ctx.terms).reverse());
    }

    /// Stability: the same inputs always give the same result
    #[test]
    fn kbo_stable(d1 in arb_term_desc(3), d2 in arb_term_desc(3)) {
        let mut ctx = Context::new();
        let s = build_term(&d1, &mut ctx);
        let t = build_term(&d2, &mut ctx);
        let kbo = Kbo::default();
        let first = kbo.compare(s, t, &ctx.terms);
        prop_assert_eq!(first, kbo.compare(s, t, &ctx.terms));
    }

    /// Ground terms are totally ordered
    #[test]
    fn kbo_total_on_ground(d1 in arb_ground_term_desc(3), d2 in arb_ground_term_desc(3)) {
        let mut ctx = Context::new();
        let s = build_term(&d1, &mut ctx);
        let t = build_term(&d2, &mut ctx);
        let kbo = Kbo::default();
        let cmp = kbo.compare(s, t, &ctx.terms);
        prop_assert_ne!(cmp, Ordering::Incomparable);
        if s == t {
            prop_assert_eq!(cmp, Ordering::Equal);
        } else {
            prop_assert_ne!(cmp, Ordering::Equal);
        }
    }

    /// Transitivity on ground terms
    #[test]
    fn kbo_transitive_on_ground(
        d1 in arb_ground_term_desc(2),
        d2 in arb_ground_term_desc(2),
        d3 in arb_ground_term_desc(2),
    ) {
        let mut ctx = Context::new();
        let t1 = build_term(&d1, &mut ctx);
        let t2 = build_term(&d2, &mut ctx);
        let t3 = build_term(&d3, &mut ctx);
        let kbo = Kbo::default();

        let c12 = kbo.compare(t1, t2, &ctx.terms);
        let c23 = kbo.compare(t2, t3, &ctx.terms);
        let c13 = kbo.compare(t1, t3, &ctx.terms);

        if c12 == Ordering::Greater && c23 == Ordering::Greater {
            prop_assert_eq!(c13, Ordering::Greater);
        }
        if c12 == Ordering::Less && c23 == Ordering::Less {
            prop_assert_eq!(c13, Ordering::Less);
        }
    }

    /// A term is strictly greater than its proper subterms
    #[test]
    fn kbo_subterm_property(desc in arb_ground_term_desc(3)) {
        let mut ctx = Context::new();
        let t = build_term(&desc, &mut ctx);
        let kbo = Kbo::default();
        let subterms: Vec<Term> = ctx.terms.subterms(t).collect();
        for sub in subterms {
            if sub != t {
                prop_assert_eq!(kbo.compare(t, sub, &ctx.terms), Ordering::Greater);
            }
        }
    }
}
