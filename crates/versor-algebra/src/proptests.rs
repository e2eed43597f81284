//! Property-based tests for algebra operations.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use versor_core::{Factor, NumericBackend};
    use versor_expr::{Evaluator, ExprBackend, ExprHandle};

    use crate::config::default_blade_names;
    use crate::prod_tree::ProdTree;
    use crate::{Algebra, Multivector, MultivectorOf};

    type Mv = MultivectorOf<NumericBackend>;
    type MvExpr = MultivectorOf<ExprBackend>;

    const TOLERANCE: f64 = 1e-9;

    fn algebra(metric: &[f64]) -> Algebra<NumericBackend> {
        let metric = metric.iter().map(|&m| Factor::Numeric(m)).collect();
        Algebra::new(metric, default_blade_names(3), NumericBackend).unwrap()
    }

    fn build(alg: &Algebra<NumericBackend>, coeffs: &[f64]) -> Mv {
        Multivector::new(alg, |b| {
            for (bm, &c) in (0..).zip(coeffs) {
                if c != 0.0 {
                    b.add(bm, &[c.into()], false)?;
                }
            }
            Ok(())
        })
        .unwrap()
    }

    fn vector(alg: &Algebra<NumericBackend>, coeffs: &[f64]) -> Mv {
        let components: Vec<Factor<_>> = coeffs.iter().map(|&c| c.into()).collect();
        alg.vector(&components).unwrap()
    }

    fn dense(mv: &Mv) -> [f64; 8] {
        let mut out = [0.0; 8];
        for (bm, x) in mv.to_numeric().unwrap() {
            out[bm as usize] = x;
        }
        out
    }

    fn close(a: &Mv, b: &Mv) -> bool {
        dense(a)
            .iter()
            .zip(dense(b).iter())
            .all(|(x, y)| (x - y).abs() < TOLERANCE)
    }

    // Strategy for diagonal metrics, including null and negative directions
    fn metric() -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(prop::sample::select(vec![-1.0, 0.0, 1.0, 2.0]), 3)
    }

    // Strategy for non-degenerate metrics
    fn regular_metric() -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(prop::sample::select(vec![-1.0, 1.0, 2.0]), 3)
    }

    // Strategy for small integer coefficients, so products are exact
    fn coeffs(len: usize) -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec((-3i32..=3).prop_map(f64::from), len)
    }

    fn nonzero_vector() -> impl Strategy<Value = Vec<f64>> {
        coeffs(3).prop_filter("vector must be non-zero", |v| v.iter().any(|&x| x != 0.0))
    }

    proptest! {
        #[test]
        fn geometric_product_associative(
            m in metric(),
            a in coeffs(8),
            b in coeffs(8),
            c in coeffs(8),
        ) {
            let alg = algebra(&m);
            let (a, b, c) = (build(&alg, &a), build(&alg, &b), build(&alg, &c));
            let left = alg.geometric_product(&alg.geometric_product(&a, &b).unwrap(), &c).unwrap();
            let right = alg.geometric_product(&a, &alg.geometric_product(&b, &c).unwrap()).unwrap();
            prop_assert!(close(&left, &right));
        }

        #[test]
        fn wedge_is_grade_two_part_for_vectors(m in metric(), a in coeffs(3), b in coeffs(3)) {
            let alg = algebra(&m);
            let (a, b) = (vector(&alg, &a), vector(&alg, &b));
            let wedge = alg.wedge_product(&a, &b).unwrap();
            let gp = alg.geometric_product(&a, &b).unwrap();
            prop_assert!(close(&wedge, &alg.extract_grade(2, &gp).unwrap()));
        }

        #[test]
        fn norm_is_multiplicative_for_versors(
            u in nonzero_vector(),
            v in nonzero_vector(),
            w in nonzero_vector(),
        ) {
            let alg = algebra(&[1.0, 1.0, 1.0]);
            let a = alg.geometric_product(&vector(&alg, &u), &vector(&alg, &v)).unwrap();
            let b = vector(&alg, &w);
            let ab = alg.geometric_product(&a, &b).unwrap();
            let lhs = alg.norm(&ab).unwrap().as_numeric().unwrap();
            let rhs = alg.norm(&a).unwrap().as_numeric().unwrap()
                * alg.norm(&b).unwrap().as_numeric().unwrap();
            prop_assert!((lhs - rhs).abs() < TOLERANCE * rhs.max(1.0));
        }

        #[test]
        fn normalize_gives_unit(u in nonzero_vector(), v in nonzero_vector()) {
            let alg = algebra(&[1.0, 1.0, 1.0]);
            let x = alg.geometric_product(&vector(&alg, &u), &vector(&alg, &v)).unwrap();
            prop_assume!(alg.norm(&x).unwrap().as_numeric().unwrap() > TOLERANCE);
            let unit = alg.normalize(&x).unwrap();
            prop_assert!(unit.known_unit());
            let plain = unit.with_known_unit(false);
            let n = alg.norm(&plain).unwrap().as_numeric().unwrap();
            prop_assert!((n - 1.0).abs() < TOLERANCE);
        }

        #[test]
        fn inverse_of_versor(m in regular_metric(), u in nonzero_vector(), v in nonzero_vector()) {
            let alg = algebra(&m);
            let a = alg.geometric_product(&vector(&alg, &u), &vector(&alg, &v)).unwrap();
            let ns = alg.norm_squared(&a).unwrap().as_numeric().unwrap();
            prop_assume!(ns.abs() > 1e-6);
            let inv = alg.inverse(&a).unwrap();
            let one = alg.one().unwrap();
            prop_assert!(close(&alg.geometric_product(&inv, &a).unwrap(), &one));
            prop_assert!(close(&alg.geometric_product(&a, &inv).unwrap(), &one));
        }

        #[test]
        fn sandwich_matches_reference(m in metric(), r in coeffs(8), x in coeffs(8)) {
            let alg = algebra(&m);
            let (r, x) = (build(&alg, &r), build(&alg, &x));
            let reference = alg.sandwich1(&r, &x).unwrap();
            prop_assert!(close(&alg.sandwich(&r).unwrap().apply(&x).unwrap(), &reference));
            prop_assert!(close(&alg.sandwich_chain(&[&r], &x).unwrap(), &reference));
        }

        #[test]
        fn symbolic_sandwich_matches_reference(
            m in metric(),
            values in proptest::collection::vec(-2.0f64..2.0, 8),
            x in coeffs(8),
        ) {
            let mut backend = ExprBackend::new();
            let symbols: Vec<_> = (0..8).map(|i| backend.sym(&format!("r{i}"))).collect();
            let metric = m.iter().map(|&v| Factor::Numeric(v)).collect();
            let alg = Algebra::new(metric, default_blade_names(3), backend).unwrap();
            let r = Multivector::new(&alg, |b| {
                for (bm, s) in (0..).zip(&symbols) {
                    b.add(bm, std::slice::from_ref(s), false)?;
                }
                Ok(())
            })
            .unwrap();
            let x = Multivector::new(&alg, |b| {
                for (bm, &c) in (0..).zip(&x) {
                    b.add(bm, &[c.into()], false)?;
                }
                Ok(())
            })
            .unwrap();

            let fast = alg.sandwich(&r).unwrap().apply(&x).unwrap();
            let slow = alg.sandwich1(&r, &x).unwrap();

            let backend = alg.backend();
            let names: Vec<String> = (0..8).map(|i| format!("r{i}")).collect();
            let mut eval = Evaluator::new(&backend)
                .bind_all(names.iter().map(String::as_str).zip(values.iter().copied()));
            for bm in 0..8 {
                let f = eval.factor(&fast.value(bm)).unwrap();
                let s = eval.factor(&slow.value(bm)).unwrap();
                prop_assert!((f - s).abs() < 1e-6, "component {}: {} vs {}", bm, f, s);
            }
        }

        #[test]
        fn prod_tree_optimize_preserves_sums(
            terms in proptest::collection::vec(
                (
                    0u32..4,
                    proptest::collection::vec(0u8..3, 0..3),
                    proptest::collection::vec(-2i32..=2, 0..3),
                    0u32..4,
                ),
                0..40,
            ),
        ) {
            let mut tree = ProdTree::new();
            for (bitmap, symbols, numbers, flips) in &terms {
                let term: Vec<Factor<u8>> = symbols
                    .iter()
                    .map(|&s| Factor::Symbolic(s))
                    .chain(numbers.iter().map(|&n| Factor::Numeric(f64::from(n))))
                    .collect();
                tree.add(*bitmap, &term, *flips);
            }
            let before = tree.sums();
            tree.optimize();
            let after = tree.sums();

            for (key, value) in &before {
                prop_assert_eq!(after.get(key).copied().unwrap_or(0.0), *value);
            }
            prop_assert!(after.values().all(|&v| v != 0.0));
        }
    }

    fn symbolic_even(alg: &Algebra<ExprBackend>, symbols: &[Factor<ExprHandle>]) -> MvExpr {
        Multivector::new(alg, |b| {
            for (&bm, s) in [0b000, 0b011, 0b101, 0b110].iter().zip(symbols) {
                b.add(bm, std::slice::from_ref(s), false)?;
            }
            Ok(())
        })
        .unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn symbolic_chain_matches_nested_reference(
            m in metric(),
            values in proptest::collection::vec(-2.0f64..2.0, 8),
            x in coeffs(8),
        ) {
            let mut backend = ExprBackend::new();
            let names: Vec<String> = (0..4)
                .map(|i| format!("p{i}"))
                .chain((0..4).map(|i| format!("q{i}")))
                .collect();
            let symbols: Vec<_> = names.iter().map(|n| backend.sym(n)).collect();
            let metric = m.iter().map(|&v| Factor::Numeric(v)).collect();
            let alg = Algebra::new(metric, default_blade_names(3), backend).unwrap();
            let p = symbolic_even(&alg, &symbols[..4]);
            let q = symbolic_even(&alg, &symbols[4..]);
            let x = Multivector::new(&alg, |b| {
                for (bm, &c) in (0..).zip(&x) {
                    b.add(bm, &[c.into()], false)?;
                }
                Ok(())
            })
            .unwrap();

            let chain = alg.sandwich_chain(&[&p, &q], &x).unwrap();
            let inner = alg.sandwich1(&q, &x).unwrap();
            let nested = alg.sandwich1(&p, &inner).unwrap();

            let backend = alg.backend();
            let mut eval = Evaluator::new(&backend)
                .bind_all(names.iter().map(String::as_str).zip(values.iter().copied()));
            for bm in 0..8 {
                let c = eval.factor(&chain.value(bm)).unwrap();
                let n = eval.factor(&nested.value(bm)).unwrap();
                prop_assert!(
                    (c - n).abs() < 1e-6 * n.abs().max(1.0),
                    "component {}: {} vs {}",
                    bm,
                    c,
                    n
                );
            }
        }
    }

    #[test]
    fn concrete_scenario() {
        let alg = Algebra::new(
            vec![1.0.into(); 3],
            crate::config::blade_names(&["x", "y", "z"]),
            NumericBackend,
        )
        .unwrap();
        let a = alg.mv([("x", 3.0.into()), ("y", 4.0.into())]).unwrap();

        assert_eq!(alg.norm(&a).unwrap().as_numeric(), Some(5.0));
        let mut squared = [0.0; 8];
        squared[0] = 25.0;
        assert_eq!(dense(&alg.geometric_product(&a, &a).unwrap()), squared);
        assert_eq!(dense(&alg.wedge_product(&a, &a).unwrap()), [0.0; 8]);

        let inv = dense(&alg.inverse(&a).unwrap());
        assert!((inv[1] - 0.12).abs() < 1e-12);
        assert!((inv[2] - 0.16).abs() < 1e-12);
    }
}
