//! Property-based tests for the symbolic back end.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use versor_core::{Accumulator, Factor, NumericBackend};

    use crate::{Evaluator, ExprBackend};

    const NAMES: [&str; 3] = ["a", "b", "c"];

    // Strategy for a term: up to three symbol indices and up to two numbers
    fn term() -> impl Strategy<Value = (Vec<usize>, Vec<f64>, bool)> {
        (
            proptest::collection::vec(0usize..3, 0..3),
            proptest::collection::vec((-4i32..=4).prop_map(f64::from), 0..2),
            any::<bool>(),
        )
    }

    proptest! {
        #[test]
        fn sums_hash_cons_in_any_order(perm in Just(vec![0usize, 1, 2]).prop_shuffle()) {
            let mut backend = ExprBackend::new();
            let arena = backend.arena_mut();
            let handles: Vec<_> = NAMES.iter().map(|n| arena.symbol(n)).collect();
            let sorted = arena.add(handles.clone());
            let shuffled = arena.add(perm.iter().map(|&i| handles[i]).collect::<Vec<_>>());
            prop_assert_eq!(sorted, shuffled);
        }

        #[test]
        fn symbolic_accumulation_matches_numeric(
            terms in proptest::collection::vec(term(), 1..12),
            values in proptest::collection::vec(-3.0f64..3.0, 3),
        ) {
            let mut backend = ExprBackend::new();
            let symbols: Vec<_> = NAMES.iter().map(|n| backend.sym(n)).collect();

            let mut symbolic = Accumulator::new("s");
            let mut numeric = Accumulator::<NumericBackend>::new("n");
            for (indices, numbers, negate) in &terms {
                let sym_term: Vec<Factor<_>> = indices
                    .iter()
                    .map(|&i| symbols[i])
                    .chain(numbers.iter().map(|&x| Factor::Numeric(x)))
                    .collect();
                let num_term: Vec<Factor<_>> = indices
                    .iter()
                    .map(|&i| Factor::Numeric(values[i]))
                    .chain(numbers.iter().map(|&x| Factor::Numeric(x)))
                    .collect();
                symbolic.add(&mut backend, &sym_term, *negate).unwrap();
                numeric.add(&mut NumericBackend, &num_term, *negate).unwrap();
            }
            let symbolic = symbolic.value(&mut backend);
            let expected = numeric.value(&mut NumericBackend).as_numeric().unwrap();

            let mut eval = Evaluator::new(&backend)
                .bind_all(NAMES.iter().copied().zip(values.iter().copied()));
            let actual = eval.factor(&symbolic).unwrap();
            prop_assert!((actual - expected).abs() < 1e-9, "{} vs {}", actual, expected);
        }
    }
}
