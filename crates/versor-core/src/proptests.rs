//! Property-based tests for blade combinatorics and accumulation.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::blade::{bit_count, bit_list, product_flips, reverse_flips};
    use crate::{Accumulator, Factor, NumericBackend};

    fn bitmap() -> impl Strategy<Value = u32> {
        0u32..256
    }

    proptest! {
        #[test]
        fn bit_count_matches_count_ones(bm in any::<u32>()) {
            prop_assert_eq!(bit_count(bm), bm.count_ones());
        }

        #[test]
        fn bit_list_is_ascending(bm in any::<u32>()) {
            let bits = bit_list(bm);
            prop_assert_eq!(bits.len() as u32, bm.count_ones());
            prop_assert!(bits.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn product_flips_counts_inversions(a in bitmap(), b in bitmap()) {
            let seq: Vec<u32> = bit_list(a).into_iter().chain(bit_list(b)).collect();
            let mut inversions = 0;
            for i in 0..seq.len() {
                for j in (i + 1)..seq.len() {
                    if seq[i] > seq[j] {
                        inversions += 1;
                    }
                }
            }
            prop_assert_eq!(product_flips(a, b), inversions);
        }

        #[test]
        fn reverse_flips_parity(bm in bitmap()) {
            prop_assert_eq!(reverse_flips(bm) % 2, product_flips(bm, bm) % 2);
        }

        #[test]
        fn numeric_accumulation_is_a_signed_sum(
            terms in proptest::collection::vec((-100i32..100, -100i32..100, any::<bool>()), 0..20)
        ) {
            let mut backend = NumericBackend;
            let mut acc = Accumulator::new("c");
            let mut expected = 0.0;
            for &(a, b, negate) in &terms {
                let (a, b) = (f64::from(a), f64::from(b));
                acc.add(&mut backend, &[Factor::Numeric(a), Factor::Numeric(b)], negate).unwrap();
                if negate { expected -= a * b } else { expected += a * b }
            }
            prop_assert_eq!(acc.value(&mut backend).as_numeric(), Some(expected));
        }
    }
}
