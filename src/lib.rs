//! Shared fixtures for the Versor benchmarks.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use versor::prelude::*;

/// A seeded generator, so every run measures the same operands.
#[must_use]
pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// The Euclidean algebra of dimension `n` over `backend`.
///
/// # Errors
///
/// Fails only if `n` is too large for a bitmap.
pub fn euclidean<B: Backend>(n: usize, backend: B) -> Result<Algebra<B>, AlgebraError> {
    Algebra::new(vec![Factor::Numeric(1.0); n], default_blade_names(n), backend)
}

/// A numeric multivector where each blade is present with probability
/// `density`.
///
/// # Errors
///
/// Propagates construction errors.
pub fn random_multivector(
    alg: &Algebra<NumericBackend>,
    rng: &mut ChaCha8Rng,
    density: f64,
) -> Result<MultivectorOf<NumericBackend>, AlgebraError> {
    let blades = 1u32 << alg.n_dimensions();
    Multivector::new(alg, |b| {
        for bm in 0..blades {
            if rng.gen_bool(density) {
                b.add(bm, &[Factor::Numeric(rng.gen_range(-1.0..1.0))], false)?;
            }
        }
        Ok(())
    })
}

/// A fully symbolic even multivector named `prefix0`, `prefix1`, ...
///
/// # Errors
///
/// Propagates construction errors.
pub fn symbolic_even(
    alg: &Algebra<ExprBackend>,
    prefix: &str,
) -> Result<MultivectorOf<ExprBackend>, AlgebraError> {
    let blades = 1u32 << alg.n_dimensions();
    let symbols: Vec<_> = (0..blades)
        .filter(|bm| bm.count_ones() % 2 == 0)
        .map(|bm| (bm, alg.backend_mut().sym(&format!("{prefix}{bm}"))))
        .collect();
    Multivector::new(alg, |b| {
        for (bm, symbol) in &symbols {
            b.add(*bm, std::slice::from_ref(symbol), false)?;
        }
        Ok(())
    })
}
