//! Blade bitmap combinatorics.
//!
//! A basis blade is identified by a bitmap: bit `i` is set iff basis vector
//! `e_i` participates. The grade of a blade is the popcount of its bitmap,
//! and the geometric product of two blades is the blade `a ^ b` up to a sign
//! and the metric factors of the shared basis vectors `a & b`.

use smallvec::SmallVec;

use crate::factor::{Factor, Term};

/// Bitmap identifying a basis blade.
pub type Bitmap = u32;

/// Population count using Kernighan's loop.
#[inline]
#[must_use]
pub fn bit_count(mut bm: Bitmap) -> u32 {
    let mut count = 0;
    while bm != 0 {
        bm &= bm - 1;
        count += 1;
    }
    count
}

/// The grade of a blade.
#[inline]
#[must_use]
pub fn grade(bm: Bitmap) -> u32 {
    bit_count(bm)
}

/// Calls `f` with the position of every set bit, ascending.
#[inline]
pub fn for_bitmap(mut bm: Bitmap, mut f: impl FnMut(u32)) {
    while bm != 0 {
        let bit = bm.trailing_zeros();
        f(bit);
        bm &= bm - 1;
    }
}

/// Positions of the set bits, ascending.
#[must_use]
pub fn bit_list(bm: Bitmap) -> SmallVec<[u32; 8]> {
    let mut bits = SmallVec::new();
    for_bitmap(bm, |bit| bits.push(bit));
    bits
}

/// Number of adjacent transpositions needed to sort the concatenation of
/// the basis vectors of `a` followed by those of `b`.
///
/// Duplicated vectors are kept, so only the parity is meaningful: an odd
/// count flips the sign of the blade product `a * b`.
#[must_use]
pub fn product_flips(a: Bitmap, b: Bitmap) -> u32 {
    let mut flips = 0;
    let mut b_seen = 0;
    let mut rest = a | b;
    while rest != 0 {
        let bit = 1 << rest.trailing_zeros();
        if a & bit != 0 {
            flips += b_seen;
        }
        if b & bit != 0 {
            b_seen += 1;
        }
        rest &= !bit;
    }
    flips
}

/// Number of adjacent transpositions needed to reverse a blade: `k(k-1)/2`.
#[inline]
#[must_use]
pub fn reverse_flips(bm: Bitmap) -> u32 {
    let k = bit_count(bm);
    k * k.saturating_sub(1) / 2
}

/// True when `flips` is odd.
#[inline]
#[must_use]
pub fn is_odd(flips: u32) -> bool {
    flips & 1 == 1
}

/// Non-unit metric factors of the basis vectors in `bm`.
///
/// Returns `None` when any of them is the literal number zero: a product
/// through a null direction vanishes and must be skipped entirely.
#[must_use]
pub fn metric_factors<S: Clone>(metric: &[Factor<S>], bm: Bitmap) -> Option<Term<S>> {
    let mut factors = Term::new();
    let mut rest = bm;
    while rest != 0 {
        let i = rest.trailing_zeros() as usize;
        rest &= rest - 1;
        match metric.get(i) {
            Some(f) if f.is_zero() => return None,
            Some(f) if f.is_one() => {}
            Some(f) => factors.push(f.clone()),
            None => {}
        }
    }
    Some(factors)
}

/// True when every basis vector of `bm` has metric factor exactly one.
#[must_use]
pub fn is_euclidean<S>(metric: &[Factor<S>], bm: Bitmap) -> bool {
    let mut ok = true;
    for_bitmap(bm, |i| {
        ok &= metric.get(i as usize).is_some_and(Factor::is_one);
    });
    ok
}
