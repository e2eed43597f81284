//! Extension of a linear map on 1-vectors to whole multivectors.

use versor_core::blade::bit_count;
use versor_core::{AlgebraError, Backend, Bitmap, Factor, Result};

use crate::algebra::{Algebra, MultivectorOf};
use crate::multivector::{Multivector, MultivectorBuilder};

/// A sparse linear map: `matrix[j][i]` is the `e_j` coordinate of the image
/// of `e_i`. Absent and literal-zero entries contribute nothing.
pub type LinearMap<S> = [Vec<Option<Factor<S>>>];

impl<B: Backend> Algebra<B> {
    /// Applies `matrix` to every basis vector of every component of `mv`,
    /// wedging the images together.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::DimensionMismatch`] if the matrix has more
    /// rows than the algebra has dimensions.
    pub fn outermorphism(
        &self,
        mv: &MultivectorOf<B>,
        matrix: &LinearMap<B::Symbol>,
    ) -> Result<MultivectorOf<B>> {
        self.check_mine(mv)?;
        if matrix.len() > self.n_dimensions() {
            return Err(AlgebraError::DimensionMismatch {
                expected: self.n_dimensions(),
                actual: matrix.len(),
            });
        }
        self.annotate("outermorphism");
        Multivector::new(self, |b| {
            let mut term = Vec::new();
            for (bm, value) in mv.iter() {
                let mut walk = Walk {
                    matrix,
                    value,
                    term: &mut term,
                };
                walk.expand(b, bm, 0, 0)?;
            }
            Ok(())
        })
    }
}

/// Depth-first expansion of one input component.
struct Walk<'m, S> {
    matrix: &'m LinearMap<S>,
    value: &'m Factor<S>,
    term: &'m mut Vec<Factor<S>>,
}

impl<S: Clone> Walk<'_, S> {
    /// Maps the lowest remaining input bit onto each unused output basis
    /// vector in turn. `flips` counts the transpositions needed to sort the
    /// output vectors placed so far.
    fn expand<B>(
        &mut self,
        b: &mut MultivectorBuilder<'_, B>,
        remaining: Bitmap,
        out: Bitmap,
        flips: u32,
    ) -> Result<()>
    where
        B: Backend<Symbol = S>,
    {
        if remaining == 0 {
            self.term.push(self.value.clone());
            let result = b.add(out, self.term.as_slice(), flips % 2 == 1);
            self.term.pop();
            return result;
        }
        let i = remaining.trailing_zeros() as usize;
        let rest = remaining & (remaining - 1);
        for (j, row) in self.matrix.iter().enumerate() {
            let bit = 1 << j;
            if out & bit != 0 {
                continue;
            }
            let Some(entry) = row.get(i).and_then(Option::as_ref) else {
                continue;
            };
            if entry.is_zero() {
                continue;
            }
            self.term.push(entry.clone());
            let result = self.expand(b, rest, out | bit, flips + bit_count(out >> (j + 1)));
            self.term.pop();
            result?;
        }
        Ok(())
    }
}
