//! Multivectors: sparse, bitmap-indexed collections of frozen scalars.
//!
//! A multivector is populated exactly once, through a builder callback that
//! drives one [`Accumulator`] per touched blade. When the callback returns,
//! every accumulator is frozen in first-touch order and the multivector is
//! read-only from then on.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use versor_core::blade::grade;
use versor_core::{Accumulator, Backend, Bitmap, Factor, Result};

use crate::algebra::{Algebra, AlgebraId};

/// A multivector belonging to one [`Algebra`].
#[derive(Clone, Debug)]
pub struct Multivector<S> {
    algebra: AlgebraId,
    /// Touched components in first-touch order.
    components: Vec<(Bitmap, Factor<S>)>,
    index: FxHashMap<Bitmap, usize>,
    known_unit: bool,
}

impl<S: Clone> Multivector<S> {
    /// Builds a multivector by running `build` against a fresh builder.
    ///
    /// # Errors
    ///
    /// Any error returned by `build` is passed through and nothing is built.
    pub fn new<B, F>(algebra: &Algebra<B>, build: F) -> Result<Self>
    where
        B: Backend<Symbol = S>,
        F: FnOnce(&mut MultivectorBuilder<'_, B>) -> Result<()>,
    {
        let mut builder = MultivectorBuilder {
            algebra,
            slots: Vec::new(),
            index: FxHashMap::default(),
        };
        build(&mut builder)?;
        Ok(builder.finish())
    }

    /// A multivector with no components.
    pub(crate) fn empty(algebra: AlgebraId) -> Self {
        Self {
            algebra,
            components: Vec::new(),
            index: FxHashMap::default(),
            known_unit: false,
        }
    }

    /// The value of a component, or literal zero if it was never touched.
    #[must_use]
    pub fn value(&self, bitmap: Bitmap) -> Factor<S> {
        self.get(bitmap).cloned().unwrap_or(Factor::Numeric(0.0))
    }

    /// The value of a touched component.
    #[must_use]
    pub fn get(&self, bitmap: Bitmap) -> Option<&Factor<S>> {
        self.index.get(&bitmap).map(|&i| &self.components[i].1)
    }

    /// Touched components in first-touch order (not sorted by bitmap).
    pub fn iter(&self) -> impl Iterator<Item = (Bitmap, &Factor<S>)> + '_ {
        self.components.iter().map(|(bm, value)| (*bm, value))
    }

    /// Touched bitmaps in first-touch order.
    pub fn bitmaps(&self) -> impl Iterator<Item = Bitmap> + '_ {
        self.components.iter().map(|(bm, _)| *bm)
    }

    /// Number of touched components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True if no component was touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Distinct grades of the touched components, ascending.
    #[must_use]
    pub fn grades(&self) -> SmallVec<[u32; 4]> {
        let mut grades: SmallVec<[u32; 4]> = self.bitmaps().map(grade).collect();
        grades.sort_unstable();
        grades.dedup();
        grades
    }

    /// The components as plain numbers, if every value is numeric.
    #[must_use]
    pub fn to_numeric(&self) -> Option<Vec<(Bitmap, f64)>> {
        self.iter()
            .map(|(bm, value)| value.as_numeric().map(|x| (bm, x)))
            .collect()
    }

    /// Whether an operation has established that the norm is 1.
    ///
    /// This is a trusted hint and is not verified unless the algebra is
    /// configured to do so.
    #[must_use]
    pub fn known_unit(&self) -> bool {
        self.known_unit
    }

    /// Overrides the unit hint.
    pub fn set_known_unit(&mut self, known_unit: bool) {
        self.known_unit = known_unit;
    }

    /// Returns the multivector with the unit hint replaced.
    #[must_use]
    pub fn with_known_unit(mut self, known_unit: bool) -> Self {
        self.known_unit = known_unit;
        self
    }

    /// Identity of the owning algebra.
    #[must_use]
    pub fn algebra_id(&self) -> AlgebraId {
        self.algebra
    }
}

/// Collects contributions to a multivector under construction.
pub struct MultivectorBuilder<'a, B: Backend> {
    algebra: &'a Algebra<B>,
    slots: Vec<(Bitmap, Accumulator<B>)>,
    index: FxHashMap<Bitmap, usize>,
}

impl<'a, B: Backend> MultivectorBuilder<'a, B> {
    /// The algebra the multivector belongs to.
    #[must_use]
    pub fn algebra(&self) -> &'a Algebra<B> {
        self.algebra
    }

    /// Adds `term` (negated if `negate`) to the component at `bitmap`.
    ///
    /// The first use of a bitmap creates its accumulator, even when the
    /// term itself turns out to be zero.
    ///
    /// # Errors
    ///
    /// Propagates accumulator errors.
    pub fn add(&mut self, bitmap: Bitmap, term: &[Factor<B::Symbol>], negate: bool) -> Result<()> {
        let slot = match self.index.get(&bitmap) {
            Some(&slot) => slot,
            None => {
                let slot = self.slots.len();
                let name = if bitmap == 0 {
                    "scalar"
                } else {
                    self.algebra.blade_name(bitmap)
                };
                self.slots.push((bitmap, Accumulator::new(name)));
                self.index.insert(bitmap, slot);
                slot
            }
        };
        let mut backend = self.algebra.backend_mut();
        self.slots[slot].1.add(&mut *backend, term, negate)
    }

    /// Number of components touched so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no component was touched yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn finish(self) -> Multivector<B::Symbol> {
        let mut backend = self.algebra.backend_mut();
        let components: Vec<_> = self
            .slots
            .into_iter()
            .map(|(bm, mut acc)| (bm, acc.value(&mut *backend)))
            .collect();
        Multivector {
            algebra: self.algebra.id(),
            components,
            index: self.index,
            known_unit: false,
        }
    }
}
