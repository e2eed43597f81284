//! The algebra: metric, blade names and the back end.
//!
//! An [`Algebra`] is immutable after construction. Every operation takes
//! multivectors it created, checks their ownership, and returns a freshly
//! built multivector; the back end is driven eagerly and in a fixed order
//! while that multivector is built.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use tracing::debug;
use versor_core::blade::{is_euclidean, metric_factors};
use versor_core::{
    binop, scalar_func, AlgebraError, Backend, BinOp, Bitmap, Factor, Result, ScalarFunc,
};

use crate::config::AlgebraConfig;
use crate::multivector::Multivector;

/// Multivector type produced by an algebra over back end `B`.
pub type MultivectorOf<B> = Multivector<<B as Backend>::Symbol>;

static NEXT_ALGEBRA_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of an algebra, stamped on every multivector it creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AlgebraId(u64);

/// A geometric algebra over a diagonal metric, bound to a back end.
pub struct Algebra<B: Backend> {
    id: AlgebraId,
    metric: Vec<Factor<B::Symbol>>,
    names: Vec<String>,
    name_index: FxHashMap<String, Bitmap>,
    config: AlgebraConfig,
    backend: RefCell<B>,
}

impl<B: Backend> Algebra<B> {
    /// Creates an algebra with the default configuration.
    ///
    /// `metric[i]` is the square of basis vector `e_i`; a literal `0` marks a
    /// null direction. `names` must list all `2^n` blades by bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Configuration`] if `names` has the wrong length.
    pub fn new(metric: Vec<Factor<B::Symbol>>, names: Vec<String>, backend: B) -> Result<Self> {
        Self::with_config(metric, names, backend, AlgebraConfig::default())
    }

    /// Creates an algebra with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Configuration`] if `names` has the wrong length
    /// and [`AlgebraError::TooManyDimensions`] if the metric does not fit a
    /// blade bitmap.
    pub fn with_config(
        metric: Vec<Factor<B::Symbol>>,
        names: Vec<String>,
        backend: B,
        config: AlgebraConfig,
    ) -> Result<Self> {
        let n = metric.len();
        let expected = u32::try_from(n)
            .ok()
            .filter(|&n| n < Bitmap::BITS)
            .and_then(|n| 1usize.checked_shl(n))
            .ok_or(AlgebraError::TooManyDimensions {
                max: Bitmap::BITS - 1,
                actual: n,
            })?;
        if names.len() != expected {
            return Err(AlgebraError::Configuration {
                expected,
                actual: names.len(),
            });
        }

        let name_index = names
            .iter()
            .enumerate()
            .filter_map(|(bm, name)| Bitmap::try_from(bm).ok().map(|bm| (name.clone(), bm)))
            .collect();

        let id = AlgebraId(NEXT_ALGEBRA_ID.fetch_add(1, Ordering::Relaxed));
        debug!(
            dimensions = n,
            null = metric.iter().filter(|f| f.is_zero()).count(),
            symbolic = metric.iter().filter(|f| !f.is_numeric()).count(),
            "algebra created"
        );

        Ok(Self {
            id,
            metric,
            names,
            name_index,
            config,
            backend: RefCell::new(backend),
        })
    }

    /// Identity stamped on this algebra's multivectors.
    #[must_use]
    pub fn id(&self) -> AlgebraId {
        self.id
    }

    /// Number of basis vectors.
    #[must_use]
    pub fn n_dimensions(&self) -> usize {
        self.metric.len()
    }

    /// The metric factors.
    #[must_use]
    pub fn metric(&self) -> &[Factor<B::Symbol>] {
        &self.metric
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &AlgebraConfig {
        &self.config
    }

    /// Blade names indexed by bitmap.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name of a blade.
    #[must_use]
    pub fn blade_name(&self, bitmap: Bitmap) -> &str {
        self.names.get(bitmap as usize).map_or("?", String::as_str)
    }

    /// Bitmap of a named blade.
    #[must_use]
    pub fn bitmap_of(&self, name: &str) -> Option<Bitmap> {
        self.name_index.get(name).copied()
    }

    /// Bitmap of the pseudoscalar.
    #[must_use]
    pub fn full_bitmap(&self) -> Bitmap {
        ((1u64 << self.n_dimensions()) - 1) as Bitmap
    }

    /// Shared access to the back end.
    ///
    /// # Panics
    ///
    /// Panics if the back end is mutably borrowed, which only happens while
    /// an operation is running or a [`Algebra::backend_mut`] guard is alive.
    #[must_use]
    pub fn backend(&self) -> Ref<'_, B> {
        self.backend.borrow()
    }

    /// Exclusive access to the back end. Drop the guard before calling any
    /// operation.
    ///
    /// # Panics
    ///
    /// Panics if the back end is already borrowed.
    #[must_use]
    pub fn backend_mut(&self) -> RefMut<'_, B> {
        self.backend.borrow_mut()
    }

    /// Consumes the algebra, returning its back end.
    #[must_use]
    pub fn into_backend(self) -> B {
        self.backend.into_inner()
    }

    /// Checks that `mv` was created by this algebra.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Ownership`] otherwise.
    pub fn check_mine(&self, mv: &MultivectorOf<B>) -> Result<()> {
        if mv.algebra_id() == self.id {
            Ok(())
        } else {
            Err(AlgebraError::Ownership)
        }
    }

    /// Non-unit metric factors of `bitmap`, or `None` if it is null.
    #[must_use]
    pub fn metric_factors(&self, bitmap: Bitmap) -> Option<versor_core::Term<B::Symbol>> {
        metric_factors(&self.metric, bitmap)
    }

    /// True when every basis vector of `bitmap` squares to exactly one.
    #[must_use]
    pub fn is_euclidean(&self, bitmap: Bitmap) -> bool {
        is_euclidean(&self.metric, bitmap)
    }

    // === Scalar helpers ===

    /// Applies a scalar function, folding numbers without the back end.
    pub fn scalar_func(&self, func: ScalarFunc, args: &[Factor<B::Symbol>]) -> Factor<B::Symbol> {
        scalar_func(&mut *self.backend_mut(), func, args)
    }

    /// Applies a binary operator, folding numbers without the back end.
    pub fn binop(
        &self,
        op: BinOp,
        lhs: &Factor<B::Symbol>,
        rhs: &Factor<B::Symbol>,
    ) -> Factor<B::Symbol> {
        binop(&mut *self.backend_mut(), op, lhs, rhs)
    }

    /// Emits an operation comment when enabled in the configuration.
    pub(crate) fn annotate(&self, operation: &str) {
        if self.config.comments {
            let mut backend = self.backend_mut();
            backend.space();
            backend.comment(operation);
        }
    }

    /// Marks `mv` as unit, verifying the claim when configured to.
    pub(crate) fn mark_unit(&self, mut mv: MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        mv.set_known_unit(true);
        if let Some(tolerance) = self.config.verify_known_unit {
            if let Some(norm) = self.numeric_norm(&mv) {
                if (norm - 1.0).abs() > tolerance {
                    return Err(AlgebraError::KnownUnitViolation { norm });
                }
            }
        }
        Ok(mv)
    }

    /// Norm computed in plain arithmetic, if every value and metric factor
    /// involved is numeric.
    fn numeric_norm(&self, mv: &MultivectorOf<B>) -> Option<f64> {
        let mut sum = 0.0;
        for (bm, value) in mv.iter() {
            let x = value.as_numeric()?;
            let Some(factors) = self.metric_factors(bm) else {
                continue;
            };
            let m = versor_core::factor::numeric_product(&factors)?;
            sum += m * x * x;
        }
        Some(sum.abs().sqrt())
    }

    // === Constructors ===

    /// The zero multivector (no components).
    #[must_use]
    pub fn zero(&self) -> MultivectorOf<B> {
        Multivector::empty(self.id)
    }

    /// The unit scalar.
    ///
    /// # Errors
    ///
    /// Propagates back-end accumulation errors.
    pub fn one(&self) -> Result<MultivectorOf<B>> {
        let one = Multivector::new(self, |b| b.add(0, &[Factor::Numeric(1.0)], false))?;
        Ok(one.with_known_unit(true))
    }

    /// A scalar multivector; unit iff `value` is the literal 1.
    ///
    /// # Errors
    ///
    /// Propagates back-end accumulation errors.
    pub fn scalar(&self, value: Factor<B::Symbol>) -> Result<MultivectorOf<B>> {
        let unit = value.is_one();
        Ok(Multivector::new(self, |b| b.add(0, &[value], false))?.with_known_unit(unit))
    }

    /// The unit pseudoscalar; unit iff every metric factor is 1.
    ///
    /// # Errors
    ///
    /// Propagates back-end accumulation errors.
    pub fn pseudo_scalar(&self) -> Result<MultivectorOf<B>> {
        let full = self.full_bitmap();
        let unit = self.metric.iter().all(Factor::is_one);
        let ps = Multivector::new(self, |b| b.add(full, &[Factor::Numeric(1.0)], false))?;
        Ok(ps.with_known_unit(unit))
    }

    /// The basis vectors `e_i`; each is unit iff its metric factor is 1.
    ///
    /// # Errors
    ///
    /// Propagates back-end accumulation errors.
    pub fn basis_vectors(&self) -> Result<Vec<MultivectorOf<B>>> {
        (0..self.n_dimensions())
            .map(|i| {
                let unit = self.metric[i].is_one();
                let mv =
                    Multivector::new(self, |b| b.add(1 << i, &[Factor::Numeric(1.0)], false))?;
                Ok(mv.with_known_unit(unit))
            })
            .collect()
    }

    /// A 1-vector from one factor per dimension.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::DimensionMismatch`] if the count is wrong.
    pub fn vector(&self, components: &[Factor<B::Symbol>]) -> Result<MultivectorOf<B>> {
        if components.len() != self.n_dimensions() {
            return Err(AlgebraError::DimensionMismatch {
                expected: self.n_dimensions(),
                actual: components.len(),
            });
        }
        Multivector::new(self, |b| {
            for (i, value) in components.iter().enumerate() {
                b.add(1 << i, std::slice::from_ref(value), false)?;
            }
            Ok(())
        })
    }

    /// A multivector from named components.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnexpectedComponentKey`] for unknown names.
    pub fn mv<'k>(
        &self,
        components: impl IntoIterator<Item = (&'k str, Factor<B::Symbol>)>,
    ) -> Result<MultivectorOf<B>> {
        Multivector::new(self, |b| {
            for (name, value) in components {
                let bm = self
                    .bitmap_of(name)
                    .ok_or_else(|| AlgebraError::UnexpectedComponentKey(name.to_string()))?;
                b.add(bm, &[value], false)?;
            }
            Ok(())
        })
    }
}

impl<B: Backend> Algebra<B>
where
    B::Symbol: fmt::Display,
{
    /// Formats a multivector using the blade name table.
    #[must_use]
    pub fn format(&self, mv: &MultivectorOf<B>) -> String {
        let mut out = String::new();
        for (i, (bm, value)) in mv.iter().enumerate() {
            if i > 0 {
                out.push_str(" + ");
            }
            if bm == 0 {
                let _ = write!(out, "{value}");
            } else {
                let _ = write!(out, "{value}*{}", self.blade_name(bm));
            }
        }
        if out.is_empty() {
            out.push('0');
        }
        out
    }
}

impl<B: Backend> fmt::Debug for Algebra<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Algebra")
            .field("id", &self.id)
            .field("metric", &self.metric)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
