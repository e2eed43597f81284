//! Bilinear products over blade pairs.
//!
//! Every product is the geometric product restricted to a subset of the
//! output grades: for blades of grades `r` and `s` meeting in a blade of
//! grade `t`, the product keeps or drops the pair depending on `r`, `s`, `t`.

use versor_core::blade::{grade, product_flips, reverse_flips};
use versor_core::{Accumulator, Backend, Bitmap, Factor, Result};

use crate::algebra::{Algebra, MultivectorOf};
use crate::multivector::Multivector;

/// Which blade pairs a product keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Product {
    /// All pairs.
    Geometric,
    /// `t = r + s`.
    Wedge,
    /// `t = s - r`.
    ContractLeft,
    /// `t = r - s`.
    ContractRight,
    /// `t = 0`.
    Scalar,
    /// `t = |r - s|`.
    Dot,
}

impl Product {
    /// Whether the pair of blades `a`, `b` contributes.
    #[must_use]
    pub fn includes(self, a: Bitmap, b: Bitmap) -> bool {
        let (r, s, t) = (grade(a), grade(b), grade(a ^ b));
        match self {
            Self::Geometric => true,
            Self::Wedge => t == r + s,
            Self::ContractLeft => s >= r && t == s - r,
            Self::ContractRight => r >= s && t == r - s,
            Self::Scalar => t == 0,
            Self::Dot => t == r.abs_diff(s),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Geometric => "geometric product",
            Self::Wedge => "wedge product",
            Self::ContractLeft => "left contraction",
            Self::ContractRight => "right contraction",
            Self::Scalar => "scalar product",
            Self::Dot => "dot product",
        }
    }
}

impl<B: Backend> Algebra<B> {
    /// Product of two multivectors, keeping only pairs accepted by `kind`.
    ///
    /// The result is unit iff both operands are unit and no pair was
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn product2(
        &self,
        kind: Product,
        a: &MultivectorOf<B>,
        b: &MultivectorOf<B>,
    ) -> Result<MultivectorOf<B>> {
        self.check_mine(a)?;
        self.check_mine(b)?;
        self.annotate(kind.name());
        let mut excluded = false;
        let out = Multivector::new(self, |out| {
            let mut term: Vec<Factor<B::Symbol>> = Vec::new();
            for (abm, av) in a.iter() {
                for (bbm, bv) in b.iter() {
                    if !kind.includes(abm, bbm) {
                        excluded = true;
                        continue;
                    }
                    let Some(metric) = self.metric_factors(abm & bbm) else {
                        continue;
                    };
                    term.clear();
                    term.extend(metric);
                    term.push(av.clone());
                    term.push(bv.clone());
                    out.add(abm ^ bbm, &term, product_flips(abm, bbm) % 2 == 1)?;
                }
            }
            Ok(())
        })?;
        let unit = !excluded && a.known_unit() && b.known_unit();
        Ok(out.with_known_unit(unit))
    }

    /// Left-associated product of any number of operands.
    ///
    /// No operands yields `1`; a single operand is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn product(&self, kind: Product, mvs: &[&MultivectorOf<B>]) -> Result<MultivectorOf<B>> {
        let Some((first, rest)) = mvs.split_first() else {
            return self.one();
        };
        self.check_mine(first)?;
        let mut acc = (*first).clone();
        for mv in rest {
            acc = self.product2(kind, &acc, mv)?;
        }
        Ok(acc)
    }

    /// Geometric product `a b`.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn geometric_product(
        &self,
        a: &MultivectorOf<B>,
        b: &MultivectorOf<B>,
    ) -> Result<MultivectorOf<B>> {
        self.product2(Product::Geometric, a, b)
    }

    /// Outer product `a ∧ b`.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn wedge_product(
        &self,
        a: &MultivectorOf<B>,
        b: &MultivectorOf<B>,
    ) -> Result<MultivectorOf<B>> {
        self.product2(Product::Wedge, a, b)
    }

    /// Left contraction `a ⌋ b`.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn contract_left(
        &self,
        a: &MultivectorOf<B>,
        b: &MultivectorOf<B>,
    ) -> Result<MultivectorOf<B>> {
        self.product2(Product::ContractLeft, a, b)
    }

    /// Right contraction `a ⌊ b`.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn contract_right(
        &self,
        a: &MultivectorOf<B>,
        b: &MultivectorOf<B>,
    ) -> Result<MultivectorOf<B>> {
        self.product2(Product::ContractRight, a, b)
    }

    /// Symmetric inner product.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn dot_product(
        &self,
        a: &MultivectorOf<B>,
        b: &MultivectorOf<B>,
    ) -> Result<MultivectorOf<B>> {
        self.product2(Product::Dot, a, b)
    }

    /// Scalar part of `a b`, as a multivector.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn scalar_product_mv(
        &self,
        a: &MultivectorOf<B>,
        b: &MultivectorOf<B>,
    ) -> Result<MultivectorOf<B>> {
        self.product2(Product::Scalar, a, b)
    }

    /// Scalar part of `a b`, as a scalar.
    ///
    /// Only blades present in both operands contribute; each pair carries
    /// the metric factor and the reversion sign of its blade.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn scalar_product(
        &self,
        a: &MultivectorOf<B>,
        b: &MultivectorOf<B>,
    ) -> Result<Factor<B::Symbol>> {
        self.check_mine(a)?;
        self.check_mine(b)?;
        self.annotate("scalar product");
        let mut acc = Accumulator::new("scalar");
        let mut term: Vec<Factor<B::Symbol>> = Vec::new();
        for (bm, av) in a.iter() {
            let Some(bv) = b.get(bm) else {
                continue;
            };
            let Some(metric) = self.metric_factors(bm) else {
                continue;
            };
            term.clear();
            term.extend(metric);
            term.push(av.clone());
            term.push(bv.clone());
            acc.add(&mut *self.backend_mut(), &term, reverse_flips(bm) % 2 == 1)?;
        }
        Ok(acc.value(&mut *self.backend_mut()))
    }
}
