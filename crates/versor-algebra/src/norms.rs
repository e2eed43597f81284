//! The norm family and the operations built on it: inverse, normalization,
//! duals, the exponential and logarithm, and interpolation.

use tracing::warn;
use versor_core::blade::{grade, is_odd, reverse_flips};
use versor_core::factor::numeric_product;
use versor_core::{Accumulator, AlgebraError, Backend, BinOp, Bitmap, Factor, Result, ScalarFunc};

use crate::algebra::{Algebra, MultivectorOf};
use crate::multivector::Multivector;

/// Squared norms below this are reported when clamped to zero.
const NEGATIVE_NORM_WARNING: f64 = -1e-9;

impl<B: Backend> Algebra<B> {
    /// `Σ metric(bm) · v²` over all components; literal 1 for unit operands.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Ownership`] for foreign operands.
    pub fn norm_squared(&self, mv: &MultivectorOf<B>) -> Result<Factor<B::Symbol>> {
        self.check_mine(mv)?;
        if mv.known_unit() {
            return Ok(Factor::Numeric(1.0));
        }
        self.annotate("norm squared");
        let mut acc = Accumulator::new("norm_squared");
        let mut term: Vec<Factor<B::Symbol>> = Vec::new();
        for (bm, value) in mv.iter() {
            let Some(metric) = self.metric_factors(bm) else {
                continue;
            };
            term.clear();
            term.extend(metric);
            term.push(value.clone());
            term.push(value.clone());
            acc.add(&mut *self.backend_mut(), &term, false)?;
        }
        Ok(acc.value(&mut *self.backend_mut()))
    }

    /// The bitmap of the only component that may be non-zero, provided the
    /// blade squares to exactly 1 in this metric.
    fn single_euclidean(&self, mv: &MultivectorOf<B>) -> Option<Bitmap> {
        let mut candidates = mv.iter().filter(|(_, value)| !value.is_zero());
        let bm = match (candidates.next(), candidates.next()) {
            (None, _) => return Some(0),
            (Some((bm, _)), None) => bm,
            (Some(_), Some(_)) => return None,
        };
        self.is_euclidean(bm).then_some(bm)
    }

    /// The magnitude of a versor.
    ///
    /// Negative squared norms are floored at zero unless the configuration
    /// disables clamping, in which case their absolute value is used.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Ownership`] for foreign operands.
    pub fn norm(&self, mv: &MultivectorOf<B>) -> Result<Factor<B::Symbol>> {
        self.check_mine(mv)?;
        if mv.known_unit() {
            return Ok(Factor::Numeric(1.0));
        }
        if let Some(bm) = self.single_euclidean(mv) {
            return Ok(self.scalar_func(ScalarFunc::Abs, &[mv.value(bm)]));
        }
        let ns = self.norm_squared(mv)?;
        let magnitude = if self.config().clamp_negative_norm {
            if let Some(x) = ns.as_numeric() {
                if x < NEGATIVE_NORM_WARNING {
                    warn!(norm_squared = x, "negative squared norm clamped to zero");
                }
            }
            self.scalar_func(ScalarFunc::Max, &[Factor::Numeric(0.0), ns])
        } else {
            self.scalar_func(ScalarFunc::Abs, &[ns])
        };
        Ok(self.scalar_func(ScalarFunc::Sqrt, &[magnitude]))
    }

    /// Inverse of a versor.
    ///
    /// A unit versor is inverted by reversion alone.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::DivisionByZero`] if the squared norm is a
    /// literal zero.
    pub fn inverse(&self, mv: &MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        self.check_mine(mv)?;
        if mv.known_unit() {
            return self.reverse(mv);
        }
        let ns = self.norm_squared(mv)?;
        if ns.is_zero() {
            return Err(AlgebraError::DivisionByZero("inverse"));
        }
        self.annotate("inverse");

        // (v B)^-1 = ±B / (m v) for a single blade with numeric metric m.
        if let [(bm, value)] = mv.iter().collect::<Vec<_>>().as_slice() {
            let numeric_metric = self
                .metric_factors(*bm)
                .and_then(|factors| numeric_product(&factors));
            if let Some(m) = numeric_metric {
                let sign = if is_odd(reverse_flips(*bm)) { -1.0 } else { 1.0 };
                let inv = self.binop(BinOp::Div, &Factor::Numeric(sign / m), value);
                return Multivector::new(self, |b| b.add(*bm, &[inv], false));
            }
        }

        let inv = self.binop(BinOp::Div, &Factor::Numeric(1.0), &ns);
        Multivector::new(self, |b| {
            for (bm, value) in mv.iter() {
                b.add(bm, &[inv.clone(), value.clone()], is_odd(reverse_flips(bm)))?;
            }
            Ok(())
        })
    }

    /// Scales a versor to unit norm and marks it as such.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::DivisionByZero`] if the operand has zero norm.
    pub fn normalize(&self, mv: &MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        self.check_mine(mv)?;
        if mv.known_unit() {
            return Ok(mv.clone());
        }
        self.annotate("normalize");
        if let Some(bm) = self.single_euclidean(mv) {
            let value = mv.value(bm);
            if value.is_zero() {
                return Err(AlgebraError::DivisionByZero("normalize"));
            }
            let sign = self.scalar_func(ScalarFunc::Sign, &[value]);
            let out = Multivector::new(self, |b| b.add(bm, &[sign], false))?;
            return self.mark_unit(out);
        }
        let ns = self.norm_squared(mv)?;
        if ns.is_zero() {
            return Err(AlgebraError::DivisionByZero("normalize"));
        }
        let magnitude = self.scalar_func(ScalarFunc::Abs, &[ns]);
        let root = self.scalar_func(ScalarFunc::Sqrt, &[magnitude]);
        let factor = self.binop(BinOp::Div, &Factor::Numeric(1.0), &root);
        let out = self.scale(&factor, mv)?;
        self.mark_unit(out)
    }

    /// `mv ⌋ I⁻¹`.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::NullPseudoScalar`] in a degenerate metric.
    pub fn dual(&self, mv: &MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        self.check_mine(mv)?;
        let ps = self.pseudo_scalar()?;
        let inv = self.inverse(&ps).map_err(|err| match err {
            AlgebraError::DivisionByZero(_) => AlgebraError::NullPseudoScalar,
            other => other,
        })?;
        self.contract_left(mv, &inv)
    }

    /// `mv ⌋ I`, the inverse of [`Algebra::dual`].
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Ownership`] for foreign operands.
    pub fn undual(&self, mv: &MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        self.check_mine(mv)?;
        let ps = self.pseudo_scalar()?;
        self.contract_left(mv, &ps)
    }

    /// Exponential of a 2-blade in a positive semi-definite metric.
    ///
    /// The argument is not checked to be a blade.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Ownership`] for foreign operands.
    pub fn exp(&self, bivector: &MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        self.check_mine(bivector)?;
        let ns = self.norm_squared(bivector)?;
        if ns.is_zero() {
            let one = self.one()?;
            let out = self.plus(&[&one, bivector])?;
            let unit = bivector.iter().all(|(_, value)| value.is_zero());
            return Ok(out.with_known_unit(unit));
        }
        self.annotate("exp");
        let alpha = self.scalar_func(ScalarFunc::Sqrt, &[ns]);
        let cos = self.scalar_func(ScalarFunc::Cos, &[alpha.clone()]);
        let sin = self.scalar_func(ScalarFunc::Sin, &[alpha.clone()]);
        let weight = self.binop(BinOp::Div, &sin, &alpha);
        let out = Multivector::new(self, |b| {
            b.add(0, &[cos], false)?;
            for (bm, value) in bivector.iter() {
                b.add(bm, &[weight.clone(), value.clone()], false)?;
            }
            Ok(())
        })?;
        self.mark_unit(out)
    }

    /// Logarithm of a 3-D rotor: the bivector `B` with `exp(B) = R`.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::DivisionByZero`] if the grade-2 part has a
    /// literal zero norm.
    pub fn log(&self, rotor: &MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        self.check_mine(rotor)?;
        let r0 = rotor.value(0);
        let r2 = self.extract(|bm| grade(bm) == 2, rotor)?;
        let n = self.norm(&r2)?;
        if n.is_zero() {
            return Err(AlgebraError::DivisionByZero("log"));
        }
        self.annotate("log");
        let angle = self.scalar_func(ScalarFunc::Atan2, &[n.clone(), r0]);
        let factor = self.binop(BinOp::Div, &angle, &n);
        self.scale(&factor, &r2)
    }

    /// `norm(a - b)`.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Ownership`] for foreign operands.
    pub fn dist(&self, a: &MultivectorOf<B>, b: &MultivectorOf<B>) -> Result<Factor<B::Symbol>> {
        let diff = self.minus(a, b)?;
        self.norm(&diff)
    }

    /// Angle between two 1-vectors.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Ownership`] for foreign operands.
    pub fn angle(&self, a: &MultivectorOf<B>, b: &MultivectorOf<B>) -> Result<Factor<B::Symbol>> {
        let wedge = self.wedge_product(a, b)?;
        let sine = self.norm(&wedge)?;
        let cosine = self.scalar_product(a, b)?;
        Ok(self.scalar_func(ScalarFunc::Atan2, &[sine, cosine]))
    }

    /// Prepares spherical interpolation between two unit 1-vectors.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Ownership`] for foreign operands.
    pub fn slerp<'a>(
        &'a self,
        a: &'a MultivectorOf<B>,
        b: &'a MultivectorOf<B>,
    ) -> Result<Slerp<'a, B>> {
        let angle = self.angle(a, b)?;
        let sin_angle = self.scalar_func(ScalarFunc::Sin, &[angle.clone()]);
        Ok(Slerp {
            algebra: self,
            a,
            b,
            angle,
            sin_angle,
        })
    }
}

/// Spherical interpolation between two fixed endpoints.
pub struct Slerp<'a, B: Backend> {
    algebra: &'a Algebra<B>,
    a: &'a MultivectorOf<B>,
    b: &'a MultivectorOf<B>,
    angle: Factor<B::Symbol>,
    sin_angle: Factor<B::Symbol>,
}

impl<B: Backend> Slerp<'_, B> {
    /// The angle between the endpoints.
    #[must_use]
    pub fn angle(&self) -> &Factor<B::Symbol> {
        &self.angle
    }

    /// The point at parameter `t`; `t = 0` gives the first endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::KnownUnitViolation`] if verification is
    /// enabled and the endpoints were not unit.
    pub fn at(&self, t: &Factor<B::Symbol>) -> Result<MultivectorOf<B>> {
        let alg = self.algebra;
        alg.annotate("slerp");
        let weight = |fraction: &Factor<B::Symbol>| {
            let scaled = alg.binop(BinOp::Mul, fraction, &self.angle);
            let sine = alg.scalar_func(ScalarFunc::Sin, &[scaled]);
            alg.binop(BinOp::Div, &sine, &self.sin_angle)
        };
        let rest = alg.binop(BinOp::Sub, &Factor::Numeric(1.0), t);
        let wa = weight(&rest);
        let wb = weight(t);
        let out = Multivector::new(alg, |out| {
            for (bm, value) in self.a.iter() {
                out.add(bm, &[wa.clone(), value.clone()], false)?;
            }
            for (bm, value) in self.b.iter() {
                out.add(bm, &[wb.clone(), value.clone()], false)?;
            }
            Ok(())
        })?;
        alg.mark_unit(out)
    }
}
