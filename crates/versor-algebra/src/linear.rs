//! Grade-wise and linear operations: involutions, scaling, filtering, sums.

use versor_core::blade::{grade, is_odd, reverse_flips};
use versor_core::{Backend, Bitmap, Factor, Result};

use crate::algebra::{Algebra, MultivectorOf};
use crate::multivector::Multivector;

impl<B: Backend> Algebra<B> {
    /// Re-emits every component, negating those where `flip` holds.
    fn resign(
        &self,
        mv: &MultivectorOf<B>,
        flip: impl Fn(Bitmap) -> bool,
    ) -> Result<MultivectorOf<B>> {
        self.check_mine(mv)?;
        let out = Multivector::new(self, |b| {
            for (bm, value) in mv.iter() {
                b.add(bm, std::slice::from_ref(value), flip(bm))?;
            }
            Ok(())
        })?;
        Ok(out.with_known_unit(mv.known_unit()))
    }

    /// `-mv`.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn negate(&self, mv: &MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        self.annotate("negate");
        self.resign(mv, |_| true)
    }

    /// Grade involution: odd grades change sign.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn grade_involution(&self, mv: &MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        self.annotate("grade involution");
        self.resign(mv, |bm| is_odd(grade(bm)))
    }

    /// Reversion: grade `k` changes sign iff `k(k-1)/2` is odd.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn reverse(&self, mv: &MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        self.annotate("reverse");
        self.resign(mv, |bm| is_odd(reverse_flips(bm)))
    }

    /// Clifford conjugation: reversion composed with grade involution.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn conjugate(&self, mv: &MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        self.annotate("conjugate");
        self.resign(mv, |bm| is_odd(grade(bm) + reverse_flips(bm)))
    }

    /// Multiplies every component by `factor`.
    ///
    /// A literal zero factor yields a multivector with no components at all.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn scale(
        &self,
        factor: &Factor<B::Symbol>,
        mv: &MultivectorOf<B>,
    ) -> Result<MultivectorOf<B>> {
        self.check_mine(mv)?;
        if factor.is_zero() {
            return Ok(self.zero());
        }
        self.annotate("scale");
        Multivector::new(self, |b| {
            for (bm, value) in mv.iter() {
                b.add(bm, &[factor.clone(), value.clone()], false)?;
            }
            Ok(())
        })
    }

    /// Keeps the components whose bitmap satisfies `keep`.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn extract(
        &self,
        keep: impl Fn(Bitmap) -> bool,
        mv: &MultivectorOf<B>,
    ) -> Result<MultivectorOf<B>> {
        self.check_mine(mv)?;
        Multivector::new(self, |b| {
            for (bm, value) in mv.iter().filter(|(bm, _)| keep(*bm)) {
                b.add(bm, std::slice::from_ref(value), false)?;
            }
            Ok(())
        })
    }

    /// Keeps the grade-`k` components.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn extract_grade(&self, k: u32, mv: &MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        self.extract(|bm| grade(bm) == k, mv)
    }

    /// Component-wise sum. A single operand is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn plus(&self, mvs: &[&MultivectorOf<B>]) -> Result<MultivectorOf<B>> {
        for mv in mvs {
            self.check_mine(mv)?;
        }
        match mvs {
            [] => Ok(self.zero()),
            [single] => Ok((*single).clone()),
            _ => {
                self.annotate("plus");
                Multivector::new(self, |b| {
                    for mv in mvs {
                        for (bm, value) in mv.iter() {
                            b.add(bm, std::slice::from_ref(value), false)?;
                        }
                    }
                    Ok(())
                })
            }
        }
    }

    /// `a - b` in a single pass.
    ///
    /// # Errors
    ///
    /// Returns [`versor_core::AlgebraError::Ownership`] for foreign operands.
    pub fn minus(&self, a: &MultivectorOf<B>, b: &MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        self.check_mine(a)?;
        self.check_mine(b)?;
        self.annotate("minus");
        Multivector::new(self, |out| {
            for (bm, value) in a.iter() {
                out.add(bm, std::slice::from_ref(value), false)?;
            }
            for (bm, value) in b.iter() {
                out.add(bm, std::slice::from_ref(value), true)?;
            }
            Ok(())
        })
    }
}
