//! Scalar factors and terms.
//!
//! A term is an ordered list of factors that are implicitly multiplied.
//! Numeric factors are plain `f64` values; symbolic factors are opaque
//! handles owned by a back end.

use std::fmt;

use smallvec::SmallVec;

/// A single multiplicand: either a known number or a back-end symbol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Factor<S> {
    /// A literal number, folded at construction time.
    Numeric(f64),
    /// A back-end defined value.
    Symbolic(S),
}

/// An implicitly multiplied sequence of factors.
pub type Term<S> = SmallVec<[Factor<S>; 8]>;

impl<S> Factor<S> {
    /// Returns the literal number, if this factor is numeric.
    #[must_use]
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Factor::Numeric(x) => Some(*x),
            Factor::Symbolic(_) => None,
        }
    }

    /// Returns true if this is the literal number zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Factor::Numeric(x) if *x == 0.0)
    }

    /// Returns true if this is the literal number one.
    #[must_use]
    pub fn is_one(&self) -> bool {
        matches!(self, Factor::Numeric(x) if *x == 1.0)
    }

    /// Returns true if this factor is numeric.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Factor::Numeric(_))
    }

    /// Returns the symbol, if this factor is symbolic.
    #[must_use]
    pub fn as_symbol(&self) -> Option<&S> {
        match self {
            Factor::Numeric(_) => None,
            Factor::Symbolic(s) => Some(s),
        }
    }
}

impl<S> From<f64> for Factor<S> {
    fn from(value: f64) -> Self {
        Factor::Numeric(value)
    }
}

impl<S: fmt::Display> fmt::Display for Factor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::Numeric(x) => write!(f, "{x}"),
            Factor::Symbolic(s) => write!(f, "{s}"),
        }
    }
}

/// Returns the product of a term if every factor is numeric.
pub fn numeric_product<S>(term: &[Factor<S>]) -> Option<f64> {
    term.iter()
        .try_fold(1.0, |acc, factor| factor.as_numeric().map(|x| acc * x))
}
