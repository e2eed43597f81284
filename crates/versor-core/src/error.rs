//! Error taxonomy shared by every Versor crate.

use thiserror::Error;

/// Errors raised while building or combining multivectors.
///
/// All errors are fail-fast: the operation that raised one produces no
/// partially built result.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum AlgebraError {
    /// The blade name table does not have `2^n` entries.
    #[error("name table has {actual} entries, expected {expected}")]
    Configuration {
        /// Required number of names (`2^n`).
        expected: usize,
        /// Number of names supplied.
        actual: usize,
    },

    /// The metric has more directions than a blade bitmap can index.
    #[error("{actual} dimensions requested, at most {max} supported")]
    TooManyDimensions {
        /// Largest supported dimension.
        max: u32,
        /// Number of metric entries supplied.
        actual: usize,
    },

    /// An operand was created by a different algebra.
    #[error("multivector belongs to a different algebra")]
    Ownership,

    /// A term was added to an accumulator after its value was read.
    #[error("accumulator `{name}` is frozen")]
    FrozenMutation {
        /// Name hint of the offending accumulator.
        name: String,
    },

    /// A component name passed to `mv` is not in the name table.
    #[error("unexpected component key `{0}`")]
    UnexpectedComponentKey(String),

    /// The operand of an inverting operation is metrically null.
    #[error("division by zero in {0}")]
    DivisionByZero(&'static str),

    /// The pseudoscalar squares to zero, so the dual is undefined.
    #[error("pseudoscalar is null under this metric")]
    NullPseudoScalar,

    /// A matrix or component list does not match the algebra dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Required size.
        expected: usize,
        /// Supplied size.
        actual: usize,
    },

    /// A result marked as unit has a numeric norm away from 1.
    #[error("multivector marked unit has norm {norm}")]
    KnownUnitViolation {
        /// The offending norm.
        norm: f64,
    },
}

/// Result alias used across Versor.
pub type Result<T, E = AlgebraError> = std::result::Result<T, E>;
