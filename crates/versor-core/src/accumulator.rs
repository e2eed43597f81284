//! Per-component scalar accumulation.
//!
//! An accumulator collects the signed terms contributing to one output
//! component. Purely numeric terms are folded into a running number;
//! only terms with a symbolic factor are forwarded to the back end.

use tracing::trace;

use crate::backend::Backend;
use crate::error::{AlgebraError, Result};
use crate::factor::{numeric_product, Factor};

enum State<B: Backend> {
    Building {
        /// Sum of all purely numeric terms seen so far.
        numeric: f64,
        /// Back-end storage, allocated at the first symbolic term.
        var: Option<B::Var>,
    },
    Frozen(Factor<B::Symbol>),
}

/// Builder for a single scalar value.
///
/// Starts out accepting terms; the first call to [`Accumulator::value`]
/// freezes it, after which [`Accumulator::add`] fails.
pub struct Accumulator<B: Backend> {
    name: String,
    state: State<B>,
}

impl<B: Backend> Accumulator<B> {
    /// Creates an empty accumulator. The name is passed to the back end as
    /// a hint if storage is ever needed.
    #[must_use]
    pub fn new(name_hint: impl Into<String>) -> Self {
        Self {
            name: name_hint.into(),
            state: State::Building {
                numeric: 0.0,
                var: None,
            },
        }
    }

    /// The name hint.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true once the value has been read.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        matches!(self.state, State::Frozen(_))
    }

    /// Adds `term` (negated if `negate`) to the value.
    ///
    /// A term with a literal zero factor is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::FrozenMutation`] if the value was already read.
    pub fn add(&mut self, backend: &mut B, term: &[Factor<B::Symbol>], negate: bool) -> Result<()> {
        let State::Building { numeric, var } = &mut self.state else {
            return Err(AlgebraError::FrozenMutation {
                name: self.name.clone(),
            });
        };

        if term.iter().any(Factor::is_zero) {
            return Ok(());
        }

        if let Some(product) = numeric_product(term) {
            if negate {
                *numeric -= product;
            } else {
                *numeric += product;
            }
            return Ok(());
        }

        let init = var.is_none();
        let name = &self.name;
        let var = var.get_or_insert_with(|| backend.make_var(name));
        backend.emit_term(var, term, negate, init);
        Ok(())
    }

    /// Reads the value, freezing the accumulator on first use.
    ///
    /// If any symbolic term was added, a non-zero numeric remainder is
    /// flushed to the back end as one last addition and the back-end symbol
    /// is returned; otherwise the plain numeric total is returned.
    pub fn value(&mut self, backend: &mut B) -> Factor<B::Symbol> {
        let value = match &mut self.state {
            State::Frozen(value) => return value.clone(),
            State::Building { numeric, var } => match var.take() {
                Some(mut var) => {
                    if *numeric != 0.0 {
                        backend.emit_term(&mut var, &[Factor::Numeric(*numeric)], false, false);
                    }
                    Factor::Symbolic(backend.finish_var(var))
                }
                None => Factor::Numeric(*numeric),
            },
        };
        trace!(name = %self.name, symbolic = !value.is_numeric(), "accumulator frozen");
        self.state = State::Frozen(value.clone());
        value
    }
}

impl<B: Backend> std::fmt::Debug for Accumulator<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accumulator")
            .field("name", &self.name)
            .field("frozen", &self.is_frozen())
            .finish()
    }
}
