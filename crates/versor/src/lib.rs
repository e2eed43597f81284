//! # Versor
//!
//! A symbolic/numeric compiler core for geometric (Clifford) algebra.
//!
//! Versor computes multivector operations over a diagonal metric and emits
//! only the scalar work that survives numeric folding and cancellation.
//! How that work is realized is up to the back end: plain numbers, or a
//! recorded statement list that can be rendered as source text.
//!
//! ## Features
//!
//! - **Deferred Accumulation**: numeric terms fold without reaching the back end
//! - **Sparse Multivectors**: only touched blades are stored
//! - **Full Operation Set**: products, norms, inverse, duals, `exp`/`log`, outermorphisms
//! - **Cancelling Sandwiches**: provably-zero contributions are never emitted
//!
//! ## Quick Start
//!
//! ```rust
//! use versor::prelude::*;
//!
//! let mut backend = ExprBackend::new();
//! let a = backend.sym("a");
//! let b = backend.sym("b");
//!
//! let alg = Algebra::new(vec![1.0.into(); 3], blade_names(&["x", "y", "z"]), backend)?;
//! let rotor = alg.mv([("1", a), ("xy", b)])?;
//! let z = alg.mv([("z", 1.0.into())])?;
//! let rotated = alg.sandwich(&rotor)?.apply(&z)?;
//!
//! // The xyz contributions cancel before any code is emitted.
//! assert!(rotated.get(0b111).is_none());
//! println!("{}", alg.backend().render());
//! # Ok::<(), AlgebraError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use versor_algebra as algebra;
pub use versor_core as core;
pub use versor_expr as expr;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use versor_algebra::{
        blade_names, default_blade_names, Algebra, AlgebraConfig, Multivector, MultivectorOf,
        PreparedSandwich, Product, SandwichOptions,
    };
    pub use versor_core::{AlgebraError, Backend, Factor, NumericBackend};
    pub use versor_expr::{Evaluator, ExprBackend};
}
