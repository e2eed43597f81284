//! # versor-algebra
//!
//! Geometric algebra operations over a pluggable scalar back end.
//!
//! This crate provides:
//! - [`Algebra`]: a diagonal-metric Clifford algebra bound to a back end
//! - [`Multivector`]: sparse, build-once multivectors owned by one algebra
//! - Products, involutions, the norm family, duals, `exp`/`log`
//! - Outermorphisms of sparse linear maps
//! - Prepared sandwiches and chained conjugation through a [`ProdTree`]
//!
//! ## Example
//!
//! ```
//! use versor_algebra::{blade_names, Algebra};
//! use versor_core::NumericBackend;
//!
//! let alg = Algebra::new(vec![1.0.into(); 3], blade_names(&["x", "y", "z"]), NumericBackend)?;
//! let a = alg.mv([("x", 3.0.into()), ("y", 4.0.into())])?;
//! assert_eq!(alg.norm(&a)?.as_numeric(), Some(5.0));
//! # Ok::<(), versor_core::AlgebraError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod algebra;
pub mod config;
pub mod linear;
pub mod multivector;
pub mod norms;
pub mod outermorphism;
pub mod prod_tree;
pub mod products;
pub mod sandwich;

#[cfg(test)]
mod proptests;

pub use algebra::{Algebra, AlgebraId, MultivectorOf};
pub use config::{blade_names, default_blade_names, AlgebraConfig};
pub use multivector::{Multivector, MultivectorBuilder};
pub use norms::Slerp;
pub use outermorphism::LinearMap;
pub use prod_tree::{Leaf, ProdTree, ProdVisitor};
pub use products::Product;
pub use sandwich::{PreparedSandwich, SandwichOptions};
