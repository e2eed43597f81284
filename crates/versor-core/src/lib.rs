//! # versor-core
//!
//! Leaf layer of the Versor geometric algebra compiler.
//!
//! This crate provides:
//! - Blade bitmap combinatorics (grades, sign parities, metric factors)
//! - The `Factor`/`Term` representation of scalar products
//! - The `Backend` interface through which surviving terms are emitted
//! - The `Accumulator`, a per-component scalar builder with a numeric fast path
//!
//! ## Design Principles
//!
//! - **Numeric folding first**: purely numeric terms never reach a back end
//! - **Explicit lifecycles**: accumulators are either building or frozen
//! - **Ordered symbols**: back-end symbols are totally ordered so products can
//!   be canonicalized before emission

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod accumulator;
pub mod backend;
pub mod blade;
pub mod error;
pub mod factor;

#[cfg(test)]
mod proptests;

pub use accumulator::Accumulator;
pub use backend::{binop, scalar_func, Backend, BinOp, NumericBackend, ScalarFunc};
pub use blade::Bitmap;
pub use error::{AlgebraError, Result};
pub use factor::{Factor, Term};
