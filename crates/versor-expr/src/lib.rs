//! # versor-expr
//!
//! Symbolic back end for the Versor geometric algebra compiler.
//!
//! This crate provides:
//! - Arena-allocated expression storage with hash-consing
//! - Type-safe, totally ordered expression handles
//! - A statement log of every emitted assignment and temporary
//! - Text rendering and numeric evaluation of the recorded program
//!
//! ## Design Principles
//!
//! - **Hash-Consing**: every structurally unique expression is stored once,
//!   so repeated scalar functions and products share one temporary
//! - **Observable emission**: the statement log is the measure of generated
//!   code size, which makes cancellation visible to tests

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod backend;
pub mod eval;
pub mod expr;
pub mod handle;
pub mod intern;
pub mod render;

#[cfg(test)]
mod proptests;

pub use arena::ExprArena;
pub use backend::{ExprBackend, Local, Statement, VarSlot};
pub use eval::Evaluator;
pub use expr::{ExprNode, LocalId, SymbolId};
pub use handle::ExprHandle;
