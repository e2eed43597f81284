//! Expression node types.

use smallvec::SmallVec;
use versor_core::{BinOp, ScalarFunc};

use crate::handle::ExprHandle;

/// Unique identifier for an input symbol.
pub type SymbolId = u32;

/// Unique identifier for a local (an emitted component or temporary).
pub type LocalId = u32;

/// An expression node stored in the arena.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprNode {
    // === Atoms ===
    /// A literal number, stored as its bit pattern so nodes can be hashed.
    ///
    /// Invariant: `-0.0` is normalized to `0.0`.
    Number(u64),

    /// An input symbol supplied by the caller.
    Symbol(SymbolId),

    /// A local produced by an emitted statement.
    Local(LocalId),

    // === Compound Expressions ===
    /// Sum of expressions. Invariant: at least 2 arguments.
    Add(SmallVec<[ExprHandle; 4]>),

    /// Product of expressions. Invariant: at least 2 arguments.
    Mul(SmallVec<[ExprHandle; 4]>),

    /// Negation: -expr.
    Neg(ExprHandle),

    /// A binary operation.
    Binary {
        /// The operator.
        op: BinOp,
        /// Left operand.
        lhs: ExprHandle,
        /// Right operand.
        rhs: ExprHandle,
    },

    /// A scalar function application.
    Function {
        /// The function.
        func: ScalarFunc,
        /// The arguments.
        args: SmallVec<[ExprHandle; 2]>,
    },
}

impl ExprNode {
    /// Builds a number node.
    #[must_use]
    pub fn number(value: f64) -> Self {
        let value = if value == 0.0 { 0.0 } else { value };
        ExprNode::Number(value.to_bits())
    }

    /// Returns the literal value of a number node.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ExprNode::Number(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }

    /// Returns true if this node has no children.
    #[must_use]
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            ExprNode::Number(_) | ExprNode::Symbol(_) | ExprNode::Local(_)
        )
    }

    /// Returns the children of this node.
    #[must_use]
    pub fn children(&self) -> SmallVec<[ExprHandle; 4]> {
        match self {
            ExprNode::Number(_) | ExprNode::Symbol(_) | ExprNode::Local(_) => SmallVec::new(),
            ExprNode::Add(args) | ExprNode::Mul(args) => args.clone(),
            ExprNode::Neg(arg) => smallvec::smallvec![*arg],
            ExprNode::Binary { lhs, rhs, .. } => smallvec::smallvec![*lhs, *rhs],
            ExprNode::Function { args, .. } => args.iter().copied().collect(),
        }
    }
}
