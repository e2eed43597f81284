//! The interface through which surviving terms are emitted.
//!
//! A back end decides how a component is realized: evaluated to a number,
//! written out as source text, or lowered to an instruction stream. The core
//! only calls it for terms that still carry a symbolic factor after numeric
//! folding, and always in a fixed order, so text emitting back ends produce
//! one statement per call.

use std::convert::Infallible;
use std::fmt::Debug;
use std::hash::Hash;

use smallvec::SmallVec;

use crate::factor::Factor;

/// Scalar functions a back end must be able to express.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarFunc {
    /// Square root.
    Sqrt,
    /// Absolute value.
    Abs,
    /// Sign: -1, 0 or 1.
    Sign,
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// Two-argument arctangent `atan2(y, x)`.
    Atan2,
    /// Maximum of two values.
    Max,
}

impl ScalarFunc {
    /// Name used by text back ends.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ScalarFunc::Sqrt => "sqrt",
            ScalarFunc::Abs => "abs",
            ScalarFunc::Sign => "sign",
            ScalarFunc::Sin => "sin",
            ScalarFunc::Cos => "cos",
            ScalarFunc::Atan2 => "atan2",
            ScalarFunc::Max => "max",
        }
    }

    /// Number of arguments the function takes.
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            ScalarFunc::Atan2 | ScalarFunc::Max => 2,
            _ => 1,
        }
    }

    /// Evaluates the function on numbers. Wrong arity yields NaN.
    #[must_use]
    pub fn eval(self, args: &[f64]) -> f64 {
        match (self, args) {
            (ScalarFunc::Sqrt, [x]) => x.sqrt(),
            (ScalarFunc::Abs, [x]) => x.abs(),
            (ScalarFunc::Sign, [x]) => sign(*x),
            (ScalarFunc::Sin, [x]) => x.sin(),
            (ScalarFunc::Cos, [x]) => x.cos(),
            (ScalarFunc::Atan2, [y, x]) => y.atan2(*x),
            (ScalarFunc::Max, [a, b]) => a.max(*b),
            _ => f64::NAN,
        }
    }
}

/// Sign with `sign(0) == 0`, unlike `f64::signum`.
#[must_use]
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}

/// Binary arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
}

impl BinOp {
    /// Operator token used by text back ends.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }

    /// Evaluates the operator on numbers.
    #[must_use]
    pub fn eval(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
        }
    }
}

/// A code generation target.
///
/// `Symbol` must be totally ordered and hashable: products are canonicalized
/// by sorting their symbolic factors before they are emitted.
pub trait Backend {
    /// Handle to a value the back end has produced.
    type Symbol: Clone + Ord + Hash + Debug;

    /// Storage for one output component while it is being accumulated.
    type Var;

    /// Allocates storage for a component. Called at most once per
    /// accumulator, at its first symbolic contribution.
    fn make_var(&mut self, name_hint: &str) -> Self::Var;

    /// Emits `var = ±term` when `init` is set, `var += ±term` otherwise.
    fn emit_term(
        &mut self,
        var: &mut Self::Var,
        term: &[Factor<Self::Symbol>],
        negate: bool,
        init: bool,
    );

    /// Closes a component and returns the symbol holding its value.
    fn finish_var(&mut self, var: Self::Var) -> Self::Symbol;

    /// Applies a scalar function. At least one argument is symbolic.
    fn scalar_func(&mut self, func: ScalarFunc, args: &[Factor<Self::Symbol>]) -> Self::Symbol;

    /// Applies a binary operator. At least one operand is symbolic.
    fn binop(
        &mut self,
        op: BinOp,
        lhs: &Factor<Self::Symbol>,
        rhs: &Factor<Self::Symbol>,
    ) -> Self::Symbol;

    /// Visual separator between operations.
    fn space(&mut self) {}

    /// Free-form annotation.
    fn comment(&mut self, _text: &str) {}
}

/// Applies `func`, evaluating directly when every argument is numeric.
pub fn scalar_func<B: Backend>(
    backend: &mut B,
    func: ScalarFunc,
    args: &[Factor<B::Symbol>],
) -> Factor<B::Symbol> {
    let numeric: Option<SmallVec<[f64; 2]>> = args.iter().map(Factor::as_numeric).collect();
    match numeric {
        Some(values) => Factor::Numeric(func.eval(&values)),
        None => Factor::Symbolic(backend.scalar_func(func, args)),
    }
}

/// Applies `op`, folding numbers and trivial identities without the back end.
pub fn binop<B: Backend>(
    backend: &mut B,
    op: BinOp,
    lhs: &Factor<B::Symbol>,
    rhs: &Factor<B::Symbol>,
) -> Factor<B::Symbol> {
    if let (Some(a), Some(b)) = (lhs.as_numeric(), rhs.as_numeric()) {
        return Factor::Numeric(op.eval(a, b));
    }
    match op {
        BinOp::Mul if lhs.is_zero() || rhs.is_zero() => Factor::Numeric(0.0),
        BinOp::Mul if lhs.is_one() => rhs.clone(),
        BinOp::Mul | BinOp::Div if rhs.is_one() => lhs.clone(),
        BinOp::Add if lhs.is_zero() => rhs.clone(),
        BinOp::Add | BinOp::Sub if rhs.is_zero() => lhs.clone(),
        _ => Factor::Symbolic(backend.binop(op, lhs, rhs)),
    }
}

/// Back end for purely numeric evaluation.
///
/// Its symbol type is uninhabited, so every term folds to a number inside
/// the accumulator and none of the emitting methods can be reached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NumericBackend;

impl NumericBackend {
    /// Creates the numeric back end.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn absurd(factors: &[Factor<Infallible>]) -> Infallible {
    for factor in factors {
        if let Factor::Symbolic(never) = factor {
            return *never;
        }
    }
    unreachable!("numeric back end reached without a symbolic factor")
}

impl Backend for NumericBackend {
    type Symbol = Infallible;
    type Var = Infallible;

    fn make_var(&mut self, name_hint: &str) -> Infallible {
        unreachable!("numeric back end asked for storage for `{name_hint}`")
    }

    fn emit_term(&mut self, var: &mut Infallible, _: &[Factor<Infallible>], _: bool, _: bool) {
        match *var {}
    }

    fn finish_var(&mut self, var: Infallible) -> Infallible {
        var
    }

    fn scalar_func(&mut self, _: ScalarFunc, args: &[Factor<Infallible>]) -> Infallible {
        absurd(args)
    }

    fn binop(
        &mut self,
        _: BinOp,
        lhs: &Factor<Infallible>,
        rhs: &Factor<Infallible>,
    ) -> Infallible {
        absurd(&[*lhs, *rhs])
    }
}
