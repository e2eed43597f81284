//! Numeric evaluation of recorded expressions.

use hashbrown::HashMap;
use versor_core::Factor;

use crate::backend::ExprBackend;
use crate::expr::ExprNode;
use crate::handle::ExprHandle;

/// Evaluates expressions of an [`ExprBackend`] under symbol bindings.
///
/// Results are memoized per handle, so evaluating many components that
/// share temporaries costs each shared node once.
pub struct Evaluator<'a> {
    backend: &'a ExprBackend,
    bindings: HashMap<String, f64>,
    memo: HashMap<ExprHandle, f64>,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator with no bindings.
    #[must_use]
    pub fn new(backend: &'a ExprBackend) -> Self {
        Self {
            backend,
            bindings: HashMap::new(),
            memo: HashMap::new(),
        }
    }

    /// Binds a symbol name to a value.
    #[must_use]
    pub fn bind(mut self, name: &str, value: f64) -> Self {
        self.bindings.insert(name.to_string(), value);
        self.memo.clear();
        self
    }

    /// Binds several symbols at once.
    #[must_use]
    pub fn bind_all<'n>(mut self, values: impl IntoIterator<Item = (&'n str, f64)>) -> Self {
        for (name, value) in values {
            self.bindings.insert(name.to_string(), value);
        }
        self.memo.clear();
        self
    }

    /// Evaluates a factor. Returns `None` if an unbound symbol or an
    /// incomplete local is reached.
    pub fn factor(&mut self, factor: &Factor<ExprHandle>) -> Option<f64> {
        match factor {
            Factor::Numeric(x) => Some(*x),
            Factor::Symbolic(h) => self.eval(*h),
        }
    }

    /// Evaluates an expression.
    pub fn eval(&mut self, handle: ExprHandle) -> Option<f64> {
        if let Some(&value) = self.memo.get(&handle) {
            return Some(value);
        }

        let backend: &'a ExprBackend = self.backend;
        let arena = backend.arena();
        let value = match arena.get(handle) {
            ExprNode::Number(bits) => f64::from_bits(*bits),
            ExprNode::Symbol(id) => {
                let name = arena.symbol_name(*id)?;
                *self.bindings.get(name)?
            }
            ExprNode::Local(id) => {
                let definition = backend.local(*id)?.definition?;
                self.eval(definition)?
            }
            ExprNode::Add(args) => {
                let mut sum = 0.0;
                for &arg in args {
                    sum += self.eval(arg)?;
                }
                sum
            }
            ExprNode::Mul(args) => {
                let mut product = 1.0;
                for &arg in args {
                    product *= self.eval(arg)?;
                }
                product
            }
            ExprNode::Neg(arg) => -self.eval(*arg)?,
            ExprNode::Binary { op, lhs, rhs } => {
                let (op, lhs, rhs) = (*op, *lhs, *rhs);
                op.eval(self.eval(lhs)?, self.eval(rhs)?)
            }
            ExprNode::Function { func, args } => {
                let func = *func;
                let mut values = Vec::with_capacity(args.len());
                for &arg in args {
                    values.push(self.eval(arg)?);
                }
                func.eval(&values)
            }
        };

        self.memo.insert(handle, value);
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use versor_core::{Accumulator, Backend, BinOp, ScalarFunc};

    #[test]
    fn test_eval_accumulated_component() {
        let mut backend = ExprBackend::new();
        let a = backend.sym("a");
        let b = backend.sym("b");

        let mut acc = Accumulator::new("c");
        acc.add(&mut backend, &[a, b], false).unwrap();
        acc.add(&mut backend, &[a, 2.0.into()], true).unwrap();
        acc.add(&mut backend, &[0.5.into()], false).unwrap();
        let value = acc.value(&mut backend);

        let mut eval = Evaluator::new(&backend).bind("a", 3.0).bind("b", 5.0);
        // 3*5 - 2*3 + 0.5
        assert_eq!(eval.factor(&value), Some(9.5));
    }

    #[test]
    fn test_eval_temporaries() {
        let mut backend = ExprBackend::new();
        let a = backend.sym("a");
        let root = backend.scalar_func(ScalarFunc::Sqrt, &[a]);
        let q = backend.binop(BinOp::Div, &Factor::Symbolic(root), &Factor::Numeric(2.0));

        let mut eval = Evaluator::new(&backend).bind_all([("a", 16.0)]);
        assert_eq!(eval.eval(q), Some(2.0));
    }

    #[test]
    fn test_unbound_symbol() {
        let mut backend = ExprBackend::new();
        let a = backend.symbol("a");
        let mut eval = Evaluator::new(&backend);
        assert_eq!(eval.eval(a), None);
    }
}
