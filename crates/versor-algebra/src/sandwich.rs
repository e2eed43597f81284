//! Conjugation `R x R~` with cancellation of provably-zero contributions.
//!
//! Expanding `R x R~` term by term pairs every operator component `l` with
//! every operator component `r`. Each unordered pair shares one product
//! `R_l R_r metric(l & r)`, and the two orders of a pair often contribute
//! to the same output with opposite signs. [`PreparedSandwich`] counts the
//! signed contributions per `(pair, operand component)` first and only
//! emits the buckets that survive.

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use tracing::debug;
use versor_core::blade::{grade, product_flips, reverse_flips};
use versor_core::{Accumulator, AlgebraError, Backend, BinOp, Bitmap, Factor, Result, Term};

use crate::algebra::{Algebra, MultivectorOf};
use crate::multivector::{Multivector, MultivectorBuilder};
use crate::prod_tree::{ProdTree, ProdVisitor};
use crate::products::Product;

/// Options for [`PreparedSandwich::apply_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SandwichOptions {
    /// Only force the memoized operator pair products; emit no result.
    pub dummy: bool,
    /// Drop output components whose grade does not occur in the operand.
    /// Only valid when the operator is a versor.
    pub keep_operand_grades: bool,
}

/// Memoized product of an unordered operator component pair.
struct Pair<S> {
    metric: Term<S>,
    value: Option<Factor<S>>,
}

/// An operator prepared for repeated conjugation.
pub struct PreparedSandwich<'a, B: Backend> {
    algebra: &'a Algebra<B>,
    operator: MultivectorOf<B>,
    pairs: RefCell<FxHashMap<(Bitmap, Bitmap), Pair<B::Symbol>>>,
}

impl<B: Backend> Algebra<B> {
    /// Prepares `operator` for conjugating operands with
    /// [`PreparedSandwich::apply`].
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Ownership`] for foreign operators.
    pub fn sandwich(&self, operator: &MultivectorOf<B>) -> Result<PreparedSandwich<'_, B>> {
        self.check_mine(operator)?;
        let mut pairs = FxHashMap::default();
        for (l, _) in operator.iter() {
            for (r, _) in operator.iter() {
                if r < l {
                    continue;
                }
                if let Some(metric) = self.metric_factors(l & r) {
                    pairs.insert((l, r), Pair { metric, value: None });
                }
            }
        }
        debug!(components = operator.len(), pairs = pairs.len(), "prepared sandwich");
        Ok(PreparedSandwich {
            algebra: self,
            operator: operator.clone(),
            pairs: RefCell::new(pairs),
        })
    }

    /// `operator * operand * reverse(operator)` by plain products.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Ownership`] for foreign operands.
    pub fn sandwich1(
        &self,
        operator: &MultivectorOf<B>,
        operand: &MultivectorOf<B>,
    ) -> Result<MultivectorOf<B>> {
        let reversed = self.reverse(operator)?;
        self.product(Product::Geometric, &[operator, operand, &reversed])
    }

    /// Reflects `x` in the hyperplane orthogonal to the 1-vector `normal`:
    /// `-n x n^-1`.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::DivisionByZero`] for a null normal.
    pub fn reflect(
        &self,
        normal: &MultivectorOf<B>,
        x: &MultivectorOf<B>,
    ) -> Result<MultivectorOf<B>> {
        let ns = self.norm_squared(normal)?;
        if ns.is_zero() {
            return Err(AlgebraError::DivisionByZero("reflect"));
        }
        let conjugated = self.sandwich(normal)?.apply(x)?;
        let factor = self.binop(BinOp::Div, &Factor::Numeric(-1.0), &ns);
        Ok(self.scale(&factor, &conjugated)?.with_known_unit(x.known_unit()))
    }

    /// Conjugates `operand` by a chain of operators:
    /// `O1 ... Ok x Ok~ ... O1~`.
    ///
    /// Contributions are collected in a [`ProdTree`], optimized, and only
    /// then emitted.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Ownership`] for foreign operands.
    pub fn sandwich_chain(
        &self,
        operators: &[&MultivectorOf<B>],
        operand: &MultivectorOf<B>,
    ) -> Result<MultivectorOf<B>> {
        for op in operators {
            self.check_mine(op)?;
        }
        self.check_mine(operand)?;
        self.annotate("sandwich chain");

        let stages: Vec<Stage<'_, B::Symbol>> = operators
            .iter()
            .map(|op| Stage { mv: *op, reversed: false })
            .chain(std::iter::once(Stage {
                mv: operand,
                reversed: false,
            }))
            .chain(operators.iter().rev().map(|op| Stage { mv: *op, reversed: true }))
            .collect();

        let mut tree = ProdTree::new();
        let mut term = Vec::new();
        self.collect_chain(&stages, 0, 0, &mut term, &mut tree);
        tree.optimize();

        let out = Multivector::new(self, |b| tree.traverse(&mut ChainEmitter { builder: b }))?;
        let unit = operand.known_unit() && operators.iter().all(|op| op.known_unit());
        if unit {
            self.mark_unit(out)
        } else {
            Ok(out)
        }
    }

    /// Expands the remaining stages depth-first into `tree`.
    fn collect_chain(
        &self,
        stages: &[Stage<'_, B::Symbol>],
        out: Bitmap,
        flips: u32,
        term: &mut Vec<Factor<B::Symbol>>,
        tree: &mut ProdTree<B::Symbol>,
    ) {
        let Some((stage, rest)) = stages.split_first() else {
            tree.add(out, term.as_slice(), flips);
            return;
        };
        for (bm, value) in stage.mv.iter() {
            let Some(metric) = self.metric_factors(out & bm) else {
                continue;
            };
            let mut next = flips + product_flips(out, bm);
            if stage.reversed {
                next += reverse_flips(bm);
            }
            let mark = term.len();
            term.extend(metric);
            term.push(value.clone());
            self.collect_chain(rest, out ^ bm, next, term, tree);
            term.truncate(mark);
        }
    }
}

struct Stage<'m, S> {
    mv: &'m Multivector<S>,
    reversed: bool,
}

/// Emits the optimized chain into a multivector under construction.
struct ChainEmitter<'b, 'a, B: Backend> {
    builder: &'b mut MultivectorBuilder<'a, B>,
}

impl<B: Backend> ProdVisitor<B::Symbol> for ChainEmitter<'_, '_, B> {
    fn extend(
        &mut self,
        running: &Factor<B::Symbol>,
        symbol: &B::Symbol,
    ) -> Result<Factor<B::Symbol>> {
        let symbol = Factor::Symbolic(symbol.clone());
        Ok(self.builder.algebra().binop(BinOp::Mul, running, &symbol))
    }

    fn leaf(
        &mut self,
        running: &Factor<B::Symbol>,
        bitmap: Bitmap,
        coefficient: f64,
    ) -> Result<()> {
        let term = [Factor::Numeric(coefficient), running.clone()];
        self.builder.add(bitmap, &term, false)
    }
}

impl<B: Backend> PreparedSandwich<'_, B> {
    /// The prepared operator.
    #[must_use]
    pub fn operator(&self) -> &MultivectorOf<B> {
        &self.operator
    }

    /// Conjugates `operand` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Ownership`] for foreign operands.
    pub fn apply(&self, operand: &MultivectorOf<B>) -> Result<MultivectorOf<B>> {
        let out = self.apply_with(operand, SandwichOptions::default())?;
        Ok(out.unwrap_or_else(|| self.algebra.zero()))
    }

    /// Conjugates `operand`. Returns `None` in dummy mode.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Ownership`] for foreign operands.
    pub fn apply_with(
        &self,
        operand: &MultivectorOf<B>,
        options: SandwichOptions,
    ) -> Result<Option<MultivectorOf<B>>> {
        let alg = self.algebra;
        alg.check_mine(operand)?;
        if options.dummy {
            self.force()?;
            return Ok(None);
        }
        alg.annotate("sandwich");

        // Signed contribution counts per (pair, operand component), in
        // first-touch order.
        let mut buckets: Vec<((Bitmap, Bitmap, Bitmap), i64)> = Vec::new();
        let mut index: FxHashMap<(Bitmap, Bitmap, Bitmap), usize> = FxHashMap::default();
        let mut contributions = 0usize;
        {
            let pairs = self.pairs.borrow();
            for (l, _) in self.operator.iter() {
                for (r, _) in self.operator.iter() {
                    let key = (l.min(r), l.max(r));
                    if !pairs.contains_key(&key) {
                        continue;
                    }
                    for (i, _) in operand.iter() {
                        if alg.metric_factors((l ^ r) & i).is_none() {
                            continue;
                        }
                        contributions += 1;
                        let flips =
                            product_flips(l, i) + product_flips(l ^ i, r) + reverse_flips(r);
                        let sign = if flips % 2 == 1 { -1 } else { 1 };
                        let bucket = (key.0, key.1, i);
                        match index.get(&bucket) {
                            Some(&slot) => buckets[slot].1 += sign,
                            None => {
                                index.insert(bucket, buckets.len());
                                buckets.push((bucket, sign));
                            }
                        }
                    }
                }
            }
        }

        let grades = operand.grades();
        let total = buckets.len();
        buckets.retain(|&((lo, hi, i), count)| {
            count != 0 && (!options.keep_operand_grades || grades.contains(&grade(lo ^ hi ^ i)))
        });
        debug!(
            contributions,
            buckets = total,
            surviving = buckets.len(),
            "applied sandwich"
        );

        let mut term: Vec<Factor<B::Symbol>> = Vec::new();
        let out = Multivector::new(alg, |b| {
            for &((lo, hi, i), count) in &buckets {
                let Some(metric) = alg.metric_factors((lo ^ hi) & i) else {
                    continue;
                };
                term.clear();
                term.push(self.pair_value(lo, hi)?);
                term.push(operand.value(i));
                term.extend(metric);
                term.push(Factor::Numeric(count.unsigned_abs() as f64));
                b.add(lo ^ hi ^ i, &term, count < 0)?;
            }
            Ok(())
        })?;

        if self.operator.known_unit() && operand.known_unit() {
            alg.mark_unit(out).map(Some)
        } else {
            Ok(Some(out))
        }
    }

    /// Computes every memoized pair product.
    ///
    /// # Errors
    ///
    /// Propagates back-end accumulation errors.
    pub fn force(&self) -> Result<()> {
        let mut keys: Vec<_> = self.pairs.borrow().keys().copied().collect();
        keys.sort_unstable();
        for (l, r) in keys {
            self.pair_value(l, r)?;
        }
        Ok(())
    }

    /// `R_l R_r metric(l & r)`, computed on first use.
    fn pair_value(&self, l: Bitmap, r: Bitmap) -> Result<Factor<B::Symbol>> {
        let mut pairs = self.pairs.borrow_mut();
        let Some(pair) = pairs.get_mut(&(l, r)) else {
            return Ok(Factor::Numeric(0.0));
        };
        if let Some(value) = &pair.value {
            return Ok(value.clone());
        }
        let alg = self.algebra;
        let mut acc = Accumulator::new("pair");
        let mut term = pair.metric.clone();
        term.push(self.operator.value(l));
        term.push(self.operator.value(r));
        let mut backend = alg.backend_mut();
        acc.add(&mut *backend, &term, false)?;
        let value = acc.value(&mut *backend);
        pair.value = Some(value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_4;

    use versor_core::NumericBackend;
    use versor_expr::{Evaluator, ExprBackend};

    use super::*;
    use crate::config::{blade_names, default_blade_names};

    fn euclidean3() -> Algebra<NumericBackend> {
        Algebra::new(vec![1.0.into(); 3], blade_names(&["x", "y", "z"]), NumericBackend).unwrap()
    }

    fn nonzero(mv: &MultivectorOf<NumericBackend>) -> Vec<(Bitmap, f64)> {
        let mut out: Vec<_> = mv
            .to_numeric()
            .unwrap()
            .into_iter()
            .filter(|(_, x)| x.abs() > 1e-12)
            .collect();
        out.sort_by_key(|(bm, _)| *bm);
        out
    }

    fn assert_same(a: &MultivectorOf<NumericBackend>, b: &MultivectorOf<NumericBackend>) {
        let (a, b) = (nonzero(a), nonzero(b));
        assert_eq!(a.len(), b.len(), "{a:?} vs {b:?}");
        for ((abm, ax), (bbm, bx)) in a.iter().zip(&b) {
            assert_eq!(abm, bbm);
            assert!((ax - bx).abs() < 1e-12, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_quarter_turn() {
        let alg = euclidean3();
        // exp(-pi/4 xy) turns x into y
        let rotor = alg.exp(&alg.mv([("xy", (-FRAC_PI_4).into())]).unwrap()).unwrap();
        let x = alg.mv([("x", 1.0.into())]).unwrap();
        let rotated = alg.sandwich(&rotor).unwrap().apply(&x).unwrap();
        assert_same(&rotated, &alg.mv([("y", 1.0.into())]).unwrap());
        assert!(!rotated.known_unit());

        let basis = alg.basis_vectors().unwrap();
        assert!(alg.sandwich(&rotor).unwrap().apply(&basis[0]).unwrap().known_unit());
    }

    #[test]
    fn test_matches_reference() {
        let alg = euclidean3();
        let op = alg
            .mv([("1", 0.5.into()), ("x", 2.0.into()), ("xy", (-1.5).into()), ("xyz", 0.25.into())])
            .unwrap();
        let x = alg
            .mv([("1", 3.0.into()), ("y", 1.0.into()), ("xz", 2.0.into())])
            .unwrap();
        let prepared = alg.sandwich(&op).unwrap();
        assert_same(&prepared.apply(&x).unwrap(), &alg.sandwich1(&op, &x).unwrap());
        assert_same(&alg.sandwich_chain(&[&op], &x).unwrap(), &alg.sandwich1(&op, &x).unwrap());
    }

    #[test]
    fn test_degenerate_metric_matches_reference() {
        let alg = Algebra::new(
            vec![0.0.into(), 1.0.into(), (-1.0).into()],
            default_blade_names(3),
            NumericBackend,
        )
        .unwrap();
        let op = alg
            .mv([("1", 1.0.into()), ("e12", 0.5.into()), ("e23", 2.0.into())])
            .unwrap();
        let x = alg.mv([("e1", 1.0.into()), ("e3", 3.0.into())]).unwrap();
        let fast = alg.sandwich(&op).unwrap().apply(&x).unwrap();
        assert_same(&fast, &alg.sandwich1(&op, &x).unwrap());
    }

    #[test]
    fn test_chain_of_two() {
        let alg = euclidean3();
        let a = alg.mv([("1", 1.0.into()), ("xy", 2.0.into())]).unwrap();
        let b = alg.mv([("x", 1.0.into()), ("yz", (-1.0).into())]).unwrap();
        let x = alg.mv([("z", 1.0.into()), ("xz", 0.5.into())]).unwrap();
        let inner = alg.sandwich1(&b, &x).unwrap();
        let expected = alg.sandwich1(&a, &inner).unwrap();
        assert_same(&alg.sandwich_chain(&[&a, &b], &x).unwrap(), &expected);
    }

    #[test]
    fn test_reflect() {
        let alg = euclidean3();
        let n = alg.mv([("x", 2.0.into())]).unwrap();
        let v = alg.mv([("x", 1.0.into()), ("y", 3.0.into())]).unwrap();
        let reflected = alg.reflect(&n, &v).unwrap();
        assert_same(&reflected, &alg.mv([("x", (-1.0).into()), ("y", 3.0.into())]).unwrap());
        assert_eq!(
            alg.reflect(&alg.zero(), &v).unwrap_err(),
            AlgebraError::DivisionByZero("reflect")
        );
    }

    #[test]
    fn test_keep_operand_grades() {
        let alg = euclidean3();
        // Not a versor: the conjugate of a vector picks up a scalar part.
        let op = alg.mv([("1", 1.0.into()), ("x", 1.0.into())]).unwrap();
        let x = alg.mv([("x", 1.0.into())]).unwrap();
        let full = alg.sandwich(&op).unwrap().apply(&x).unwrap();
        assert_eq!(full.grades().as_slice(), &[0, 1]);

        let options = SandwichOptions {
            keep_operand_grades: true,
            ..SandwichOptions::default()
        };
        let kept = alg.sandwich(&op).unwrap().apply_with(&x, options).unwrap().unwrap();
        assert_eq!(kept.grades().as_slice(), &[1]);
    }

    #[test]
    fn test_symbolic_cancellation_skips_emission() {
        let mut backend = ExprBackend::new();
        let a = backend.sym("a");
        let b = backend.sym("b");
        let names = blade_names(&["x", "y", "z"]);
        let alg = Algebra::new(vec![1.0.into(); 3], names, backend).unwrap();
        let rotor = alg.mv([("1", a), ("xy", b)]).unwrap();
        let z = alg.basis_vectors().unwrap().remove(2);

        let start = alg.backend().statement_count();
        let fast = alg.sandwich(&rotor).unwrap().apply(&z).unwrap();
        let fast_statements = alg.backend().statement_count() - start;

        let start = alg.backend().statement_count();
        let slow = alg.sandwich1(&rotor, &z).unwrap();
        let slow_statements = alg.backend().statement_count() - start;

        // The xyz contributions cancel and are never emitted.
        assert!(fast.get(0b111).is_none());
        assert!(slow.get(0b111).is_some());
        assert!(fast_statements < slow_statements);

        let backend = alg.backend();
        let mut eval = Evaluator::new(&backend).bind("a", 0.6).bind("b", 0.8);
        let fz = eval.factor(&fast.value(0b100)).unwrap();
        let sz = eval.factor(&slow.value(0b100)).unwrap();
        assert!((fz - sz).abs() < 1e-12);
        assert!((fz - 1.0).abs() < 1e-12);
        assert_eq!(eval.factor(&slow.value(0b111)), Some(0.0));
    }

    #[test]
    fn test_symbolic_chain_cancels_before_emission() {
        let mut backend = ExprBackend::new();
        let a = backend.sym("a");
        let b = backend.sym("b");
        let names = blade_names(&["x", "y", "z"]);
        let alg = Algebra::new(vec![1.0.into(); 3], names, backend).unwrap();
        let rotor = alg.mv([("1", a), ("xy", b)]).unwrap();
        let z = alg.basis_vectors().unwrap().remove(2);

        let start = alg.backend().statement_count();
        let chain = alg.sandwich_chain(&[&rotor], &z).unwrap();
        let chain_statements = alg.backend().statement_count() - start;

        let start = alg.backend().statement_count();
        let slow = alg.sandwich1(&rotor, &z).unwrap();
        let slow_statements = alg.backend().statement_count() - start;

        // a*b and b*a share one trie path, where they cancel.
        assert!(chain.get(0b111).is_none());
        assert!(slow.get(0b111).is_some());
        assert!(chain_statements < slow_statements);

        let backend = alg.backend();
        let mut eval = Evaluator::new(&backend).bind("a", 0.6).bind("b", 0.8);
        let cz = eval.factor(&chain.value(0b100)).unwrap();
        assert!((cz - 1.0).abs() < 1e-12);
        assert_eq!(chain.grades().as_slice(), &[1]);
    }

    #[test]
    fn test_dummy_forces_pairs_only() {
        let mut backend = ExprBackend::new();
        let a = backend.sym("a");
        let b = backend.sym("b");
        let alg = Algebra::new(vec![1.0.into(); 2], default_blade_names(2), backend).unwrap();
        let rotor = alg.mv([("1", a), ("e12", b)]).unwrap();
        let x = alg.basis_vectors().unwrap().remove(0);

        let prepared = alg.sandwich(&rotor).unwrap();
        let options = SandwichOptions {
            dummy: true,
            ..SandwichOptions::default()
        };
        let start = alg.backend().statement_count();
        assert!(prepared.apply_with(&x, options).unwrap().is_none());
        let forced = alg.backend().statement_count() - start;
        // a*a, a*b and b*b
        assert_eq!(forced, 3);

        // Pair products are reused by later applications.
        let start = alg.backend().statement_count();
        prepared.apply(&x).unwrap();
        let second = alg.backend().statement_count() - start;
        let start = alg.backend().statement_count();
        prepared.apply(&x).unwrap();
        assert_eq!(alg.backend().statement_count() - start, second);
    }
}
