//! A trie of symbolic products used to cancel and share work before any
//! code is emitted.
//!
//! Contributions are keyed by their sorted symbolic factors; each trie node
//! keeps the numeric coefficients of the contributions ending there, one
//! leaf per contribution until [`ProdTree::optimize`] merges them.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;
use versor_core::blade::is_odd;
use versor_core::{Bitmap, Factor, Result};

/// A numeric coefficient waiting to be emitted to an output component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Leaf {
    /// Signed product of the numeric factors.
    pub coefficient: f64,
    /// Output component.
    pub bitmap: Bitmap,
}

#[derive(Debug)]
struct Node<S> {
    children: BTreeMap<S, Node<S>>,
    leaves: Vec<Leaf>,
}

impl<S> Default for Node<S> {
    fn default() -> Self {
        Self {
            children: BTreeMap::new(),
            leaves: Vec::new(),
        }
    }
}

/// Callbacks for [`ProdTree::traverse`].
pub trait ProdVisitor<S> {
    /// Multiplies the running product by one more symbol on the way down.
    ///
    /// # Errors
    ///
    /// Errors abort the traversal.
    fn extend(&mut self, running: &Factor<S>, symbol: &S) -> Result<Factor<S>>;

    /// Receives a surviving leaf together with the product of the symbols
    /// on its path.
    ///
    /// # Errors
    ///
    /// Errors abort the traversal.
    fn leaf(&mut self, running: &Factor<S>, bitmap: Bitmap, coefficient: f64) -> Result<()>;
}

/// Product trie keyed by sorted symbolic factors.
#[derive(Debug)]
pub struct ProdTree<S> {
    root: Node<S>,
    contributions: usize,
}

impl<S> Default for ProdTree<S> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            contributions: 0,
        }
    }
}

impl<S: Clone + Ord> ProdTree<S> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `term` as a contribution to `bitmap`, negated if `flips` is
    /// odd. Terms with a literal zero factor are dropped.
    pub fn add(&mut self, bitmap: Bitmap, term: &[Factor<S>], flips: u32) {
        if term.iter().any(Factor::is_zero) {
            return;
        }
        self.contributions += 1;

        let mut numbers: SmallVec<[f64; 8]> = SmallVec::new();
        let mut symbols: SmallVec<[S; 8]> = SmallVec::new();
        for factor in term {
            match factor {
                Factor::Numeric(x) => numbers.push(*x),
                Factor::Symbolic(s) => symbols.push(s.clone()),
            }
        }
        // Fixed folding order so equal products fold to equal coefficients.
        numbers.sort_by(f64::total_cmp);
        let sign = if is_odd(flips) { -1.0 } else { 1.0 };
        let coefficient = numbers.iter().fold(sign, |acc, x| acc * x);
        symbols.sort();

        let mut node = &mut self.root;
        for symbol in symbols {
            node = node.children.entry(symbol).or_default();
        }
        node.leaves.push(Leaf {
            coefficient,
            bitmap,
        });
    }

    /// Merges the leaves of every node per output bitmap and removes those
    /// that sum to exactly zero, along with any subtree left empty.
    pub fn optimize(&mut self) {
        let before = self.leaf_count();
        self.root.optimize();
        debug!(
            contributions = self.contributions,
            leaves_before = before,
            leaves_after = self.leaf_count(),
            "optimized product tree"
        );
    }

    /// Visits the tree in pre-order, leaves of a node before its children.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the visitor.
    pub fn traverse<V: ProdVisitor<S>>(&self, visitor: &mut V) -> Result<()> {
        self.root.traverse(&Factor::Numeric(1.0), visitor)
    }

    /// Number of contributions added.
    #[must_use]
    pub fn contributions(&self) -> usize {
        self.contributions
    }

    /// Number of leaves currently in the tree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// True if the tree holds no leaves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaf_count() == 0
    }

    /// Summed coefficient per symbol path and output bitmap.
    #[must_use]
    pub fn sums(&self) -> BTreeMap<(Vec<S>, Bitmap), f64> {
        let mut out = BTreeMap::new();
        let mut path = Vec::new();
        self.root.sums(&mut path, &mut out);
        out
    }
}

impl<S: Clone + Ord> Node<S> {
    fn optimize(&mut self) {
        for child in self.children.values_mut() {
            child.optimize();
        }
        self.children.retain(|_, child| !child.is_empty());

        let mut merged: Vec<Leaf> = Vec::with_capacity(self.leaves.len());
        let mut index: FxHashMap<Bitmap, usize> = FxHashMap::default();
        for leaf in self.leaves.drain(..) {
            match index.get(&leaf.bitmap) {
                Some(&slot) => merged[slot].coefficient += leaf.coefficient,
                None => {
                    index.insert(leaf.bitmap, merged.len());
                    merged.push(leaf);
                }
            }
        }
        merged.retain(|leaf| leaf.coefficient != 0.0);
        self.leaves = merged;
    }

    fn is_empty(&self) -> bool {
        self.leaves.is_empty() && self.children.is_empty()
    }

    fn traverse<V: ProdVisitor<S>>(&self, running: &Factor<S>, visitor: &mut V) -> Result<()> {
        for leaf in &self.leaves {
            visitor.leaf(running, leaf.bitmap, leaf.coefficient)?;
        }
        for (symbol, child) in &self.children {
            let next = visitor.extend(running, symbol)?;
            child.traverse(&next, visitor)?;
        }
        Ok(())
    }

    fn leaf_count(&self) -> usize {
        self.leaves.len() + self.children.values().map(Node::leaf_count).sum::<usize>()
    }

    fn sums(&self, path: &mut Vec<S>, out: &mut BTreeMap<(Vec<S>, Bitmap), f64>) {
        for leaf in &self.leaves {
            *out.entry((path.clone(), leaf.bitmap)).or_insert(0.0) += leaf.coefficient;
        }
        for (symbol, child) in &self.children {
            path.push(symbol.clone());
            child.sums(path, out);
            path.pop();
        }
    }
}
