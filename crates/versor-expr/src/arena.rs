//! Arena allocator for expression storage.
//!
//! Nodes are stored contiguously in a `Vec`, with hash-consing ensuring
//! each structurally unique expression is stored exactly once.

use hashbrown::HashMap;
use smallvec::SmallVec;
use versor_core::{BinOp, ScalarFunc};

use crate::expr::{ExprNode, LocalId, SymbolId};
use crate::handle::ExprHandle;
use crate::intern::InternTable;

/// The arena holding every expression node.
#[derive(Debug, Default)]
pub struct ExprArena {
    /// Storage for all expression nodes.
    nodes: Vec<ExprNode>,
    /// Interning table: maps node content to its handle.
    intern_map: HashMap<ExprNode, ExprHandle>,
    /// Input symbol names.
    symbols: InternTable<String>,
}

impl ExprArena {
    /// Creates a new empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns an expression node, returning its handle.
    ///
    /// If an identical node already exists, returns the existing handle.
    pub fn intern(&mut self, node: ExprNode) -> ExprHandle {
        if let Some(&handle) = self.intern_map.get(&node) {
            return handle;
        }

        let index = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        let handle = ExprHandle::new(index);
        self.nodes.push(node.clone());
        self.intern_map.insert(node, handle);
        handle
    }

    /// Gets the node at the given handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle did not come from this arena.
    #[must_use]
    pub fn get(&self, handle: ExprHandle) -> &ExprNode {
        &self.nodes[handle.index() as usize]
    }

    /// Interns a symbol name, returning its id.
    pub fn intern_symbol(&mut self, name: &str) -> SymbolId {
        self.symbols.intern(name.to_string())
    }

    /// Gets the name of a symbol by its id.
    #[must_use]
    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.symbols.get(id).map(String::as_str)
    }

    /// Looks up a symbol id by name.
    #[must_use]
    pub fn symbol_id(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get_id(&name.to_string())
    }

    /// Returns the number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // === Convenience constructors ===

    /// Creates a number expression.
    pub fn number(&mut self, value: f64) -> ExprHandle {
        self.intern(ExprNode::number(value))
    }

    /// Creates a symbol expression.
    pub fn symbol(&mut self, name: &str) -> ExprHandle {
        let id = self.intern_symbol(name);
        self.intern(ExprNode::Symbol(id))
    }

    /// Creates a reference to a local.
    pub fn local(&mut self, id: LocalId) -> ExprHandle {
        self.intern(ExprNode::Local(id))
    }

    /// Creates a sum. Arguments are sorted so that sums hash-cons
    /// regardless of operand order.
    pub fn add(&mut self, args: impl Into<SmallVec<[ExprHandle; 4]>>) -> ExprHandle {
        let mut args = args.into();
        match args.len() {
            0 => self.number(0.0),
            1 => args[0],
            _ => {
                args.sort_unstable();
                self.intern(ExprNode::Add(args))
            }
        }
    }

    /// Creates a product. Arguments are sorted like [`ExprArena::add`].
    pub fn mul(&mut self, args: impl Into<SmallVec<[ExprHandle; 4]>>) -> ExprHandle {
        let mut args = args.into();
        match args.len() {
            0 => self.number(1.0),
            1 => args[0],
            _ => {
                args.sort_unstable();
                self.intern(ExprNode::Mul(args))
            }
        }
    }

    /// Creates a negation expression.
    pub fn neg(&mut self, arg: ExprHandle) -> ExprHandle {
        if let ExprNode::Neg(inner) = self.get(arg) {
            return *inner;
        }
        self.intern(ExprNode::Neg(arg))
    }

    /// Creates a binary operation.
    pub fn binary(&mut self, op: BinOp, lhs: ExprHandle, rhs: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Binary { op, lhs, rhs })
    }

    /// Creates a function application.
    pub fn function(
        &mut self,
        func: ScalarFunc,
        args: impl Into<SmallVec<[ExprHandle; 2]>>,
    ) -> ExprHandle {
        self.intern(ExprNode::Function {
            func,
            args: args.into(),
        })
    }
}
