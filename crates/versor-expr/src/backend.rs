//! A symbolic back end that records every emitted statement.
//!
//! Components become locals defined by an `=` statement followed by `+=`
//! statements; scalar functions and binary operations become `let`
//! temporaries, shared through hash-consing when the same operation is
//! requested twice.

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use tracing::trace;
use versor_core::{Backend, BinOp, Factor, ScalarFunc};

use crate::arena::ExprArena;
use crate::expr::LocalId;
use crate::handle::ExprHandle;

/// One emitted statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    /// `let local = value;` for a component's first contribution.
    Assign {
        /// Target local.
        local: LocalId,
        /// Assigned expression.
        value: ExprHandle,
    },
    /// `local += value;` for a later contribution.
    AddAssign {
        /// Target local.
        local: LocalId,
        /// Added expression.
        value: ExprHandle,
    },
    /// `let local = value;` for a temporary.
    Let {
        /// Target local.
        local: LocalId,
        /// Bound expression.
        value: ExprHandle,
    },
    /// A blank separator line.
    Space,
    /// A comment line.
    Comment(String),
}

impl Statement {
    /// True for statements that perform arithmetic.
    #[must_use]
    pub fn is_code(&self) -> bool {
        !matches!(self, Statement::Space | Statement::Comment(_))
    }
}

/// A local variable: a component or a temporary.
#[derive(Clone, Debug)]
pub struct Local {
    /// Unique name.
    pub name: String,
    /// Full defining expression, known once the local is complete.
    pub definition: Option<ExprHandle>,
}

/// Storage for a component under construction.
#[derive(Debug)]
pub struct VarSlot {
    local: LocalId,
    terms: SmallVec<[ExprHandle; 4]>,
}

/// Symbolic back end built on a hash-consed [`ExprArena`].
#[derive(Debug, Default)]
pub struct ExprBackend {
    arena: ExprArena,
    statements: Vec<Statement>,
    locals: Vec<Local>,
    /// Number of locals created per name hint, for unique naming.
    name_counts: HashMap<String, u32>,
    /// Every local name issued so far.
    taken: HashSet<String>,
    /// Maps an operation node to the temporary holding it.
    temporaries: HashMap<ExprHandle, ExprHandle>,
}

impl ExprBackend {
    /// Creates an empty back end.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or reuses) an input symbol.
    pub fn symbol(&mut self, name: &str) -> ExprHandle {
        self.arena.symbol(name)
    }

    /// Creates an input symbol wrapped as a factor.
    pub fn sym(&mut self, name: &str) -> Factor<ExprHandle> {
        Factor::Symbolic(self.symbol(name))
    }

    /// The underlying arena.
    #[must_use]
    pub fn arena(&self) -> &ExprArena {
        &self.arena
    }

    /// Mutable access to the underlying arena.
    pub fn arena_mut(&mut self) -> &mut ExprArena {
        &mut self.arena
    }

    /// Every statement emitted so far, in order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Number of arithmetic statements emitted so far.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.statements.iter().filter(|s| s.is_code()).count()
    }

    /// Every local created so far.
    #[must_use]
    pub fn locals(&self) -> &[Local] {
        &self.locals
    }

    /// Looks up a local by id.
    #[must_use]
    pub fn local(&self, id: LocalId) -> Option<&Local> {
        self.locals.get(id as usize)
    }

    /// Discards the statement log, keeping the arena and locals.
    pub fn clear_statements(&mut self) {
        self.statements.clear();
    }

    fn new_local(&mut self, hint: &str) -> LocalId {
        let hint = if hint.is_empty() { "t" } else { hint };
        let count = self.name_counts.entry(hint.to_string()).or_insert(0);
        // A suffixed name may already have been issued for another hint.
        let name = loop {
            let candidate = if *count == 0 {
                hint.to_string()
            } else {
                format!("{hint}_{count}")
            };
            *count += 1;
            if !self.taken.contains(&candidate) {
                break candidate;
            }
        };
        self.taken.insert(name.clone());

        let id = LocalId::try_from(self.locals.len()).unwrap_or(LocalId::MAX);
        self.locals.push(Local {
            name,
            definition: None,
        });
        id
    }

    fn factor_handle(&mut self, factor: &Factor<ExprHandle>) -> ExprHandle {
        match factor {
            Factor::Numeric(x) => self.arena.number(*x),
            Factor::Symbolic(h) => *h,
        }
    }

    /// Binds `node` to a temporary, reusing one if the node was seen before.
    fn temporary(&mut self, node: ExprHandle, hint: &str) -> ExprHandle {
        if let Some(&existing) = self.temporaries.get(&node) {
            return existing;
        }
        let local = self.new_local(hint);
        self.locals[local as usize].definition = Some(node);
        self.statements.push(Statement::Let { local, value: node });
        let handle = self.arena.local(local);
        self.temporaries.insert(node, handle);
        handle
    }
}

impl Backend for ExprBackend {
    type Symbol = ExprHandle;
    type Var = VarSlot;

    fn make_var(&mut self, name_hint: &str) -> VarSlot {
        VarSlot {
            local: self.new_local(name_hint),
            terms: SmallVec::new(),
        }
    }

    fn emit_term(
        &mut self,
        var: &mut VarSlot,
        term: &[Factor<ExprHandle>],
        negate: bool,
        init: bool,
    ) {
        let factors: SmallVec<[ExprHandle; 4]> = term
            .iter()
            .filter(|f| !f.is_one())
            .map(|f| self.factor_handle(f))
            .collect();
        let product = self.arena.mul(factors);
        let signed = if negate { self.arena.neg(product) } else { product };
        var.terms.push(signed);

        let local = var.local;
        trace!(local, init, "emit term");
        self.statements.push(if init {
            Statement::Assign {
                local,
                value: signed,
            }
        } else {
            Statement::AddAssign {
                local,
                value: signed,
            }
        });
    }

    fn finish_var(&mut self, var: VarSlot) -> ExprHandle {
        let definition = self.arena.add(var.terms);
        self.locals[var.local as usize].definition = Some(definition);
        self.arena.local(var.local)
    }

    fn scalar_func(&mut self, func: ScalarFunc, args: &[Factor<ExprHandle>]) -> ExprHandle {
        let args: SmallVec<[ExprHandle; 2]> = args.iter().map(|f| self.factor_handle(f)).collect();
        let node = self.arena.function(func, args);
        self.temporary(node, func.name())
    }

    fn binop(
        &mut self,
        op: BinOp,
        lhs: &Factor<ExprHandle>,
        rhs: &Factor<ExprHandle>,
    ) -> ExprHandle {
        let lhs = self.factor_handle(lhs);
        let rhs = self.factor_handle(rhs);
        let node = self.arena.binary(op, lhs, rhs);
        self.temporary(node, "t")
    }

    fn space(&mut self) {
        self.statements.push(Statement::Space);
    }

    fn comment(&mut self, text: &str) {
        self.statements.push(Statement::Comment(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use versor_core::Accumulator;

    #[test]
    fn test_accumulator_emits_assign_then_add_assign() {
        let mut backend = ExprBackend::new();
        let a = backend.sym("a");
        let b = backend.sym("b");

        let mut acc = Accumulator::new("xy");
        acc.add(&mut backend, &[a, b], false).unwrap();
        acc.add(&mut backend, &[a, 2.0.into()], true).unwrap();
        acc.add(&mut backend, &[3.0.into()], false).unwrap();
        let value = acc.value(&mut backend);

        assert!(matches!(value, Factor::Symbolic(_)));
        let kinds: Vec<_> = backend
            .statements()
            .iter()
            .map(|s| match s {
                Statement::Assign { .. } => "=",
                Statement::AddAssign { .. } => "+=",
                _ => "?",
            })
            .collect();
        // a*b, -2a, then the flushed numeric remainder 3
        assert_eq!(kinds, vec!["=", "+=", "+="]);
        assert_eq!(backend.locals()[0].name, "xy");
    }

    #[test]
    fn test_local_names_are_unique() {
        let mut backend = ExprBackend::new();
        let first = backend.make_var("x");
        let second = backend.make_var("x");
        assert_eq!(backend.local(first.local).unwrap().name, "x");
        assert_eq!(backend.local(second.local).unwrap().name, "x_1");
    }

    #[test]
    fn test_suffixed_hint_does_not_collide() {
        let mut backend = ExprBackend::new();
        let names: Vec<String> = ["x", "x", "x_1", "x"]
            .into_iter()
            .map(|hint| {
                let slot = backend.make_var(hint);
                backend.local(slot.local).unwrap().name.clone()
            })
            .collect();
        assert_eq!(names, vec!["x", "x_1", "x_1_1", "x_2"]);
    }

    #[test]
    fn test_temporaries_are_shared() {
        let mut backend = ExprBackend::new();
        let a = backend.sym("a");
        let b = backend.sym("b");

        let t1 = backend.binop(BinOp::Mul, &a, &b);
        let t2 = backend.binop(BinOp::Mul, &a, &b);
        assert_eq!(t1, t2);
        assert_eq!(backend.statement_count(), 1);

        backend.comment("done");
        backend.space();
        assert_eq!(backend.statement_count(), 1);
        assert_eq!(backend.statements().len(), 3);
    }
}
