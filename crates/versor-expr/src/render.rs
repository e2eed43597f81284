//! Text rendering of the statement log.
//!
//! The output is a Rust-like listing, one line per statement. Components
//! that receive later contributions are declared `let mut`.

use std::fmt::Write;

use hashbrown::HashSet;

use crate::backend::{ExprBackend, Statement};
use crate::expr::ExprNode;
use crate::handle::ExprHandle;

/// Binding strength used to decide where parentheses are needed.
fn precedence(node: &ExprNode) -> u8 {
    match node {
        ExprNode::Add(_) => 1,
        ExprNode::Binary { op, .. } => match op {
            versor_core::BinOp::Add | versor_core::BinOp::Sub => 1,
            versor_core::BinOp::Mul | versor_core::BinOp::Div => 2,
        },
        ExprNode::Mul(_) => 2,
        ExprNode::Neg(_) => 3,
        _ => 4,
    }
}

impl ExprBackend {
    /// Renders an expression as text.
    #[must_use]
    pub fn display(&self, handle: ExprHandle) -> String {
        let mut out = String::new();
        self.write_expr(&mut out, handle, 0);
        out
    }

    fn write_expr(&self, out: &mut String, handle: ExprHandle, outer: u8) {
        let node = self.arena().get(handle);
        let prec = precedence(node);
        if prec < outer {
            out.push('(');
        }
        match node {
            ExprNode::Number(bits) => {
                let _ = write!(out, "{:?}", f64::from_bits(*bits));
            }
            ExprNode::Symbol(id) => {
                out.push_str(self.arena().symbol_name(*id).unwrap_or("?"));
            }
            ExprNode::Local(id) => {
                out.push_str(self.local(*id).map_or("?", |l| l.name.as_str()));
            }
            ExprNode::Add(args) => self.write_list(out, args, " + ", prec),
            ExprNode::Mul(args) => self.write_list(out, args, " * ", prec),
            ExprNode::Neg(arg) => {
                out.push('-');
                self.write_expr(out, *arg, prec + 1);
            }
            ExprNode::Binary { op, lhs, rhs } => {
                self.write_expr(out, *lhs, prec);
                let _ = write!(out, " {} ", op.symbol());
                self.write_expr(out, *rhs, prec + 1);
            }
            ExprNode::Function { func, args } => {
                out.push_str(func.name());
                out.push('(');
                self.write_list(out, args, ", ", 0);
                out.push(')');
            }
        }
        if prec < outer {
            out.push(')');
        }
    }

    fn write_list(&self, out: &mut String, args: &[ExprHandle], sep: &str, prec: u8) {
        for (i, &arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            self.write_expr(out, arg, prec);
        }
    }

    fn local_name(&self, id: u32) -> &str {
        self.local(id).map_or("?", |l| l.name.as_str())
    }

    /// Renders the whole statement log.
    #[must_use]
    pub fn render(&self) -> String {
        let updated: HashSet<u32> = self
            .statements()
            .iter()
            .filter_map(|s| match s {
                Statement::AddAssign { local, .. } => Some(*local),
                _ => None,
            })
            .collect();
        let mut out = String::new();
        for statement in self.statements() {
            match statement {
                Statement::Assign { local, value } | Statement::Let { local, value } => {
                    let binding = if updated.contains(local) { "let mut" } else { "let" };
                    let name = self.local_name(*local);
                    let _ = writeln!(out, "{binding} {name} = {};", self.display(*value));
                }
                Statement::AddAssign { local, value } => {
                    let name = self.local_name(*local);
                    if let ExprNode::Neg(inner) = self.arena().get(*value) {
                        let _ = writeln!(out, "{name} -= {};", self.display(*inner));
                    } else {
                        let _ = writeln!(out, "{name} += {};", self.display(*value));
                    }
                }
                Statement::Space => out.push('\n'),
                Statement::Comment(text) => {
                    let _ = writeln!(out, "// {text}");
                }
            }
        }
        out
    }
}
