//! The null-guard yanker.
//!
//! Walks a tree top-down and, at every conditional, checks for a guard of
//! the form `path == null ? default : unwrap(path)`. A confirmed guard is
//! replaced by its unwrap side, visited with the suppression flag set. While
//! suppressing, the companion checks the same lowering introduced drop out:
//!
//! - conversions to `Bool?` are stripped,
//! - `x != null` comparisons are elided and their combinator keeps the
//!   sibling operand,
//! - nested guards `path == null ? _ : rest` collapse to `rest`.
//!
//! Everything the patterns do not match is returned structurally unchanged.

use std::mem;

use log::{debug, trace};
use unguard_expr::visit::{walk_binary, walk_conditional, walk_unary};
use unguard_expr::{BinaryOp, Expr, ExprRewriter, Rewritten, UnaryOp, rewrite_tree};

use crate::unwrap::{MemberUnwrap, MethodUnwrap, UnwrapShape};

/// Suppression-flag visitor removing null guards of one [`UnwrapShape`].
#[derive(Debug, Clone, Default)]
pub struct NullGuardYanker<S> {
    shape: S,
    suppressing: bool,
    guards_removed: usize,
}

impl<S: UnwrapShape> NullGuardYanker<S> {
    /// Create a yanker for the given shape.
    pub const fn new(shape: S) -> Self {
        Self {
            shape,
            suppressing: false,
            guards_removed: 0,
        }
    }

    /// Remove every guard in `expr`.
    ///
    /// An expression that is itself an elided companion check comes back as
    /// `true`.
    pub fn yank(&mut self, expr: &Expr) -> Expr {
        rewrite_tree(self, expr)
    }

    /// Number of guards removed so far.
    pub const fn guards_removed(&self) -> usize {
        self.guards_removed
    }

    /// Check if the yanker is inside a confirmed guard.
    pub const fn is_suppressing(&self) -> bool {
        self.suppressing
    }

    /// Visit `expr` with suppression on, then restore the prior state.
    fn suppressed(&mut self, expr: &Expr) -> Rewritten {
        let prior = mem::replace(&mut self.suppressing, true);
        let result = self.rewrite(expr);
        self.suppressing = prior;
        result
    }

    /// Replace a guard conditional, or `None` when `expr` is not one.
    fn try_remove(&mut self, expr: &Expr) -> Option<Rewritten> {
        let Expr::Conditional {
            test,
            if_true,
            if_false,
            ..
        } = expr
        else {
            return None;
        };
        let path = test.as_null_check()?;
        let unwrapped = self.shape.match_unwrap(if_true, if_false)?;
        if unwrapped.operand != path {
            return None;
        }

        debug!("Removing {} null guard on {}", self.shape.name(), path);
        self.guards_removed += 1;

        let replacement = unwrapped.replacement;
        Some(substitute(self.suppressed(replacement), replacement))
    }
}

/// Turn "unchanged" into an explicit replacement by `node`.
///
/// Used where a parent is replaced by one of its children.
fn substitute(result: Rewritten, node: &Expr) -> Rewritten {
    match result {
        Rewritten::Unchanged => Rewritten::Replaced(node.clone()),
        other => other,
    }
}

impl<S: UnwrapShape> ExprRewriter for NullGuardYanker<S> {
    fn rewrite_unary(&mut self, expr: &Expr) -> Rewritten {
        match expr {
            Expr::Unary {
                op: UnaryOp::Convert,
                operand,
                ty,
            } if self.suppressing && ty.is_nullable_bool() => {
                trace!("Stripping conversion to {ty}");
                substitute(self.rewrite(operand), operand)
            }
            _ => walk_unary(self, expr),
        }
    }

    fn rewrite_binary(&mut self, expr: &Expr) -> Rewritten {
        if !self.suppressing {
            return walk_binary(self, expr);
        }
        let Expr::Binary {
            op, left, right, ..
        } = expr
        else {
            return walk_binary(self, expr);
        };

        let new_left = self.rewrite(left);
        let new_right = self.rewrite(right);

        if new_left.is_elided() {
            return substitute(new_right, right);
        }
        if new_right.is_elided() {
            return substitute(new_left, left);
        }

        let changed = new_left.is_changed() || new_right.is_changed();
        let (Some(left), Some(right)) = (new_left.present(left), new_right.present(right)) else {
            return Rewritten::Unchanged;
        };

        if *op == BinaryOp::NotEqual && (left.is_null_constant() || right.is_null_constant()) {
            trace!("Eliding companion check {left} != {right}");
            return Rewritten::Elided;
        }

        if changed {
            Rewritten::Replaced(Expr::binary(left, *op, right))
        } else {
            Rewritten::Unchanged
        }
    }

    fn rewrite_conditional(&mut self, expr: &Expr) -> Rewritten {
        if let Some(result) = self.try_remove(expr) {
            return result;
        }

        match expr {
            Expr::Conditional { test, if_false, .. }
                if self.suppressing && test.as_null_check().is_some() =>
            {
                trace!("Collapsing nested guard on {test}");
                substitute(self.rewrite(if_false), if_false)
            }
            _ => walk_conditional(self, expr),
        }
    }
}

/// Remove member-unwrap null guards from `expr`.
///
/// `p.Flag == null ? false : p.Flag.Value` becomes `p.Flag`.
pub fn remove_null_guards(expr: &Expr) -> Expr {
    NullGuardYanker::new(MemberUnwrap).yank(expr)
}

/// Remove method-call null guards from `expr`.
///
/// `p.Name == null ? "k" : p.Name.to_lower()` becomes `p.Name.to_lower()`.
pub fn remove_method_null_guards(expr: &Expr) -> Expr {
    NullGuardYanker::new(MethodUnwrap).yank(expr)
}

/// Remove both kinds of null guard in a single pass.
pub fn remove_all_null_guards(expr: &Expr) -> Expr {
    NullGuardYanker::new((MemberUnwrap, MethodUnwrap)).yank(expr)
}
