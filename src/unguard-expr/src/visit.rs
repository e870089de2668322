//! Rebuilding tree traversal.
//!
//! An [`ExprRewriter`] walks a tree top-down. Every hook returns a
//! [`Rewritten`]: the node is either unchanged, replaced, or elided from its
//! parent. Parents are only rebuilt when at least one child changed, so a
//! pass that matches nothing hands back the input untouched.
//!
//! Elision is not the null literal. An elided node asks its parent to drop
//! it. Parents that are not combinators have nowhere to drop a child, so the
//! default walkers stand the elided child in with `true`: the only nodes ever
//! elided are null checks that are vacuously satisfied.

use crate::expr::Expr;

/// Result of rewriting one node.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewritten {
    /// The node is kept as it was.
    Unchanged,
    /// The node is replaced.
    Replaced(Expr),
    /// The node is removed from its parent.
    Elided,
}

impl Rewritten {
    /// Check if the node was elided.
    pub const fn is_elided(&self) -> bool {
        matches!(self, Self::Elided)
    }

    /// Check if the node was replaced or elided.
    pub const fn is_changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// The present node, or `None` when elided.
    pub fn present(self, original: &Expr) -> Option<Expr> {
        match self {
            Self::Unchanged => Some(original.clone()),
            Self::Replaced(expr) => Some(expr),
            Self::Elided => None,
        }
    }

    /// The resulting node, standing in `true` for an elided one.
    pub fn resolve(self, original: &Expr) -> Expr {
        self.present(original).unwrap_or_else(|| Expr::constant(true))
    }

    /// The new child for a parent rebuild, or `None` when unchanged.
    fn into_child(self) -> Option<Expr> {
        match self {
            Self::Unchanged => None,
            Self::Replaced(expr) => Some(expr),
            Self::Elided => Some(Expr::constant(true)),
        }
    }
}

/// A rebuilding visitor over [`Expr`] trees.
///
/// Each hook defaults to the matching `walk_*` function, so implementors only
/// override the node kinds they care about and call back into `rewrite` for
/// children.
pub trait ExprRewriter {
    /// Rewrite any node, dispatching on its kind.
    fn rewrite(&mut self, expr: &Expr) -> Rewritten {
        match expr {
            Expr::Member { .. } => self.rewrite_member(expr),
            Expr::Call { .. } => self.rewrite_call(expr),
            Expr::Unary { .. } => self.rewrite_unary(expr),
            Expr::Binary { .. } => self.rewrite_binary(expr),
            Expr::Conditional { .. } => self.rewrite_conditional(expr),
            Expr::Lambda { .. } => self.rewrite_lambda(expr),
            Expr::Constant { .. } => self.rewrite_constant(expr),
            Expr::Parameter { .. }
            | Expr::QueryRoot { .. }
            | Expr::Source { .. }
            | Expr::Opaque { .. } => self.rewrite_leaf(expr),
        }
    }

    /// Rewrite a constant.
    fn rewrite_constant(&mut self, _expr: &Expr) -> Rewritten {
        Rewritten::Unchanged
    }

    /// Rewrite a parameter, query root, source or opaque node.
    fn rewrite_leaf(&mut self, _expr: &Expr) -> Rewritten {
        Rewritten::Unchanged
    }

    /// Rewrite a member access.
    fn rewrite_member(&mut self, expr: &Expr) -> Rewritten {
        walk_member(self, expr)
    }

    /// Rewrite a call.
    fn rewrite_call(&mut self, expr: &Expr) -> Rewritten {
        walk_call(self, expr)
    }

    /// Rewrite a unary operation.
    fn rewrite_unary(&mut self, expr: &Expr) -> Rewritten {
        walk_unary(self, expr)
    }

    /// Rewrite a binary operation.
    fn rewrite_binary(&mut self, expr: &Expr) -> Rewritten {
        walk_binary(self, expr)
    }

    /// Rewrite a conditional.
    fn rewrite_conditional(&mut self, expr: &Expr) -> Rewritten {
        walk_conditional(self, expr)
    }

    /// Rewrite a lambda.
    fn rewrite_lambda(&mut self, expr: &Expr) -> Rewritten {
        walk_lambda(self, expr)
    }
}

/// Rewrite the children of a member access.
pub fn walk_member<R: ExprRewriter + ?Sized>(rewriter: &mut R, expr: &Expr) -> Rewritten {
    let Expr::Member { owner, member, ty } = expr else {
        return Rewritten::Unchanged;
    };
    match rewriter.rewrite(owner).into_child() {
        None => Rewritten::Unchanged,
        Some(owner) => Rewritten::Replaced(Expr::Member {
            owner: Box::new(owner),
            member: member.clone(),
            ty: ty.clone(),
        }),
    }
}

/// Rewrite the receiver and arguments of a call.
pub fn walk_call<R: ExprRewriter + ?Sized>(rewriter: &mut R, expr: &Expr) -> Rewritten {
    let Expr::Call {
        receiver,
        method,
        args,
        ty,
    } = expr
    else {
        return Rewritten::Unchanged;
    };

    let new_receiver = receiver
        .as_deref()
        .map(|r| rewriter.rewrite(r).into_child());
    let new_args: Vec<Option<Expr>> = args
        .iter()
        .map(|a| rewriter.rewrite(a).into_child())
        .collect();

    let receiver_changed = matches!(new_receiver, Some(Some(_)));
    if !receiver_changed && new_args.iter().all(Option::is_none) {
        return Rewritten::Unchanged;
    }

    let receiver = match (receiver, new_receiver) {
        (_, Some(Some(r))) => Some(Box::new(r)),
        (original, _) => original.clone(),
    };
    let args = args
        .iter()
        .zip(new_args)
        .map(|(original, new)| new.unwrap_or_else(|| original.clone()))
        .collect();

    Rewritten::Replaced(Expr::Call {
        receiver,
        method: method.clone(),
        args,
        ty: ty.clone(),
    })
}

/// Rewrite the operand of a unary operation.
pub fn walk_unary<R: ExprRewriter + ?Sized>(rewriter: &mut R, expr: &Expr) -> Rewritten {
    let Expr::Unary { op, operand, ty } = expr else {
        return Rewritten::Unchanged;
    };
    match rewriter.rewrite(operand).into_child() {
        None => Rewritten::Unchanged,
        Some(operand) => Rewritten::Replaced(Expr::Unary {
            op: *op,
            operand: Box::new(operand),
            ty: ty.clone(),
        }),
    }
}

/// Rewrite both operands of a binary operation.
///
/// A rebuilt node has its result type recomputed from the new operands.
pub fn walk_binary<R: ExprRewriter + ?Sized>(rewriter: &mut R, expr: &Expr) -> Rewritten {
    let Expr::Binary {
        op, left, right, ..
    } = expr
    else {
        return Rewritten::Unchanged;
    };
    let new_left = rewriter.rewrite(left).into_child();
    let new_right = rewriter.rewrite(right).into_child();
    if new_left.is_none() && new_right.is_none() {
        return Rewritten::Unchanged;
    }
    Rewritten::Replaced(Expr::binary(
        new_left.unwrap_or_else(|| (**left).clone()),
        *op,
        new_right.unwrap_or_else(|| (**right).clone()),
    ))
}

/// Rewrite the three branches of a conditional.
pub fn walk_conditional<R: ExprRewriter + ?Sized>(rewriter: &mut R, expr: &Expr) -> Rewritten {
    let Expr::Conditional {
        test,
        if_true,
        if_false,
        ty,
    } = expr
    else {
        return Rewritten::Unchanged;
    };
    let new_test = rewriter.rewrite(test).into_child();
    let new_true = rewriter.rewrite(if_true).into_child();
    let new_false = rewriter.rewrite(if_false).into_child();
    if new_test.is_none() && new_true.is_none() && new_false.is_none() {
        return Rewritten::Unchanged;
    }
    Rewritten::Replaced(Expr::Conditional {
        test: Box::new(new_test.unwrap_or_else(|| (**test).clone())),
        if_true: Box::new(new_true.unwrap_or_else(|| (**if_true).clone())),
        if_false: Box::new(new_false.unwrap_or_else(|| (**if_false).clone())),
        ty: ty.clone(),
    })
}

/// Rewrite the body of a lambda.
pub fn walk_lambda<R: ExprRewriter + ?Sized>(rewriter: &mut R, expr: &Expr) -> Rewritten {
    let Expr::Lambda { params, body } = expr else {
        return Rewritten::Unchanged;
    };
    match rewriter.rewrite(body).into_child() {
        None => Rewritten::Unchanged,
        Some(body) => Rewritten::Replaced(Expr::Lambda {
            params: params.clone(),
            body: Box::new(body),
        }),
    }
}

/// Run a rewriter over a whole tree.
///
/// An elided root is vacuously true and comes back as the `true` constant.
pub fn rewrite_tree<R: ExprRewriter + ?Sized>(rewriter: &mut R, expr: &Expr) -> Expr {
    rewriter.rewrite(expr).resolve(expr)
}
