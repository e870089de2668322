//! Query operators as static calls over a sequence.
//!
//! Every operator takes the sequence as its first argument, so a composed
//! query is a chain of calls ending in a [`Expr::QueryRoot`] or a
//! [`Expr::Source`].

use unguard_expr::expr::constant;
use unguard_expr::{Expr, MethodId, TypeDesc};

/// Keep the elements a predicate accepts.
pub const WHERE: &str = "where";
/// Project every element.
pub const SELECT: &str = "select";
/// Keep the first `n` elements.
pub const TAKE: &str = "take";
/// Drop the first `n` elements.
pub const SKIP: &str = "skip";
/// Count the elements, optionally those a predicate accepts.
pub const COUNT: &str = "count";
/// Check whether any element exists, optionally one a predicate accepts.
pub const ANY: &str = "any";
/// The first element, optionally the first a predicate accepts.
pub const FIRST: &str = "first";

/// Operators producing a sequence.
pub const SEQUENCE_OPS: [&str; 4] = [WHERE, SELECT, TAKE, SKIP];

/// Operators producing a single value.
pub const SCALAR_OPS: [&str; 3] = [COUNT, ANY, FIRST];

fn element_of(seq: &Expr) -> TypeDesc {
    seq.static_type()
        .element()
        .cloned()
        .unwrap_or(TypeDesc::Object)
}

/// `where(seq, predicate)`
pub fn filter(seq: Expr, predicate: Expr) -> Expr {
    let ty = seq.static_type();
    Expr::call_static(WHERE, vec![seq, predicate], ty)
}

/// `select(seq, projection)` producing elements of type `element`.
pub fn map(seq: Expr, projection: Expr, element: TypeDesc) -> Expr {
    Expr::call_static(SELECT, vec![seq, projection], TypeDesc::sequence(element))
}

/// `take(seq, n)`
pub fn take(seq: Expr, n: i64) -> Expr {
    let ty = seq.static_type();
    Expr::call_static(TAKE, vec![seq, constant(n)], ty)
}

/// `skip(seq, n)`
pub fn skip(seq: Expr, n: i64) -> Expr {
    let ty = seq.static_type();
    Expr::call_static(SKIP, vec![seq, constant(n)], ty)
}

/// `count(seq)`
pub fn count(seq: Expr) -> Expr {
    Expr::call_static(COUNT, vec![seq], TypeDesc::Int64)
}

/// `any(seq)`
pub fn any(seq: Expr) -> Expr {
    Expr::call_static(ANY, vec![seq], TypeDesc::Bool)
}

/// `first(seq)`
pub fn first(seq: Expr) -> Expr {
    let element = element_of(&seq);
    Expr::call_static(FIRST, vec![seq], element)
}

/// If `expr` is a query operator call, its name and arguments.
pub fn as_query_op(expr: &Expr) -> Option<(&str, &[Expr])> {
    match expr {
        Expr::Call {
            receiver: None,
            method: MethodId { name, is_static: true },
            args,
            ..
        } if SEQUENCE_OPS.contains(&name.as_str()) || SCALAR_OPS.contains(&name.as_str()) => {
            Some((name.as_str(), args.as_slice()))
        }
        _ => None,
    }
}

/// Strip quoting from a lambda argument.
pub fn unquote(expr: &Expr) -> &Expr {
    match expr {
        Expr::Unary {
            op: unguard_expr::UnaryOp::Quote,
            operand,
            ..
        } => unquote(operand),
        other => other,
    }
}
