//! Expression trees.

mod binary;
mod explain;
mod expr;
mod member;
mod unary;

pub use binary::BinaryOp;
pub use expr::{Expr, constant, lambda, null_of, param};
pub use member::{MemberId, MethodId};
pub use unary::UnaryOp;
