//! Expression trees for query predicates and projections.
//!
//! `unguard-expr` provides the node model the null-guard rewriter works on:
//!
//! - [`types`]: closed type descriptors and runtime values
//! - [`expr`]: the immutable, structurally compared [`Expr`] tree
//! - [`visit`]: a rebuilding visitor whose results distinguish a replaced
//!   node from an elided one
//! - [`testing`]: trees in the shapes null-conditional lowering produces
//!
//! # Example
//!
//! ```rust
//! use unguard_expr::expr::{constant, param};
//! use unguard_expr::types::TypeDesc;
//!
//! let name = param("p", TypeDesc::record("Person")).member("Name", TypeDesc::String);
//! let pred = name.call("to_lower", vec![], TypeDesc::String).equal(constant("k"));
//! assert_eq!(pred.to_string(), "(p.Name.to_lower() == \"k\")");
//! ```

pub mod expr;
mod proptest_utils;
pub mod testing;
pub mod types;
pub mod visit;

pub use expr::{BinaryOp, Expr, MemberId, MethodId, UnaryOp};
pub use types::{TypeDesc, Value};
pub use visit::{ExprRewriter, Rewritten, rewrite_tree};
