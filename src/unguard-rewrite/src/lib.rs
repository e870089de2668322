//! Null-propagation guard removal for query expression trees.
//!
//! Compilers lower `x?.Member` in a boolean context to a conditional that
//! short-circuits to a default when `x` is null. Many query backends cannot
//! translate those conditionals. When the data never holds nulls at the
//! guarded positions the guard is inert, and this crate removes it:
//!
//! ```text
//! (p.Flag == null) ? false : p.Flag.Value              =>  p.Flag
//! ((p.Name == null) ? "k" : p.Name.to_lower()) == "k"  =>  p.Name.to_lower() == "k"
//! ```
//!
//! # Modules
//!
//! - [`unwrap`]: the guard shapes the detector recognizes
//! - [`yanker`]: the suppression-flag rewriter and its entry points
//! - [`rules`]: the rule pipeline the query shim runs before execution
//!
//! The rewrite is total. Trees that match no guard pattern come back
//! structurally unchanged, and each call owns its own state, so independent
//! trees can be rewritten concurrently.

pub mod rules;
pub mod unwrap;
pub mod yanker;

pub use rules::{
    NullGuardRemoval, ReplaceQueryRoot, RewritePipeline, RewriteResult, RewriteRule, RuleTrace,
    Transformed,
};
pub use unwrap::{MemberUnwrap, MethodUnwrap, UnwrapShape, Unwrapped};
pub use yanker::{
    NullGuardYanker, remove_all_null_guards, remove_method_null_guards, remove_null_guards,
};

use common_error::UnguardResult;
use unguard_expr::Expr;

/// Remove guards from `expr` with the default pipeline.
pub fn rewrite(expr: Expr) -> UnguardResult<Expr> {
    Ok(RewritePipeline::default().rewrite(expr)?.expr)
}
