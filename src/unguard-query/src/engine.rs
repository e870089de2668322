//! The query engine interface the shim forwards to.

use async_trait::async_trait;
use common_error::UnguardResult;
use unguard_expr::{Expr, Value};

use crate::stream::RowBatchStream;

/// An engine that translates and runs query expression trees.
///
/// # Contract
///
/// - `source_expr` names the data the engine owns; it is the tree a
///   composed query's placeholder stands for
/// - `execute` runs a query producing a single value
/// - `enumerate` runs a query producing a sequence, lazily
/// - Translation failures surface as errors; trees are never mutated
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Get the name of this engine.
    fn name(&self) -> &'static str;

    /// The expression for the engine's own data source.
    fn source_expr(&self) -> Expr;

    /// Execute a scalar or aggregate query.
    async fn execute(&self, expr: &Expr) -> UnguardResult<Value>;

    /// Enumerate the rows of a sequence query.
    async fn enumerate(&self, expr: &Expr) -> UnguardResult<RowBatchStream>;
}
