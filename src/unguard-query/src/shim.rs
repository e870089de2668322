//! The pass-through shim that removes null guards before execution.
//!
//! [`GuardlessQuery`] wraps a [`QueryEngine`]. Composing operators only
//! builds a tree rooted at a [`Expr::QueryRoot`] placeholder; nothing is
//! rewritten until a terminal operator runs. At that point the placeholder
//! is replaced by the engine's source and the guards are removed, once,
//! over the fully composed tree.
//!
//! ```rust,ignore
//! let people = Arc::new(MemoryEngine::new("people", person_type(), rows))
//!     .without_null_propagation();
//! let count = people.filter(lambda(["p"], guarded))?.count().await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use common_config::RewriteConfig;
use common_error::{UnguardError, UnguardResult, ensure};
use log::{debug, trace};
use unguard_expr::{Expr, TypeDesc, Value};
use unguard_rewrite::RewritePipeline;

use crate::engine::QueryEngine;
use crate::ops;
use crate::stream::{RowBatchStream, RowStream, collect_rows, into_rows};

/// A composable query whose trees reach the engine without null guards.
pub struct GuardlessQuery<E: ?Sized> {
    engine: Arc<E>,
    expr: Expr,
    config: RewriteConfig,
}

impl<E: ?Sized> Clone for GuardlessQuery<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            expr: self.expr.clone(),
            config: self.config.clone(),
        }
    }
}

impl<E: ?Sized> std::fmt::Debug for GuardlessQuery<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardlessQuery")
            .field("expr", &self.expr.to_string())
            .field("config", &self.config)
            .finish()
    }
}

impl<E: QueryEngine + ?Sized> GuardlessQuery<E> {
    /// Wrap an engine; the query starts as the engine's whole source.
    pub fn new(engine: Arc<E>) -> Self {
        let element = engine
            .source_expr()
            .static_type()
            .element()
            .cloned()
            .unwrap_or(TypeDesc::Object);
        Self {
            engine,
            expr: Expr::query_root(element),
            config: RewriteConfig::default(),
        }
    }

    /// Replace the rewrite configuration.
    #[must_use]
    pub fn with_config(mut self, config: RewriteConfig) -> Self {
        self.config = config;
        self
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// The composed tree, still rooted at the placeholder and unrewritten.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The element type of the query.
    pub fn element_type(&self) -> TypeDesc {
        self.expr
            .static_type()
            .element()
            .cloned()
            .unwrap_or(TypeDesc::Object)
    }

    /// The placeholder standing for this query's source.
    pub fn root(&self) -> Expr {
        Expr::query_root(self.root_element())
    }

    fn root_element(&self) -> TypeDesc {
        let mut element = None;
        self.expr.for_each_node(&mut |node| {
            if let Expr::QueryRoot { element: e } = node {
                element.get_or_insert_with(|| e.clone());
            }
        });
        element.unwrap_or(TypeDesc::Object)
    }

    // ========== Composition ==========

    /// Continue the query with a sequence expression built over [`Self::root`].
    ///
    /// Rejects, before anything runs, a tree that does not produce a sequence
    /// or is not rooted at this query's placeholder.
    pub fn compose(&self, expr: Expr) -> UnguardResult<Self> {
        let ty = expr.static_type();
        if !ty.is_sequence() {
            return Err(UnguardError::invalid_parameter(format!(
                "Expected a sequence query, got {ty}"
            )));
        }
        self.check_rooted(&expr)?;
        Ok(Self {
            engine: Arc::clone(&self.engine),
            expr,
            config: self.config.clone(),
        })
    }

    /// Keep the elements `predicate` accepts.
    pub fn filter(&self, predicate: Expr) -> UnguardResult<Self> {
        check_lambda("filter", &predicate)?;
        self.compose(ops::filter(self.expr.clone(), predicate))
    }

    /// Project every element through `projection`.
    pub fn map(&self, projection: Expr, element: TypeDesc) -> UnguardResult<Self> {
        check_lambda("map", &projection)?;
        self.compose(ops::map(self.expr.clone(), projection, element))
    }

    /// Keep the first `n` elements.
    pub fn take(&self, n: i64) -> UnguardResult<Self> {
        check_count("take", n)?;
        self.compose(ops::take(self.expr.clone(), n))
    }

    /// Drop the first `n` elements.
    pub fn skip(&self, n: i64) -> UnguardResult<Self> {
        check_count("skip", n)?;
        self.compose(ops::skip(self.expr.clone(), n))
    }

    fn check_rooted(&self, expr: &Expr) -> UnguardResult<()> {
        let element = self.root_element();
        let mut rooted = false;
        let mut foreign = None;
        expr.for_each_node(&mut |node| {
            if let Expr::QueryRoot { element: e } = node {
                if *e == element {
                    rooted = true;
                } else if foreign.is_none() {
                    foreign = Some(e.clone());
                }
            }
        });

        if let Some(other) = foreign {
            return Err(UnguardError::invalid_parameter(format!(
                "Expression is rooted at a query over {other}, not {element}"
            )));
        }
        if !rooted {
            return Err(UnguardError::invalid_parameter(
                "Expression is not rooted at this query",
            ));
        }
        Ok(())
    }

    // ========== Execution ==========

    /// Replace the placeholder with the engine's source and remove guards.
    pub fn prepare(&self, expr: &Expr) -> UnguardResult<Expr> {
        let pipeline = RewritePipeline::for_source(self.engine.source_expr(), self.config.clone());
        let result = pipeline.rewrite(expr.clone())?;

        debug!(
            "Prepared query for {} ({} rules applied): {}",
            self.engine.name(),
            result.rules_applied,
            result.expr
        );
        if self.config.enable_trace {
            trace!("{result}");
        }

        Ok(result.expr)
    }

    /// Execute a scalar expression built over [`Self::root`].
    pub async fn execute_scalar(&self, expr: Expr) -> UnguardResult<Value> {
        self.check_rooted(&expr)?;
        self.execute(&expr).await
    }

    /// Number of elements.
    pub async fn count(&self) -> UnguardResult<i64> {
        let value = self.execute(&ops::count(self.expr.clone())).await?;
        value.as_int64().ok_or_else(|| {
            UnguardError::type_error(format!("count returned {}", value.type_name()))
        })
    }

    /// Whether any element exists.
    pub async fn any(&self) -> UnguardResult<bool> {
        let value = self.execute(&ops::any(self.expr.clone())).await?;
        value.as_bool().ok_or_else(|| {
            UnguardError::type_error(format!("any returned {}", value.type_name()))
        })
    }

    /// The first element.
    pub async fn first(&self) -> UnguardResult<Value> {
        self.execute(&ops::first(self.expr.clone())).await
    }

    /// Enumerate the elements in batches.
    pub async fn batches(&self) -> UnguardResult<RowBatchStream> {
        self.enumerate(&self.expr).await
    }

    /// Enumerate the elements one by one.
    pub async fn stream(&self) -> UnguardResult<RowStream> {
        Ok(into_rows(self.batches().await?))
    }

    /// Collect every element.
    pub async fn collect(&self) -> UnguardResult<Vec<Value>> {
        collect_rows(self.batches().await?).await
    }

    /// Collect every element from synchronous code.
    ///
    /// Must not be called from inside an async context.
    pub fn collect_blocking(&self) -> UnguardResult<Vec<Value>> {
        common_runtime::block_on(self.collect())?
    }
}

/// The shim is itself an engine: trees handed to it are prepared and
/// forwarded, and engine failures pass through unchanged.
#[async_trait]
impl<E: QueryEngine + ?Sized> QueryEngine for GuardlessQuery<E> {
    fn name(&self) -> &'static str {
        "GuardlessQuery"
    }

    fn source_expr(&self) -> Expr {
        self.engine.source_expr()
    }

    async fn execute(&self, expr: &Expr) -> UnguardResult<Value> {
        let prepared = self.prepare(expr)?;
        self.engine.execute(&prepared).await
    }

    async fn enumerate(&self, expr: &Expr) -> UnguardResult<RowBatchStream> {
        let prepared = self.prepare(expr)?;
        self.engine.enumerate(&prepared).await
    }
}

fn check_lambda(operator: &str, expr: &Expr) -> UnguardResult<()> {
    match ops::unquote(expr) {
        Expr::Lambda { params, .. } if params.len() == 1 => Ok(()),
        other => Err(UnguardError::invalid_parameter(format!(
            "{operator} expects a one-parameter lambda, got {other}"
        ))),
    }
}

fn check_count(operator: &str, n: i64) -> UnguardResult<()> {
    ensure!(n >= 0, InvalidParameter: "{operator} expects a non-negative count, got {n}");
    Ok(())
}

/// Wrap `engine` so null-propagation guards are removed before its trees
/// reach it.
pub fn without_null_propagation<E: QueryEngine>(engine: Arc<E>) -> GuardlessQuery<E> {
    GuardlessQuery::new(engine)
}

/// Extension method form of [`without_null_propagation`].
pub trait WithoutNullPropagation: QueryEngine {
    /// Wrap this engine in a [`GuardlessQuery`].
    fn without_null_propagation(self: Arc<Self>) -> GuardlessQuery<Self>;
}

impl<E: QueryEngine> WithoutNullPropagation for E {
    fn without_null_propagation(self: Arc<Self>) -> GuardlessQuery<Self> {
        GuardlessQuery::new(self)
    }
}
