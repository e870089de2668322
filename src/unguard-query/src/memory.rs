//! In-memory reference engine.
//!
//! Runs queries over a single named source of record rows. In strict mode it
//! refuses conditional nodes during translation, standing in for a remote
//! provider whose query language has no ternary.

use std::sync::Arc;

use async_trait::async_trait;
use common_config::EngineConfig;
use common_error::{UnguardError, UnguardResult};
use log::debug;
use tokio::sync::Mutex;
use unguard_expr::{Expr, TypeDesc, Value};

use crate::engine::QueryEngine;
use crate::evaluator::Evaluator;
use crate::stream::{MemoryRowStream, RowBatchStream};

/// Query engine over in-memory rows.
#[derive(Debug)]
pub struct MemoryEngine {
    source: String,
    element: TypeDesc,
    rows: Arc<Vec<Value>>,
    config: EngineConfig,
    record: bool,
    /// Trees handed to the engine since the last drain, when recording.
    received: Mutex<Vec<Expr>>,
}

impl MemoryEngine {
    /// Create an engine serving `rows` as the source `source`.
    pub fn new(source: impl Into<String>, element: TypeDesc, rows: Vec<Value>) -> Self {
        Self {
            source: source.into(),
            element,
            rows: Arc::new(rows),
            config: EngineConfig::default(),
            record: false,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Replace the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The rows of the source.
    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    /// Keep a copy of every tree this engine is asked to run.
    #[must_use]
    pub fn with_recording(mut self) -> Self {
        self.record = true;
        self
    }

    /// Trees received since the last [`Self::take_received`]; empty unless
    /// recording is on.
    pub async fn received(&self) -> Vec<Expr> {
        self.received.lock().await.clone()
    }

    /// Drain the recorded trees.
    pub async fn take_received(&self) -> Vec<Expr> {
        std::mem::take(&mut *self.received.lock().await)
    }

    /// Check that the engine can translate `expr`.
    pub fn translate(&self, expr: &Expr) -> UnguardResult<()> {
        if !self.config.strict {
            return Ok(());
        }

        let mut conditional = None;
        expr.for_each_node(&mut |node| {
            if conditional.is_none() && matches!(node, Expr::Conditional { .. }) {
                conditional = Some(node);
            }
        });

        match conditional {
            Some(node) => Err(UnguardError::unsupported(format!(
                "{} cannot translate conditional {node}",
                self.name()
            ))),
            None => Ok(()),
        }
    }

    async fn run(&self, expr: &Expr) -> UnguardResult<Value> {
        if self.record {
            self.received.lock().await.push(expr.clone());
        }
        self.translate(expr)?;
        debug!("{} running {}", self.name(), expr);
        Evaluator::new(&self.source, &self.rows).evaluate(expr)
    }
}

#[async_trait]
impl QueryEngine for MemoryEngine {
    fn name(&self) -> &'static str {
        "MemoryEngine"
    }

    fn source_expr(&self) -> Expr {
        Expr::source(self.source.clone(), self.element.clone())
    }

    async fn execute(&self, expr: &Expr) -> UnguardResult<Value> {
        self.run(expr).await
    }

    async fn enumerate(&self, expr: &Expr) -> UnguardResult<RowBatchStream> {
        match self.run(expr).await? {
            Value::List(rows) => Ok(MemoryRowStream::boxed(rows, self.config.batch_size)),
            other => Err(UnguardError::type_error(format!(
                "Expected a sequence query, got {}",
                other.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use crate::stream::collect_rows;
    use unguard_expr::expr::lambda;
    use unguard_expr::testing::{flag, member_guard, person_row, person_type};

    fn engine() -> MemoryEngine {
        MemoryEngine::new(
            "people",
            person_type(),
            vec![
                person_row(Some("Ann"), Some(true), None),
                person_row(Some("Bob"), Some(false), None),
            ],
        )
    }

    #[tokio::test]
    async fn test_execute_and_enumerate() {
        let engine = engine().with_recording();
        let source = engine.source_expr();
        assert_eq!(source.static_type(), TypeDesc::sequence(person_type()));

        let count = engine.execute(&ops::count(source.clone())).await.unwrap();
        assert_eq!(count, Value::Int64(2));

        let filtered = ops::filter(source, lambda(["p"], flag()));
        let rows = collect_rows(engine.enumerate(&filtered).await.unwrap())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(engine.received().await.len(), 2);
    }

    #[tokio::test]
    async fn test_recording_is_opt_in_and_drains() {
        let quiet = engine();
        quiet.execute(&ops::count(quiet.source_expr())).await.unwrap();
        assert!(quiet.received().await.is_empty());

        let recording = engine().with_recording();
        let count = ops::count(recording.source_expr());
        recording.execute(&count).await.unwrap();
        recording.execute(&count).await.unwrap();

        assert_eq!(recording.take_received().await, vec![count.clone(), count]);
        assert!(recording.received().await.is_empty());
    }

    #[tokio::test]
    async fn test_strict_rejects_conditionals() {
        let engine = engine().with_config(EngineConfig::strict());
        assert!(engine.config().strict);

        let guarded = ops::filter(engine.source_expr(), lambda(["p"], member_guard()));
        let err = engine.execute(&ops::count(guarded.clone())).await.unwrap_err();
        assert!(matches!(err, UnguardError::UnsupportedExpression(_)));
        assert!(err.to_string().contains("MemoryEngine cannot translate conditional"));

        let lenient = self::engine();
        assert!(lenient.translate(&guarded).is_ok());
    }

    #[tokio::test]
    async fn test_enumerate_scalar_fails() {
        let engine = engine();
        let err = engine
            .enumerate(&ops::count(engine.source_expr()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, UnguardError::TypeError(_)));
    }

    #[tokio::test]
    async fn test_batches_follow_config() {
        let engine = engine().with_config(EngineConfig::default().with_batch_size(1));
        let batches: Vec<_> = futures::TryStreamExt::try_collect(
            engine.enumerate(&engine.source_expr()).await.unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(engine.rows().len(), 2);
    }
}
