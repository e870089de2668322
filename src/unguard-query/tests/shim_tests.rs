//! End-to-end tests for the guard-removing query shim.

use std::sync::Arc;

use async_trait::async_trait;
use common_config::EngineConfig;
use common_error::{UnguardError, UnguardResult};
use futures::TryStreamExt;
use tokio::sync::Mutex;
use unguard_expr::testing::{
    chained_guard, companion_guard, member_guard, method_guard_predicate, name, person_row,
    person_type, predicate, true_polarity_guard,
};
use unguard_expr::{Expr, TypeDesc, Value};
use unguard_query::{
    GuardlessQuery, MemoryEngine, QueryEngine, RowBatchStream, WithoutNullPropagation, ops,
    without_null_propagation,
};

fn people() -> Vec<Value> {
    vec![
        person_row(Some("Ann"), Some(true), Some(true)),
        person_row(Some("Bob"), Some(false), Some(false)),
        person_row(Some("k"), Some(true), Some(false)),
        person_row(Some("Kay"), Some(false), Some(true)),
    ]
}

fn strict_engine(rows: Vec<Value>) -> Arc<MemoryEngine> {
    Arc::new(
        MemoryEngine::new("people", person_type(), rows)
            .with_config(EngineConfig::strict().with_batch_size(2))
            .with_recording(),
    )
}

/// Engine that always fails and remembers what it was asked.
#[derive(Default)]
struct FailingEngine {
    seen: Mutex<Vec<Expr>>,
}

#[async_trait]
impl QueryEngine for FailingEngine {
    fn name(&self) -> &'static str {
        "FailingEngine"
    }

    fn source_expr(&self) -> Expr {
        Expr::source("people", person_type())
    }

    async fn execute(&self, expr: &Expr) -> UnguardResult<Value> {
        self.seen.lock().await.push(expr.clone());
        Err(UnguardError::execution("backend unavailable"))
    }

    async fn enumerate(&self, expr: &Expr) -> UnguardResult<RowBatchStream> {
        self.seen.lock().await.push(expr.clone());
        Err(UnguardError::execution("backend unavailable"))
    }
}

#[tokio::test]
async fn test_guarded_predicates_run_on_strict_engine() {
    let engine = strict_engine(people());
    let query = engine.clone().without_null_propagation();

    let cases = [
        (member_guard(), 2),
        (method_guard_predicate(), 1),
        (chained_guard(), 2),
        (companion_guard(), 2),
    ];
    for (body, expected) in cases {
        let count = query.filter(predicate(body)).unwrap().count().await.unwrap();
        assert_eq!(count, expected);
    }

    // One prepared tree per terminal, none of them guarded.
    let received = engine.take_received().await;
    assert_eq!(received.len(), 4);
    for tree in &received {
        assert!(!tree.contains(|e| matches!(e, Expr::Conditional { .. })));
    }
    assert!(engine.received().await.is_empty());
}

#[tokio::test]
async fn test_unmatched_conditional_still_reaches_engine() {
    let engine = strict_engine(people());
    let query = without_null_propagation(engine.clone());

    let err = query
        .filter(predicate(true_polarity_guard()))
        .unwrap()
        .count()
        .await
        .unwrap_err();
    assert!(matches!(err, UnguardError::UnsupportedExpression(_)));
    assert!(err.to_string().contains("MemoryEngine cannot translate conditional"));
}

#[tokio::test]
async fn test_engine_errors_pass_through_unchanged() {
    let engine = Arc::new(FailingEngine::default());
    let query = engine.clone().without_null_propagation();
    let filtered = query.filter(predicate(member_guard())).unwrap();

    let err = filtered.count().await.unwrap_err();
    assert_eq!(err.to_string(), "ExecutionError: backend unavailable");

    let err = filtered.batches().await.err().unwrap();
    assert!(matches!(err, UnguardError::ExecutionError(_)));

    let seen = engine.seen.lock().await;
    assert_eq!(seen.len(), 2);
    assert!(!seen[0].contains(|e| matches!(e, Expr::Conditional { .. })));
    assert!(!seen[1].contains(|e| matches!(e, Expr::QueryRoot { .. })));
}

#[tokio::test]
async fn test_composition_is_lazy() {
    let engine = Arc::new(FailingEngine::default());
    let query = without_null_propagation(engine.clone())
        .filter(predicate(member_guard()))
        .unwrap()
        .skip(1)
        .unwrap()
        .map(predicate(name()), TypeDesc::String)
        .unwrap()
        .take(2)
        .unwrap();

    assert!(engine.seen.lock().await.is_empty());
    assert_eq!(query.element_type(), TypeDesc::String);
    assert!(query.expr().contains(|e| matches!(e, Expr::Conditional { .. })));
}

#[tokio::test]
async fn test_stream_rows_in_order() {
    let query = strict_engine(people())
        .without_null_propagation()
        .filter(predicate(member_guard()))
        .unwrap()
        .map(predicate(name()), TypeDesc::String)
        .unwrap();

    let names: Vec<Value> = query.stream().await.unwrap().try_collect().await.unwrap();
    assert_eq!(names, vec![Value::from("Ann"), Value::from("k")]);

    let batches: Vec<Vec<Value>> = query.batches().await.unwrap().try_collect().await.unwrap();
    assert_eq!(batches.len(), 1);
}

#[tokio::test]
async fn test_nulls_at_removed_guards() {
    // A null wrapper value just fails the predicate.
    let rows = vec![
        person_row(Some("Ann"), None, Some(true)),
        person_row(Some("Bob"), Some(true), Some(true)),
    ];
    let query = strict_engine(rows).without_null_propagation();
    assert_eq!(
        query.filter(predicate(member_guard())).unwrap().count().await.unwrap(),
        1
    );

    // A null receiver is dereferenced once its guard is gone.
    let rows = vec![person_row(None, Some(true), Some(true))];
    let query = strict_engine(rows).without_null_propagation();
    let err = query
        .filter(predicate(method_guard_predicate()))
        .unwrap()
        .any()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("NullReference"));
}

#[tokio::test]
async fn test_shim_as_engine() {
    let engine = strict_engine(people());
    let shim: GuardlessQuery<MemoryEngine> = without_null_propagation(engine);

    let tree = ops::count(ops::filter(shim.root(), predicate(member_guard())));
    assert_eq!(shim.execute(&tree).await.unwrap(), Value::Int64(2));

    let dynamic: Arc<dyn QueryEngine> = Arc::new(shim.clone());
    let nested = GuardlessQuery::new(dynamic);
    let tree = ops::any(ops::filter(nested.root(), predicate(chained_guard())));
    assert_eq!(nested.execute_scalar(tree).await.unwrap(), Value::Bool(true));
    assert_eq!(nested.first().await.unwrap(), people()[0]);
}

#[test]
fn test_collect_blocking_outside_runtime() {
    let rows = strict_engine(people())
        .without_null_propagation()
        .filter(predicate(companion_guard()))
        .unwrap()
        .collect_blocking()
        .unwrap();
    assert_eq!(rows.len(), 2);
}
