//! Row stream utilities.
//!
//! Engines hand sequence results back as a stream of row batches.

use std::pin::Pin;
use std::task::{Context, Poll};

use common_error::{UnguardError, UnguardResult};
use futures::stream::{Stream, StreamExt, TryStreamExt};
use unguard_expr::Value;

// ============================================================================
// Stream Types
// ============================================================================

/// A batch of rows.
pub type RowBatch = Vec<Value>;

/// A stream of row batches produced by an engine.
pub type RowBatchStream = Pin<Box<dyn Stream<Item = UnguardResult<RowBatch>> + Send>>;

/// A stream of single rows.
pub type RowStream = Pin<Box<dyn Stream<Item = UnguardResult<Value>> + Send>>;

// ============================================================================
// Stream Utilities
// ============================================================================

/// Create an empty `RowBatchStream`.
pub fn empty_stream() -> RowBatchStream {
    Box::pin(futures::stream::empty())
}

/// Create a `RowBatchStream` from a single batch.
pub fn once_stream(batch: RowBatch) -> RowBatchStream {
    Box::pin(futures::stream::once(async move { Ok(batch) }))
}

/// Create a `RowBatchStream` from a fallible iterator.
pub fn iter_stream<I>(iter: I) -> RowBatchStream
where
    I: IntoIterator<Item = UnguardResult<RowBatch>> + Send + 'static,
    I::IntoIter: Send,
{
    Box::pin(futures::stream::iter(iter))
}

/// Flatten a batch stream into a stream of rows.
pub fn into_rows(batches: RowBatchStream) -> RowStream {
    Box::pin(
        batches
            .map_ok(|batch| futures::stream::iter(batch.into_iter().map(Ok::<_, UnguardError>)))
            .try_flatten(),
    )
}

/// Drain a batch stream into a single vector of rows.
pub async fn collect_rows(batches: RowBatchStream) -> UnguardResult<Vec<Value>> {
    batches.try_concat().await
}

/// Count the rows left in a batch stream.
pub async fn count_rows(mut batches: RowBatchStream) -> UnguardResult<usize> {
    let mut total = 0;
    while let Some(batch) = batches.next().await {
        total += batch?.len();
    }
    Ok(total)
}

// ============================================================================
// MemoryRowStream
// ============================================================================

/// A stream over in-memory rows, yielded in fixed-size batches.
pub struct MemoryRowStream {
    rows: Vec<Value>,
    batch_size: usize,
    index: usize,
}

impl MemoryRowStream {
    /// Create a new memory row stream.
    ///
    /// A batch size of zero is treated as one.
    pub fn new(rows: Vec<Value>, batch_size: usize) -> Self {
        Self {
            rows,
            batch_size: batch_size.max(1),
            index: 0,
        }
    }

    /// Create a boxed stream.
    pub fn boxed(rows: Vec<Value>, batch_size: usize) -> RowBatchStream {
        Box::pin(Self::new(rows, batch_size))
    }

    fn remaining_batches(&self) -> usize {
        (self.rows.len() - self.index).div_ceil(self.batch_size)
    }
}

impl Stream for MemoryRowStream {
    type Item = UnguardResult<RowBatch>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.index < self.rows.len() {
            let end = (self.index + self.batch_size).min(self.rows.len());
            let batch = self.rows[self.index..end].to_vec();
            self.index = end;
            Poll::Ready(Some(Ok(batch)))
        } else {
            Poll::Ready(None)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining_batches();
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: i64) -> Vec<Value> {
        (0..n).map(Value::Int64).collect()
    }

    #[tokio::test]
    async fn test_memory_stream_batches() {
        let stream = MemoryRowStream::new(rows(5), 2);
        assert_eq!(stream.size_hint(), (3, Some(3)));

        let batches: Vec<_> = MemoryRowStream::boxed(rows(5), 2)
            .try_collect()
            .await
            .unwrap();
        let sizes: Vec<_> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_zero_batch_size() {
        let batches: Vec<_> = MemoryRowStream::boxed(rows(2), 0)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(batches.len(), 2);
    }

    #[tokio::test]
    async fn test_into_rows() {
        let rows: Vec<_> = into_rows(MemoryRowStream::boxed(rows(3), 2))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(rows, vec![Value::Int64(0), Value::Int64(1), Value::Int64(2)]);
    }

    #[tokio::test]
    async fn test_collect_and_count() {
        assert_eq!(
            collect_rows(MemoryRowStream::boxed(rows(4), 3)).await.unwrap(),
            rows(4)
        );
        assert_eq!(count_rows(MemoryRowStream::boxed(rows(4), 3)).await.unwrap(), 4);
        assert_eq!(count_rows(empty_stream()).await.unwrap(), 0);
        assert_eq!(
            collect_rows(once_stream(rows(1))).await.unwrap(),
            rows(1)
        );
    }

    #[tokio::test]
    async fn test_error_propagates() {
        let stream = iter_stream(vec![
            Ok(rows(1)),
            Err(UnguardError::execution("disconnected")),
        ]);
        let err = collect_rows(stream).await.unwrap_err();
        assert!(matches!(err, UnguardError::ExecutionError(_)));
    }
}
