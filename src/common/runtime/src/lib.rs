//! Async runtime utilities for unguard.
//!
//! Lets synchronous callers drive the async engine API.

use std::future::Future;

use common_error::{UnguardError, UnguardResult};
use tokio::runtime::Runtime;

/// Create a Tokio runtime for blocking operations.
pub fn get_runtime() -> UnguardResult<Runtime> {
    Runtime::new().map_err(|e| UnguardError::internal(format!("Failed to create runtime: {e}")))
}

/// Block on a future using a fresh runtime.
///
/// Must not be called from inside an async context.
pub fn block_on<F: Future>(future: F) -> UnguardResult<F::Output> {
    let runtime = get_runtime()?;
    Ok(runtime.block_on(future))
}
