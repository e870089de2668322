//! Query pass-through shim for unguard.
//!
//! A [`QueryEngine`] runs expression trees against a data source. Wrapping an
//! engine with [`without_null_propagation`] yields a [`GuardlessQuery`]:
//! operators compose lazily over a placeholder root, and when a terminal
//! operator runs the composed tree is bound to the engine's source and its
//! null-propagation guards are removed before the engine sees it.
//!
//! [`MemoryEngine`] is an in-memory reference engine with a strict mode that
//! refuses conditional nodes, the way many remote query translators do.

pub mod engine;
pub mod evaluator;
pub mod memory;
pub mod ops;
pub mod shim;
pub mod stream;

pub use engine::QueryEngine;
pub use evaluator::{Env, Evaluator};
pub use memory::MemoryEngine;
pub use shim::{GuardlessQuery, WithoutNullPropagation, without_null_propagation};
pub use stream::{
    MemoryRowStream, RowBatch, RowBatchStream, RowStream, collect_rows, count_rows, into_rows,
};
