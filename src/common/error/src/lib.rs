//! Error types and result aliases for unguard.
//!
//! The guard rewrite itself is total and never fails; these errors come from
//! the rule framework, the query shim and the engines behind it.

mod error;

pub use error::{UnguardError, UnguardResult};
