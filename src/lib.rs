//! Unguard - null-propagation guard removal for query expression trees
//!
//! Compilers lower null-propagating member access in boolean contexts to
//! conditionals that many query backends cannot translate. Unguard removes
//! those guards from expression trees, and wraps query engines so every tree
//! they execute arrives without them.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export core crates
pub use common_config as config;
pub use common_error as error;
pub use unguard_expr as expr;
pub use unguard_query as query;
pub use unguard_rewrite as rewrite;

pub use common_error::{UnguardError, UnguardResult};
pub use unguard_query::{GuardlessQuery, QueryEngine, WithoutNullPropagation, without_null_propagation};
pub use unguard_rewrite::{remove_all_null_guards, remove_method_null_guards, remove_null_guards};

/// Unguard version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
