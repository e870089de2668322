//! Rewrite rules applied to query expressions before they reach an engine.
//!
//! - **ReplaceQueryRoot**: splice the engine's source into the composed query
//! - **NullGuardRemoval**: strip null-propagation guards

mod null_guard_removal;
mod pipeline;
mod replace_query_root;
mod rule;

pub use null_guard_removal::NullGuardRemoval;
pub use pipeline::RewritePipeline;
pub use replace_query_root::ReplaceQueryRoot;
pub use rule::{RewriteResult, RewriteRule, RuleTrace, Transformed};
