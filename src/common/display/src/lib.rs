//! Display utilities for unguard.
//!
//! Provides tree rendering for expression explain output.

mod tree;

pub use tree::{DisplayTree, TreeNode};

/// Indent a multi-line string.
pub fn indent(s: &str, prefix: &str) -> String {
    s.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
