//! Unary operators for expression nodes.

use serde::{Deserialize, Serialize};

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical NOT
    Not,
    /// Arithmetic negation (-)
    Negate,
    /// Widening or narrowing conversion to the node's result type
    Convert,
    /// Quotes a lambda so it is passed as a tree rather than evaluated
    Quote,
}

impl UnaryOp {
    /// Get the operator name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Negate => "-",
            Self::Convert => "convert",
            Self::Quote => "quote",
        }
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
