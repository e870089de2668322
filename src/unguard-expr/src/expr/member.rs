//! Member and method identifiers.

use serde::{Deserialize, Serialize};

/// Identifies the member read by a member access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberId {
    /// A named field or property.
    Named(String),
    /// The wrapped-value accessor of a nullable wrapper (an unwrap).
    WrappedValue,
    /// The has-value test of a nullable wrapper.
    HasValue,
}

impl MemberId {
    /// Create a named member.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Check if this is the wrapped-value accessor.
    pub const fn is_wrapped_value(&self) -> bool {
        matches!(self, Self::WrappedValue)
    }

    /// Name shown in traces and display output.
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::WrappedValue => "Value",
            Self::HasValue => "HasValue",
        }
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Identifies the method invoked by a call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodId {
    /// Method name.
    pub name: String,
    /// Static methods take no receiver; their first argument stands in for it.
    pub is_static: bool,
}

impl MethodId {
    /// An instance method invoked on a receiver.
    pub fn instance(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_static: false,
        }
    }

    /// A static (or extension) method.
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_static: true,
        }
    }
}

impl std::fmt::Display for MethodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
