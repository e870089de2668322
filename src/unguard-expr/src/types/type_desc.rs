//! Static type descriptors attached to every expression node.

use serde::{Deserialize, Serialize};

/// Static type of an expression node.
///
/// The descriptor is closed: nullable wrappers are an explicit variant rather
/// than something discovered by inspecting a type at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDesc {
    /// Boolean type.
    Bool,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string (a reference type, may be null).
    String,
    /// A named record type (a reference type, may be null).
    Record(String),
    /// A sequence of elements (a query or collection).
    Sequence(Box<Self>),
    /// Nullable wrapper around a value type.
    Nullable(Box<Self>),
    /// Anything else.
    Object,
}

impl TypeDesc {
    /// Create a nullable wrapper of `inner`.
    pub fn nullable(inner: Self) -> Self {
        Self::Nullable(Box::new(inner))
    }

    /// The nullable boolean type.
    pub fn nullable_bool() -> Self {
        Self::nullable(Self::Bool)
    }

    /// Create a sequence type.
    pub fn sequence(element: Self) -> Self {
        Self::Sequence(Box::new(element))
    }

    /// Create a record type.
    pub fn record(name: impl Into<String>) -> Self {
        Self::Record(name.into())
    }

    /// Check if this is the boolean type.
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Check if this is a nullable wrapper.
    pub const fn is_nullable_wrapper(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }

    /// Check if this is a nullable wrapper of `Bool`.
    pub fn is_nullable_bool(&self) -> bool {
        matches!(self, Self::Nullable(inner) if inner.is_bool())
    }

    /// Check if a value of this type may be null.
    ///
    /// True for nullable wrappers and for reference-like types.
    pub const fn admits_null(&self) -> bool {
        matches!(
            self,
            Self::Nullable(_) | Self::String | Self::Record(_) | Self::Sequence(_) | Self::Object
        )
    }

    /// Check if this is a sequence type.
    pub const fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// The wrapped type of a nullable wrapper.
    pub fn wrapped(&self) -> Option<&Self> {
        match self {
            Self::Nullable(inner) => Some(inner),
            _ => None,
        }
    }

    /// The element type of a sequence.
    pub fn element(&self) -> Option<&Self> {
        match self {
            Self::Sequence(inner) => Some(inner),
            _ => None,
        }
    }

    /// Strip one nullable wrapper, if any.
    pub fn unwrapped(&self) -> &Self {
        self.wrapped().unwrap_or(self)
    }

    /// Lift a value type into a nullable wrapper, leaving null-admitting types alone.
    pub fn lifted(&self) -> Self {
        if self.admits_null() {
            self.clone()
        } else {
            Self::nullable(self.clone())
        }
    }

    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self.unwrapped(), Self::Int64 | Self::Float64)
    }

    /// Get the display name for this type.
    pub fn display_name(&self) -> String {
        match self {
            Self::Bool => "Bool".to_string(),
            Self::Int64 => "Int64".to_string(),
            Self::Float64 => "Float64".to_string(),
            Self::String => "String".to_string(),
            Self::Record(name) => name.clone(),
            Self::Sequence(inner) => format!("Seq<{}>", inner.display_name()),
            Self::Nullable(inner) => format!("{}?", inner.display_name()),
            Self::Object => "Object".to_string(),
        }
    }
}

impl std::fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_wrapper() {
        let t = TypeDesc::nullable_bool();
        assert!(t.is_nullable_wrapper());
        assert!(t.is_nullable_bool());
        assert_eq!(t.wrapped(), Some(&TypeDesc::Bool));
        assert_eq!(t.unwrapped(), &TypeDesc::Bool);

        assert!(!TypeDesc::Bool.is_nullable_wrapper());
        assert!(!TypeDesc::nullable(TypeDesc::Int64).is_nullable_bool());
    }

    #[test]
    fn test_admits_null() {
        assert!(TypeDesc::String.admits_null());
        assert!(TypeDesc::record("Person").admits_null());
        assert!(TypeDesc::nullable(TypeDesc::Int64).admits_null());
        assert!(!TypeDesc::Int64.admits_null());
        assert!(!TypeDesc::Bool.admits_null());

        // Reference types admit null without being nullable wrappers.
        assert!(!TypeDesc::String.is_nullable_wrapper());
    }

    #[test]
    fn test_lifted() {
        assert_eq!(TypeDesc::Bool.lifted(), TypeDesc::nullable_bool());
        assert_eq!(TypeDesc::String.lifted(), TypeDesc::String);
        assert_eq!(TypeDesc::nullable_bool().lifted(), TypeDesc::nullable_bool());
    }

    #[test]
    fn test_display_name() {
        let t = TypeDesc::sequence(TypeDesc::record("Person"));
        assert_eq!(t.to_string(), "Seq<Person>");
        assert_eq!(TypeDesc::nullable(TypeDesc::Int64).to_string(), "Int64?");
        assert_eq!(t.element(), Some(&TypeDesc::record("Person")));
    }
}
