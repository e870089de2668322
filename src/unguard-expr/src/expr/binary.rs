//! Binary operators for expression nodes.

use serde::{Deserialize, Serialize};

use crate::types::TypeDesc;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Comparison operators
    /// Equality (==)
    Equal,
    /// Inequality (!=)
    NotEqual,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    GtEq,

    // Logical operators
    /// Logical AND (short-circuit)
    And,
    /// Logical OR (short-circuit)
    Or,

    // Arithmetic operators
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Subtract,
    /// Multiplication (*)
    Multiply,
    /// Division (/)
    Divide,
}

impl BinaryOp {
    /// Check if this is a comparison operator.
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Equal | Self::NotEqual | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }

    /// Check if this is a logical operator.
    pub const fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Check if this is an arithmetic operator.
    pub const fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide
        )
    }

    /// Get the result type of this operator given operand types.
    ///
    /// Comparisons and logical operators over a nullable wrapper are lifted
    /// to a nullable boolean.
    pub fn result_type(&self, left: &TypeDesc, right: &TypeDesc) -> TypeDesc {
        let lifted = left.is_nullable_wrapper() || right.is_nullable_wrapper();
        match self {
            Self::Equal | Self::NotEqual => TypeDesc::Bool,
            Self::Lt | Self::LtEq | Self::Gt | Self::GtEq | Self::And | Self::Or => {
                if lifted {
                    TypeDesc::nullable_bool()
                } else {
                    TypeDesc::Bool
                }
            }
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide => {
                let base = match (left.unwrapped(), right.unwrapped()) {
                    (TypeDesc::Int64, TypeDesc::Int64) => TypeDesc::Int64,
                    (TypeDesc::String, _) | (_, TypeDesc::String) if *self == Self::Add => {
                        return TypeDesc::String;
                    }
                    _ => TypeDesc::Float64,
                };
                if lifted { base.lifted() } else { base }
            }
        }
    }

    /// Get the operator symbol for display.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
