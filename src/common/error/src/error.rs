//! Core error types for unguard.

use thiserror::Error;

/// Result type alias using `UnguardError`.
pub type UnguardResult<T> = std::result::Result<T, UnguardError>;

/// Error type for rewrite pipelines, the query shim and query engines.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UnguardError {
    /// Type mismatch or invalid type operation.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Invalid value encountered during evaluation.
    #[error("ValueError: {0}")]
    ValueError(String),

    /// Invalid argument handed to the shim or an engine.
    #[error("InvalidParameter: {0}")]
    InvalidParameter(String),

    /// An engine cannot translate part of an expression tree.
    #[error("UnsupportedExpression: {0}")]
    UnsupportedExpression(String),

    /// Query execution error raised by an engine.
    #[error("ExecutionError: {0}")]
    ExecutionError(String),

    /// Feature not yet implemented.
    #[error("NotImplemented: {0}")]
    NotImplemented(String),

    /// Internal error (bug in unguard).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl UnguardError {
    /// Create a new `TypeError`.
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a new `ValueError`.
    pub fn value_error<S: Into<String>>(msg: S) -> Self {
        Self::ValueError(msg.into())
    }

    /// Create a new `InvalidParameter` error.
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a new `UnsupportedExpression` error.
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedExpression(msg.into())
    }

    /// Create a new `ExecutionError`.
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionError(msg.into())
    }

    /// Create a new `NotImplemented` error.
    pub fn not_implemented<S: Into<String>>(msg: S) -> Self {
        Self::NotImplemented(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Create a null dereference error (using `ExecutionError`).
    pub fn null_reference<S: Into<String>>(what: S) -> Self {
        Self::ExecutionError(format!("NullReference: {}", what.into()))
    }
}

/// Ensure a condition holds, returning an `ExecutionError` if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::UnguardError::ExecutionError($msg.to_string()));
        }
    };
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::UnguardError::$variant(format!($($msg)*)));
        }
    };
}

/// Return early with a `ValueError`.
#[macro_export]
macro_rules! value_err {
    ($($arg:tt)*) => {
        return Err($crate::UnguardError::ValueError(format!($($arg)*)))
    };
}

/// Return early with a `TypeError`.
#[macro_export]
macro_rules! type_err {
    ($($arg:tt)*) => {
        return Err($crate::UnguardError::TypeError(format!($($arg)*)))
    };
}
