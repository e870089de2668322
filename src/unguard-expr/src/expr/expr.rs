//! The expression node model.
//!
//! Trees are immutable once built: rewrites produce new nodes and never
//! mutate an existing one. Equality is structural, so "is this the same
//! access path" is answered by `==` rather than by node identity.

use serde::{Deserialize, Serialize};

use super::{BinaryOp, MemberId, MethodId, UnaryOp};
use crate::types::{TypeDesc, Value};

/// An expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A literal, including the null literal.
    Constant {
        /// Literal value.
        value: Value,
        /// Static type.
        ty: TypeDesc,
    },

    /// A reference to a lambda parameter.
    Parameter {
        /// Parameter name.
        name: String,
        /// Static type.
        ty: TypeDesc,
    },

    /// A read of a member off `owner`.
    Member {
        /// Expression the member is read from.
        owner: Box<Self>,
        /// Member being read.
        member: MemberId,
        /// Result type.
        ty: TypeDesc,
    },

    /// A method invocation.
    Call {
        /// Receiver of an instance call; `None` for static calls.
        receiver: Option<Box<Self>>,
        /// Invoked method.
        method: MethodId,
        /// Ordered arguments.
        args: Vec<Self>,
        /// Result type.
        ty: TypeDesc,
    },

    /// A unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Self>,
        /// Result type (the target type for conversions).
        ty: TypeDesc,
    },

    /// A binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Self>,
        /// Right operand.
        right: Box<Self>,
        /// Result type.
        ty: TypeDesc,
    },

    /// A ternary conditional.
    Conditional {
        /// Condition.
        test: Box<Self>,
        /// Result when the condition holds.
        if_true: Box<Self>,
        /// Result otherwise.
        if_false: Box<Self>,
        /// Result type.
        ty: TypeDesc,
    },

    /// A lambda used as a query predicate or projection.
    Lambda {
        /// Parameter names, bound positionally.
        params: Vec<String>,
        /// Body.
        body: Box<Self>,
    },

    /// Placeholder for the composed query built so far.
    QueryRoot {
        /// Element type of the query.
        element: TypeDesc,
    },

    /// A data source owned by a query engine.
    Source {
        /// Source name.
        name: String,
        /// Element type.
        element: TypeDesc,
    },

    /// Any other sub-tree, carried through unchanged.
    Opaque {
        /// Free-form label.
        label: String,
        /// Static type.
        ty: TypeDesc,
    },
}

impl Expr {
    // ========== Constructors ==========

    /// Create a constant, inferring its static type from the value.
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = match &value {
            Value::Bool(_) => TypeDesc::Bool,
            Value::Int64(_) => TypeDesc::Int64,
            Value::Float64(_) => TypeDesc::Float64,
            Value::String(_) => TypeDesc::String,
            Value::Null | Value::Record(_) | Value::List(_) => TypeDesc::Object,
        };
        Self::Constant { value, ty }
    }

    /// Create a constant with an explicit static type.
    pub fn typed_constant(value: impl Into<Value>, ty: TypeDesc) -> Self {
        Self::Constant {
            value: value.into(),
            ty,
        }
    }

    /// Create the null literal of a given type.
    pub fn null_of(ty: TypeDesc) -> Self {
        Self::Constant {
            value: Value::Null,
            ty,
        }
    }

    /// Create a parameter reference.
    pub fn param(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self::Parameter {
            name: name.into(),
            ty,
        }
    }

    /// Create a binary expression, computing its result type.
    pub fn binary(left: Self, op: BinaryOp, right: Self) -> Self {
        let ty = op.result_type(&left.static_type(), &right.static_type());
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty,
        }
    }

    /// Create a unary expression with an explicit result type.
    pub fn unary(op: UnaryOp, operand: Self, ty: TypeDesc) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
            ty,
        }
    }

    /// Create a conditional; its type is the type of the `if_false` branch.
    pub fn conditional(test: Self, if_true: Self, if_false: Self) -> Self {
        let ty = if_false.static_type();
        Self::Conditional {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
            ty,
        }
    }

    /// Create a static (receiver-less) call.
    pub fn call_static(method: impl Into<String>, args: Vec<Self>, ty: TypeDesc) -> Self {
        Self::Call {
            receiver: None,
            method: MethodId::function(method),
            args,
            ty,
        }
    }

    /// Create a lambda.
    pub fn lambda<S: Into<String>>(params: impl IntoIterator<Item = S>, body: Self) -> Self {
        Self::Lambda {
            params: params.into_iter().map(Into::into).collect(),
            body: Box::new(body),
        }
    }

    /// Create the composed-query placeholder.
    pub const fn query_root(element: TypeDesc) -> Self {
        Self::QueryRoot { element }
    }

    /// Create a data source reference.
    pub fn source(name: impl Into<String>, element: TypeDesc) -> Self {
        Self::Source {
            name: name.into(),
            element,
        }
    }

    /// Create an opaque node.
    pub fn opaque(label: impl Into<String>, ty: TypeDesc) -> Self {
        Self::Opaque {
            label: label.into(),
            ty,
        }
    }

    // ========== Fluent builders ==========

    /// Read a named member.
    #[must_use]
    pub fn member(self, name: impl Into<String>, ty: TypeDesc) -> Self {
        Self::Member {
            owner: Box::new(self),
            member: MemberId::named(name),
            ty,
        }
    }

    /// Unwrap a nullable wrapper (`x.Value`).
    #[must_use]
    pub fn wrapped_value(self) -> Self {
        let ty = self.static_type().unwrapped().clone();
        Self::Member {
            owner: Box::new(self),
            member: MemberId::WrappedValue,
            ty,
        }
    }

    /// Test whether a nullable wrapper holds a value (`x.HasValue`).
    #[must_use]
    pub fn has_value(self) -> Self {
        Self::Member {
            owner: Box::new(self),
            member: MemberId::HasValue,
            ty: TypeDesc::Bool,
        }
    }

    /// Invoke an instance method on this expression.
    #[must_use]
    pub fn call(self, method: impl Into<String>, args: Vec<Self>, ty: TypeDesc) -> Self {
        Self::Call {
            receiver: Some(Box::new(self)),
            method: MethodId::instance(method),
            args,
            ty,
        }
    }

    /// Convert to another type.
    #[must_use]
    pub fn convert(self, ty: TypeDesc) -> Self {
        Self::unary(UnaryOp::Convert, self, ty)
    }

    /// Quote (used for lambdas passed to query operators).
    #[must_use]
    pub fn quote(self) -> Self {
        let ty = self.static_type();
        Self::unary(UnaryOp::Quote, self, ty)
    }

    /// Logical NOT.
    #[must_use]
    pub fn logical_not(self) -> Self {
        let ty = self.static_type();
        Self::unary(UnaryOp::Not, self, ty)
    }

    /// Arithmetic negation.
    #[must_use]
    pub fn negate(self) -> Self {
        let ty = self.static_type();
        Self::unary(UnaryOp::Negate, self, ty)
    }

    /// Equality comparison.
    #[must_use]
    pub fn equal(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Equal, other)
    }

    /// Inequality comparison.
    #[must_use]
    pub fn not_equal(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::NotEqual, other)
    }

    /// Less than comparison.
    #[must_use]
    pub fn less_than(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Lt, other)
    }

    /// Greater than comparison.
    #[must_use]
    pub fn greater_than(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Gt, other)
    }

    /// Logical AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::And, other)
    }

    /// Logical OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Or, other)
    }

    /// Compare against the null literal of this expression's type.
    #[must_use]
    pub fn equal_null(self) -> Self {
        let null = Self::null_of(self.static_type());
        self.equal(null)
    }

    /// Compare against the null literal with `!=`.
    #[must_use]
    pub fn not_equal_null(self) -> Self {
        let null = Self::null_of(self.static_type());
        self.not_equal(null)
    }

    // ========== Analysis methods ==========

    /// The static type of this node.
    pub fn static_type(&self) -> TypeDesc {
        match self {
            Self::Constant { ty, .. }
            | Self::Parameter { ty, .. }
            | Self::Member { ty, .. }
            | Self::Call { ty, .. }
            | Self::Unary { ty, .. }
            | Self::Binary { ty, .. }
            | Self::Conditional { ty, .. }
            | Self::Opaque { ty, .. } => ty.clone(),
            Self::Lambda { body, .. } => body.static_type(),
            Self::QueryRoot { element } | Self::Source { element, .. } => {
                TypeDesc::sequence(element.clone())
            }
        }
    }

    /// Check if this node is the null literal.
    pub const fn is_null_constant(&self) -> bool {
        matches!(
            self,
            Self::Constant {
                value: Value::Null,
                ..
            }
        )
    }

    /// Check if this node is a boolean-typed constant holding `expected`.
    pub fn is_bool_constant(&self, expected: bool) -> bool {
        matches!(
            self,
            Self::Constant { value: Value::Bool(b), ty: TypeDesc::Bool } if *b == expected
        )
    }

    /// If this node is `path == null`, return `path`.
    pub fn as_null_check(&self) -> Option<&Self> {
        match self {
            Self::Binary {
                op: BinaryOp::Equal,
                left,
                right,
                ..
            } if right.is_null_constant() => Some(&**left),
            _ => None,
        }
    }

    /// Get the constant value, if this is a constant.
    pub const fn as_constant(&self) -> Option<&Value> {
        match self {
            Self::Constant { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Short name of the node variant, used in traces.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Constant { .. } => "Constant",
            Self::Parameter { .. } => "Parameter",
            Self::Member { .. } => "Member",
            Self::Call { .. } => "Call",
            Self::Unary { .. } => "Unary",
            Self::Binary { .. } => "Binary",
            Self::Conditional { .. } => "Conditional",
            Self::Lambda { .. } => "Lambda",
            Self::QueryRoot { .. } => "QueryRoot",
            Self::Source { .. } => "Source",
            Self::Opaque { .. } => "Opaque",
        }
    }

    /// Direct children in positional order.
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Member { owner, .. } => vec![&**owner],
            Self::Call { receiver, args, .. } => {
                receiver.iter().map(|r| &**r).chain(args).collect()
            }
            Self::Unary { operand, .. } => vec![&**operand],
            Self::Binary { left, right, .. } => vec![&**left, &**right],
            Self::Conditional {
                test,
                if_true,
                if_false,
                ..
            } => vec![&**test, &**if_true, &**if_false],
            Self::Lambda { body, .. } => vec![&**body],
            Self::Constant { .. }
            | Self::Parameter { .. }
            | Self::QueryRoot { .. }
            | Self::Source { .. }
            | Self::Opaque { .. } => Vec::new(),
        }
    }

    /// Visit every node in pre-order.
    pub fn for_each_node<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        f(self);
        for child in self.children() {
            child.for_each_node(f);
        }
    }

    /// Check if any node in the tree satisfies `pred`.
    pub fn contains(&self, pred: impl Fn(&Self) -> bool) -> bool {
        let mut found = false;
        self.for_each_node(&mut |node| found = found || pred(node));
        found
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.for_each_node(&mut |_| count += 1);
        count
    }

    /// Pre-order trace of node kinds, space separated.
    pub fn kind_trace(&self) -> String {
        let mut kinds = Vec::new();
        self.for_each_node(&mut |node| kinds.push(node.kind()));
        kinds.join(" ")
    }
}

/// Create a parameter reference.
pub fn param(name: impl Into<String>, ty: TypeDesc) -> Expr {
    Expr::param(name, ty)
}

/// Create a constant.
pub fn constant(value: impl Into<Value>) -> Expr {
    Expr::constant(value)
}

/// Create the null literal of a given type.
pub fn null_of(ty: TypeDesc) -> Expr {
    Expr::null_of(ty)
}

/// Create a lambda.
pub fn lambda<S: Into<String>>(params: impl IntoIterator<Item = S>, body: Expr) -> Expr {
    Expr::lambda(params, body)
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant { value, .. } => write!(f, "{value}"),
            Self::Parameter { name, .. } => write!(f, "{name}"),
            Self::Member { owner, member, .. } => write!(f, "{owner}.{member}"),
            Self::Call {
                receiver,
                method,
                args,
                ..
            } => {
                let args = args
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                match receiver {
                    Some(receiver) => write!(f, "{receiver}.{method}({args})"),
                    None => write!(f, "{method}({args})"),
                }
            }
            Self::Unary { op, operand, ty } => match op {
                UnaryOp::Not => write!(f, "!{operand}"),
                UnaryOp::Negate => write!(f, "-{operand}"),
                UnaryOp::Convert => write!(f, "({ty}){operand}"),
                UnaryOp::Quote => write!(f, "{operand}"),
            },
            Self::Binary {
                op, left, right, ..
            } => write!(f, "({left} {op} {right})"),
            Self::Conditional {
                test,
                if_true,
                if_false,
                ..
            } => write!(f, "({test} ? {if_true} : {if_false})"),
            Self::Lambda { params, body } => {
                if params.len() == 1 {
                    write!(f, "{} => {body}", params[0])
                } else {
                    write!(f, "({}) => {body}", params.join(", "))
                }
            }
            Self::QueryRoot { .. } => write!(f, "<query>"),
            Self::Source { name, .. } => write!(f, "{name}"),
            Self::Opaque { label, .. } => write!(f, "<{label}>"),
        }
    }
}
