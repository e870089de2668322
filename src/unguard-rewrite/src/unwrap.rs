//! What counts as the unwrap half of a null guard.
//!
//! A guard is `path == null ? default : unwrap(path)`. The conditional's
//! shape is fixed; the unwrap expression and the defaults it pairs with are
//! not, so the detector is generic over an [`UnwrapShape`].

use unguard_expr::{Expr, Value};

/// A matched unwrap expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unwrapped<'a> {
    /// The operand being unwrapped; must equal the guarded path.
    pub operand: &'a Expr,
    /// The node that replaces the whole guard once visited.
    pub replacement: &'a Expr,
}

/// Recognizes the `if_true` / `if_false` halves of a guard conditional.
pub trait UnwrapShape {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Check that `if_true` is a default this shape pairs with.
    fn accepts_default(&self, if_true: &Expr) -> bool;

    /// If `if_false` is an unwrap of this shape, the operand it unwraps.
    fn guarded_operand<'a>(&self, if_false: &'a Expr) -> Option<&'a Expr>;

    /// The node standing in for the guard, given an `if_false` that matched.
    fn replacement<'a>(&self, if_false: &'a Expr) -> &'a Expr;

    /// Match both branches at once.
    fn match_unwrap<'a>(&self, if_true: &Expr, if_false: &'a Expr) -> Option<Unwrapped<'a>> {
        if !self.accepts_default(if_true) {
            return None;
        }
        let operand = self.guarded_operand(if_false)?;
        Some(Unwrapped {
            operand,
            replacement: self.replacement(if_false),
        })
    }
}

/// `path == null ? false : path.Value` over a nullable wrapper.
///
/// The guard is replaced by `path` itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberUnwrap;

impl UnwrapShape for MemberUnwrap {
    fn name(&self) -> &'static str {
        "member"
    }

    fn accepts_default(&self, if_true: &Expr) -> bool {
        if_true.is_bool_constant(false)
    }

    fn guarded_operand<'a>(&self, if_false: &'a Expr) -> Option<&'a Expr> {
        match if_false {
            Expr::Member { owner, member, .. }
                if member.is_wrapped_value() && owner.static_type().is_nullable_wrapper() =>
            {
                Some(&**owner)
            }
            _ => None,
        }
    }

    fn replacement<'a>(&self, if_false: &'a Expr) -> &'a Expr {
        self.guarded_operand(if_false).unwrap_or(if_false)
    }
}

/// `path == null ? default : path.method(..)` over any null-admitting path.
///
/// Static calls take their first argument as the receiver. Any constant
/// default is accepted except boolean `true`, so string and numeric guards
/// match too. The call itself replaces the guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodUnwrap;

impl UnwrapShape for MethodUnwrap {
    fn name(&self) -> &'static str {
        "method"
    }

    fn accepts_default(&self, if_true: &Expr) -> bool {
        // A `true` default flips the guard's polarity, whatever its static type.
        matches!(if_true, Expr::Constant { .. })
            && !matches!(if_true.as_constant(), Some(Value::Bool(true)))
    }

    fn guarded_operand<'a>(&self, if_false: &'a Expr) -> Option<&'a Expr> {
        let Expr::Call {
            receiver, args, ..
        } = if_false
        else {
            return None;
        };
        let operand = match receiver {
            Some(receiver) => &**receiver,
            None => args.first()?,
        };
        operand.static_type().admits_null().then_some(operand)
    }

    fn replacement<'a>(&self, if_false: &'a Expr) -> &'a Expr {
        if_false
    }
}

/// An optional shape; `None` never matches.
impl<S: UnwrapShape> UnwrapShape for Option<S> {
    fn name(&self) -> &'static str {
        self.as_ref().map_or("disabled", UnwrapShape::name)
    }

    fn accepts_default(&self, if_true: &Expr) -> bool {
        self.as_ref().is_some_and(|s| s.accepts_default(if_true))
    }

    fn guarded_operand<'a>(&self, if_false: &'a Expr) -> Option<&'a Expr> {
        self.as_ref()?.guarded_operand(if_false)
    }

    fn replacement<'a>(&self, if_false: &'a Expr) -> &'a Expr {
        self.as_ref().map_or(if_false, |s| s.replacement(if_false))
    }

    fn match_unwrap<'a>(&self, if_true: &Expr, if_false: &'a Expr) -> Option<Unwrapped<'a>> {
        self.as_ref()?.match_unwrap(if_true, if_false)
    }
}

/// Two shapes tried in order; the first full match wins.
impl<A: UnwrapShape, B: UnwrapShape> UnwrapShape for (A, B) {
    fn name(&self) -> &'static str {
        "any"
    }

    fn accepts_default(&self, if_true: &Expr) -> bool {
        self.0.accepts_default(if_true) || self.1.accepts_default(if_true)
    }

    fn guarded_operand<'a>(&self, if_false: &'a Expr) -> Option<&'a Expr> {
        self.0
            .guarded_operand(if_false)
            .or_else(|| self.1.guarded_operand(if_false))
    }

    fn replacement<'a>(&self, if_false: &'a Expr) -> &'a Expr {
        if self.0.guarded_operand(if_false).is_some() {
            self.0.replacement(if_false)
        } else {
            self.1.replacement(if_false)
        }
    }

    fn match_unwrap<'a>(&self, if_true: &Expr, if_false: &'a Expr) -> Option<Unwrapped<'a>> {
        self.0
            .match_unwrap(if_true, if_false)
            .or_else(|| self.1.match_unwrap(if_true, if_false))
    }
}
