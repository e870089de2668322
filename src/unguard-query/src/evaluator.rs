//! Expression evaluator for the in-memory engine.
//!
//! Evaluates a tree against a single named source of record rows. Null
//! follows the lifted semantics of nullable types: comparisons and
//! arithmetic over null yield null, `==` treats two nulls as equal, and
//! `&&`/`||` use three-valued logic with short-circuiting. Reading a member
//! or calling a method on null is an error.

use std::cmp::Ordering;

use common_error::{UnguardError, UnguardResult, type_err, value_err};
use unguard_expr::{BinaryOp, Expr, MemberId, MethodId, TypeDesc, UnaryOp, Value};

use crate::ops::{self, ANY, COUNT, FIRST, SELECT, SKIP, TAKE, WHERE};

/// Parameter bindings visible while evaluating a lambda body.
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: Vec<(String, Value)>,
}

impl Env {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// A child environment with `name` bound to `value`.
    #[must_use]
    pub fn bind(&self, name: impl Into<String>, value: Value) -> Self {
        let mut bindings = self.bindings.clone();
        bindings.push((name.into(), value));
        Self { bindings }
    }

    /// Look up the innermost binding for `name`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Expression evaluator over one in-memory source.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    source: &'a str,
    rows: &'a [Value],
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator that resolves `Source(source)` to `rows`.
    pub const fn new(source: &'a str, rows: &'a [Value]) -> Self {
        Self { source, rows }
    }

    /// Evaluate a closed expression.
    pub fn evaluate(&self, expr: &Expr) -> UnguardResult<Value> {
        self.eval(expr, &Env::new())
    }

    /// Evaluate a one-parameter lambda against an argument.
    pub fn apply(&self, lambda: &Expr, arg: Value, env: &Env) -> UnguardResult<Value> {
        match ops::unquote(lambda) {
            Expr::Lambda { params, body } if params.len() == 1 => {
                self.eval(body, &env.bind(params[0].clone(), arg))
            }
            other => Err(UnguardError::type_error(format!(
                "Expected a one-parameter lambda, got {other}"
            ))),
        }
    }

    /// Evaluate an expression in an environment.
    pub fn eval(&self, expr: &Expr, env: &Env) -> UnguardResult<Value> {
        match expr {
            Expr::Constant { value, .. } => Ok(value.clone()),

            Expr::Parameter { name, .. } => env
                .lookup(name)
                .cloned()
                .ok_or_else(|| UnguardError::execution(format!("Unbound parameter '{name}'"))),

            Expr::Member { owner, member, .. } => self.eval_member(owner, member, env),

            Expr::Call {
                receiver: Some(receiver),
                method,
                args,
                ..
            } => self.eval_method(receiver, method, args, env),

            Expr::Call {
                receiver: None,
                method,
                args,
                ..
            } => self.eval_static(method, args, env),

            Expr::Unary { op, operand, ty } => self.eval_unary(*op, operand, ty, env),

            Expr::Binary {
                op, left, right, ..
            } => self.eval_binary(*op, left, right, env),

            Expr::Conditional {
                test,
                if_true,
                if_false,
                ..
            } => match self.eval(test, env)? {
                Value::Bool(true) => self.eval(if_true, env),
                Value::Bool(false) => self.eval(if_false, env),
                other => Err(UnguardError::type_error(format!(
                    "Conditional test must be Bool, got {}",
                    other.type_name()
                ))),
            },

            Expr::Lambda { .. } => Err(UnguardError::execution(
                "Lambda cannot be evaluated directly",
            )),

            Expr::QueryRoot { .. } => Err(UnguardError::execution(
                "Query root placeholder was not replaced by a source",
            )),

            Expr::Source { name, .. } => {
                if name == self.source {
                    Ok(Value::List(self.rows.to_vec()))
                } else {
                    value_err!("Unknown source '{name}'")
                }
            }

            Expr::Opaque { label, .. } => Err(UnguardError::not_implemented(format!(
                "Evaluation of opaque expression <{label}>"
            ))),
        }
    }

    /// Evaluate an expression that must produce a sequence.
    pub fn eval_sequence(&self, expr: &Expr, env: &Env) -> UnguardResult<Vec<Value>> {
        match self.eval(expr, env)? {
            Value::List(items) => Ok(items),
            other => type_err!("Expected a sequence, got {}", other.type_name()),
        }
    }

    // ========== Members and methods ==========

    fn eval_member(&self, owner: &Expr, member: &MemberId, env: &Env) -> UnguardResult<Value> {
        let value = self.eval(owner, env)?;

        if *member == MemberId::HasValue {
            return Ok(Value::Bool(!value.is_null()));
        }
        if value.is_null() {
            return Err(UnguardError::null_reference(format!(
                "reading {member} of {owner}"
            )));
        }

        match member {
            MemberId::WrappedValue => Ok(value),
            MemberId::HasValue => Ok(Value::Bool(true)),
            MemberId::Named(name) => match value {
                Value::Record(mut fields) => fields.remove(name).ok_or_else(|| {
                    UnguardError::value_error(format!("Record has no member '{name}'"))
                }),
                Value::String(s) if name == "length" => length(s.chars().count()),
                Value::List(items) if name == "length" => length(items.len()),
                other => Err(UnguardError::type_error(format!(
                    "Cannot read member '{name}' of {}",
                    other.type_name()
                ))),
            },
        }
    }

    fn eval_method(
        &self,
        receiver: &Expr,
        method: &MethodId,
        args: &[Expr],
        env: &Env,
    ) -> UnguardResult<Value> {
        let target = self.eval(receiver, env)?;
        if target.is_null() {
            return Err(UnguardError::null_reference(format!(
                "calling {method} on {receiver}"
            )));
        }
        let s = match target {
            Value::String(s) => s,
            other => {
                return Err(UnguardError::unsupported(format!(
                    "Method '{method}' on {}",
                    other.type_name()
                )));
            }
        };

        let name = method.name.as_str();
        match name {
            "to_lower" => Ok(Value::String(s.to_lowercase())),
            "to_upper" => Ok(Value::String(s.to_uppercase())),
            "trim" => Ok(Value::String(s.trim().to_string())),
            "contains" | "starts_with" | "ends_with" => {
                let arg = self.string_arg(name, args, env)?;
                let found = match name {
                    "contains" => s.contains(arg.as_str()),
                    "starts_with" => s.starts_with(arg.as_str()),
                    _ => s.ends_with(arg.as_str()),
                };
                Ok(Value::Bool(found))
            }
            _ => Err(UnguardError::unsupported(format!(
                "Method '{name}' on String"
            ))),
        }
    }

    fn string_arg(&self, method: &str, args: &[Expr], env: &Env) -> UnguardResult<String> {
        let arg = args.first().ok_or_else(|| {
            UnguardError::invalid_parameter(format!("'{method}' expects one argument"))
        })?;
        match self.eval(arg, env)? {
            Value::String(s) => Ok(s),
            Value::Null => Err(UnguardError::null_reference(format!(
                "argument of {method}"
            ))),
            other => type_err!(
                "'{method}' expects a String argument, got {}",
                other.type_name()
            ),
        }
    }

    // ========== Query operators ==========

    fn eval_static(&self, method: &MethodId, args: &[Expr], env: &Env) -> UnguardResult<Value> {
        let name = method.name.as_str();
        let seq = args.first().ok_or_else(|| {
            UnguardError::invalid_parameter(format!("'{name}' expects a sequence argument"))
        })?;
        let lambda = args.get(1);

        match name {
            WHERE => {
                let predicate = required(name, lambda)?;
                let mut kept = Vec::new();
                for item in self.eval_sequence(seq, env)? {
                    if self.accepts(predicate, item.clone(), env)? {
                        kept.push(item);
                    }
                }
                Ok(Value::List(kept))
            }
            SELECT => {
                let projection = required(name, lambda)?;
                let items = self
                    .eval_sequence(seq, env)?
                    .into_iter()
                    .map(|item| self.apply(projection, item, env))
                    .collect::<UnguardResult<Vec<_>>>()?;
                Ok(Value::List(items))
            }
            TAKE | SKIP => {
                let n = self.count_arg(name, required(name, lambda)?, env)?;
                let items = self.eval_sequence(seq, env)?;
                let items = if name == TAKE {
                    items.into_iter().take(n).collect()
                } else {
                    items.into_iter().skip(n).collect()
                };
                Ok(Value::List(items))
            }
            COUNT => {
                let matching = self.matching(seq, lambda, env)?;
                length(matching.len())
            }
            ANY => Ok(Value::Bool(!self.matching(seq, lambda, env)?.is_empty())),
            FIRST => self
                .matching(seq, lambda, env)?
                .into_iter()
                .next()
                .ok_or_else(|| UnguardError::execution("Sequence contains no matching element")),
            _ => Err(UnguardError::unsupported(format!("Function '{name}'"))),
        }
    }

    /// Elements of `seq` accepted by the optional predicate.
    fn matching(&self, seq: &Expr, predicate: Option<&Expr>, env: &Env) -> UnguardResult<Vec<Value>> {
        let items = self.eval_sequence(seq, env)?;
        let Some(predicate) = predicate else {
            return Ok(items);
        };
        let mut kept = Vec::new();
        for item in items {
            if self.accepts(predicate, item.clone(), env)? {
                kept.push(item);
            }
        }
        Ok(kept)
    }

    /// Apply a predicate; null counts as not accepted.
    fn accepts(&self, predicate: &Expr, item: Value, env: &Env) -> UnguardResult<bool> {
        match self.apply(predicate, item, env)? {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(false),
            other => type_err!("Predicate must evaluate to Bool, got {}", other.type_name()),
        }
    }

    fn count_arg(&self, name: &str, arg: &Expr, env: &Env) -> UnguardResult<usize> {
        let n = self.eval(arg, env)?.as_int64().ok_or_else(|| {
            UnguardError::type_error(format!("'{name}' expects an Int64 count"))
        })?;
        usize::try_from(n).map_err(|_| {
            UnguardError::invalid_parameter(format!("'{name}' expects a non-negative count, got {n}"))
        })
    }

    // ========== Operators ==========

    fn eval_unary(&self, op: UnaryOp, operand: &Expr, ty: &TypeDesc, env: &Env) -> UnguardResult<Value> {
        let value = self.eval(operand, env)?;
        match (op, value) {
            (_, Value::Null) => Ok(Value::Null),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (UnaryOp::Negate, Value::Int64(i)) => i
                .checked_neg()
                .map(Value::Int64)
                .ok_or_else(|| UnguardError::value_error("Integer overflow in negation")),
            (UnaryOp::Negate, Value::Float64(f)) => Ok(Value::Float64(-f)),
            (UnaryOp::Convert, Value::Int64(i)) if *ty.unwrapped() == TypeDesc::Float64 => {
                Ok(Value::Float64(i as f64))
            }
            (UnaryOp::Convert | UnaryOp::Quote, value) => Ok(value),
            (op, value) => Err(UnguardError::type_error(format!(
                "Cannot apply {} to {}",
                op.name(),
                value.type_name()
            ))),
        }
    }

    fn eval_binary(&self, op: BinaryOp, left: &Expr, right: &Expr, env: &Env) -> UnguardResult<Value> {
        if op.is_logical() {
            return self.eval_logical(op, left, right, env);
        }

        let l = self.eval(left, env)?;
        let r = self.eval(right, env)?;

        match op {
            BinaryOp::Equal => Ok(Value::Bool(values_equal(&l, &r))),
            BinaryOp::NotEqual => Ok(Value::Bool(!values_equal(&l, &r))),
            _ if l.is_null() || r.is_null() => Ok(Value::Null),
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                let ordering = compare(&l, &r)?;
                let result = match op {
                    BinaryOp::Lt => ordering == Ordering::Less,
                    BinaryOp::LtEq => ordering != Ordering::Greater,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                Ok(Value::Bool(result))
            }
            _ => arithmetic(op, &l, &r),
        }
    }

    fn eval_logical(&self, op: BinaryOp, left: &Expr, right: &Expr, env: &Env) -> UnguardResult<Value> {
        let short_circuit = op == BinaryOp::Or;
        let l = logical_operand(self.eval(left, env)?)?;
        if l == Some(short_circuit) {
            return Ok(Value::Bool(short_circuit));
        }
        let r = logical_operand(self.eval(right, env)?)?;
        let result = match (l, r) {
            (_, Some(b)) if b == short_circuit => Some(short_circuit),
            (Some(_), r) => r,
            (None, _) => None,
        };
        Ok(result.map_or(Value::Null, Value::Bool))
    }
}

fn required<'e>(name: &str, arg: Option<&'e Expr>) -> UnguardResult<&'e Expr> {
    arg.ok_or_else(|| UnguardError::invalid_parameter(format!("'{name}' expects two arguments")))
}

fn length(n: usize) -> UnguardResult<Value> {
    i64::try_from(n)
        .map(Value::Int64)
        .map_err(|_| UnguardError::value_error(format!("Length {n} does not fit in Int64")))
}

fn logical_operand(value: Value) -> UnguardResult<Option<bool>> {
    match value {
        Value::Bool(b) => Ok(Some(b)),
        Value::Null => Ok(None),
        other => Err(UnguardError::type_error(format!(
            "Logical operand must be Bool, got {}",
            other.type_name()
        ))),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Int64(i) => Some(*i as f64),
        Value::Float64(f) => Some(*f),
        _ => None,
    }
}

fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Int64(_), Value::Float64(_)) | (Value::Float64(_), Value::Int64(_)) => {
            as_number(l) == as_number(r)
        }
        _ => l == r,
    }
}

fn compare(l: &Value, r: &Value) -> UnguardResult<Ordering> {
    let ordering = match (l, r) {
        (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (as_number(l), as_number(r)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };
    ordering.ok_or_else(|| {
        UnguardError::type_error(format!(
            "Cannot compare {} with {}",
            l.type_name(),
            r.type_name()
        ))
    })
}

fn arithmetic(op: BinaryOp, l: &Value, r: &Value) -> UnguardResult<Value> {
    match (l, r) {
        (Value::Int64(a), Value::Int64(b)) => {
            let result = match op {
                BinaryOp::Add => a.checked_add(*b),
                BinaryOp::Subtract => a.checked_sub(*b),
                BinaryOp::Multiply => a.checked_mul(*b),
                BinaryOp::Divide if *b == 0 => {
                    return Err(UnguardError::value_error("Division by zero"));
                }
                _ => a.checked_div(*b),
            };
            result
                .map(Value::Int64)
                .ok_or_else(|| UnguardError::value_error(format!("Integer overflow in {a} {op} {b}")))
        }
        (Value::String(a), b) if op == BinaryOp::Add => Ok(Value::String(format!("{a}{}", text(b)))),
        (a, Value::String(b)) if op == BinaryOp::Add => Ok(Value::String(format!("{}{b}", text(a)))),
        _ => match (as_number(l), as_number(r)) {
            (Some(a), Some(b)) => Ok(Value::Float64(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Subtract => a - b,
                BinaryOp::Multiply => a * b,
                _ => a / b,
            })),
            _ => Err(UnguardError::type_error(format!(
                "Cannot apply {op} to {} and {}",
                l.type_name(),
                r.type_name()
            ))),
        },
    }
}

/// String concatenation renders strings without quotes.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unguard_expr::expr::{constant, lambda, null_of};
    use unguard_expr::testing::{flag, member_guard, name, person_row, person_type, verified};

    fn rows() -> Vec<Value> {
        vec![
            person_row(Some("Ann"), Some(true), Some(true)),
            person_row(Some("Bob"), Some(false), Some(false)),
            person_row(Some("Cy"), Some(true), Some(false)),
        ]
    }

    fn people() -> Expr {
        Expr::source("people", person_type())
    }

    fn names(value: &Value) -> Vec<String> {
        value
            .as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(|row| row.field("Name").and_then(Value::as_str).map(String::from))
            .collect()
    }

    #[test]
    fn test_filter_with_guard() {
        let rows = rows();
        let eval = Evaluator::new("people", &rows);
        let query = ops::filter(people(), lambda(["p"], member_guard()));
        let result = eval.evaluate(&query).unwrap();
        assert_eq!(names(&result), vec!["Ann", "Cy"]);
    }

    #[test]
    fn test_select_and_paging() {
        let rows = rows();
        let eval = Evaluator::new("people", &rows);
        let upper = name().call("to_upper", vec![], TypeDesc::String);
        let query = ops::take(
            ops::skip(ops::map(people(), lambda(["p"], upper), TypeDesc::String), 1),
            1,
        );
        let result = eval.evaluate(&query).unwrap();
        assert_eq!(result, Value::List(vec![Value::from("BOB")]));
    }

    #[test]
    fn test_scalar_operators() {
        let rows = rows();
        let eval = Evaluator::new("people", &rows);
        assert_eq!(eval.evaluate(&ops::count(people())).unwrap(), Value::Int64(3));
        assert_eq!(eval.evaluate(&ops::any(people())).unwrap(), Value::Bool(true));

        let verified_people = ops::filter(people(), lambda(["p"], verified()));
        assert_eq!(
            names(&Value::List(vec![eval.evaluate(&ops::first(verified_people)).unwrap()])),
            vec!["Ann"]
        );

        let none = ops::filter(people(), lambda(["p"], constant(false)));
        assert_eq!(eval.evaluate(&ops::any(none.clone())).unwrap(), Value::Bool(false));
        let err = eval.evaluate(&ops::first(none)).unwrap_err();
        assert!(matches!(err, UnguardError::ExecutionError(_)));
    }

    #[test]
    fn test_null_dereference_fails() {
        let rows = vec![person_row(None, None, None)];
        let eval = Evaluator::new("people", &rows);
        let lowered = name().call("to_lower", vec![], TypeDesc::String);
        let query = ops::map(people(), lambda(["p"], lowered), TypeDesc::String);

        let err = eval.evaluate(&query).unwrap_err();
        assert!(err.to_string().contains("NullReference"));
    }

    #[test]
    fn test_has_value_and_unwrap() {
        let rows = vec![person_row(Some("Ann"), None, None)];
        let eval = Evaluator::new("people", &rows);

        let has = ops::map(people(), lambda(["p"], flag().has_value()), TypeDesc::Bool);
        assert_eq!(
            eval.evaluate(&has).unwrap(),
            Value::List(vec![Value::Bool(false)])
        );

        // The guard protects the unwrap.
        let guarded = ops::map(people(), lambda(["p"], member_guard()), TypeDesc::Bool);
        assert_eq!(
            eval.evaluate(&guarded).unwrap(),
            Value::List(vec![Value::Bool(false)])
        );

        let unguarded = ops::map(
            people(),
            lambda(["p"], flag().wrapped_value()),
            TypeDesc::Bool,
        );
        assert!(eval.evaluate(&unguarded).is_err());
    }

    #[test]
    fn test_three_valued_logic() {
        let eval = Evaluator::new("people", &[]);
        let null = || null_of(TypeDesc::nullable_bool());

        let cases = [
            (constant(false).and(null()), Value::Bool(false)),
            (null().and(constant(false)), Value::Bool(false)),
            (constant(true).and(null()), Value::Null),
            (constant(true).or(null()), Value::Bool(true)),
            (null().or(constant(true)), Value::Bool(true)),
            (constant(false).or(null()), Value::Null),
            (null().or(null()), Value::Null),
        ];
        for (expr, expected) in cases {
            assert_eq!(eval.evaluate(&expr).unwrap(), expected, "{expr}");
        }
    }

    #[test]
    fn test_short_circuit_skips_null_dereference() {
        let rows = vec![person_row(None, None, None)];
        let eval = Evaluator::new("people", &rows);
        let safe = name()
            .not_equal_null()
            .and(name().call("starts_with", vec![constant("A")], TypeDesc::Bool));
        let query = ops::count(ops::filter(people(), lambda(["p"], safe)));
        assert_eq!(eval.evaluate(&query).unwrap(), Value::Int64(0));
    }

    #[test]
    fn test_comparison_and_arithmetic() {
        let eval = Evaluator::new("people", &[]);
        let two = || constant(2i64);

        assert_eq!(
            eval.evaluate(&two().less_than(constant(3i64))).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            eval.evaluate(&Expr::binary(two(), BinaryOp::Multiply, constant(1.5)))
                .unwrap(),
            Value::Float64(3.0)
        );
        assert_eq!(
            eval.evaluate(&Expr::binary(constant("n"), BinaryOp::Add, two()))
                .unwrap(),
            Value::from("n2")
        );
        assert_eq!(
            eval.evaluate(&two().greater_than(null_of(TypeDesc::nullable(TypeDesc::Int64))))
                .unwrap(),
            Value::Null
        );
        assert!(eval
            .evaluate(&Expr::binary(two(), BinaryOp::Divide, constant(0i64)))
            .is_err());
        assert_eq!(
            eval.evaluate(&two().equal(constant(2.0))).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_type_errors() {
        let rows = rows();
        let eval = Evaluator::new("people", &rows);

        let not_a_predicate = ops::filter(people(), lambda(["p"], name()));
        let err = eval.evaluate(&not_a_predicate).unwrap_err();
        assert!(matches!(err, UnguardError::TypeError(_)));
        assert!(err.to_string().contains("Predicate must evaluate to Bool, got String"));

        let bad_arg = name().call("contains", vec![constant(1i64)], TypeDesc::Bool);
        let err = eval
            .evaluate(&ops::any(ops::filter(people(), lambda(["p"], bad_arg))))
            .unwrap_err();
        assert!(matches!(err, UnguardError::TypeError(_)));

        let err = eval
            .eval_sequence(&constant(3i64), &Env::new())
            .unwrap_err();
        assert!(err.to_string().contains("Expected a sequence, got Int64"));
    }

    #[test]
    fn test_unresolved_root_and_unknown_source() {
        let eval = Evaluator::new("people", &[]);
        assert!(eval.evaluate(&ops::count(Expr::query_root(person_type()))).is_err());
        let err = eval
            .evaluate(&ops::count(Expr::source("pets", person_type())))
            .unwrap_err();
        assert!(matches!(err, UnguardError::ValueError(_)));
    }
}
