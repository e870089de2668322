//! Hand-built trees in the shapes the null-conditional lowering produces.
//!
//! Shared by the rewrite and query crates' tests.

use crate::expr::{Expr, constant, lambda, param};
use crate::types::{TypeDesc, Value};

/// The `Person` record type used throughout the fixtures.
pub fn person_type() -> TypeDesc {
    TypeDesc::record("Person")
}

/// The `Address` record type reachable from `Person.Address`.
pub fn address_type() -> TypeDesc {
    TypeDesc::record("Address")
}

/// `p`
pub fn person() -> Expr {
    param("p", person_type())
}

/// `p.Name`
pub fn name() -> Expr {
    person().member("Name", TypeDesc::String)
}

/// `p.Flag`, a nullable boolean.
pub fn flag() -> Expr {
    person().member("Flag", TypeDesc::nullable_bool())
}

/// `p.Address`
pub fn address() -> Expr {
    person().member("Address", address_type())
}

/// `p.Address.Verified`
pub fn verified() -> Expr {
    address().member("Verified", TypeDesc::Bool)
}

/// The lowering of a boolean-typed `p?.Flag`:
/// `p.Flag == null ? false : p.Flag.Value`.
pub fn member_guard() -> Expr {
    guard(flag())
}

/// Wrap `path` in the member-unwrap guard.
pub fn guard(path: Expr) -> Expr {
    Expr::conditional(
        path.clone().equal_null(),
        constant(false),
        path.wrapped_value(),
    )
}

/// `(p.Name == null ? "k" : p.Name.to_lower()) == "k"`
pub fn method_guard_predicate() -> Expr {
    Expr::conditional(
        name().equal_null(),
        constant("k"),
        name().call("to_lower", vec![], TypeDesc::String),
    )
    .equal(constant("k"))
}

/// `p.Name.to_lower() == "k"`
pub fn method_unguarded_predicate() -> Expr {
    name()
        .call("to_lower", vec![], TypeDesc::String)
        .equal(constant("k"))
}

/// `p?.Address?.Verified` as a nullable boolean:
/// `p.Address == null ? null : (Bool?)p.Address.Verified`.
pub fn lifted_verified() -> Expr {
    Expr::conditional(
        address().equal_null(),
        Expr::null_of(TypeDesc::nullable_bool()),
        verified().convert(TypeDesc::nullable_bool()),
    )
}

/// The lowering of a boolean-typed `p?.Address?.Verified`: a guard whose
/// guarded path is itself a guard on `p.Address`.
pub fn chained_guard() -> Expr {
    guard(lifted_verified())
}

/// A guard over `p.Name != null && p.Flag`, whose companion `!= null` check
/// drops out once the guard is confirmed.
pub fn companion_guard() -> Expr {
    guard(name().not_equal_null().and(flag()))
}

/// A guard whose default is `true`: the complementary polarity, never removed.
pub fn true_polarity_guard() -> Expr {
    Expr::conditional(
        flag().equal_null(),
        constant(true),
        flag().wrapped_value(),
    )
}

/// A boolean predicate lambda over `p`.
pub fn predicate(body: Expr) -> Expr {
    lambda(["p"], body)
}

/// A `Person` row.
pub fn person_row(name: Option<&str>, flag: Option<bool>, verified: Option<bool>) -> Value {
    Value::record([
        ("Name", Value::from(name)),
        ("Flag", Value::from(flag)),
        ("Address", Value::record([("Verified", Value::from(verified))])),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_shapes() {
        assert_eq!(
            member_guard().to_string(),
            "((p.Flag == null) ? false : p.Flag.Value)"
        );
        assert_eq!(member_guard().static_type(), TypeDesc::Bool);
        assert_eq!(
            method_guard_predicate().to_string(),
            "(((p.Name == null) ? \"k\" : p.Name.to_lower()) == \"k\")"
        );
        assert_ne!(
            method_guard_predicate().kind_trace(),
            method_unguarded_predicate().kind_trace()
        );
    }

    #[test]
    fn test_person_row() {
        let row = person_row(Some("Ann"), None, Some(true));
        assert_eq!(row.field("Name").and_then(Value::as_str), Some("Ann"));
        assert!(row.field("Flag").is_some_and(Value::is_null));
        assert_eq!(
            row.field("Address")
                .and_then(|a| a.field("Verified"))
                .and_then(Value::as_bool),
            Some(true)
        );
    }
}
