//! Property tests for null-guard removal.

use proptest::prelude::*;
use unguard_expr::expr::{constant, lambda, param};
use unguard_expr::testing::guard;
use unguard_expr::{BinaryOp, Expr, TypeDesc};
use unguard_rewrite::{remove_all_null_guards, remove_null_guards};

// =========================================================================
// Strategies
// =========================================================================

fn person() -> Expr {
    param("p", TypeDesc::record("Person"))
}

/// Leaves without any guard shape.
fn arb_leaf() -> impl Strategy<Value = Expr> {
    prop_oneof![
        any::<bool>().prop_map(|b| constant(b)),
        any::<i32>().prop_map(|i| constant(i64::from(i))),
        "[a-z]{0,6}".prop_map(|s| constant(s)),
        "[A-Z][a-z]{1,5}".prop_map(|m| person().member(m, TypeDesc::String)),
        "[A-Z][a-z]{1,5}".prop_map(|m| person().member(m, TypeDesc::nullable_bool())),
    ]
}

/// Trees whose only conditionals default to `true`, which no shape accepts.
fn arb_guard_free() -> impl Strategy<Value = Expr> {
    arb_leaf().prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| l.and(r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| l.or(r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| l.not_equal(r)),
            inner.clone().prop_map(Expr::not_equal_null),
            inner.clone().prop_map(|e| e.convert(TypeDesc::nullable_bool())),
            inner.clone().prop_map(Expr::logical_not),
            (inner.clone(), inner.clone()).prop_map(|(t, f)| {
                Expr::conditional(t.equal_null(), constant(true), f.wrapped_value())
            }),
            inner.prop_map(|e| e.call("trim", vec![], TypeDesc::String)),
        ]
    })
}

/// Nullable-boolean paths as the lowering leaves them inside a guard.
fn arb_guarded_path() -> impl Strategy<Value = Expr> {
    let flag = "[A-Z][a-z]{1,5}".prop_map(|m| person().member(m, TypeDesc::nullable_bool()));
    flag.prop_recursive(3, 12, 2, |inner| {
        prop_oneof![
            // Companion check joined to the path.
            (inner.clone(), "[A-Z][a-z]{1,5}").prop_map(|(path, m)| {
                person()
                    .member(m, TypeDesc::String)
                    .not_equal_null()
                    .and(path)
            }),
            // Nested guard on an intermediate record.
            (inner.clone(), "[A-Z][a-z]{1,5}").prop_map(|(path, m)| {
                let owner = person().member(m, TypeDesc::record("Owner"));
                Expr::conditional(
                    owner.equal_null(),
                    Expr::null_of(TypeDesc::nullable_bool()),
                    path,
                )
            }),
            // Lifting a plain comparison.
            inner.prop_map(|path| {
                path.wrapped_value()
                    .equal(constant(true))
                    .convert(TypeDesc::nullable_bool())
            }),
        ]
    })
}

/// A guard-free context with a guard spliced in.
fn arb_guarded() -> impl Strategy<Value = Expr> {
    (arb_guard_free(), arb_guarded_path(), any::<bool>()).prop_map(|(ctx, path, and)| {
        let op = if and { BinaryOp::And } else { BinaryOp::Or };
        lambda(["p"], Expr::binary(ctx, op, guard(path)))
    })
}

fn is_guard_test(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Conditional { test, .. } if test.as_null_check().is_some()
    )
}

// =========================================================================
// Property Tests
// =========================================================================

proptest! {
    /// Trees without guards pass through structurally unchanged.
    #[test]
    fn guard_free_is_unchanged(expr in arb_guard_free()) {
        prop_assert_eq!(remove_null_guards(&expr), expr.clone());
        prop_assert_eq!(remove_all_null_guards(&expr), expr);
    }

    /// A second application finds nothing left to remove.
    #[test]
    fn removal_is_idempotent(expr in arb_guarded()) {
        let once = remove_null_guards(&expr);
        let twice = remove_null_guards(&once);
        prop_assert_eq!(twice, once);
    }

    /// No guard conditional survives inside the removed guard.
    #[test]
    fn guard_is_eliminated(path in arb_guarded_path()) {
        let rewritten = remove_null_guards(&guard(path));
        prop_assert!(!rewritten.contains(is_guard_test));
        let has_null_inequality = rewritten.contains(|e| matches!(
            e,
            Expr::Binary { op: BinaryOp::NotEqual, right, .. } if right.is_null_constant()
        ));
        prop_assert!(!has_null_inequality);
    }

    /// The rewrite never grows a tree.
    #[test]
    fn rewrite_never_grows(expr in arb_guarded()) {
        prop_assert!(remove_null_guards(&expr).node_count() <= expr.node_count());
    }
}
