//! Operator engine tests: concrete dispatch, lifting, and algebraic laws

use canopy::ast::{BinaryOp, Expr, ExprRef, UnaryOp};
use canopy::eval::binary::apply_binary;
use canopy::eval::unary::apply_unary;
use canopy::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn eval(expr: ExprRef) -> Result<Value> {
    let mut env = Environment::with_prelude();
    let ctx = EvalContext::default();
    force(expr.eval(&mut env, &ctx)?)
}

fn int_set(items: &[i64]) -> Value {
    Value::set(items.iter().map(|n| Value::Integer(*n)).collect())
}

/// Apply `op` with the left operand delivered later through a promise.
fn lifted(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    let pending = Promise::new();
    let result = apply_binary(op, Value::Promise(pending.clone()), right)?;
    pending.fulfil(Ok(left));
    force(result)
}

// ═══════════════════════════════════════════════════════════════════════
// Arithmetic
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_integer_arithmetic() {
    let expr = Expr::binary(
        BinaryOp::Sub,
        Expr::binary(BinaryOp::Mul, Expr::int(6), Expr::int(7)),
        Expr::int(2),
    );
    assert_eq!(eval(expr).unwrap(), Value::Integer(40));
}

#[test]
fn test_float_arithmetic() {
    let expr = Expr::binary(BinaryOp::Div, Expr::lit(1.0), Expr::lit(4.0));
    assert_eq!(eval(expr).unwrap(), Value::Float(0.25));
}

#[test]
fn test_remainder_by_zero() {
    let expr = Expr::binary(BinaryOp::Rem, Expr::int(5), Expr::int(0));
    assert!(matches!(eval(expr), Err(EvalError::DivisionByZero)));
}

#[test]
fn test_no_implicit_promotion() {
    let expr = Expr::binary(BinaryOp::Add, Expr::int(1), Expr::lit(2.0));
    match eval(expr) {
        Err(EvalError::TypeError { operation, values }) => {
            assert_eq!(operation, "+");
            assert_eq!(values, vec![Value::Integer(1), Value::Float(2.0)]);
        }
        other => panic!("expected type error, got {:?}", other),
    }
}

#[test]
fn test_type_error_message_names_operator_and_values() {
    let err = apply_binary(BinaryOp::Add, Value::Integer(1), Value::Bool(true)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Type error: operation \"+\" not defined for Integer 1, Bool true"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Logical
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_and_short_circuits() {
    // The right side would fail if evaluated
    let expr = Expr::binary(BinaryOp::And, Expr::lit(false), Expr::ident("missing"));
    assert_eq!(eval(expr).unwrap(), Value::Bool(false));
}

#[test]
fn test_or_short_circuits() {
    let expr = Expr::binary(BinaryOp::Or, Expr::lit(true), Expr::ident("missing"));
    assert_eq!(eval(expr).unwrap(), Value::Bool(true));
}

#[test]
fn test_logical_requires_bool() {
    let expr = Expr::binary(BinaryOp::And, Expr::lit(true), Expr::int(1));
    assert!(matches!(eval(expr), Err(EvalError::TypeError { .. })));
}

#[test]
fn test_not() {
    let expr = Expr::unary(UnaryOp::Not, Expr::lit(true));
    assert_eq!(eval(expr).unwrap(), Value::Bool(false));
}

// ═══════════════════════════════════════════════════════════════════════
// Collections
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_set_algebra() {
    assert_eq!(
        apply_binary(BinaryOp::BitAnd, int_set(&[1, 2, 3]), int_set(&[2, 3, 4])).unwrap(),
        int_set(&[2, 3])
    );
    assert_eq!(
        apply_binary(BinaryOp::BitOr, int_set(&[1]), int_set(&[2])).unwrap(),
        int_set(&[1, 2])
    );
    assert_eq!(
        apply_binary(BinaryOp::BitXor, int_set(&[1, 2, 3]), int_set(&[2, 3, 4])).unwrap(),
        int_set(&[1, 4])
    );
}

#[test]
fn test_dict_xor_keeps_original_values() {
    let left = Value::dict(vec![
        (Value::symbol("a"), Value::Integer(1)),
        (Value::symbol("b"), Value::Integer(2)),
    ]);
    let right = Value::dict(vec![
        (Value::symbol("b"), Value::Integer(20)),
        (Value::symbol("c"), Value::Integer(30)),
    ]);
    assert_eq!(
        apply_binary(BinaryOp::BitXor, left, right).unwrap(),
        Value::dict(vec![
            (Value::symbol("a"), Value::Integer(1)),
            (Value::symbol("c"), Value::Integer(30)),
        ])
    );
}

#[test]
fn test_membership() {
    let expr = Expr::binary(
        BinaryOp::In,
        Expr::int(2),
        Expr::set(vec![Expr::int(1), Expr::int(2)]),
    );
    assert_eq!(eval(expr).unwrap(), Value::Bool(true));
}

#[test]
fn test_cons_operators_build_sequences() {
    let expr = Expr::binary(
        BinaryOp::ConsRight,
        Expr::binary(BinaryOp::ConsLeft, Expr::int(1), Expr::seq(vec![Expr::int(2)])),
        Expr::int(3),
    );
    assert_eq!(
        eval(expr).unwrap(),
        Value::sequence(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Lifting
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_lifted_equality() {
    assert_eq!(
        lifted(BinaryOp::Eq, Value::Integer(3), Value::Integer(3)).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_lifted_failure_propagates() {
    let failed = Value::Promise(Promise::failed(EvalError::DivisionByZero));
    let result = apply_binary(BinaryOp::Add, failed, Value::Integer(1)).unwrap();
    assert!(matches!(force(result), Err(EvalError::DivisionByZero)));
}

#[test]
fn test_lifted_unary() {
    let pending = Promise::new();
    let result = apply_unary(UnaryOp::BitNot, Value::Promise(pending.clone())).unwrap();
    pending.fulfil(Ok(Value::Integer(0)));
    assert_eq!(force(result).unwrap(), Value::Integer(-1));
}

// ═══════════════════════════════════════════════════════════════════════
// Laws
// ═══════════════════════════════════════════════════════════════════════

const OPS: [BinaryOp; 9] = [
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Lt,
    BinaryOp::Ge,
    BinaryOp::Eq,
    BinaryOp::BitAnd,
    BinaryOp::BitOr,
    BinaryOp::BitXor,
];

fn float_element() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(f64::NAN),
        Just(-f64::NAN),
        Just(0.0),
        Just(-0.0),
        proptest::num::f64::ANY,
    ]
}

proptest! {
    #[test]
    fn prop_set_xor_is_symmetric_difference(
        a in proptest::collection::btree_set(-20i64..20, 0..12),
        b in proptest::collection::btree_set(-20i64..20, 0..12),
    ) {
        let left = int_set(&a.iter().copied().collect::<Vec<_>>());
        let right = int_set(&b.iter().copied().collect::<Vec<_>>());
        let expected: BTreeSet<i64> = a.symmetric_difference(&b).copied().collect();

        let xor = apply_binary(BinaryOp::BitXor, left.clone(), right.clone()).unwrap();
        prop_assert_eq!(&xor, &int_set(&expected.into_iter().collect::<Vec<_>>()));

        let flipped = apply_binary(BinaryOp::BitXor, right, left.clone()).unwrap();
        prop_assert_eq!(&xor, &flipped);

        let own = apply_binary(BinaryOp::BitXor, left.clone(), left).unwrap();
        prop_assert_eq!(own, int_set(&[]));
    }

    #[test]
    fn prop_float_set_xor_laws(
        a in proptest::collection::vec(float_element(), 0..10),
        b in proptest::collection::vec(float_element(), 0..10),
    ) {
        let left = Value::set(a.into_iter().map(Value::Float).collect());
        let right = Value::set(b.into_iter().map(Value::Float).collect());

        let own = apply_binary(BinaryOp::BitXor, left.clone(), left.clone()).unwrap();
        prop_assert_eq!(own.len(), Some(0));

        let xor = apply_binary(BinaryOp::BitXor, left.clone(), right.clone()).unwrap();
        let flipped = apply_binary(BinaryOp::BitXor, right.clone(), left.clone()).unwrap();
        prop_assert_eq!(&xor, &flipped);

        let back = apply_binary(BinaryOp::BitXor, xor, right).unwrap();
        prop_assert_eq!(back, left);
    }

    #[test]
    fn prop_dict_xor_keys_in_exactly_one(
        a in proptest::collection::btree_map(0i64..16, any::<i64>(), 0..8),
        b in proptest::collection::btree_map(0i64..16, any::<i64>(), 0..8),
    ) {
        let to_dict = |m: &std::collections::BTreeMap<i64, i64>| {
            Value::dict(m.iter().map(|(k, v)| (Value::Integer(*k), Value::Integer(*v))).collect())
        };
        let Value::Dict(xor) = apply_binary(BinaryOp::BitXor, to_dict(&a), to_dict(&b)).unwrap() else {
            panic!("expected a dict");
        };

        for (key, value) in a.iter().chain(b.iter()) {
            let in_both = a.contains_key(key) && b.contains_key(key);
            let found = xor.get(&Value::Integer(*key));
            if in_both {
                prop_assert!(found.is_none());
            } else {
                prop_assert_eq!(found, Some(&Value::Integer(*value)));
            }
        }
        prop_assert_eq!(
            xor.size(),
            a.keys().filter(|k| !b.contains_key(k)).count()
                + b.keys().filter(|k| !a.contains_key(k)).count()
        );
    }

    #[test]
    fn prop_lifting_agrees_with_sync(
        left in -1000i64..1000,
        right in -1000i64..1000,
        op in 0..OPS.len(),
    ) {
        let op = OPS[op];
        let sync = apply_binary(op, Value::Integer(left), Value::Integer(right)).unwrap();
        let deferred = lifted(op, Value::Integer(left), Value::Integer(right)).unwrap();
        prop_assert_eq!(sync, deferred);
    }
}
