//! End-to-end evaluation tests

use canopy::ast::*;
use canopy::*;
use pretty_assertions::assert_eq;

fn eval(expr: ExprRef) -> Result<Value> {
    let mut env = Environment::with_prelude();
    let ctx = EvalContext::default();
    force(expr.eval(&mut env, &ctx)?)
}

/// `let fact = \n -> if n <= 1 then 1 else n * fact (n - 1) in fact x`
fn factorial(x: i64) -> ExprRef {
    let n = || Expr::ident("n");
    Expr::let_in(
        vec![LetBinding::new(
            Pattern::bind("fact"),
            Expr::lambda(
                &["n"],
                Expr::if_else(
                    Expr::binary(BinaryOp::Le, n(), Expr::int(1)),
                    Expr::int(1),
                    Expr::binary(
                        BinaryOp::Mul,
                        n(),
                        Expr::call(
                            Expr::ident("fact"),
                            vec![Expr::binary(BinaryOp::Sub, n(), Expr::int(1))],
                        ),
                    ),
                ),
            ),
        )],
        Expr::call(Expr::ident("fact"), vec![Expr::int(x)]),
    )
}

// ═══════════════════════════════════════════════════════════════════════
// Literals and Constructors
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_literal() {
    assert_eq!(eval(Expr::lit('x')).unwrap(), Value::Char('x'));
}

#[test]
fn test_undefined_identifier() {
    assert!(matches!(
        eval(Expr::ident("nope")),
        Err(EvalError::UndefinedName { .. })
    ));
}

#[test]
fn test_set_constructor_collapses_duplicates() {
    let expr = Expr::set(vec![Expr::int(1), Expr::int(1), Expr::int(2)]);
    assert_eq!(eval(expr).unwrap().len(), Some(2));
}

#[test]
fn test_dict_constructor() {
    let expr = Expr::dict(vec![(Expr::text("k"), Expr::int(1))]);
    assert_eq!(
        eval(expr).unwrap(),
        Value::dict(vec![(Value::string("k"), Value::Integer(1))])
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Functions
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_lambda_call() {
    let expr = Expr::call(
        Expr::lambda(
            &["a", "b"],
            Expr::binary(BinaryOp::Sub, Expr::ident("a"), Expr::ident("b")),
        ),
        vec![Expr::int(10), Expr::int(4)],
    );
    assert_eq!(eval(expr).unwrap(), Value::Integer(6));
}

#[test]
fn test_recursive_let_function() {
    assert_eq!(eval(factorial(10)).unwrap(), Value::Integer(3_628_800));
}

#[test]
fn test_closure_captures_definition_scope() {
    // let k = 5; add_k = \x -> x + k in add_k 1
    let expr = Expr::let_in(
        vec![
            LetBinding::new(Pattern::bind("k"), Expr::int(5)),
            LetBinding::new(
                Pattern::bind("add_k"),
                Expr::lambda(
                    &["x"],
                    Expr::binary(BinaryOp::Add, Expr::ident("x"), Expr::ident("k")),
                ),
            ),
        ],
        Expr::call(Expr::ident("add_k"), vec![Expr::int(1)]),
    );
    assert_eq!(eval(expr).unwrap(), Value::Integer(6));
}

#[test]
fn test_builtins() {
    let expr = Expr::call(Expr::ident("type_of"), vec![Expr::lit(1.5)]);
    assert_eq!(eval(expr).unwrap(), Value::symbol("float"));

    let expr = Expr::call(Expr::ident("show"), vec![Expr::text("hi")]);
    assert_eq!(eval(expr).unwrap(), Value::string("hi"));
}

#[test]
fn test_calling_non_function() {
    let expr = Expr::call(Expr::int(3), vec![]);
    assert!(matches!(eval(expr), Err(EvalError::NotCallable { .. })));
}

// ═══════════════════════════════════════════════════════════════════════
// Control
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_if_requires_bool() {
    let expr = Expr::if_else(Expr::int(0), Expr::int(1), Expr::int(2));
    assert!(matches!(eval(expr), Err(EvalError::TypeError { .. })));
}

#[test]
fn test_do_block_value_is_last_step() {
    let expr = Expr::do_block(vec![
        DoStep::Eval(Expr::int(1)),
        DoStep::Bind(LetBinding::new(Pattern::bind("x"), Expr::int(2))),
        DoStep::Eval(Expr::binary(BinaryOp::Mul, Expr::ident("x"), Expr::int(21))),
    ]);
    assert_eq!(eval(expr).unwrap(), Value::Integer(42));
}

#[test]
fn test_interrupt() {
    let mut env = Environment::new();
    let ctx = EvalContext::default();
    ctx.interrupt();
    assert!(matches!(
        Expr::int(1).eval(&mut env, &ctx),
        Err(EvalError::Interrupted)
    ));
    ctx.reset_interrupt();
    assert_eq!(Expr::int(1).eval(&mut env, &ctx).unwrap(), Value::Integer(1));
}

#[test]
fn test_evaluation_leaves_environment_unchanged() {
    let mut env = Environment::with_prelude();
    let ctx = EvalContext::default();
    let before = env.len();
    factorial(5).eval(&mut env, &ctx).unwrap();
    assert_eq!(env.len(), before);
}
