use std::sync::Arc;

use insta::assert_snapshot;
use pmql_core::builder::Builder;
use pmql_core::expression::Expression;
use pmql_core::functions::FunctionPool;
use pmql_core::ops::BinaryOp;
use pmql_core::scalar::ScalarValue;

/// `if(((${a} + ${b}) > int{0}), ((${a} + ${b}) - int{42}), ((${a} + ${b}) + null))`
/// built by hand. The repeated sum is stored once.
fn showcase() -> Expression {
    let mut b = Builder::new(Arc::new(FunctionPool::builtin()));

    let a = b.var("a");
    let v = b.var("b");
    let sum = b.binary(BinaryOp::Add, a, v).unwrap();

    let zero = b.constant(0);
    let cond = b.binary(BinaryOp::Gt, sum, zero).unwrap();

    let c42 = b.constant(42);
    let positive = b.binary(BinaryOp::Sub, sum, c42).unwrap();

    let null = b.constant(ScalarValue::Null);
    let negative = b.binary(BinaryOp::Add, sum, null).unwrap();

    b.branch(cond, positive, negative).unwrap();
    b.finish().unwrap()
}

#[test]
fn display_lists_ingredients() {
    assert_snapshot!(showcase().to_string(), @r###"
    Constants:
      _0: int{0}
      _1: int{42}
      _2: null
    Extension functions:
      @avail
    Operations:
      #0: a($0)
      #1: b($1)
      #2: add(#0, #1)
      #3: const(_0)
      #4: gt(#2, #3)
      #5: const(_1)
      #6: sub(#2, #5)
      #7: const(_2)
      #8: add(#2, #7)
      #9: if(#4 ? #6 : #8)
    "###);
}

#[test]
fn evaluates_with_substitutions() {
    let expr = showcase();
    let mut ctx = expr.context(true);

    ctx.set_by_name("a", 40).unwrap();
    ctx.set_by_name("b", 3).unwrap();
    assert!(ctx.ready());
    assert_eq!(ScalarValue::Int64(1), expr.eval(&mut ctx).unwrap());

    // Flip the sum negative, the null branch takes over.
    let a = ctx.find("a").unwrap();
    ctx.set(a, -50).unwrap();
    assert_eq!(ScalarValue::Null, expr.eval(&mut ctx).unwrap());
}

#[test]
fn caching_survives_unrelated_changes() {
    let expr = showcase();
    let mut ctx = expr.context(true);

    ctx.set_by_name("a", 1).unwrap();
    ctx.set_by_name("b", 43).unwrap();
    assert_eq!(ScalarValue::Int64(2), expr.eval(&mut ctx).unwrap());

    // Re-evaluating without changes serves the cached root.
    assert_eq!(ScalarValue::Int64(2), expr.eval(&mut ctx).unwrap());

    ctx.set_by_name("b", 42).unwrap();
    assert_eq!(ScalarValue::Int64(1), expr.eval(&mut ctx).unwrap());
}

#[test]
fn missing_variable_fails_until_set() {
    let expr = showcase();
    let mut ctx = expr.context(true);

    ctx.set_by_name("a", 1).unwrap();
    assert!(!ctx.ready());
    assert_eq!(vec!["b"], ctx.missing().collect::<Vec<_>>());
    assert!(expr.eval(&mut ctx).is_err());

    // Setting the variable invalidates the cached failure.
    ctx.set_by_name("b", 42).unwrap();
    assert_eq!(ScalarValue::Int64(1), expr.eval(&mut ctx).unwrap());
}

#[test]
fn branches_are_lazy() {
    let pool = Arc::new(FunctionPool::builtin());

    // The untaken branch divides by zero.
    let expr = pmql_core::parse("if(${flag}, int{1}, (int{1} / int{0}))", pool).unwrap();
    let mut ctx = expr.context(true);
    ctx.set_by_name("flag", true).unwrap();
    assert_eq!(ScalarValue::Int64(1), expr.eval(&mut ctx).unwrap());

    ctx.set_by_name("flag", false).unwrap();
    assert!(expr.eval(&mut ctx).is_err());
}

#[test]
fn avail_stops_at_first_non_null() {
    let pool = Arc::new(FunctionPool::builtin());

    // The failing argument sits behind a non-null one and is never pulled.
    let expr = pmql_core::parse("@avail(${a}, (int{1} / int{0}))", pool).unwrap();
    let mut ctx = expr.context(true);
    ctx.set_by_name("a", 7).unwrap();
    assert_eq!(ScalarValue::Int64(7), expr.eval(&mut ctx).unwrap());

    ctx.set_by_name("a", ScalarValue::Null).unwrap();
    assert!(expr.eval(&mut ctx).is_err());
}

#[test]
fn evaluation_log_shows_outcomes() {
    let pool = Arc::new(FunctionPool::builtin());
    let expr = pmql_core::parse("if(${flag}, int{1}, int{2})", pool).unwrap();
    let mut ctx = expr.context(true);
    ctx.set_by_name("flag", true).unwrap();
    expr.eval(&mut ctx).unwrap();

    assert_snapshot!(expr.log(&ctx).to_string(), @r###"
    #0: flag($0) = bool{true}
    #1: const(_0) = int{1}
    #2: const(_1) = <not evaluated>
    #3: if(#0 ? #1 : #2) = int{1}
    "###);
}
