//! Built-in procedures: variadic arithmetic folds and chained numeric
//! comparisons. Comparisons return the 1/0 sentinel integers the `if`
//! truthiness rule is defined over.

use crate::evaluator::{EvalError, EvalResult};
use crate::source::Span;
use crate::types::{Expr, Node, Number};

// Checks the number of arguments
macro_rules! check_arity {
    ($args:expr, min $expected:expr, $span:expr, $name:expr) => {
        if $args.len() < $expected {
            return Err(EvalError::InvalidArguments(
                format!(
                    "Builtin '{}' expects at least {} arguments, got {}",
                    $name,
                    $expected,
                    $args.len()
                ),
                $span,
            ));
        }
    };
}

// Extracts a number from a Node or returns a TypeMismatch error
fn expect_number(node: &Node, span: Span) -> EvalResult<Number> {
    match node.kind {
        Expr::Number(n) => Ok(n),
        ref other => Err(EvalError::TypeMismatch {
            expected: "a number",
            found: other.clone(),
            span,
        }),
    }
}

// Integer results outside the i64 range are reported, not wrapped
fn overflow_error(operator: &str, span: Span) -> EvalError {
    EvalError::InvalidArguments(format!("Integer overflow in '{}'", operator), span)
}

fn fold_numbers<F: Fn(Number, Number) -> Option<Number>>(
    args: Vec<Node>,
    span: Span,
    start: Number,
    func: F,
    operator: &str,
) -> EvalResult {
    let mut acc = start;
    for node in &args {
        let num = expect_number(node, span)?;
        acc = func(acc, num).ok_or_else(|| overflow_error(operator, span))?;
    }
    Ok(Node::new_number(acc, span))
}

pub fn prim_add(args: Vec<Node>, span: Span) -> EvalResult {
    // (+) -> 0
    // (+ 1 2 3) -> 6
    fold_numbers(args, span, Number::Int(0), Number::add, "+")
}

pub fn prim_sub(args: Vec<Node>, span: Span) -> EvalResult {
    // (- x) -> -x
    // (- x y z) -> x - y - z
    check_arity!(args, min 1, span, "-");
    let first = expect_number(&args[0], span)?;

    if args.len() == 1 {
        let negated = Number::Int(0)
            .sub(first)
            .ok_or_else(|| overflow_error("-", span))?;
        return Ok(Node::new_number(negated, span));
    }
    let mut result = first;
    for node in &args[1..] {
        result = result
            .sub(expect_number(node, span)?)
            .ok_or_else(|| overflow_error("-", span))?;
    }
    Ok(Node::new_number(result, span))
}

pub fn prim_mul(args: Vec<Node>, span: Span) -> EvalResult {
    // (*) -> 1
    // (* 2 3 4) -> 24
    fold_numbers(args, span, Number::Int(1), Number::mul, "*")
}

pub fn prim_div(args: Vec<Node>, span: Span) -> EvalResult {
    // (/ x) -> 1/x
    // (/ x y z) -> x / y / z
    check_arity!(args, min 1, span, "/");
    let first = expect_number(&args[0], span)?;

    let divide = |a: Number, b: Number| {
        if b.is_zero() {
            return Err(EvalError::InvalidArguments(
                "Division by zero".to_string(),
                span,
            ));
        }
        a.div(b).ok_or_else(|| overflow_error("/", span))
    };

    if args.len() == 1 {
        return Ok(Node::new_number(divide(Number::Int(1), first)?, span));
    }
    let mut result = first;
    for node in &args[1..] {
        result = divide(result, expect_number(node, span)?)?;
    }
    Ok(Node::new_number(result, span))
}

/// Chained comparison over two or more numbers; 1 when every adjacent pair
/// satisfies `compare`, else 0.
fn compare_numbers<F: Fn(Number, Number) -> bool>(
    args: Vec<Node>,
    span: Span,
    compare: F,
    operator: &str,
) -> EvalResult {
    check_arity!(args, min 2, span, operator);
    let mut last_val = expect_number(&args[0], span)?;
    let mut result = true;
    for arg in &args[1..] {
        let val = expect_number(arg, span)?;
        result = result && compare(last_val, val);
        last_val = val;
    }
    Ok(Node::new_int(if result { 1 } else { 0 }, span))
}

pub fn prim_equals(args: Vec<Node>, span: Span) -> EvalResult {
    compare_numbers(args, span, |left, right| left.eq(right), "==")
}

pub fn prim_not_equals(args: Vec<Node>, span: Span) -> EvalResult {
    compare_numbers(args, span, |left, right| !left.eq(right), "!=")
}

pub fn prim_less_than(args: Vec<Node>, span: Span) -> EvalResult {
    compare_numbers(args, span, |left, right| left.lt(right), "<")
}

pub fn prim_less_than_or_equals(args: Vec<Node>, span: Span) -> EvalResult {
    compare_numbers(args, span, |left, right| left.le(right), "<=")
}

pub fn prim_greater_than(args: Vec<Node>, span: Span) -> EvalResult {
    compare_numbers(args, span, |left, right| right.lt(left), ">")
}

pub fn prim_greater_than_or_equals(args: Vec<Node>, span: Span) -> EvalResult {
    compare_numbers(args, span, |left, right| right.le(left), ">=")
}
