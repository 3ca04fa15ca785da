use crate::environment::Environment;
use crate::evaluator::EvalResult;
use crate::source::Span;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: Expr, // The actual expression data
    pub span: Span, // The source span it covers
}

impl Node {
    pub fn new(kind: Expr, span: Span) -> Self {
        Node { kind, span }
    }

    pub fn new_number(n: Number, span: Span) -> Self {
        Node::new(Expr::Number(n), span)
    }

    pub fn new_int(n: i64, span: Span) -> Self {
        Node::new(Expr::Number(Number::Int(n)), span)
    }

    pub fn new_float(n: f64, span: Span) -> Self {
        Node::new(Expr::Number(Number::Float(n)), span)
    }

    pub fn new_symbol(name: impl Into<String>, span: Span) -> Self {
        Node::new(Expr::Symbol(name.into()), span)
    }

    pub fn new_list(elements: Vec<Node>, span: Span) -> Self {
        Node::new(Expr::List(elements), span)
    }

    /// The empty list `()`, also used as the unit-like result of
    /// side-effect-only forms.
    pub fn new_empty_list(span: Span) -> Self {
        Node::new(Expr::List(Vec::new()), span)
    }

    pub fn new_builtin(func: BuiltinFn, name: &str, span: Span) -> Self {
        Node::new(
            Expr::Procedure(Procedure::Builtin(func, name.to_string())),
            span,
        )
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Delegate to Expr's Display implementation
        write!(f, "{}", self.kind)
    }
}

/// A numeric value. Source literals without a decimal point are integers,
/// everything else is a double.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(n) => n == 0.0,
        }
    }

    /// Integer arithmetic stays integral; mixing in a float promotes the
    /// result to a float. `None` when an all-integer result overflows i64,
    /// so the caller can report it instead of panicking.
    pub fn add(self, other: Number) -> Option<Number> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.checked_add(b).map(Number::Int),
            (a, b) => Some(Number::Float(a.as_f64() + b.as_f64())),
        }
    }

    pub fn sub(self, other: Number) -> Option<Number> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.checked_sub(b).map(Number::Int),
            (a, b) => Some(Number::Float(a.as_f64() - b.as_f64())),
        }
    }

    pub fn mul(self, other: Number) -> Option<Number> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.checked_mul(b).map(Number::Int),
            (a, b) => Some(Number::Float(a.as_f64() * b.as_f64())),
        }
    }

    /// Truncating division for integer operands. `None` for a zero divisor
    /// or an overflowing quotient (i64::MIN / -1).
    pub fn div(self, other: Number) -> Option<Number> {
        if other.is_zero() {
            return None;
        }
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.checked_div(b).map(Number::Int),
            (a, b) => Some(Number::Float(a.as_f64() / b.as_f64())),
        }
    }

    pub fn eq(self, other: Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }

    pub fn lt(self, other: Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a < b,
            (a, b) => a.as_f64() < b.as_f64(),
        }
    }

    pub fn le(self, other: Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a <= b,
            (a, b) => a.as_f64() <= b.as_f64(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Float(n) => write!(f, "{}", n),
        }
    }
}

/// The parsed tree form of one expression. This enum is the core data
/// structure for both code and data; procedures only appear as evaluation
/// results, never from the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Number),  // e.g., 42, 3.14
    Symbol(String),  // e.g., +, variable-name, quote
    List(Vec<Node>), // e.g., (+ 1 2), (define x 10); empty for ()
    Procedure(Procedure),
}

impl Expr {
    pub fn type_name(&self) -> &'static str {
        match self {
            Expr::Number(_) => "number",
            Expr::Symbol(_) => "symbol",
            Expr::List(_) => "list",
            Expr::Procedure(_) => "procedure",
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Symbol(s) => write!(f, "{}", s),
            Expr::List(list) => {
                write!(f, "(")?;
                let mut first = true;
                for expr in list {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", expr)?;
                    first = false;
                }
                write!(f, ")")
            }
            Expr::Procedure(procedure) => match procedure {
                Procedure::Builtin(_, name) => write!(f, "#<builtin:{}>", name),
                Procedure::Closure(_) => write!(f, "#<closure>"),
            },
        }
    }
}

pub type BuiltinFn = fn(Vec<Node>, Span) -> EvalResult;

/// A callable value: a native operation registered by name, or a closure
/// pairing a parameter list and body with its defining environment.
#[derive(Clone)]
pub enum Procedure {
    Builtin(BuiltinFn, String), // The function pointer and its name (for display/debug)
    Closure(Rc<Lambda>),
}

#[derive(Debug, Clone)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Node,
    // Captured by shared ownership: the defining frame may outlive the call
    // that created it and may be held by several closures at once.
    pub env: Rc<RefCell<Environment>>,
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Procedure::Builtin(_, name) => write!(f, "Builtin({})", name),
            Procedure::Closure(lambda) => write!(f, "Closure({:?})", lambda.params),
        }
    }
}

// Function pointers don't implement PartialEq directly, so builtins compare
// by registered name and closures by identity.
impl PartialEq for Procedure {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Procedure::Builtin(_f1, n1), Procedure::Builtin(_f2, n2)) => n1 == n2,
            (Procedure::Closure(l1), Procedure::Closure(l2)) => Rc::ptr_eq(l1, l2),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_promotion() {
        assert_eq!(Number::Int(1).add(Number::Int(2)), Some(Number::Int(3)));
        assert_eq!(
            Number::Int(1).add(Number::Float(0.5)),
            Some(Number::Float(1.5))
        );
        assert_eq!(
            Number::Float(2.0).mul(Number::Int(3)),
            Some(Number::Float(6.0))
        );
        assert_eq!(Number::Int(10).sub(Number::Int(3)), Some(Number::Int(7)));
    }

    #[test]
    fn test_integer_overflow_is_none() {
        assert_eq!(Number::Int(i64::MAX).add(Number::Int(1)), None);
        assert_eq!(Number::Int(i64::MIN).sub(Number::Int(1)), None);
        assert_eq!(Number::Int(i64::MAX).mul(Number::Int(2)), None);
        assert_eq!(Number::Int(i64::MIN).div(Number::Int(-1)), None);
        // A float operand promotes first, so the integer limits do not apply
        assert_eq!(
            Number::Int(i64::MAX).mul(Number::Float(2.0)),
            Some(Number::Float(i64::MAX as f64 * 2.0))
        );
    }

    #[test]
    fn test_integer_division_truncates() {
        assert_eq!(Number::Int(10).div(Number::Int(4)), Some(Number::Int(2)));
        assert_eq!(
            Number::Float(10.0).div(Number::Int(4)),
            Some(Number::Float(2.5))
        );
    }

    #[test]
    fn test_division_by_zero_is_none() {
        assert_eq!(Number::Int(1).div(Number::Int(0)), None);
        assert_eq!(Number::Float(1.0).div(Number::Float(0.0)), None);
    }

    #[test]
    fn test_mixed_comparison() {
        assert!(Number::Int(2).eq(Number::Float(2.0)));
        assert!(Number::Int(1).lt(Number::Float(1.5)));
        assert!(Number::Float(1.0).le(Number::Int(1)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Number::Int(42).to_string(), "42");
        assert_eq!(Number::Float(3.14).to_string(), "3.14");

        let span = Span::default();
        let list = Node::new_list(
            vec![
                Node::new_symbol("+", span),
                Node::new_int(1, span),
                Node::new_int(2, span),
            ],
            span,
        );
        assert_eq!(list.to_string(), "(+ 1 2)");
        assert_eq!(Node::new_empty_list(span).to_string(), "()");
    }
}
