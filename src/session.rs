use crate::environment::Environment;
use crate::evaluator::{EvalError, evaluate};
use crate::lexer::{Token, tokenize};
use crate::parser::{ParseError, Parser};
use crate::types::Node;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Either stage of the eval pipeline can fail; hosts that only call
/// [`Session::eval`] handle this one type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LispError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// One process-lifetime instance of a global environment plus the entry
/// points operating against it.
///
/// There is no implicit singleton: every `Session::new()` owns its own
/// populated global environment, so independent sessions coexist and
/// `define`/`set!` effects accumulate per session. Not internally
/// synchronized; a multi-threaded host must serialize access.
pub struct Session {
    env: Rc<RefCell<Environment>>,
}

impl Session {
    pub fn new() -> Self {
        Session {
            env: Environment::new_global_populated(),
        }
    }

    /// The session's global environment (shared with every closure created
    /// at top level).
    pub fn env(&self) -> Rc<RefCell<Environment>> {
        self.env.clone()
    }

    /// Evaluates an already-parsed expression against the persistent
    /// session environment.
    pub fn execute(&self, node: Node) -> Result<Node, EvalError> {
        evaluate(node, self.env.clone())
    }

    /// tokenize -> parse -> execute, against the persistent session
    /// environment. The common entry point for hosts.
    pub fn eval(&self, input: &str) -> Result<Node, LispError> {
        let node = parse(tokenize(input))?;
        Ok(self.execute(node)?)
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

/// Pure pipeline stage: consumes the token stream and yields the first
/// top-level expression. Exposed alongside [`tokenize`] for introspection
/// and testing.
pub fn parse(tokens: Vec<Token>) -> Result<Node, ParseError> {
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Expr, Number};

    fn assert_eval_kind(session: &Session, input: &str, expected: Expr) {
        match session.eval(input) {
            Ok(node) => assert_eq!(node.kind, expected, "Input: '{}'", input),
            Err(e) => panic!("Evaluation failed for input '{}': {}", input, e),
        }
    }

    fn int(n: i64) -> Expr {
        Expr::Number(Number::Int(n))
    }

    fn float(n: f64) -> Expr {
        Expr::Number(Number::Float(n))
    }

    #[test]
    fn test_tokenize_then_parse_mirrors_nesting() {
        let tokens = tokenize("(+ 1 1)");
        let rendered: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        assert_eq!(rendered, vec!["(", "+", "1", "1", ")"]);

        let node = parse(tokens).unwrap();
        match node.kind {
            Expr::List(elements) => assert_eq!(elements.len(), 3),
            other => panic!("Expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unbalanced_parens() {
        assert!(matches!(
            parse(tokenize("(")),
            Err(ParseError::UnexpectedEof(_))
        ));
        assert!(matches!(
            parse(tokenize(")")),
            Err(ParseError::UnexpectedClosingParen(_))
        ));
    }

    #[test]
    fn test_execute_bare_number() {
        let session = Session::new();
        let node = parse(tokenize("1")).unwrap();
        assert_eq!(session.execute(node).unwrap().kind, int(1));
    }

    #[test]
    fn test_eval() {
        let session = Session::new();
        assert_eval_kind(&session, "(* 2 (+ 1 0) )", int(2));
    }

    #[test]
    fn test_define_persists_across_eval_calls() {
        let session = Session::new();
        session.eval("(define pi 3.141592653)").unwrap();
        assert_eval_kind(&session, "(* pi 2)", float(6.283185306));
    }

    #[test]
    fn test_sessions_are_independent() {
        let a = Session::new();
        let b = Session::new();
        a.eval("(define x 1)").unwrap();
        assert_eval_kind(&a, "x", int(1));
        assert!(b.eval("x").is_err());
    }

    #[test]
    fn test_if() {
        let session = Session::new();
        assert_eval_kind(&session, "(if (== 1 2) 1 2)", int(2));
        assert_eval_kind(&session, "(if (!= 1 2) 1 2)", int(1));
    }

    #[test]
    fn test_lambda() {
        let session = Session::new();
        session
            .eval("(define area (lambda (r) (* 3.141592653 (* r r))))")
            .unwrap();
        assert_eval_kind(&session, "(area 3)", float(28.274333877));

        session
            .eval("(define fact (lambda (n) (if (<= n 1) 1 (* n (fact (- n 1))))))")
            .unwrap();
        assert_eval_kind(&session, "(fact 10)", int(3628800));
    }

    #[test]
    fn test_quote() {
        let session = Session::new();
        let result = session.eval("(quote (a b c))").unwrap();
        match result.kind {
            Expr::List(elements) => {
                let names: Vec<_> = elements
                    .iter()
                    .map(|n| match &n.kind {
                        Expr::Symbol(s) => s.as_str(),
                        other => panic!("Expected symbol, got {:?}", other),
                    })
                    .collect();
                assert_eq!(names, vec!["a", "b", "c"]);
            }
            other => panic!("Expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment() {
        let session = Session::new();
        let err = session.eval("(set! foo 42)").unwrap_err();
        assert_eq!(err.to_string(), "foo must be defined before you can set! it");

        session.eval("(define foo 3.14)").unwrap();
        assert_eval_kind(&session, "(set! foo 42)", int(42));
        assert_eval_kind(&session, "(* 1 foo)", int(42));
        assert_eval_kind(&session, "(set! foo (* -1 foo))", int(-42));
    }

    #[test]
    fn test_sequencing() {
        let session = Session::new();
        assert_eval_kind(
            &session,
            "(begin (define x 1) (set! x (+ x 1)) (* x 2))",
            int(4),
        );
    }

    #[test]
    fn test_display_eval_returns_ok() {
        let session = Session::new();
        // The printed bytes are covered by evaluator::write_display tests;
        // here we only pin down the call contract.
        let result = session.eval("(display Hello World! 42)").unwrap();
        assert_eq!(result.kind, Expr::List(vec![]));
    }

    #[test]
    fn test_parse_errors_surface_through_eval() {
        let session = Session::new();
        assert!(matches!(
            session.eval("(+ 1"),
            Err(LispError::Parse(ParseError::UnexpectedEof(_)))
        ));
    }
}
