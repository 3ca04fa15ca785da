use crate::environment::{EnvError, Environment};
use crate::source::Span;
use crate::types::{Expr, Lambda, Node, Procedure};
use std::cell::RefCell;
use std::collections::HashSet;
use std::io::{self, Write};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Env(#[from] EnvError), // Errors from environment lookup / set!
    #[error("Evaluation Error: not a procedure: {0}")]
    NotAProcedure(Expr, Span), // Tried to call something that isn't callable
    #[error("Evaluation Error: expected {expected} arguments, got {found}")]
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },
    #[error("Evaluation Error: expected {expected}, got {}", .found.type_name())]
    TypeMismatch {
        expected: &'static str,
        found: Expr,
        span: Span,
    },
    #[error("Evaluation Error: invalid arguments - {0}")]
    InvalidArguments(String, Span), // Builtin misuse (bad arity, division by zero)
    #[error("Evaluation Error: invalid special form - {0}")]
    InvalidSpecialForm(String, Span), // Malformed special form (e.g., (if))
    #[error("Evaluation Error: display write failed - {0}")]
    Io(String, Span), // The display sink rejected the write (e.g., closed pipe)
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::Env(env_err) => env_err.span(),
            EvalError::NotAProcedure(_, span)
            | EvalError::ArityMismatch { span, .. }
            | EvalError::TypeMismatch { span, .. }
            | EvalError::InvalidArguments(_, span)
            | EvalError::InvalidSpecialForm(_, span)
            | EvalError::Io(_, span) => *span,
        }
    }
}

// Result type alias for convenience
pub type EvalResult<T = Node> = Result<T, EvalError>;

/// The special-form keywords, kept in one place so the REPL completer and
/// the dispatch below cannot drift apart.
pub const SPECIAL_FORMS: [&str; 7] = ["quote", "if", "define", "set!", "lambda", "begin", "display"];

pub fn special_form_identifiers() -> HashSet<String> {
    SPECIAL_FORMS.iter().map(|s| s.to_string()).collect()
}

/// Evaluates a given AST node within the specified environment.
pub fn evaluate(node: Node, env: Rc<RefCell<Environment>>) -> EvalResult {
    match &node.kind {
        // 1. Self-evaluating: numbers, procedures, and the empty list ()
        Expr::Number(_) | Expr::Procedure(_) => Ok(node),

        // 2. Symbols: look up in the environment
        Expr::Symbol(name) => {
            // Use the symbol's span for error reporting if lookup fails
            Ok(env.borrow().get(name, node.span)?)
        }

        // 3. Lists: special forms or procedure application
        Expr::List(elements) => {
            if let [first, rest @ ..] = &elements[..] {
                match &first.kind {
                    Expr::Symbol(sym_name) if sym_name == "quote" => {
                        evaluate_quote(rest, node.span)
                    }
                    Expr::Symbol(sym_name) if sym_name == "if" => {
                        evaluate_if(rest, env, node.span)
                    }
                    Expr::Symbol(sym_name) if sym_name == "define" => {
                        evaluate_define(rest, env, node.span)
                    }
                    Expr::Symbol(sym_name) if sym_name == "set!" => {
                        evaluate_set(rest, env, node.span)
                    }
                    Expr::Symbol(sym_name) if sym_name == "lambda" => {
                        evaluate_lambda(rest, env, node.span)
                    }
                    Expr::Symbol(sym_name) if sym_name == "begin" => {
                        evaluate_begin(rest, env, node.span)
                    }
                    Expr::Symbol(sym_name) if sym_name == "display" => {
                        evaluate_display(rest, env, node.span)
                    }
                    _ => evaluate_application(first, rest, env, node.span),
                }
            } else {
                // () evaluates to itself
                Ok(node)
            }
        }
    }
}

fn evaluate_application(
    operator: &Node,
    operands: &[Node],
    env: Rc<RefCell<Environment>>,
    span: Span,
) -> EvalResult {
    // An unbound bare head symbol is reported as a failed application, not
    // a plain lookup failure. Any other error in the operator expression
    // (e.g., division by zero inside a compound head) propagates unchanged.
    let operator_node = match evaluate(operator.clone(), env.clone()) {
        Ok(node) => node,
        Err(EvalError::Env(EnvError::UnboundVariable(_, _)))
            if matches!(operator.kind, Expr::Symbol(_)) =>
        {
            return Err(EvalError::NotAProcedure(
                operator.kind.clone(),
                operator.span,
            ));
        }
        Err(err) => return Err(err),
    };

    let procedure = match operator_node.kind {
        Expr::Procedure(proc) => proc,
        other => return Err(EvalError::NotAProcedure(other, operator.span)),
    };

    // Evaluate the operands left-to-right in the current environment
    let mut evaluated_args: Vec<Node> = Vec::with_capacity(operands.len());
    for operand_node in operands {
        evaluated_args.push(evaluate(operand_node.clone(), env.clone())?);
    }

    match procedure {
        Procedure::Builtin(func, _) => func(evaluated_args, span),
        Procedure::Closure(lambda) => apply_closure(&lambda, evaluated_args, span),
    }
}

/// Applies a closure: a fresh frame enclosed in the closure's *captured*
/// environment, parameters bound to the evaluated arguments, body evaluated
/// in that frame. The frame is dropped when the call returns unless a
/// nested closure captured it.
fn apply_closure(lambda: &Lambda, args: Vec<Node>, span: Span) -> EvalResult {
    if lambda.params.len() != args.len() {
        return Err(EvalError::ArityMismatch {
            expected: lambda.params.len(),
            found: args.len(),
            span,
        });
    }

    let call_env = Environment::new_enclosed(lambda.env.clone());
    {
        let mut frame = call_env.borrow_mut();
        for (param, arg) in lambda.params.iter().zip(args) {
            frame.define(param.clone(), arg);
        }
    }
    evaluate(lambda.body.clone(), call_env)
}

fn evaluate_quote(operands: &[Node], span: Span) -> EvalResult {
    if let [node] = operands {
        // Quote returns its operand unevaluated, as opaque data.
        Ok(node.clone())
    } else {
        Err(EvalError::InvalidSpecialForm(
            "quote expects exactly one argument".to_string(),
            span,
        ))
    }
}

/// Truthiness: only the zero numbers 0 and 0.0 are false. Symbols, lists
/// (including ()), procedures, and every other number are true. The
/// comparison builtins return 1/0, so their results round-trip through this
/// mapping.
pub fn is_truthy(expr: &Expr) -> bool {
    !matches!(expr, Expr::Number(n) if n.is_zero())
}

fn evaluate_if(operands: &[Node], env: Rc<RefCell<Environment>>, span: Span) -> EvalResult {
    if let [condition, consequent, maybe_alternate @ ..] = operands
        && maybe_alternate.len() <= 1
    {
        // Evaluate the condition first; exactly one branch runs after it.
        let condition_result = evaluate(condition.clone(), env.clone())?;

        if is_truthy(&condition_result.kind) {
            evaluate(consequent.clone(), env)
        } else if let [alternate] = maybe_alternate {
            evaluate(alternate.clone(), env)
        } else {
            Ok(Node::new_empty_list(span))
        }
    } else {
        Err(EvalError::InvalidSpecialForm(
            "if expects condition, consequent, and optional alternate".to_string(),
            span,
        ))
    }
}

fn evaluate_define(operands: &[Node], env: Rc<RefCell<Environment>>, span: Span) -> EvalResult {
    if let [name_node, value_expr] = operands {
        let name = expect_symbol(name_node, "define")?;
        let value = evaluate(value_expr.clone(), env.clone())?;
        env.borrow_mut().define(name.to_string(), value.clone());
        Ok(value)
    } else {
        Err(EvalError::InvalidSpecialForm(
            "define expects a name and a value".to_string(),
            span,
        ))
    }
}

fn evaluate_set(operands: &[Node], env: Rc<RefCell<Environment>>, span: Span) -> EvalResult {
    if let [name_node, value_expr] = operands {
        let name = expect_symbol(name_node, "set!")?;
        let value = evaluate(value_expr.clone(), env.clone())?;
        env.borrow_mut().set(name, value.clone(), span)?;
        Ok(value)
    } else {
        Err(EvalError::InvalidSpecialForm(
            "set! expects a name and a value".to_string(),
            span,
        ))
    }
}

fn evaluate_lambda(operands: &[Node], env: Rc<RefCell<Environment>>, span: Span) -> EvalResult {
    if let [params_node, body] = operands {
        let param_nodes = match &params_node.kind {
            Expr::List(nodes) => nodes,
            _ => {
                return Err(EvalError::InvalidSpecialForm(
                    "lambda expects a parameter list".to_string(),
                    params_node.span,
                ));
            }
        };

        let mut params = Vec::with_capacity(param_nodes.len());
        for param in param_nodes {
            params.push(expect_symbol(param, "lambda")?.to_string());
        }

        // The environment itself is captured, not a copy: later define/set!
        // in the defining scope are visible to the closure (this is what
        // makes recursive definitions work).
        let lambda = Lambda {
            params,
            body: body.clone(),
            env,
        };
        Ok(Node::new(
            Expr::Procedure(Procedure::Closure(Rc::new(lambda))),
            span,
        ))
    } else {
        Err(EvalError::InvalidSpecialForm(
            "lambda expects a parameter list and a body".to_string(),
            span,
        ))
    }
}

fn evaluate_begin(operands: &[Node], env: Rc<RefCell<Environment>>, span: Span) -> EvalResult {
    // An empty (begin) has nothing to return; treat it as malformed.
    let [rest @ .., last] = operands else {
        return Err(EvalError::InvalidSpecialForm(
            "begin expects at least one expression".to_string(),
            span,
        ));
    };

    for expr in rest {
        evaluate(expr.clone(), env.clone())?;
    }
    evaluate(last.clone(), env)
}

/// Builds the line `display` prints: unbound bare symbols render as literal
/// text labels, everything else is evaluated and its value rendered.
pub fn display_line(operands: &[Node], env: Rc<RefCell<Environment>>) -> EvalResult<String> {
    let mut parts = Vec::with_capacity(operands.len());
    for operand in operands {
        let resolved = match &operand.kind {
            Expr::Symbol(name) => env.borrow().get(name, operand.span).ok(),
            _ => None,
        };
        let part = match (&operand.kind, resolved) {
            (Expr::Symbol(_), Some(value)) => value.to_string(),
            (Expr::Symbol(name), None) => name.clone(),
            _ => evaluate(operand.clone(), env.clone())?.to_string(),
        };
        parts.push(part);
    }
    Ok(parts.join(" "))
}

/// Writes the display line plus a trailing newline to `out`. The sink is a
/// parameter so hosts and tests can capture the exact bytes.
pub fn write_display(
    operands: &[Node],
    env: Rc<RefCell<Environment>>,
    out: &mut dyn Write,
    span: Span,
) -> EvalResult {
    let line = display_line(operands, env)?;
    writeln!(out, "{}", line).map_err(|err| EvalError::Io(err.to_string(), span))?;
    // Side-effect-only form; () stands in for "no meaningful value".
    Ok(Node::new_empty_list(span))
}

fn evaluate_display(operands: &[Node], env: Rc<RefCell<Environment>>, span: Span) -> EvalResult {
    write_display(operands, env, &mut io::stdout().lock(), span)
}

fn expect_symbol<'a>(node: &'a Node, form: &str) -> EvalResult<&'a str> {
    match &node.kind {
        Expr::Symbol(name) => Ok(name),
        other => Err(EvalError::TypeMismatch {
            expected: match form {
                "lambda" => "a parameter symbol",
                _ => "a symbol",
            },
            found: other.clone(),
            span: node.span,
        }),
    }
}
