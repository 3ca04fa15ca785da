use crate::{EnvError, EvalError, LispError, ParseError};
use ariadne::{Label, Report, ReportKind, Source};

const SOURCE_ID: &str = "REPL";

impl EvalError {
    pub fn pretty_print(&self, input: &str) {
        let span = self.span().to_range();
        let report = match self {
            EvalError::Env(env_error) => match env_error {
                EnvError::UnboundVariable(symbol, _) => {
                    Report::build(ReportKind::Error, (SOURCE_ID, span.clone()))
                        .with_message(format!("Unbound variable `{}`", symbol))
                        .with_label(
                            Label::new((SOURCE_ID, span))
                                .with_message("This symbol is not defined in the current scope"),
                        )
                }
                EnvError::NotYetDefined(symbol, _) => {
                    Report::build(ReportKind::Error, (SOURCE_ID, span.clone()))
                        .with_message(format!("Cannot set! `{}`", symbol))
                        .with_label(Label::new((SOURCE_ID, span)).with_message(format!(
                            "{} must be defined before you can set! it",
                            symbol
                        )))
                }
            },
            EvalError::NotAProcedure(expr, _) => {
                Report::build(ReportKind::Error, (SOURCE_ID, span.clone()))
                    .with_message(format!("Not a procedure: {}", expr))
                    .with_label(
                        Label::new((SOURCE_ID, span))
                            .with_message("This expression cannot be called as a procedure"),
                    )
            }
            EvalError::ArityMismatch {
                expected, found, ..
            } => Report::build(ReportKind::Error, (SOURCE_ID, span.clone()))
                .with_message("Arity mismatch")
                .with_label(Label::new((SOURCE_ID, span)).with_message(format!(
                    "This call supplies {} arguments where {} are expected",
                    found, expected
                ))),
            EvalError::TypeMismatch {
                expected, found, ..
            } => Report::build(ReportKind::Error, (SOURCE_ID, span.clone()))
                .with_message("Type mismatch")
                .with_label(Label::new((SOURCE_ID, span)).with_message(format!(
                    "Expected {}, found {}",
                    expected,
                    found.type_name()
                ))),
            EvalError::InvalidArguments(message, _) => {
                Report::build(ReportKind::Error, (SOURCE_ID, span.clone()))
                    .with_message("Invalid arguments:")
                    .with_label(Label::new((SOURCE_ID, span)).with_message(message))
            }
            EvalError::Io(message, _) => {
                Report::build(ReportKind::Error, (SOURCE_ID, span.clone()))
                    .with_message("Display write failed")
                    .with_label(Label::new((SOURCE_ID, span)).with_message(message))
            }
            EvalError::InvalidSpecialForm(message, _) => {
                Report::build(ReportKind::Error, (SOURCE_ID, span.clone()))
                    .with_message(format!("Invalid special form: {}", message))
                    .with_label(
                        Label::new((SOURCE_ID, span))
                            .with_message("This special form is malformed or incomplete"),
                    )
            }
        };
        report
            .finish()
            .print((SOURCE_ID, Source::from(input)))
            .unwrap();
    }
}

impl ParseError {
    pub fn pretty_print(&self, input: &str) {
        let report = match self {
            ParseError::UnexpectedEof(expected) => {
                let idx = input.len();
                Report::build(ReportKind::Error, (SOURCE_ID, idx..idx))
                    .with_message("Unexpected end of input")
                    .with_label(
                        Label::new((SOURCE_ID, idx..idx))
                            .with_message(format!("Expected {}", expected)),
                    )
            }
            ParseError::UnexpectedClosingParen(span) => {
                Report::build(ReportKind::Error, (SOURCE_ID, span.to_range()))
                    .with_message("Unexpected closing parenthesis")
                    .with_label(
                        Label::new((SOURCE_ID, span.to_range()))
                            .with_message("No open list to close here"),
                    )
            }
        };
        report
            .finish()
            .print((SOURCE_ID, Source::from(input)))
            .unwrap();
    }
}

impl LispError {
    pub fn pretty_print(&self, input: &str) {
        match self {
            LispError::Parse(parse_err) => parse_err.pretty_print(input),
            LispError::Eval(eval_err) => eval_err.pretty_print(input),
        }
    }
}
