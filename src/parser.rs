use crate::Span;
use crate::lexer::{Token, TokenKind, tokenize};
use crate::types::{Expr, Node, Number};
use std::iter::Peekable;
use std::vec::IntoIter; // To iterate over Vec<Token>
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Parse Error: unexpected end of input, expected {0}")]
    UnexpectedEof(String), // Description of what was expected
    #[error("Parse Error: unexpected closing parenthesis")]
    UnexpectedClosingParen(Span),
}

// Result type alias for convenience
type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    // We iterate over owned Tokens, consuming them from the front.
    tokens: Peekable<IntoIter<Token>>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: tokens.into_iter().peekable(),
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    /// Parses a single expression from the token stream.
    pub fn parse_expr(&mut self) -> ParseResult<Node> {
        match self.next_token() {
            Some(Token {
                kind: TokenKind::LParen,
                span,
            }) => self.parse_list(span),
            Some(Token {
                kind: TokenKind::RParen,
                span,
            }) => Err(ParseError::UnexpectedClosingParen(span)),
            Some(Token {
                kind: TokenKind::Atom(text),
                span,
            }) => Ok(parse_atom(&text, span)),
            None => Err(ParseError::UnexpectedEof("an expression".to_string())),
        }
    }

    /// Parses the elements of a list after its opening parenthesis,
    /// consuming and discarding the closing one.
    fn parse_list(&mut self, lparen_span: Span) -> ParseResult<Node> {
        let mut elements = Vec::new();
        loop {
            match self.tokens.peek() {
                Some(Token {
                    kind: TokenKind::RParen,
                    span,
                }) => {
                    let span = lparen_span.merge(*span);
                    self.next_token();
                    return Ok(Node::new_list(elements, span));
                }
                Some(_) => elements.push(self.parse_expr()?),
                // Stream exhausted mid-list
                None => return Err(ParseError::UnexpectedEof("')'".to_string())),
            }
        }
    }

    /// Parses exactly one top-level expression; trailing tokens are ignored
    /// (the session facade parses once per request).
    pub fn parse(mut self) -> ParseResult<Node> {
        self.parse_expr()
    }
}

/// Classifies an atom: integer when the text has no decimal point, float
/// when it does, symbol when it is not numeric at all.
fn parse_atom(text: &str, span: Span) -> Node {
    let kind = if text.contains('.') {
        match text.parse::<f64>() {
            Ok(n) => Expr::Number(Number::Float(n)),
            Err(_) => Expr::Symbol(text.to_string()),
        }
    } else {
        match text.parse::<i64>() {
            Ok(n) => Expr::Number(Number::Int(n)),
            Err(_) => Expr::Symbol(text.to_string()),
        }
    };
    Node::new(kind, span)
}

/// Helper to lex and parse a string directly (useful for tests and the
/// REPL).
pub fn parse_str(input: &str) -> ParseResult<Node> {
    Parser::new(tokenize(input)).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Helper for asserting successful parsing
    fn assert_parse(input: &str, expected: Node) {
        match parse_str(input) {
            Ok(result) => assert_eq!(result, expected, "Input: '{}'", input),
            Err(e) => panic!("Parsing failed for input '{}': {}", input, e),
        }
    }

    // Helper for asserting parse errors by variant
    fn assert_parse_error(input: &str, expected_error_variant: ParseError) {
        match parse_str(input) {
            Ok(result) => panic!(
                "Expected parsing to fail for input '{}', but got: {:?}",
                input, result
            ),
            Err(e) => {
                assert_eq!(
                    std::mem::discriminant(&e),
                    std::mem::discriminant(&expected_error_variant),
                    "Input: '{}', Expected error variant like {:?}, got: {:?}",
                    input,
                    expected_error_variant,
                    e
                );
            }
        }
    }

    fn node_int(n: i64, start: usize, end: usize) -> Node {
        Node::new_int(n, Span::new(start, end))
    }

    fn node_float(n: f64, start: usize, end: usize) -> Node {
        Node::new_float(n, Span::new(start, end))
    }

    fn node_symbol(s: &str, start: usize, end: usize) -> Node {
        Node::new_symbol(s, Span::new(start, end))
    }

    fn node_list(elements: Vec<Node>, start: usize, end: usize) -> Node {
        Node::new_list(elements, Span::new(start, end))
    }

    #[test]
    fn test_parse_atoms() {
        assert_parse("123", node_int(123, 0, 3));
        assert_parse("-45", node_int(-45, 0, 3));
        assert_parse("-4.5", node_float(-4.5, 0, 4));
        assert_parse("3.141592653", node_float(3.141592653, 0, 11));
        assert_parse("symbol", node_symbol("symbol", 0, 6));
        assert_parse("+", node_symbol("+", 0, 1));
        assert_parse("set!", node_symbol("set!", 0, 4));
    }

    #[test]
    fn test_parse_number_like_symbols() {
        // Failed numeric parses fall back to symbols
        assert_parse("1.2.3", node_symbol("1.2.3", 0, 5));
        assert_parse("1e5", node_symbol("1e5", 0, 3)); // No '.', not an i64
        assert_parse(".", node_symbol(".", 0, 1));
        assert_parse("--5", node_symbol("--5", 0, 3));
    }

    #[test]
    fn test_parse_empty_list() {
        assert_parse("()", node_list(vec![], 0, 2));
        assert_parse("( )", node_list(vec![], 0, 3)); // With space
    }

    #[test]
    fn test_parse_simple_list() {
        assert_parse(
            "(+ 1 1)",
            node_list(
                vec![node_symbol("+", 1, 2), node_int(1, 3, 4), node_int(1, 5, 6)],
                0,
                7,
            ),
        );
    }

    #[test]
    fn test_parse_nested_list() {
        // (* 2 (+ 1 0)) -> List[Symbol(*), Number(2), List[Symbol(+), Number(1), Number(0)]]
        assert_parse(
            "(* 2 (+ 1 0))",
            node_list(
                vec![
                    node_symbol("*", 1, 2),
                    node_int(2, 3, 4),
                    node_list(
                        vec![node_symbol("+", 6, 7), node_int(1, 8, 9), node_int(0, 10, 11)],
                        5,
                        12,
                    ),
                ],
                0,
                13,
            ),
        );
    }

    #[test]
    fn test_parse_lambda_shape() {
        assert_parse(
            "(lambda (r) (* r r))",
            node_list(
                vec![
                    node_symbol("lambda", 1, 7),
                    node_list(vec![node_symbol("r", 9, 10)], 8, 11),
                    node_list(
                        vec![
                            node_symbol("*", 13, 14),
                            node_symbol("r", 15, 16),
                            node_symbol("r", 17, 18),
                        ],
                        12,
                        19,
                    ),
                ],
                0,
                20,
            ),
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_parse_error("", ParseError::UnexpectedEof("".to_string()));
        assert_parse_error("(", ParseError::UnexpectedEof("".to_string()));
        assert_parse_error("(1 2", ParseError::UnexpectedEof("".to_string()));
        assert_parse_error("(1 (2 3)", ParseError::UnexpectedEof("".to_string()));
        assert_parse_error(")", ParseError::UnexpectedClosingParen(Span::default()));
    }

    #[test]
    fn test_parse_error_messages() {
        assert_eq!(
            parse_str("(").unwrap_err().to_string(),
            "Parse Error: unexpected end of input, expected ')'"
        );
        assert_eq!(
            parse_str(")").unwrap_err().to_string(),
            "Parse Error: unexpected closing parenthesis"
        );
    }

    #[test]
    fn test_trailing_tokens_are_ignored() {
        // Only the first top-level expression is parsed per call
        assert_parse("1 2 3", node_int(1, 0, 1));
        assert_parse("(+ 1 1) trailing", {
            node_list(
                vec![node_symbol("+", 1, 2), node_int(1, 3, 4), node_int(1, 5, 6)],
                0,
                7,
            )
        });
    }
}
