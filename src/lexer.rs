use logos::Logos;
use std::fmt;

use crate::Span;

/// Lexical tokens of the language: parentheses and undifferentiated atoms.
///
/// An atom's literal text is kept as-is; deciding whether it is a number or
/// a symbol happens in the parser, so the lexer never fails.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")] // Skip whitespace
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r"[^ \t\n\r()]+", |lex| lex.slice().to_string())]
    Atom(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Atom(text) => write!(f, "{}", text),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// Splits the input into tokens, left-to-right.
///
/// Tokenization cannot fail: every character is whitespace, a parenthesis,
/// or part of an atom. Unbalanced parentheses are detected by the parser.
pub fn tokenize(input: &str) -> Vec<Token> {
    TokenKind::lexer(input)
        .spanned()
        .map(|(result, range)| {
            let span = Span::new(range.start, range.end);
            match result {
                Ok(kind) => Token { kind, span },
                // Unreachable with the rules above; keep the raw slice as an
                // atom rather than dropping input.
                Err(()) => Token {
                    kind: TokenKind::Atom(input[range].to_string()),
                    span,
                },
            }
        })
        .collect()
}
