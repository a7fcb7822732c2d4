use std::iter::Peekable;

use crate::error::SyntaxError;
use crate::lex::{Lexer, Token, TokenKind};

/// A parsed formula. The tree is owned strictly top-down; once built it
/// always evaluates, the only runtime failure left being division by zero.
///
/// `PatternMatch` is constructed by the expression service for
/// `Regex(ATTR, '<pattern>')` formulas, never by the parser itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Number(f64),
    UnaryMinus(Box<Ast>),
    BinaryOp {
        left: Box<Ast>,
        op: BinaryOp,
        right: Box<Ast>,
    },
    PatternMatch(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }

    fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            _ => None,
        }
    }
}

/// Precedence-climbing parser over the token stream.
///
/// `*` and `/` bind tighter than `+` and `-`; chains of equal precedence
/// fold left, so `10-3-2` is `(10-3)-2`.
pub struct Parser<'de> {
    tokens: Peekable<Lexer<'de>>,
}

impl<'de> Parser<'de> {
    pub fn new(input: &'de str) -> Self {
        Parser {
            tokens: Lexer::new(input).peekable(),
        }
    }

    /// Parses one expression. Tokens left over after the top-level
    /// expression are ignored, preserving the permissiveness stored
    /// formulas have always relied on.
    pub fn parse(mut self) -> Result<Ast, SyntaxError> {
        self.parse_expression(0)
    }

    fn parse_expression(&mut self, min_precedence: u8) -> Result<Ast, SyntaxError> {
        let mut node = self.parse_primary()?;
        while let Some(op) = self.peek_operator() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.tokens.next();
            let right = self.parse_expression(precedence + 1)?;
            node = Ast::BinaryOp {
                left: Box::new(node),
                op,
                right: Box::new(right),
            };
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<Ast, SyntaxError> {
        let Some(token) = self.tokens.next() else {
            return Err(SyntaxError::UnexpectedEnd);
        };
        match token.kind {
            TokenKind::Number(n) => Ok(Ast::Number(n)),
            TokenKind::Minus => Ok(Ast::UnaryMinus(Box::new(self.parse_primary()?))),
            TokenKind::LeftParen => {
                let node = self.parse_expression(0)?;
                match self.tokens.next() {
                    Some(Token {
                        kind: TokenKind::RightParen,
                        ..
                    }) => Ok(node),
                    _ => Err(SyntaxError::MismatchedParens),
                }
            }
            _ => Err(SyntaxError::UnexpectedToken {
                token: token.literal.to_string(),
            }),
        }
    }

    fn peek_operator(&mut self) -> Option<BinaryOp> {
        self.tokens
            .peek()
            .and_then(|token| BinaryOp::from_token(token.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Ast, SyntaxError> {
        Parser::new(input).parse()
    }

    fn binary(left: Ast, op: BinaryOp, right: Ast) -> Ast {
        Ast::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let ast = parse("2+3*4").unwrap();
        assert_eq!(
            ast,
            binary(
                Ast::Number(2.0),
                BinaryOp::Add,
                binary(Ast::Number(3.0), BinaryOp::Mul, Ast::Number(4.0)),
            )
        );
    }

    #[test]
    fn equal_precedence_folds_left() {
        let ast = parse("10-3-2").unwrap();
        assert_eq!(
            ast,
            binary(
                binary(Ast::Number(10.0), BinaryOp::Sub, Ast::Number(3.0)),
                BinaryOp::Sub,
                Ast::Number(2.0),
            )
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        let ast = parse("(2+3)*4").unwrap();
        assert_eq!(
            ast,
            binary(
                binary(Ast::Number(2.0), BinaryOp::Add, Ast::Number(3.0)),
                BinaryOp::Mul,
                Ast::Number(4.0),
            )
        );
    }

    #[test]
    fn unary_minus_applies_to_a_primary() {
        let ast = parse("-5+3").unwrap();
        assert_eq!(
            ast,
            binary(
                Ast::UnaryMinus(Box::new(Ast::Number(5.0))),
                BinaryOp::Add,
                Ast::Number(3.0),
            )
        );
    }

    #[test]
    fn empty_input_is_an_unexpected_end() {
        assert_eq!(parse(""), Err(SyntaxError::UnexpectedEnd));
        assert_eq!(parse("2+"), Err(SyntaxError::UnexpectedEnd));
    }

    #[test]
    fn operator_where_a_primary_is_expected() {
        assert_eq!(
            parse("2+*3"),
            Err(SyntaxError::UnexpectedToken {
                token: "*".to_string()
            })
        );
    }

    #[test]
    fn unclosed_group() {
        assert_eq!(parse("(2+3"), Err(SyntaxError::MismatchedParens));
    }

    #[test]
    fn trailing_tokens_are_ignored() {
        // not hardened into an error: stored formulas rely on it
        assert_eq!(parse("2+3 7"), Ok(binary(
            Ast::Number(2.0),
            BinaryOp::Add,
            Ast::Number(3.0),
        )));
    }
}
