/// One lexical unit of a formula whose `ATTR` placeholder has already been
/// substituted.
///
/// Tokens carry no position information; formulas are short single-line
/// strings and error messages quote the offending literal instead. The
/// lexer itself never fails: anything it does not recognize comes out as
/// [`TokenKind::Unknown`] and is rejected by the parser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
    Unknown,
}

/// Splits a formula into numbers, operators and parentheses, skipping
/// whitespace. An empty or all-whitespace input yields no tokens at all;
/// the parser then reports the unexpected end.
pub struct Lexer<'de> {
    rest: &'de str,
}

impl<'de> Lexer<'de> {
    pub fn new(input: &'de str) -> Self {
        Lexer { rest: input }
    }
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Token<'de>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rest = self.rest.trim_start();
        let c = self.rest.chars().next()?;

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '0'..='9' | '.' => {
                let end = self
                    .rest
                    .find(|c: char| !matches!(c, '0'..='9' | '.'))
                    .unwrap_or(self.rest.len());
                let literal = &self.rest[..end];
                self.rest = &self.rest[end..];
                // a malformed numeric literal such as `1.2.3` is deferred
                // to the parser as an unknown token
                let kind = match literal.parse() {
                    Ok(n) => TokenKind::Number(n),
                    Err(_) => TokenKind::Unknown,
                };
                return Some(Token { kind, literal });
            }
            _ => {
                let end = self
                    .rest
                    .find(|c: char| c.is_whitespace() || "+-*/()".contains(c))
                    .unwrap_or(self.rest.len());
                let literal = &self.rest[..end];
                self.rest = &self.rest[end..];
                return Some(Token {
                    kind: TokenKind::Unknown,
                    literal,
                });
            }
        };

        let literal = &self.rest[..c.len_utf8()];
        self.rest = &self.rest[c.len_utf8()..];
        Some(Token { kind, literal })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).map(|token| token.kind).collect()
    }

    #[test]
    fn splits_operators_without_whitespace() {
        assert_eq!(
            kinds("2+3*4"),
            vec![
                TokenKind::Number(2.0),
                TokenKind::Plus,
                TokenKind::Number(3.0),
                TokenKind::Star,
                TokenKind::Number(4.0),
            ]
        );
    }

    #[test]
    fn minus_is_always_an_operator_token() {
        assert_eq!(
            kinds("-5 + 3"),
            vec![
                TokenKind::Minus,
                TokenKind::Number(5.0),
                TokenKind::Plus,
                TokenKind::Number(3.0),
            ]
        );
    }

    #[test]
    fn decimal_numbers() {
        assert_eq!(
            kinds("1.5/0.5"),
            vec![
                TokenKind::Number(1.5),
                TokenKind::Slash,
                TokenKind::Number(0.5),
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert_eq!(kinds(""), vec![]);
        assert_eq!(kinds("   \t "), vec![]);
    }

    #[test]
    fn unrecognized_text_is_an_unknown_token() {
        let tokens: Vec<_> = Lexer::new("abc+1").collect();
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
        assert_eq!(tokens[0].literal, "abc");
        assert_eq!(tokens[1].kind, TokenKind::Plus);
    }

    #[test]
    fn doubled_decimal_point_is_unknown() {
        assert_eq!(kinds("1.2.3"), vec![TokenKind::Unknown]);
    }
}
