use std::fmt;

use num_bigint::BigUint;
use num_traits::Num;

use super::SyntaxErrorKind;
use super::ast::Literal;

/// Byte range `start..end` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.end - span.start).into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    /// `$name`, without the dollar sign.
    System(String),
    Number(Literal),
    Module,
    Input,
    Output,
    Logic,
    Var,
    Assign,
    Inst,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Semi,
    Comma,
    Question,
    Eq,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Shl,
    Shr,
    Sar,
    Plus,
    Minus,
    Star,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    Tilde,
    Bang,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Ident(name) => return write!(f, "identifier `{}`", name),
            TokenKind::System(name) => return write!(f, "`${}`", name),
            TokenKind::Number(lit) => return write!(f, "number `{}`", lit.value),
            TokenKind::Module => "`module`",
            TokenKind::Input => "`input`",
            TokenKind::Output => "`output`",
            TokenKind::Logic => "`logic`",
            TokenKind::Var => "`var`",
            TokenKind::Assign => "`assign`",
            TokenKind::Inst => "`inst`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Colon => "`:`",
            TokenKind::Semi => "`;`",
            TokenKind::Comma => "`,`",
            TokenKind::Question => "`?`",
            TokenKind::Eq => "`=`",
            TokenKind::EqEq => "`==`",
            TokenKind::Ne => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::Le => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::Ge => "`>=`",
            TokenKind::Shl => "`<<`",
            TokenKind::Shr => "`>>`",
            TokenKind::Sar => "`>>>`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Amp => "`&`",
            TokenKind::AmpAmp => "`&&`",
            TokenKind::Pipe => "`|`",
            TokenKind::PipePipe => "`||`",
            TokenKind::Caret => "`^`",
            TokenKind::Tilde => "`~`",
            TokenKind::Bang => "`!`",
            TokenKind::Eof => "end of input",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub(super) type LexResult<T> = Result<T, (SyntaxErrorKind, Span)>;

pub(super) fn tokenize(source: &str) -> LexResult<Vec<Token>> {
    Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
    }
    .run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Lexer<'_> {
    fn run(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let start = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span { start, end: start },
                });
                return Ok(tokens);
            };
            let kind = if c.is_ascii_alphabetic() || c == b'_' {
                let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == b'_');
                keyword(word).unwrap_or_else(|| TokenKind::Ident(word.to_string()))
            } else if c == b'$' {
                self.pos += 1;
                let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == b'_');
                if word.is_empty() {
                    return Err((
                        SyntaxErrorKind::UnexpectedChar('$'),
                        Span {
                            start,
                            end: start + 1,
                        },
                    ));
                }
                TokenKind::System(word.to_string())
            } else if c.is_ascii_digit() {
                TokenKind::Number(self.number(start)?)
            } else {
                self.punct(start)?
            };
            tokens.push(Token {
                kind,
                span: Span {
                    start,
                    end: self.pos,
                },
            });
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.source[start..self.pos]
    }

    fn skip_trivia(&mut self) -> LexResult<()> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_ascii_whitespace() => self.pos += 1,
                (Some(b'/'), Some(b'/')) => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.pos += 1;
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some(b'*'), Some(b'/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => self.pos += 1,
                            (None, _) => {
                                return Err((
                                    SyntaxErrorKind::UnterminatedComment,
                                    Span {
                                        start,
                                        end: start + 2,
                                    },
                                ));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// `123`, `0x7f`, `8'hff`, `4'b1010`, `16'd42`. Underscores separate digits.
    fn number(&mut self, start: usize) -> LexResult<Literal> {
        let lead = self.take_while(|c| c.is_ascii_digit() || c == b'_').to_string();

        if self.peek() == Some(b'\'') {
            self.pos += 1;
            let width: usize = strip_underscores(&lead)
                .parse()
                .map_err(|_| self.invalid(start, "width is not a number"))?;
            if width == 0 {
                return Err(self.invalid(start, "width must be at least 1"));
            }
            let radix = match self.peek().map(|c| c.to_ascii_lowercase()) {
                Some(b'h') => 16,
                Some(b'd') => 10,
                Some(b'o') => 8,
                Some(b'b') => 2,
                _ => return Err(self.invalid(start, "expected one of `h`, `d`, `o`, `b` after `'`")),
            };
            self.pos += 1;
            let digits = self.take_while(|c| c.is_ascii_alphanumeric() || c == b'_').to_string();
            let value = parse_digits(&digits, radix).ok_or_else(|| {
                self.invalid(start, &format!("`{}` is not a base-{} number", digits, radix))
            })?;
            if value.bits() > width as u64 {
                return Err(self.invalid(start, &format!("value does not fit in {} bits", width)));
            }
            return Ok(Literal { value, width });
        }

        let value = if lead == "0" && matches!(self.peek(), Some(b'x' | b'X')) {
            self.pos += 1;
            let digits = self.take_while(|c| c.is_ascii_alphanumeric() || c == b'_').to_string();
            parse_digits(&digits, 16).ok_or_else(|| {
                self.invalid(start, &format!("`{}` is not a hexadecimal number", digits))
            })?
        } else {
            if self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                self.take_while(|c| c.is_ascii_alphanumeric() || c == b'_');
                return Err(self.invalid(start, "unexpected letter in decimal number"));
            }
            parse_digits(&lead, 10).ok_or_else(|| self.invalid(start, "malformed decimal number"))?
        };
        let width = (value.bits() as usize).max(1);
        Ok(Literal { value, width })
    }

    fn invalid(&self, start: usize, reason: &str) -> (SyntaxErrorKind, Span) {
        (
            SyntaxErrorKind::InvalidLiteral {
                literal: self.source[start..self.pos].to_string(),
                reason: reason.to_string(),
            },
            Span {
                start,
                end: self.pos,
            },
        )
    }

    fn punct(&mut self, start: usize) -> LexResult<TokenKind> {
        let (kind, len) = match &self.bytes[self.pos..] {
            [b'>', b'>', b'>', ..] => (TokenKind::Sar, 3),
            [b'<', b'<', ..] => (TokenKind::Shl, 2),
            [b'>', b'>', ..] => (TokenKind::Shr, 2),
            [b'<', b'=', ..] => (TokenKind::Le, 2),
            [b'>', b'=', ..] => (TokenKind::Ge, 2),
            [b'=', b'=', ..] => (TokenKind::EqEq, 2),
            [b'!', b'=', ..] => (TokenKind::Ne, 2),
            [b'&', b'&', ..] => (TokenKind::AmpAmp, 2),
            [b'|', b'|', ..] => (TokenKind::PipePipe, 2),
            [b'(', ..] => (TokenKind::LParen, 1),
            [b')', ..] => (TokenKind::RParen, 1),
            [b'{', ..] => (TokenKind::LBrace, 1),
            [b'}', ..] => (TokenKind::RBrace, 1),
            [b'[', ..] => (TokenKind::LBracket, 1),
            [b']', ..] => (TokenKind::RBracket, 1),
            [b':', ..] => (TokenKind::Colon, 1),
            [b';', ..] => (TokenKind::Semi, 1),
            [b',', ..] => (TokenKind::Comma, 1),
            [b'?', ..] => (TokenKind::Question, 1),
            [b'=', ..] => (TokenKind::Eq, 1),
            [b'<', ..] => (TokenKind::Lt, 1),
            [b'>', ..] => (TokenKind::Gt, 1),
            [b'+', ..] => (TokenKind::Plus, 1),
            [b'-', ..] => (TokenKind::Minus, 1),
            [b'*', ..] => (TokenKind::Star, 1),
            [b'&', ..] => (TokenKind::Amp, 1),
            [b'|', ..] => (TokenKind::Pipe, 1),
            [b'^', ..] => (TokenKind::Caret, 1),
            [b'~', ..] => (TokenKind::Tilde, 1),
            [b'!', ..] => (TokenKind::Bang, 1),
            _ => {
                let ch = self.source[start..].chars().next().unwrap_or('\0');
                return Err((
                    SyntaxErrorKind::UnexpectedChar(ch),
                    Span {
                        start,
                        end: start + ch.len_utf8(),
                    },
                ));
            }
        };
        self.pos += len;
        Ok(kind)
    }
}

fn keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "module" => TokenKind::Module,
        "input" => TokenKind::Input,
        "output" => TokenKind::Output,
        "logic" => TokenKind::Logic,
        "var" => TokenKind::Var,
        "assign" => TokenKind::Assign,
        "inst" => TokenKind::Inst,
        _ => return None,
    })
}

fn strip_underscores(digits: &str) -> String {
    digits.chars().filter(|c| *c != '_').collect()
}

fn parse_digits(digits: &str, radix: u32) -> Option<BigUint> {
    let digits = strip_underscores(digits);
    if digits.is_empty() {
        return None;
    }
    BigUint::from_str_radix(&digits, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn literal(source: &str) -> Literal {
        match kinds(source).remove(0) {
            TokenKind::Number(lit) => lit,
            other => panic!("expected a number, got {:?}", other),
        }
    }

    #[test]
    fn sized_and_unsized_literals() {
        assert_eq!(literal("8'hff").value, BigUint::from(255u32));
        assert_eq!(literal("8'hff").width, 8);
        assert_eq!(literal("4'b10_10").value, BigUint::from(10u32));
        assert_eq!(literal("16'd42").width, 16);
        assert_eq!(literal("0x1_00").value, BigUint::from(256u32));
        assert_eq!(literal("0x1_00").width, 9);
        assert_eq!(literal("0").width, 1);
        assert_eq!(literal("5").width, 3);
    }

    #[test]
    fn oversized_literal_is_rejected() {
        let (kind, span) = tokenize("  4'h1f").unwrap_err();
        assert!(matches!(kind, SyntaxErrorKind::InvalidLiteral { .. }));
        assert_eq!(span, Span { start: 2, end: 7 });
    }

    #[test]
    fn operators_use_longest_match() {
        assert_eq!(
            kinds("a >>> b >> c <= d"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Sar,
                TokenKind::Ident("b".into()),
                TokenKind::Shr,
                TokenKind::Ident("c".into()),
                TokenKind::Le,
                TokenKind::Ident("d".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("// line\nmodule /* block\n */ $slt"),
            vec![TokenKind::Module, TokenKind::System("slt".into()), TokenKind::Eof]
        );
        assert!(matches!(
            tokenize("/* open").unwrap_err().0,
            SyntaxErrorKind::UnterminatedComment
        ));
    }

    #[test]
    fn stray_character() {
        assert_eq!(
            tokenize("a # b").unwrap_err(),
            (SyntaxErrorKind::UnexpectedChar('#'), Span { start: 2, end: 3 })
        );
    }
}
