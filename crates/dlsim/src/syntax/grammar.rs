use num_traits::ToPrimitive;

use super::SyntaxErrorKind;
use super::ast::*;
use super::lexer::{LexResult, Span, Token, TokenKind};
use crate::ir::{BinaryOp, PortDirection, UnaryOp};

type ParseResult<T> = LexResult<T>;

pub(super) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Binding power and operator of a binary token. Higher binds tighter.
fn binary_op(kind: &TokenKind) -> Option<(u8, BinaryOp)> {
    Some(match kind {
        TokenKind::PipePipe => (1, BinaryOp::LogicOr),
        TokenKind::AmpAmp => (2, BinaryOp::LogicAnd),
        TokenKind::Pipe => (3, BinaryOp::Or),
        TokenKind::Caret => (4, BinaryOp::Xor),
        TokenKind::Amp => (5, BinaryOp::And),
        TokenKind::EqEq => (6, BinaryOp::Eq),
        TokenKind::Ne => (6, BinaryOp::Ne),
        TokenKind::Lt => (7, BinaryOp::LtU),
        TokenKind::Le => (7, BinaryOp::LeU),
        TokenKind::Gt => (7, BinaryOp::GtU),
        TokenKind::Ge => (7, BinaryOp::GeU),
        TokenKind::Shl => (8, BinaryOp::Shl),
        TokenKind::Shr => (8, BinaryOp::Shr),
        TokenKind::Sar => (8, BinaryOp::Sar),
        TokenKind::Plus => (9, BinaryOp::Add),
        TokenKind::Minus => (9, BinaryOp::Sub),
        TokenKind::Star => (10, BinaryOp::Mul),
        _ => return None,
    })
}

fn unary_op(kind: &TokenKind) -> Option<UnaryOp> {
    Some(match kind {
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Bang => UnaryOp::LogicNot,
        TokenKind::Minus => UnaryOp::Minus,
        TokenKind::Amp => UnaryOp::And,
        TokenKind::Pipe => UnaryOp::Or,
        TokenKind::Caret => UnaryOp::Xor,
        _ => return None,
    })
}

impl Parser {
    pub(super) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].kind
    }

    fn span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn unexpected<T>(&self, expected: &str) -> ParseResult<T> {
        Err((
            SyntaxErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: self.peek().to_string(),
            },
            self.span(),
        ))
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.eat(&kind) {
            Ok(())
        } else {
            self.unexpected(&kind.to_string())
        }
    }

    fn ident(&mut self) -> ParseResult<String> {
        match self.peek() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.bump();
                Ok(name)
            }
            _ => self.unexpected("an identifier"),
        }
    }

    /// A literal used as a width, index or count.
    fn constant(&mut self) -> ParseResult<usize> {
        let span = self.span();
        match self.peek() {
            TokenKind::Number(lit) => {
                let value = lit.value.to_usize().ok_or((
                    SyntaxErrorKind::InvalidLiteral {
                        literal: lit.value.to_string(),
                        reason: "constant is too large".to_string(),
                    },
                    span,
                ))?;
                self.bump();
                Ok(value)
            }
            _ => self.unexpected("a constant"),
        }
    }

    pub(super) fn source_file(&mut self) -> ParseResult<SourceFile> {
        let mut modules = Vec::new();
        while self.peek() != &TokenKind::Eof {
            modules.push(self.module()?);
        }
        Ok(SourceFile { modules })
    }

    fn module(&mut self) -> ParseResult<ModuleDecl> {
        self.expect(TokenKind::Module)?;
        let name = self.ident()?;
        let mut ports = Vec::new();
        if self.eat(&TokenKind::LParen) {
            while !self.eat(&TokenKind::RParen) {
                ports.push(self.port()?);
                if !self.eat(&TokenKind::Comma) {
                    self.expect(TokenKind::RParen)?;
                    break;
                }
            }
        }
        self.expect(TokenKind::LBrace)?;
        let mut items = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            items.push(self.item()?);
        }
        Ok(ModuleDecl { name, ports, items })
    }

    fn port(&mut self) -> ParseResult<PortDecl> {
        let name = self.ident()?;
        self.expect(TokenKind::Colon)?;
        let direction = match self.peek() {
            TokenKind::Input => PortDirection::Input,
            TokenKind::Output => PortDirection::Output,
            _ => return self.unexpected("`input` or `output`"),
        };
        self.bump();
        let width = self.logic_type()?;
        Ok(PortDecl {
            name,
            direction,
            width,
        })
    }

    /// `logic` or `logic<N>`.
    fn logic_type(&mut self) -> ParseResult<usize> {
        self.expect(TokenKind::Logic)?;
        if !self.eat(&TokenKind::Lt) {
            return Ok(1);
        }
        let span = self.span();
        let width = self.constant()?;
        if width == 0 {
            return Err((
                SyntaxErrorKind::InvalidLiteral {
                    literal: "0".to_string(),
                    reason: "width must be at least 1".to_string(),
                },
                span,
            ));
        }
        self.expect(TokenKind::Gt)?;
        Ok(width)
    }

    fn item(&mut self) -> ParseResult<Item> {
        match self.peek() {
            TokenKind::Var => {
                self.bump();
                let name = self.ident()?;
                self.expect(TokenKind::Colon)?;
                let width = self.logic_type()?;
                self.expect(TokenKind::Semi)?;
                Ok(Item::Var(VarDecl { name, width }))
            }
            TokenKind::Assign => {
                self.bump();
                let name = self.ident()?;
                let select = self.select()?;
                self.expect(TokenKind::Eq)?;
                let expr = self.expr()?;
                self.expect(TokenKind::Semi)?;
                Ok(Item::Assign(AssignStmt {
                    target: Target { name, select },
                    expr,
                }))
            }
            TokenKind::Inst => {
                self.bump();
                let name = self.ident()?;
                self.expect(TokenKind::Colon)?;
                let module = self.ident()?;
                let mut connections = Vec::new();
                if self.eat(&TokenKind::LParen) {
                    while !self.eat(&TokenKind::RParen) {
                        let port = self.ident()?;
                        self.expect(TokenKind::Colon)?;
                        let expr = self.expr()?;
                        connections.push(Connection { port, expr });
                        if !self.eat(&TokenKind::Comma) {
                            self.expect(TokenKind::RParen)?;
                            break;
                        }
                    }
                }
                self.expect(TokenKind::Semi)?;
                Ok(Item::Inst(InstDecl {
                    name,
                    module,
                    connections,
                }))
            }
            _ => self.unexpected("`var`, `assign`, `inst` or `}`"),
        }
    }

    /// Optional `[i]` or `[msb:lsb]`.
    fn select(&mut self) -> ParseResult<Option<Select>> {
        if !self.eat(&TokenKind::LBracket) {
            return Ok(None);
        }
        let first = self.constant()?;
        let select = if self.eat(&TokenKind::Colon) {
            Select::Range(first, self.constant()?)
        } else {
            Select::Bit(first)
        };
        self.expect(TokenKind::RBracket)?;
        Ok(Some(select))
    }

    pub(super) fn expr(&mut self) -> ParseResult<Expr> {
        let cond = self.binary(1)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(cond);
        }
        let then_expr = self.expr()?;
        self.expect(TokenKind::Colon)?;
        let else_expr = self.expr()?;
        Ok(Expr::Ternary {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        })
    }

    fn binary(&mut self, min_power: u8) -> ParseResult<Expr> {
        let mut lhs = self.unary()?;
        while let Some((power, op)) = binary_op(self.peek()) {
            if power < min_power {
                break;
            }
            self.bump();
            let rhs = self.binary(power + 1)?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if let Some(op) = unary_op(self.peek()) {
            self.bump();
            let inner = self.unary()?;
            return Ok(Expr::Unary(op, Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Ok(match self.select()? {
                    Some(select) => Expr::Select(name, select),
                    None => Expr::Ident(name),
                })
            }
            TokenKind::Number(lit) => {
                self.bump();
                Ok(Expr::Number(lit))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBrace => self.concat(),
            TokenKind::System(name) => self.system_call(&name),
            _ => self.unexpected("an expression"),
        }
    }

    /// `{a, b, ...}`, where each part may itself be a replication `N{...}`.
    ///
    /// A single part still yields a `Concat`, so `{a + b}` stays self-determined.
    fn concat(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LBrace)?;
        let mut parts = vec![self.concat_part()?];
        while self.eat(&TokenKind::Comma) {
            parts.push(self.concat_part()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(if parts.len() == 1 && matches!(parts[0], Expr::Replicate(..)) {
            parts.remove(0)
        } else {
            Expr::Concat(parts)
        })
    }

    fn concat_part(&mut self) -> ParseResult<Expr> {
        if matches!(self.peek(), TokenKind::Number(_)) && self.peek_at(1) == &TokenKind::LBrace {
            let count = self.constant()?;
            let inner = match self.concat()? {
                Expr::Concat(mut parts) if parts.len() == 1 => parts.remove(0),
                inner => inner,
            };
            return Ok(Expr::Replicate(count, Box::new(inner)));
        }
        self.expr()
    }

    fn system_call(&mut self, name: &str) -> ParseResult<Expr> {
        let span = self.span();
        self.bump();
        let compare = match name {
            "slt" => Some(BinaryOp::LtS),
            "sle" => Some(BinaryOp::LeS),
            "sgt" => Some(BinaryOp::GtS),
            "sge" => Some(BinaryOp::GeS),
            "signed_shr" => Some(BinaryOp::Sar),
            "sext" | "zext" => None,
            _ => {
                return Err((SyntaxErrorKind::UnknownFunction(name.to_string()), span));
            }
        };
        self.expect(TokenKind::LParen)?;
        let first = self.expr()?;
        self.expect(TokenKind::Comma)?;
        let expr = match compare {
            Some(op) => {
                let second = self.expr()?;
                Expr::Binary(Box::new(first), op, Box::new(second))
            }
            None => {
                let width_span = self.span();
                let width = self.constant()?;
                if width == 0 {
                    return Err((
                        SyntaxErrorKind::InvalidLiteral {
                            literal: "0".to_string(),
                            reason: "width must be at least 1".to_string(),
                        },
                        width_span,
                    ));
                }
                Expr::Extend {
                    expr: Box::new(first),
                    width,
                    signed: name == "sext",
                }
            }
        };
        self.expect(TokenKind::RParen)?;
        Ok(expr)
    }
}
