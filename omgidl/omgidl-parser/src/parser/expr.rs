//! Constant expressions.
//!
//! Precedence, loosest first: `|`, `^`, `&`, `<<`/`>>`, `+`/`-`,
//! `*`/`/`/`%`, unary `+`/`-`/`~`, primary. Every binary level is a
//! left-associative loop over the next tighter one.

use omgidl_core::{
    Keyword, LiteralKind, Punct, TokenKind,
    ast::{BinaryOp, ConstExpr, ExprKind, Literal, UnaryOp},
};

use super::{PResult, Parser};
use crate::{error::SyntaxError, literal};

impl Parser<'_> {
    pub(crate) fn const_expr(&mut self) -> PResult<ConstExpr> {
        self.operators = 0;
        self.or_expr()
    }

    /// Count one more binary operator against the nesting limit. A chain
    /// of `n` operators builds a tree `n` levels deep.
    fn operator(&mut self) -> PResult<()> {
        self.operators += 1;
        if self.nesting + self.operators > self.max_nesting {
            return Err(SyntaxError::NestingTooDeep {
                limit: self.max_nesting,
                span: self.prev_span,
            });
        }
        Ok(())
    }

    fn or_expr(&mut self) -> PResult<ConstExpr> {
        let mut lhs = self.xor_expr()?;
        while self.eat_punct(Punct::Pipe) {
            self.operator()?;
            let rhs = self.xor_expr()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn xor_expr(&mut self) -> PResult<ConstExpr> {
        let mut lhs = self.and_expr()?;
        while self.eat_punct(Punct::Caret) {
            self.operator()?;
            let rhs = self.and_expr()?;
            lhs = binary(BinaryOp::Xor, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> PResult<ConstExpr> {
        let mut lhs = self.shift_expr()?;
        while self.eat_punct(Punct::Amp) {
            self.operator()?;
            let rhs = self.shift_expr()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn shift_expr(&mut self) -> PResult<ConstExpr> {
        let mut lhs = self.add_expr()?;
        while let Some(op) = self.shift_op() {
            self.bump();
            self.bump();
            self.operator()?;
            let rhs = self.add_expr()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    /// `<<` and `>>` are two adjacent angle tokens. Inside template
    /// arguments `>>` closes the lists instead.
    fn shift_op(&self) -> Option<BinaryOp> {
        let (first, second) = (self.nth(0), self.nth(1));
        if !first.span.is_adjacent_to(&second.span) {
            return None;
        }
        if first.is_punct(Punct::Lt) && second.is_punct(Punct::Lt) {
            Some(BinaryOp::Shl)
        } else if first.is_punct(Punct::Gt) && second.is_punct(Punct::Gt) && self.template_args == 0
        {
            Some(BinaryOp::Shr)
        } else {
            None
        }
    }

    fn add_expr(&mut self) -> PResult<ConstExpr> {
        let mut lhs = self.mul_expr()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Punct(Punct::Plus) => BinaryOp::Add,
                TokenKind::Punct(Punct::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            self.operator()?;
            let rhs = self.mul_expr()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn mul_expr(&mut self) -> PResult<ConstExpr> {
        let mut lhs = self.unary_expr()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Punct(Punct::Star) => BinaryOp::Mul,
                TokenKind::Punct(Punct::Slash) => BinaryOp::Div,
                TokenKind::Punct(Punct::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.bump();
            self.operator()?;
            let rhs = self.unary_expr()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary_expr(&mut self) -> PResult<ConstExpr> {
        let op = match self.peek_kind() {
            TokenKind::Punct(Punct::Plus) => UnaryOp::Plus,
            TokenKind::Punct(Punct::Minus) => UnaryOp::Minus,
            TokenKind::Punct(Punct::Tilde) => UnaryOp::Not,
            _ => return self.primary_expr(),
        };
        let start = self.bump().span;
        let operand = self.nested(Self::unary_expr)?;
        let span = start.to(operand.span);
        Ok(ConstExpr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn primary_expr(&mut self) -> PResult<ConstExpr> {
        match self.peek_kind() {
            TokenKind::Ident | TokenKind::Punct(Punct::ColonColon) => {
                let name = self.scoped_name()?;
                let span = name.span;
                Ok(ConstExpr::new(ExprKind::Name(name), span))
            }
            TokenKind::Keyword(Keyword::True) | TokenKind::Keyword(Keyword::False) => {
                let token = self.bump();
                let value = token.is_keyword(Keyword::True);
                Ok(ConstExpr::new(
                    ExprKind::Literal(Literal::Boolean(value)),
                    token.span,
                ))
            }
            TokenKind::Literal(kind) => self.literal(kind),
            TokenKind::Punct(Punct::LParen) => {
                self.bump();
                let saved = std::mem::take(&mut self.template_args);
                let inner = self.nested(Self::or_expr);
                self.template_args = saved;
                let inner = inner?;
                self.expect_punct(Punct::RParen)?;
                Ok(inner)
            }
            _ => Err(self.expected("constant expression")),
        }
    }

    fn literal(&mut self, kind: LiteralKind) -> PResult<ConstExpr> {
        let token = self.bump();
        let invalid = |reason: String| SyntaxError::Invalid {
            message: format!("invalid literal `{}`: {reason}", token.lexeme),
            span: token.span,
        };
        let mut span = token.span;
        let value = match kind {
            LiteralKind::Decimal | LiteralKind::Octal | LiteralKind::Hex => {
                let (value, radix) = literal::parse_integer(&token.lexeme, kind).map_err(invalid)?;
                Literal::Integer(value, radix)
            }
            LiteralKind::Float => Literal::Float(literal::parse_float(&token.lexeme).map_err(invalid)?),
            LiteralKind::Fixed => Literal::Fixed(literal::parse_fixed(&token.lexeme).map_err(invalid)?),
            LiteralKind::Char => Literal::Char(literal::char_value(&token.lexeme).map_err(invalid)?),
            LiteralKind::WChar => Literal::WChar(literal::char_value(&token.lexeme).map_err(invalid)?),
            LiteralKind::String | LiteralKind::WString => {
                // Adjacent string literals concatenate.
                let mut text = literal::string_value(&token.lexeme).map_err(invalid)?;
                while self.peek_kind() == TokenKind::Literal(kind) {
                    let next = self.bump();
                    let part = literal::string_value(&next.lexeme).map_err(|reason| {
                        SyntaxError::Invalid {
                            message: format!("invalid literal `{}`: {reason}", next.lexeme),
                            span: next.span,
                        }
                    })?;
                    text.push_str(&part);
                    span = span.to(next.span);
                }
                if kind == LiteralKind::String {
                    Literal::String(text)
                } else {
                    Literal::WString(text)
                }
            }
        };
        Ok(ConstExpr::new(ExprKind::Literal(value), span))
    }

    /// A string literal operand outside expressions (`typeid`, `context`,
    /// `import`), with adjacent literals concatenated.
    pub(crate) fn string_literal(&mut self) -> PResult<String> {
        if self.peek_kind() != TokenKind::Literal(LiteralKind::String) {
            return Err(self.expected("string literal"));
        }
        let expr = self.literal(LiteralKind::String)?;
        match expr.kind {
            ExprKind::Literal(Literal::String(text)) => Ok(text),
            _ => Err(self.expected("string literal")),
        }
    }
}

fn binary(op: BinaryOp, lhs: ConstExpr, rhs: ConstExpr) -> ConstExpr {
    let span = lhs.span.to(rhs.span);
    ConstExpr::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    )
}
