//! Typed constant-expression evaluation.
//!
//! Integer expressions are computed in `i128` and every operation result is
//! checked against the context's fixed-width range, so overflow is reported
//! instead of wrapping. Literals and referenced constants may reach the
//! magnitude of the signed minimum (`-128` in an `int8` context is `-(128)`);
//! the final value is always within range.

use omgidl_core::{
    ConstType, ConstValue, DefId, EvaluatedConstant, IntKind, Span,
    ast::{BinaryOp, ConstExpr, ExprKind, Literal, ScopedName, UnaryOp},
};

use crate::{
    error::EvalError,
    symbol_table::{ConstSlot, SymbolTable},
    typing,
};

/// Evaluate `expr`, written inside `scope`, as a constant of type `ty`.
///
/// Names may refer to enumerators and to constants already evaluated;
/// a constant whose declaration has not been reached yet is an error.
pub fn evaluate(
    expr: &ConstExpr,
    symbols: &SymbolTable,
    scope: DefId,
    ty: ConstType,
) -> Result<EvaluatedConstant, EvalError> {
    let evaluator = Evaluator { symbols, scope, ty };
    let value = evaluator.eval(expr)?;
    if let (ConstType::Integer(kind), ConstValue::Int(v)) = (ty, &value) {
        if !kind.contains(*v) {
            return Err(evaluator.out_of_range(*v, expr.span));
        }
    }
    Ok(EvaluatedConstant::new(ty, value))
}

struct Evaluator<'a> {
    symbols: &'a SymbolTable,
    scope: DefId,
    ty: ConstType,
}

impl Evaluator<'_> {
    fn eval(&self, expr: &ConstExpr) -> Result<ConstValue, EvalError> {
        match &expr.kind {
            ExprKind::Literal(literal) => self.literal(literal, expr.span),
            ExprKind::Name(name) => self.name(name, expr.span),
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand)?;
                self.unary(*op, value, expr.span)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                self.binary(*op, lhs, rhs, expr.span)
            }
        }
    }

    fn literal(&self, literal: &Literal, span: Span) -> Result<ConstValue, EvalError> {
        let value = match (literal, self.ty) {
            (Literal::Integer(v, _), ConstType::Integer(kind)) => {
                return self.operand(kind, i128::from(*v), span);
            }
            (Literal::Integer(v, _), ConstType::Float) => ConstValue::Float(*v as f64),
            (Literal::Integer(v, _), ConstType::Fixed) => ConstValue::Fixed(*v as f64),
            (Literal::Float(v) | Literal::Fixed(v), ConstType::Float) => ConstValue::Float(*v),
            (Literal::Float(v) | Literal::Fixed(v), ConstType::Fixed) => ConstValue::Fixed(*v),
            (Literal::Char(c), ConstType::Char) => ConstValue::Char(*c),
            (Literal::Char(c) | Literal::WChar(c), ConstType::WChar) => ConstValue::WChar(*c),
            (Literal::String(s), ConstType::String) => ConstValue::String(s.clone()),
            (Literal::String(s) | Literal::WString(s), ConstType::WString) => {
                ConstValue::WString(s.clone())
            }
            (Literal::Boolean(b), ConstType::Boolean) => ConstValue::Bool(*b),
            _ => return Err(self.mismatch(literal_kind(literal).to_string(), span)),
        };
        Ok(value)
    }

    fn name(&self, name: &ScopedName, span: Span) -> Result<ConstValue, EvalError> {
        let id = self
            .symbols
            .resolve(self.scope, name)
            .map_err(|source| EvalError::Lookup { source, span })?;
        let symbol = self.symbols.get(id);
        let constant = match &symbol.constant {
            ConstSlot::Value(constant) => constant,
            ConstSlot::Pending => {
                return Err(EvalError::UsedBeforeDefinition {
                    name: name.to_string(),
                    span,
                });
            }
            ConstSlot::Failed => {
                return Err(EvalError::Poisoned {
                    name: name.to_string(),
                    span,
                });
            }
            ConstSlot::None => {
                return Err(EvalError::NotAConstant {
                    name: name.to_string(),
                    span,
                });
            }
        };

        let value = match (&constant.value, self.ty) {
            (ConstValue::Int(v), ConstType::Integer(kind)) => return self.operand(kind, *v, span),
            (ConstValue::Int(v), ConstType::Float) => ConstValue::Float(*v as f64),
            (ConstValue::Int(v), ConstType::Fixed) => ConstValue::Fixed(*v as f64),
            (ConstValue::Float(v) | ConstValue::Fixed(v), ConstType::Float) => {
                ConstValue::Float(*v)
            }
            (ConstValue::Float(v) | ConstValue::Fixed(v), ConstType::Fixed) => {
                ConstValue::Fixed(*v)
            }
            (ConstValue::Char(c), ConstType::Char) => ConstValue::Char(*c),
            (ConstValue::Char(c) | ConstValue::WChar(c), ConstType::WChar) => {
                ConstValue::WChar(*c)
            }
            (ConstValue::String(s), ConstType::String) => ConstValue::String(s.clone()),
            (ConstValue::String(s) | ConstValue::WString(s), ConstType::WString) => {
                ConstValue::WString(s.clone())
            }
            (ConstValue::Bool(b), ConstType::Boolean) => ConstValue::Bool(*b),
            (ConstValue::Enumerator { enum_id, .. }, ConstType::Enum(expected))
                if *enum_id == expected =>
            {
                constant.value.clone()
            }
            _ => {
                let found = format!(
                    "`{name}` ({})",
                    typing::describe(constant.ty, self.symbols)
                );
                return Err(self.mismatch(found, span));
            }
        };
        Ok(value)
    }

    fn unary(&self, op: UnaryOp, value: ConstValue, span: Span) -> Result<ConstValue, EvalError> {
        match (op, value) {
            (UnaryOp::Plus, v @ (ConstValue::Int(_) | ConstValue::Float(_) | ConstValue::Fixed(_))) => {
                Ok(v)
            }
            (UnaryOp::Minus, ConstValue::Int(v)) => self.result(v.checked_neg(), span),
            (UnaryOp::Minus, ConstValue::Float(v)) => Ok(ConstValue::Float(-v)),
            (UnaryOp::Minus, ConstValue::Fixed(v)) => Ok(ConstValue::Fixed(-v)),
            (UnaryOp::Not, ConstValue::Int(v)) => {
                let kind = self.int_kind(op.as_str(), span)?;
                let inverted = if kind.is_signed() { !v } else { kind.max() - v };
                self.result(Some(inverted), span)
            }
            (op, value) => Err(self.invalid_operator(op.as_str(), &value, span)),
        }
    }

    fn binary(
        &self,
        op: BinaryOp,
        lhs: ConstValue,
        rhs: ConstValue,
        span: Span,
    ) -> Result<ConstValue, EvalError> {
        match (lhs, rhs) {
            (ConstValue::Int(a), ConstValue::Int(b)) => self.int_binary(op, a, b, span),
            (ConstValue::Float(a), ConstValue::Float(b)) => {
                float_binary(op, a, b, span).map(ConstValue::Float)
            }
            (ConstValue::Fixed(a), ConstValue::Fixed(b)) => {
                float_binary(op, a, b, span).map(ConstValue::Fixed)
            }
            (lhs, _) => Err(self.invalid_operator(op.as_str(), &lhs, span)),
        }
    }

    fn int_binary(&self, op: BinaryOp, a: i128, b: i128, span: Span) -> Result<ConstValue, EvalError> {
        let kind = self.int_kind(op.as_str(), span)?;
        let value = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div | BinaryOp::Mod if b == 0 => {
                return Err(EvalError::DivisionByZero { span });
            }
            BinaryOp::Div => a.checked_div(b),
            BinaryOp::Mod => a.checked_rem(b),
            BinaryOp::Shl | BinaryOp::Shr => {
                if !(0..i128::from(kind.bits())).contains(&b) {
                    return Err(EvalError::ShiftOutOfRange {
                        amount: b,
                        ty: kind.to_string(),
                        span,
                    });
                }
                if op == BinaryOp::Shl {
                    a.checked_mul(1i128 << b)
                } else {
                    Some(a >> b)
                }
            }
            BinaryOp::And => Some(a & b),
            BinaryOp::Or => Some(a | b),
            BinaryOp::Xor => Some(a ^ b),
        };
        self.result(value, span)
    }

    /// Strict range check on an operation result.
    fn result(&self, value: Option<i128>, span: Span) -> Result<ConstValue, EvalError> {
        let kind = self.int_kind("-", span)?;
        match value {
            Some(v) if kind.contains(v) => Ok(ConstValue::Int(v)),
            _ => Err(EvalError::Overflow {
                ty: kind.to_string(),
                span,
            }),
        }
    }

    /// Range check on a literal or referenced constant, allowing the
    /// magnitude of the signed minimum so that it can be negated.
    fn operand(&self, kind: IntKind, v: i128, span: Span) -> Result<ConstValue, EvalError> {
        let upper = kind.max().max(-kind.min());
        if (kind.min()..=upper).contains(&v) {
            Ok(ConstValue::Int(v))
        } else {
            Err(self.out_of_range(v, span))
        }
    }

    fn int_kind(&self, op: &'static str, span: Span) -> Result<IntKind, EvalError> {
        match self.ty {
            ConstType::Integer(kind) => Ok(kind),
            other => Err(EvalError::InvalidOperator {
                op,
                operand: typing::describe(other, self.symbols),
                span,
            }),
        }
    }

    fn out_of_range(&self, v: i128, span: Span) -> EvalError {
        EvalError::OutOfRange {
            value: v.to_string(),
            ty: typing::describe(self.ty, self.symbols),
            span,
        }
    }

    fn mismatch(&self, found: String, span: Span) -> EvalError {
        EvalError::TypeMismatch {
            expected: typing::describe(self.ty, self.symbols),
            found,
            span,
        }
    }

    fn invalid_operator(&self, op: &'static str, value: &ConstValue, span: Span) -> EvalError {
        EvalError::InvalidOperator {
            op,
            operand: value_kind(value).to_string(),
            span,
        }
    }
}

fn float_binary(op: BinaryOp, a: f64, b: f64, span: Span) -> Result<f64, EvalError> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Sub => Ok(a - b),
        BinaryOp::Mul => Ok(a * b),
        BinaryOp::Div if b == 0.0 => Err(EvalError::DivisionByZero { span }),
        BinaryOp::Div => Ok(a / b),
        _ => Err(EvalError::InvalidOperator {
            op: op.as_str(),
            operand: "floating-point".to_string(),
            span,
        }),
    }
}

fn literal_kind(literal: &Literal) -> &'static str {
    match literal {
        Literal::Integer(..) => "integer literal",
        Literal::Float(_) => "floating-point literal",
        Literal::Fixed(_) => "fixed-point literal",
        Literal::Char(_) => "character literal",
        Literal::WChar(_) => "wide character literal",
        Literal::String(_) => "string literal",
        Literal::WString(_) => "wide string literal",
        Literal::Boolean(_) => "boolean literal",
    }
}

fn value_kind(value: &ConstValue) -> &'static str {
    match value {
        ConstValue::Int(_) => "integer",
        ConstValue::Float(_) => "floating-point",
        ConstValue::Fixed(_) => "fixed-point",
        ConstValue::Bool(_) => "boolean",
        ConstValue::Char(_) | ConstValue::WChar(_) => "character",
        ConstValue::String(_) | ConstValue::WString(_) => "string",
        ConstValue::Enumerator { .. } => "enumerator",
    }
}
