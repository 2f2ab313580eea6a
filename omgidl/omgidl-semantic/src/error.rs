use omgidl_core::{Diagnostic, Phase, Span};

/// Failure to resolve a scoped name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("cannot resolve `{name}`")]
    Undeclared { name: String },
    #[error("`{segment}` is not declared in `{scope}`")]
    NotInScope { segment: String, scope: String },
}

/// Failure to evaluate a constant expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("{source}")]
    Lookup {
        #[source]
        source: LookupError,
        span: Span,
    },
    #[error("`{name}` is not a constant")]
    NotAConstant { name: String, span: Span },
    #[error("constant `{name}` is used before its definition")]
    UsedBeforeDefinition { name: String, span: Span },
    /// The referenced constant failed to evaluate; its own error was
    /// already reported.
    #[error("constant `{name}` has no valid value")]
    Poisoned { name: String, span: Span },
    #[error("{found} cannot be used in a {expected} constant")]
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("value {value} does not fit in {ty}")]
    OutOfRange { value: String, ty: String, span: Span },
    #[error("integer overflow in {ty} constant expression")]
    Overflow { ty: String, span: Span },
    #[error("division by zero in constant expression")]
    DivisionByZero { span: Span },
    #[error("shift amount {amount} is out of range for {ty}")]
    ShiftOutOfRange { amount: i128, ty: String, span: Span },
    #[error("operator `{op}` is not defined for {operand} operands")]
    InvalidOperator {
        op: &'static str,
        operand: String,
        span: Span,
    },
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::Lookup { span, .. }
            | EvalError::NotAConstant { span, .. }
            | EvalError::UsedBeforeDefinition { span, .. }
            | EvalError::Poisoned { span, .. }
            | EvalError::TypeMismatch { span, .. }
            | EvalError::OutOfRange { span, .. }
            | EvalError::Overflow { span, .. }
            | EvalError::DivisionByZero { span }
            | EvalError::ShiftOutOfRange { span, .. }
            | EvalError::InvalidOperator { span, .. } => *span,
        }
    }

    /// Errors caused by an earlier, already reported failure.
    pub fn is_cascade(&self) -> bool {
        matches!(self, EvalError::Poisoned { .. })
    }
}

impl From<EvalError> for Diagnostic {
    fn from(err: EvalError) -> Self {
        Diagnostic::error(Phase::Semantic, err.to_string(), err.span())
    }
}
