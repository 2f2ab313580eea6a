//! Typed constant values produced by the constant-expression evaluator.

use std::fmt::{Display, Formatter, Result};

use crate::id::DefId;

/// Fixed-width integer kinds used as evaluation contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl IntKind {
    pub fn bits(self) -> u32 {
        match self {
            IntKind::I8 | IntKind::U8 => 8,
            IntKind::I16 | IntKind::U16 => 16,
            IntKind::I32 | IntKind::U32 => 32,
            IntKind::I64 | IntKind::U64 => 64,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, IntKind::I8 | IntKind::I16 | IntKind::I32 | IntKind::I64)
    }

    pub fn min(self) -> i128 {
        if self.is_signed() {
            -(1i128 << (self.bits() - 1))
        } else {
            0
        }
    }

    pub fn max(self) -> i128 {
        if self.is_signed() {
            (1i128 << (self.bits() - 1)) - 1
        } else {
            (1i128 << self.bits()) - 1
        }
    }

    pub fn contains(self, value: i128) -> bool {
        (self.min()..=self.max()).contains(&value)
    }
}

impl Display for IntKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let name = match self {
            IntKind::I8 => "int8",
            IntKind::U8 => "uint8",
            IntKind::I16 => "int16",
            IntKind::U16 => "uint16",
            IntKind::I32 => "int32",
            IntKind::U32 => "uint32",
            IntKind::I64 => "int64",
            IntKind::U64 => "uint64",
        };
        f.write_str(name)
    }
}

/// The type a constant expression is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstType {
    Integer(IntKind),
    /// `float`, `double` and `long double` all evaluate in `f64`.
    Float,
    Fixed,
    Char,
    WChar,
    Boolean,
    String,
    WString,
    /// Enumerators of the enum with this id.
    Enum(DefId),
}

impl Display for ConstType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            ConstType::Integer(kind) => kind.fmt(f),
            ConstType::Float => f.write_str("floating-point"),
            ConstType::Fixed => f.write_str("fixed-point"),
            ConstType::Char => f.write_str("char"),
            ConstType::WChar => f.write_str("wchar"),
            ConstType::Boolean => f.write_str("boolean"),
            ConstType::String => f.write_str("string"),
            ConstType::WString => f.write_str("wstring"),
            ConstType::Enum(id) => write!(f, "enum {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// Always within the range of the evaluation context's [`IntKind`].
    Int(i128),
    Float(f64),
    Fixed(f64),
    Bool(bool),
    Char(char),
    WChar(char),
    String(String),
    WString(String),
    Enumerator {
        enum_id: DefId,
        ordinal: u32,
        name: String,
    },
}

impl ConstValue {
    pub fn as_int(&self) -> Option<i128> {
        match self {
            ConstValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a strictly positive size, if it is one.
    pub fn as_positive(&self) -> Option<u64> {
        self.as_int()
            .filter(|v| *v > 0)
            .and_then(|v| u64::try_from(v).ok())
    }
}

impl Display for ConstValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Float(v) => write!(f, "{v:?}"),
            ConstValue::Fixed(v) => write!(f, "{v}d"),
            ConstValue::Bool(true) => f.write_str("TRUE"),
            ConstValue::Bool(false) => f.write_str("FALSE"),
            ConstValue::Char(c) => write!(f, "{c:?}"),
            ConstValue::WChar(c) => write!(f, "L{c:?}"),
            ConstValue::String(s) => write!(f, "{s:?}"),
            ConstValue::WString(s) => write!(f, "L{s:?}"),
            ConstValue::Enumerator { name, .. } => f.write_str(name),
        }
    }
}

/// Result of evaluating a constant expression in a typed context.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedConstant {
    pub ty: ConstType,
    pub value: ConstValue,
}

impl EvaluatedConstant {
    pub fn new(ty: ConstType, value: ConstValue) -> Self {
        Self { ty, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_kind_ranges() {
        assert_eq!(IntKind::I8.min(), -128);
        assert_eq!(IntKind::I8.max(), 127);
        assert_eq!(IntKind::U16.max(), 65_535);
        assert_eq!(IntKind::U64.max(), u64::MAX as i128);
        assert!(IntKind::I32.contains(-5));
        assert!(!IntKind::U32.contains(-1));
    }

    #[test]
    fn positive_sizes() {
        assert_eq!(ConstValue::Int(4).as_positive(), Some(4));
        assert_eq!(ConstValue::Int(0).as_positive(), None);
        assert_eq!(ConstValue::Int(-3).as_positive(), None);
        assert_eq!(ConstValue::Float(2.0).as_positive(), None);
    }
}
