//! Token types produced by the lexer.

use std::fmt::{Display, Formatter, Result};

use crate::span::Span;

macro_rules! keywords {
    ($($variant:ident => $text:literal,)*) => {
        /// Reserved IDL keywords. Matching is case-sensitive.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($variant,)*
        }

        impl Keyword {
            pub fn from_ident(text: &str) -> Option<Self> {
                match text {
                    $($text => Some(Keyword::$variant),)*
                    _ => None,
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text,)*
                }
            }
        }
    };
}

keywords! {
    Abstract => "abstract",
    Any => "any",
    Attribute => "attribute",
    Bitfield => "bitfield",
    Bitmask => "bitmask",
    Bitset => "bitset",
    Boolean => "boolean",
    Case => "case",
    Char => "char",
    Component => "component",
    Const => "const",
    Consumes => "consumes",
    Context => "context",
    Custom => "custom",
    Default => "default",
    Double => "double",
    Emits => "emits",
    Enum => "enum",
    EventType => "eventtype",
    Exception => "exception",
    Factory => "factory",
    False => "FALSE",
    Finder => "finder",
    Fixed => "fixed",
    Float => "float",
    GetRaises => "getraises",
    Home => "home",
    Import => "import",
    In => "in",
    InOut => "inout",
    Int8 => "int8",
    Int16 => "int16",
    Int32 => "int32",
    Int64 => "int64",
    Interface => "interface",
    Local => "local",
    Long => "long",
    Manages => "manages",
    Map => "map",
    Module => "module",
    Multiple => "multiple",
    Native => "native",
    Object => "Object",
    Octet => "octet",
    Oneway => "oneway",
    Out => "out",
    PrimaryKey => "primarykey",
    Private => "private",
    Provides => "provides",
    Public => "public",
    Publishes => "publishes",
    Raises => "raises",
    Readonly => "readonly",
    Sequence => "sequence",
    Set => "set",
    SetRaises => "setraises",
    Short => "short",
    String => "string",
    Struct => "struct",
    Supports => "supports",
    Switch => "switch",
    True => "TRUE",
    Truncatable => "truncatable",
    TypeDef => "typedef",
    TypeId => "typeid",
    TypePrefix => "typeprefix",
    UInt8 => "uint8",
    UInt16 => "uint16",
    UInt32 => "uint32",
    UInt64 => "uint64",
    Union => "union",
    Unsigned => "unsigned",
    Uses => "uses",
    ValueBase => "ValueBase",
    ValueType => "valuetype",
    Void => "void",
    WChar => "wchar",
    WString => "wstring",
}

/// Literal sub-kinds, distinguished from the lexeme shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Decimal,
    Octal,
    Hex,
    Float,
    Fixed,
    Char,
    WChar,
    String,
    WString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    Semi,
    Colon,
    ColonColon,
    Comma,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Lt,
    Gt,
    Eq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Tilde,
    Pipe,
    Caret,
    Amp,
    At,
}

impl Punct {
    pub fn as_str(&self) -> &'static str {
        match self {
            Punct::Semi => ";",
            Punct::Colon => ":",
            Punct::ColonColon => "::",
            Punct::Comma => ",",
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::Lt => "<",
            Punct::Gt => ">",
            Punct::Eq => "=",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Star => "*",
            Punct::Slash => "/",
            Punct::Percent => "%",
            Punct::Tilde => "~",
            Punct::Pipe => "|",
            Punct::Caret => "^",
            Punct::Amp => "&",
            Punct::At => "@",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    Keyword(Keyword),
    Literal(LiteralKind),
    Punct(Punct),
    /// Unrecognized input; already reported by the lexer.
    Invalid,
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            TokenKind::Ident => f.write_str("identifier"),
            TokenKind::Keyword(kw) => write!(f, "`{}`", kw.as_str()),
            TokenKind::Literal(kind) => match kind {
                LiteralKind::Decimal | LiteralKind::Octal | LiteralKind::Hex => {
                    f.write_str("integer literal")
                }
                LiteralKind::Float => f.write_str("floating-point literal"),
                LiteralKind::Fixed => f.write_str("fixed-point literal"),
                LiteralKind::Char | LiteralKind::WChar => f.write_str("character literal"),
                LiteralKind::String | LiteralKind::WString => f.write_str("string literal"),
            },
            TokenKind::Punct(p) => write!(f, "`{}`", p.as_str()),
            TokenKind::Invalid => f.write_str("invalid token"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// A single lexeme with its classification and location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn is_punct(&self, punct: Punct) -> bool {
        self.kind == TokenKind::Punct(punct)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    /// Human-readable description used in "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Ident => format!("identifier `{}`", self.lexeme),
            TokenKind::Literal(_) => format!("{} `{}`", self.kind, self.lexeme),
            _ => self.kind.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_is_case_sensitive() {
        assert_eq!(Keyword::from_ident("struct"), Some(Keyword::Struct));
        assert_eq!(Keyword::from_ident("Struct"), None);
        assert_eq!(Keyword::from_ident("TRUE"), Some(Keyword::True));
        assert_eq!(Keyword::from_ident("true"), None);
        assert_eq!(Keyword::ValueBase.as_str(), "ValueBase");
    }
}
