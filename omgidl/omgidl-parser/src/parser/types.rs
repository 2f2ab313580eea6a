//! Type specifications: base types, templates, inline constructed types and
//! scoped-name references.

use omgidl_core::{
    Keyword, Punct, TokenKind,
    ast::{ConstExpr, ConstrType, NamedType, PrimitiveKind, TemplateType, TypeSpec},
};

use super::{PResult, Parser};

impl Parser<'_> {
    pub(crate) fn type_spec(&mut self) -> PResult<TypeSpec> {
        self.nested(Self::type_spec_inner)
    }

    fn type_spec_inner(&mut self) -> PResult<TypeSpec> {
        if let Some(kind) = self.primitive_type()? {
            return Ok(TypeSpec::Primitive(kind));
        }
        let keyword = match self.peek_kind() {
            TokenKind::Ident | TokenKind::Punct(Punct::ColonColon) => {
                return Ok(TypeSpec::Named(NamedType::new(self.scoped_name()?)));
            }
            TokenKind::Keyword(keyword) => keyword,
            _ => return Err(self.expected("type")),
        };
        match keyword {
            Keyword::Sequence | Keyword::Set => {
                self.bump();
                let (elem, bound) = self.angle_bracketed(|p| {
                    let elem = Box::new(p.type_spec()?);
                    let bound = p.optional_bound()?;
                    Ok((elem, bound))
                })?;
                Ok(TypeSpec::Template(if keyword == Keyword::Sequence {
                    TemplateType::Sequence { elem, bound }
                } else {
                    TemplateType::Set { elem, bound }
                }))
            }
            Keyword::Map => {
                self.bump();
                let template = self.angle_bracketed(|p| {
                    let key = Box::new(p.type_spec()?);
                    p.expect_punct(Punct::Comma)?;
                    let value = Box::new(p.type_spec()?);
                    let bound = p.optional_bound()?;
                    Ok(TemplateType::Map { key, value, bound })
                })?;
                Ok(TypeSpec::Template(template))
            }
            Keyword::String | Keyword::WString => {
                self.bump();
                let bound = if self.at_punct(Punct::Lt) {
                    Some(self.angle_bracketed(Self::const_expr)?)
                } else {
                    None
                };
                Ok(TypeSpec::Template(if keyword == Keyword::String {
                    TemplateType::String { bound }
                } else {
                    TemplateType::WString { bound }
                }))
            }
            Keyword::Fixed => {
                self.bump();
                if !self.at_punct(Punct::Lt) {
                    return Ok(TypeSpec::Template(TemplateType::Fixed {
                        digits: None,
                        scale: None,
                    }));
                }
                let (digits, scale) = self.angle_bracketed(|p| {
                    let digits = p.const_expr()?;
                    p.expect_punct(Punct::Comma)?;
                    Ok((digits, p.const_expr()?))
                })?;
                Ok(TypeSpec::Template(TemplateType::Fixed {
                    digits: Some(Box::new(digits)),
                    scale: Some(Box::new(scale)),
                }))
            }
            Keyword::Struct => {
                let start = self.bump().span;
                let name = self.ident()?;
                let s = self.struct_body(start, name)?;
                Ok(constructed(ConstrType::Struct(s)))
            }
            Keyword::Union => {
                let start = self.bump().span;
                let name = self.ident()?;
                let u = self.union_body(start, name)?;
                Ok(constructed(ConstrType::Union(u)))
            }
            Keyword::Enum => Ok(constructed(ConstrType::Enum(self.enum_type()?))),
            Keyword::Bitset => Ok(constructed(ConstrType::Bitset(self.bitset_type()?))),
            Keyword::Bitmask => Ok(constructed(ConstrType::Bitmask(self.bitmask_type()?))),
            _ => Err(self.expected("type")),
        }
    }

    fn optional_bound(&mut self) -> PResult<Option<ConstExpr>> {
        if self.eat_punct(Punct::Comma) {
            Ok(Some(self.const_expr()?))
        } else {
            Ok(None)
        }
    }

    /// `< ... >` around template arguments.
    pub(crate) fn angle_bracketed<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        self.expect_punct(Punct::Lt)?;
        self.template_args += 1;
        let result = f(self);
        self.template_args -= 1;
        let value = result?;
        self.expect_punct(Punct::Gt)?;
        Ok(value)
    }

    /// Base types, including the multi-keyword `unsigned long long` and
    /// `long double` forms. `Ok(None)` when the current token starts none.
    pub(crate) fn primitive_type(&mut self) -> PResult<Option<PrimitiveKind>> {
        let TokenKind::Keyword(keyword) = self.peek_kind() else {
            return Ok(None);
        };
        let kind = match keyword {
            Keyword::Short => PrimitiveKind::Short,
            Keyword::Unsigned => {
                self.bump();
                return if self.eat_keyword(Keyword::Short) {
                    Ok(Some(PrimitiveKind::UShort))
                } else if self.eat_keyword(Keyword::Long) {
                    if self.eat_keyword(Keyword::Long) {
                        Ok(Some(PrimitiveKind::ULongLong))
                    } else {
                        Ok(Some(PrimitiveKind::ULong))
                    }
                } else {
                    Err(self.expected("`short` or `long` after `unsigned`"))
                };
            }
            Keyword::Long => {
                self.bump();
                return Ok(Some(if self.eat_keyword(Keyword::Long) {
                    PrimitiveKind::LongLong
                } else if self.eat_keyword(Keyword::Double) {
                    PrimitiveKind::LongDouble
                } else {
                    PrimitiveKind::Long
                }));
            }
            Keyword::Int8 => PrimitiveKind::Int8,
            Keyword::UInt8 => PrimitiveKind::UInt8,
            Keyword::Int16 => PrimitiveKind::Int16,
            Keyword::UInt16 => PrimitiveKind::UInt16,
            Keyword::Int32 => PrimitiveKind::Int32,
            Keyword::UInt32 => PrimitiveKind::UInt32,
            Keyword::Int64 => PrimitiveKind::Int64,
            Keyword::UInt64 => PrimitiveKind::UInt64,
            Keyword::Float => PrimitiveKind::Float,
            Keyword::Double => PrimitiveKind::Double,
            Keyword::Char => PrimitiveKind::Char,
            Keyword::WChar => PrimitiveKind::WChar,
            Keyword::Boolean => PrimitiveKind::Boolean,
            Keyword::Octet => PrimitiveKind::Octet,
            Keyword::Any => PrimitiveKind::Any,
            Keyword::Object => PrimitiveKind::Object,
            Keyword::ValueBase => PrimitiveKind::ValueBase,
            _ => return Ok(None),
        };
        self.bump();
        Ok(Some(kind))
    }
}

fn constructed(ty: ConstrType) -> TypeSpec {
    TypeSpec::Constructed(Box::new(ty))
}
