//! Mapping declared IDL types onto constant evaluation contexts.

use omgidl_core::{
    ConstType, DefId, IntKind,
    ast::{ConstrType, PrimitiveKind, TemplateType, TypeSpec},
};

use crate::symbol_table::{SymbolKind, SymbolTable};

/// Longest typedef chain followed before giving up.
const MAX_ALIAS_DEPTH: usize = 64;

pub(crate) fn primitive_const_type(kind: PrimitiveKind) -> Option<ConstType> {
    let int = |k| Some(ConstType::Integer(k));
    match kind {
        PrimitiveKind::Int8 => int(IntKind::I8),
        PrimitiveKind::UInt8 | PrimitiveKind::Octet => int(IntKind::U8),
        PrimitiveKind::Short | PrimitiveKind::Int16 => int(IntKind::I16),
        PrimitiveKind::UShort | PrimitiveKind::UInt16 => int(IntKind::U16),
        PrimitiveKind::Long | PrimitiveKind::Int32 => int(IntKind::I32),
        PrimitiveKind::ULong | PrimitiveKind::UInt32 => int(IntKind::U32),
        PrimitiveKind::LongLong | PrimitiveKind::Int64 => int(IntKind::I64),
        PrimitiveKind::ULongLong | PrimitiveKind::UInt64 => int(IntKind::U64),
        PrimitiveKind::Float | PrimitiveKind::Double | PrimitiveKind::LongDouble => {
            Some(ConstType::Float)
        }
        PrimitiveKind::Char => Some(ConstType::Char),
        PrimitiveKind::WChar => Some(ConstType::WChar),
        PrimitiveKind::Boolean => Some(ConstType::Boolean),
        PrimitiveKind::Any | PrimitiveKind::Object | PrimitiveKind::ValueBase => None,
    }
}

/// The evaluation context for a constant declared with type `ty`, following
/// typedefs. `None` when `ty` cannot hold a constant.
pub(crate) fn const_type_of(ty: &TypeSpec, symbols: &SymbolTable) -> Option<ConstType> {
    let mut ty = ty;
    for _ in 0..MAX_ALIAS_DEPTH {
        match ty {
            TypeSpec::Primitive(kind) => return primitive_const_type(*kind),
            TypeSpec::Template(TemplateType::String { .. }) => return Some(ConstType::String),
            TypeSpec::Template(TemplateType::WString { .. }) => return Some(ConstType::WString),
            TypeSpec::Template(TemplateType::Fixed { .. }) => return Some(ConstType::Fixed),
            TypeSpec::Template(_) => return None,
            TypeSpec::Constructed(constructed) => {
                return match constructed.as_ref() {
                    ConstrType::Enum(e) => symbols.defined_at(e.name.span).map(ConstType::Enum),
                    _ => None,
                };
            }
            TypeSpec::Named(named) => {
                let symbol = symbols.get(named.target?);
                match symbol.kind {
                    SymbolKind::Enum => return Some(ConstType::Enum(symbol.id)),
                    SymbolKind::Typedef => {
                        let alias = symbol.alias.as_ref().filter(|a| !a.is_array)?;
                        ty = &alias.ty;
                    }
                    _ => return None,
                }
            }
        }
    }
    None
}

/// Integer, char, wchar, boolean, octet and enum types may discriminate a
/// union.
pub(crate) fn discriminant_type(ty: &TypeSpec, symbols: &SymbolTable) -> Option<ConstType> {
    const_type_of(ty, symbols).filter(|t| {
        !matches!(
            t,
            ConstType::Float | ConstType::Fixed | ConstType::String | ConstType::WString
        )
    })
}

/// Human-readable name of an evaluation context.
pub(crate) fn describe(ty: ConstType, symbols: &SymbolTable) -> String {
    match ty {
        ConstType::Enum(id) => enum_name(id, symbols),
        other => other.to_string(),
    }
}

fn enum_name(id: DefId, symbols: &SymbolTable) -> String {
    format!("enum {}", symbols.qualified_name(id))
}
