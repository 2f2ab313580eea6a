//! Layout facts for decoding, derived from a resolved specification.
//!
//! Entries are keyed by [`DefId`] and kept in document order; inline types
//! appear just before the type that contains them.

mod build;
mod format;

use std::collections::HashMap;

use indexmap::IndexMap;
use omgidl_core::{ConstValue, DefId, EvaluatedConstant, ast::PrimitiveKind};

pub use build::build_model;
pub(crate) use build::{annotation_int, flag_positions};
pub use format::format_type_model;

/// A member or element type with every reference bound and every bound
/// evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
    Primitive(PrimitiveKind),
    String {
        bound: Option<u64>,
    },
    WString {
        bound: Option<u64>,
    },
    Fixed {
        digits: u32,
        scale: u32,
    },
    Sequence {
        elem: Box<ResolvedType>,
        bound: Option<u64>,
    },
    Set {
        elem: Box<ResolvedType>,
        bound: Option<u64>,
    },
    Map {
        key: Box<ResolvedType>,
        value: Box<ResolvedType>,
        bound: Option<u64>,
    },
    Named(DefId),
    /// A reference whose name did not resolve.
    Unresolved(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: ResolvedType,
    /// Array dimensions, outermost first.
    pub dims: Vec<u64>,
    pub key: bool,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructLayout {
    pub base: Option<DefId>,
    /// Declaration order, which is also decode order.
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionCase {
    pub labels: Vec<ConstValue>,
    pub is_default: bool,
    pub field: Field,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionLayout {
    pub discriminant: ResolvedType,
    pub cases: Vec<UnionCase>,
}

impl UnionLayout {
    pub fn default_case(&self) -> Option<&UnionCase> {
        self.cases.iter().find(|case| case.is_default)
    }

    /// The case selected by a discriminant value.
    pub fn case_for(&self, value: &ConstValue) -> Option<&UnionCase> {
        self.cases
            .iter()
            .find(|case| case.labels.contains(value))
            .or_else(|| self.default_case())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumLayout {
    pub bit_bound: u32,
    /// Index is the ordinal.
    pub enumerators: Vec<String>,
}

impl EnumLayout {
    pub fn ordinal(&self, name: &str) -> Option<u32> {
        self.enumerators
            .iter()
            .position(|e| e == name)
            .and_then(|i| u32::try_from(i).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitFlag {
    pub name: String,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmaskLayout {
    pub bit_bound: u32,
    pub flags: Vec<BitFlag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitfieldLayout {
    /// `None` for anonymous padding.
    pub name: Option<String>,
    /// Bit offset from the start of the bitset, base bits included.
    pub offset: u32,
    pub width: u32,
    /// Declared destination type, or the one implied by the width.
    pub ty: PrimitiveKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitsetLayout {
    pub base: Option<DefId>,
    pub fields: Vec<BitfieldLayout>,
    pub total_bits: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasLayout {
    pub ty: ResolvedType,
    pub dims: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Struct(StructLayout),
    Union(UnionLayout),
    Enum(EnumLayout),
    Bitmask(BitmaskLayout),
    Bitset(BitsetLayout),
    Alias(AliasLayout),
    Const(EvaluatedConstant),
    Exception(StructLayout),
    Native,
    /// CORBA constructs kept without layout; the payload names the kind.
    Opaque(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeEntry {
    pub id: DefId,
    /// Fully-qualified, e.g. `geometry_msgs::msg::Point`.
    pub name: String,
    pub kind: TypeKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeModel {
    entries: IndexMap<DefId, TypeEntry>,
    by_name: HashMap<String, DefId>,
}

impl TypeModel {
    pub(crate) fn insert(&mut self, entry: TypeEntry) {
        self.by_name.entry(entry.name.clone()).or_insert(entry.id);
        self.entries.insert(entry.id, entry);
    }

    pub fn get(&self, id: DefId) -> Option<&TypeEntry> {
        self.entries.get(&id)
    }

    /// Look up by fully-qualified name; a leading `::` is accepted.
    pub fn get_by_name(&self, name: &str) -> Option<&TypeEntry> {
        let name = name.trim_start_matches("::");
        self.by_name.get(name).and_then(|id| self.entries.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Follow typedefs without array dimensions down to the underlying type.
    pub fn unalias<'a>(&'a self, ty: &'a ResolvedType) -> &'a ResolvedType {
        let mut current = ty;
        for _ in 0..self.entries.len() {
            let ResolvedType::Named(id) = current else {
                break;
            };
            match self.get(*id).map(|e| &e.kind) {
                Some(TypeKind::Alias(alias)) if alias.dims.is_empty() => current = &alias.ty,
                _ => break,
            }
        }
        current
    }

    /// IDL-like spelling of `ty`.
    pub fn type_name(&self, ty: &ResolvedType) -> String {
        let bounded = |name: &str, bound: &Option<u64>| match bound {
            Some(b) => format!("{name}<{b}>"),
            None => name.to_string(),
        };
        match ty {
            ResolvedType::Primitive(kind) => kind.as_str().to_string(),
            ResolvedType::String { bound } => bounded("string", bound),
            ResolvedType::WString { bound } => bounded("wstring", bound),
            ResolvedType::Fixed { digits, scale } => format!("fixed<{digits}, {scale}>"),
            ResolvedType::Sequence { elem, bound } | ResolvedType::Set { elem, bound } => {
                let template = if matches!(ty, ResolvedType::Set { .. }) {
                    "set"
                } else {
                    "sequence"
                };
                match bound {
                    Some(b) => format!("{template}<{}, {b}>", self.type_name(elem)),
                    None => format!("{template}<{}>", self.type_name(elem)),
                }
            }
            ResolvedType::Map { key, value, bound } => {
                let (key, value) = (self.type_name(key), self.type_name(value));
                match bound {
                    Some(b) => format!("map<{key}, {value}, {b}>"),
                    None => format!("map<{key}, {value}>"),
                }
            }
            ResolvedType::Named(id) => match self.get(*id) {
                Some(entry) => entry.name.clone(),
                None => id.to_string(),
            },
            ResolvedType::Unresolved(name) => format!("<unresolved {name}>"),
        }
    }
}
