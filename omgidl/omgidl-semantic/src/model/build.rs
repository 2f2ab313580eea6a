use omgidl_core::{
    ConstValue, DefId,
    ast::{
        Annotation, BitValue, BitmaskType, BitsetType, CaseLabel, ConstExpr, ConstrType,
        Declarator, Definition, DefinitionKind, EnumType, Export, Identifier, Member,
        PrimitiveKind, Specification, StructType, TemplateType, TypeSpec, UnionType,
        find_annotation,
    },
};

use super::{
    AliasLayout, BitFlag, BitfieldLayout, BitmaskLayout, BitsetLayout, EnumLayout, Field,
    ResolvedType, StructLayout, TypeEntry, TypeKind, TypeModel, UnionCase, UnionLayout,
};
use crate::symbol_table::{DefState, SymbolTable};

const DEFAULT_BIT_BOUND: u32 = 32;

/// Derive the [`TypeModel`] of a resolved specification.
///
/// Meant for documents without errors; on invalid input the model is still
/// built, with unresolved references and failed sizes left as
/// [`ResolvedType::Unresolved`] and `0`.
pub fn build_model(spec: &Specification, symbols: &SymbolTable) -> TypeModel {
    let mut builder = ModelBuilder {
        symbols,
        model: TypeModel::default(),
    };
    builder.definitions(&spec.definitions);
    for symbol in symbols.dangling_forwards() {
        builder.model.insert(TypeEntry {
            id: symbol.id,
            name: symbols.qualified_name(symbol.id),
            kind: TypeKind::Opaque("forward declaration"),
        });
    }
    log::debug!("type model built: entries={}", builder.model.len());
    builder.model
}

struct ModelBuilder<'a> {
    symbols: &'a SymbolTable,
    model: TypeModel,
}

impl ModelBuilder<'_> {
    fn definitions(&mut self, definitions: &[Definition]) {
        for definition in definitions {
            self.definition(definition);
        }
    }

    fn definition(&mut self, definition: &Definition) {
        let annotations = &definition.annotations;
        match &definition.kind {
            DefinitionKind::Module(module) => self.definitions(&module.definitions),
            DefinitionKind::Struct(s) => {
                self.struct_type(s);
            }
            DefinitionKind::Union(u) => {
                self.union_type(u);
            }
            DefinitionKind::Enum(e) => {
                self.enum_type(e, annotations);
            }
            DefinitionKind::Bitset(b) => {
                self.bitset_type(b);
            }
            DefinitionKind::Bitmask(b) => {
                self.bitmask_type(b, annotations);
            }
            DefinitionKind::Typedef(typedef) => {
                let ty = self.resolved_type(&typedef.ty);
                for declarator in &typedef.declarators {
                    let kind = TypeKind::Alias(AliasLayout {
                        ty: ty.clone(),
                        dims: dims(declarator),
                    });
                    self.insert(declarator.name(), kind);
                }
            }
            DefinitionKind::Const(c) => {
                if let Some(value) = &c.value.value {
                    self.insert(&c.name, TypeKind::Const(value.clone()));
                }
            }
            DefinitionKind::Exception(e) => {
                let fields = self.fields(&e.members);
                let layout = StructLayout { base: None, fields };
                self.insert(&e.name, TypeKind::Exception(layout));
            }
            DefinitionKind::Native(name) => {
                self.insert(name, TypeKind::Native);
            }
            DefinitionKind::Interface(i) => self.opaque(&i.name, &i.body),
            DefinitionKind::ValueType(v) | DefinitionKind::Event(v) => {
                self.opaque(&v.name, &v.body)
            }
            DefinitionKind::Component(c) => self.opaque(&c.name, &c.body),
            DefinitionKind::Home(h) => self.opaque(&h.name, &h.body),
            DefinitionKind::ValueBox(v) => self.opaque(&v.name, &[]),
            DefinitionKind::Forward(_)
            | DefinitionKind::TypeId(_)
            | DefinitionKind::TypePrefix(_)
            | DefinitionKind::Annotation(_) => {}
        }
    }

    /// CORBA constructs get an opaque entry; definitions nested in their
    /// bodies are modelled normally.
    fn opaque(&mut self, name: &Identifier, body: &[Export]) {
        for export in body {
            if let Export::Definition(definition) = export {
                self.definition(definition);
            }
        }
        if let Some(id) = self.symbols.defined_at(name.span) {
            let kind = self.symbols.get(id).kind.describe();
            self.insert(name, TypeKind::Opaque(kind));
        }
    }

    fn struct_type(&mut self, s: &StructType) -> Option<DefId> {
        let fields = self.fields(&s.members);
        let base = s.base.as_ref().and_then(|b| b.target);
        self.insert(&s.name, TypeKind::Struct(StructLayout { base, fields }))
    }

    fn union_type(&mut self, u: &UnionType) -> Option<DefId> {
        let discriminant = self.resolved_type(&u.discriminant.ty);
        let cases = u
            .cases
            .iter()
            .map(|case| {
                let labels = case
                    .labels
                    .iter()
                    .filter_map(|label| match label {
                        CaseLabel::Value(expr) => expr.value.as_ref().map(|v| v.value.clone()),
                        CaseLabel::Default(_) => None,
                    })
                    .collect();
                let element = &case.element;
                let ty = self.resolved_type(&element.ty);
                UnionCase {
                    labels,
                    is_default: case.is_default(),
                    field: field(&element.annotations, &element.declarator, ty),
                }
            })
            .collect();
        let layout = UnionLayout {
            discriminant,
            cases,
        };
        self.insert(&u.name, TypeKind::Union(layout))
    }

    fn enum_type(&mut self, e: &EnumType, annotations: &[Annotation]) -> Option<DefId> {
        let layout = EnumLayout {
            bit_bound: bit_bound(annotations),
            enumerators: e.enumerators.iter().map(|en| en.name.name.clone()).collect(),
        };
        self.insert(&e.name, TypeKind::Enum(layout))
    }

    fn bitmask_type(&mut self, b: &BitmaskType, annotations: &[Annotation]) -> Option<DefId> {
        let flags = b
            .values
            .iter()
            .zip(flag_positions(&b.values))
            .map(|(value, position)| BitFlag {
                name: value.name.name.clone(),
                position: u32::try_from(position).unwrap_or(0),
            })
            .collect();
        let layout = BitmaskLayout {
            bit_bound: bit_bound(annotations),
            flags,
        };
        self.insert(&b.name, TypeKind::Bitmask(layout))
    }

    fn bitset_type(&mut self, b: &BitsetType) -> Option<DefId> {
        let base = b.base.as_ref().and_then(|base| base.target);
        let mut offset = base
            .and_then(|id| self.model.get(id))
            .and_then(|entry| match &entry.kind {
                TypeKind::Bitset(layout) => Some(layout.total_bits),
                _ => None,
            })
            .unwrap_or(0);

        let mut fields = Vec::new();
        for bitfield in &b.bitfields {
            let width = size(&bitfield.width);
            let ty = bitfield.ty.unwrap_or_else(|| implied_bitfield_type(width));
            let names: Vec<Option<String>> = if bitfield.names.is_empty() {
                vec![None]
            } else {
                bitfield.names.iter().map(|n| Some(n.name.clone())).collect()
            };
            // Each name of a multi-name bitfield gets its own bits.
            for name in names {
                fields.push(BitfieldLayout {
                    name,
                    offset,
                    width,
                    ty,
                });
                offset = offset.saturating_add(width);
            }
        }
        let layout = BitsetLayout {
            base,
            fields,
            total_bits: offset,
        };
        self.insert(&b.name, TypeKind::Bitset(layout))
    }

    fn fields(&mut self, members: &[Member]) -> Vec<Field> {
        let mut fields = Vec::new();
        for member in members {
            let ty = self.resolved_type(&member.ty);
            for declarator in &member.declarators {
                fields.push(field(&member.annotations, declarator, ty.clone()));
            }
        }
        fields
    }

    fn resolved_type(&mut self, ty: &TypeSpec) -> ResolvedType {
        match ty {
            TypeSpec::Primitive(kind) => ResolvedType::Primitive(*kind),
            TypeSpec::Named(named) => match named.target {
                Some(id) => ResolvedType::Named(id),
                None => ResolvedType::Unresolved(named.name.to_string()),
            },
            TypeSpec::Template(template) => match template {
                TemplateType::Sequence { elem, bound } => ResolvedType::Sequence {
                    elem: Box::new(self.resolved_type(elem)),
                    bound: bound.as_ref().map(size_u64),
                },
                TemplateType::Set { elem, bound } => ResolvedType::Set {
                    elem: Box::new(self.resolved_type(elem)),
                    bound: bound.as_ref().map(size_u64),
                },
                TemplateType::Map { key, value, bound } => ResolvedType::Map {
                    key: Box::new(self.resolved_type(key)),
                    value: Box::new(self.resolved_type(value)),
                    bound: bound.as_ref().map(size_u64),
                },
                TemplateType::String { bound } => ResolvedType::String {
                    bound: bound.as_ref().map(size_u64),
                },
                TemplateType::WString { bound } => ResolvedType::WString {
                    bound: bound.as_ref().map(size_u64),
                },
                TemplateType::Fixed { digits, scale } => ResolvedType::Fixed {
                    digits: digits.as_deref().map(size).unwrap_or(0),
                    scale: scale.as_deref().map(size).unwrap_or(0),
                },
            },
            TypeSpec::Constructed(constructed) => {
                let id = match constructed.as_ref() {
                    ConstrType::Struct(s) => self.struct_type(s),
                    ConstrType::Union(u) => self.union_type(u),
                    ConstrType::Enum(e) => self.enum_type(e, &[]),
                    ConstrType::Bitset(b) => self.bitset_type(b),
                    ConstrType::Bitmask(b) => self.bitmask_type(b, &[]),
                };
                match id {
                    Some(id) => ResolvedType::Named(id),
                    None => ResolvedType::Unresolved(constructed.name().name.clone()),
                }
            }
        }
    }

    /// Add an entry for the symbol `name` defines. Redeclared names keep
    /// the first entry under their qualified name.
    fn insert(&mut self, name: &Identifier, kind: TypeKind) -> Option<DefId> {
        let id = self.symbols.defined_at(name.span)?;
        if self.symbols.get(id).state != DefState::Defined {
            return None;
        }
        self.model.insert(TypeEntry {
            id,
            name: self.symbols.qualified_name(id),
            kind,
        });
        Some(id)
    }
}

fn field(annotations: &[Annotation], declarator: &Declarator, ty: ResolvedType) -> Field {
    Field {
        name: declarator.name().name.clone(),
        ty,
        dims: dims(declarator),
        key: annotation_flag(annotations, "key"),
        optional: annotation_flag(annotations, "optional"),
    }
}

fn dims(declarator: &Declarator) -> Vec<u64> {
    declarator.dims().iter().map(size_u64).collect()
}

fn size_u64(expr: &ConstExpr) -> u64 {
    expr.positive_value().unwrap_or(0)
}

fn size(expr: &ConstExpr) -> u32 {
    u32::try_from(size_u64(expr)).unwrap_or(0)
}

fn bit_bound(annotations: &[Annotation]) -> u32 {
    annotation_int(annotations, "bit_bound")
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(DEFAULT_BIT_BOUND)
}

/// Destination type of a bitfield declared without one.
fn implied_bitfield_type(width: u32) -> PrimitiveKind {
    match width {
        0 | 1 => PrimitiveKind::Boolean,
        2..=8 => PrimitiveKind::Octet,
        9..=16 => PrimitiveKind::UShort,
        17..=32 => PrimitiveKind::ULong,
        _ => PrimitiveKind::ULongLong,
    }
}

/// Evaluated integer parameter of annotation `name`.
pub(crate) fn annotation_int(annotations: &[Annotation], name: &str) -> Option<i128> {
    find_annotation(annotations, name)?
        .value()?
        .value
        .as_ref()?
        .value
        .as_int()
}

/// `@name` and `@name(TRUE)` are set; `@name(FALSE)` and absence are not.
fn annotation_flag(annotations: &[Annotation], name: &str) -> bool {
    let Some(annotation) = find_annotation(annotations, name) else {
        return false;
    };
    match annotation.value() {
        None => true,
        Some(expr) => !matches!(
            expr.value.as_ref().map(|v| &v.value),
            Some(ConstValue::Bool(false))
        ),
    }
}

/// Bit position of each bitmask value: `@position(n)` when given,
/// otherwise one past the previous value's position.
pub(crate) fn flag_positions(values: &[BitValue]) -> Vec<i128> {
    let mut next = 0i128;
    values
        .iter()
        .map(|value| {
            let position = annotation_int(&value.annotations, "position").unwrap_or(next);
            next = position + 1;
            position
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implied_types_follow_width() {
        assert_eq!(implied_bitfield_type(1), PrimitiveKind::Boolean);
        assert_eq!(implied_bitfield_type(3), PrimitiveKind::Octet);
        assert_eq!(implied_bitfield_type(12), PrimitiveKind::UShort);
        assert_eq!(implied_bitfield_type(20), PrimitiveKind::ULong);
        assert_eq!(implied_bitfield_type(40), PrimitiveKind::ULongLong);
    }
}
