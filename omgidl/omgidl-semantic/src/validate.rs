//! Rule checks that need the symbol table and evaluated constants.
//!
//! Every check runs to completion and only adds diagnostics; the tree is
//! never modified.

use std::collections::HashMap;

use omgidl_core::{
    ConstValue, DefId, Diagnostic, Phase, Span,
    ast::{
        Annotation, BitmaskType, BitsetType, CaseLabel, ConstExpr, ConstrType, Declarator,
        Definition, DefinitionKind, EnumType, Export, Identifier, Member, Specification,
        StructType, TemplateType, TypeSpec, UnionType, find_annotation,
    },
    format_type_spec,
};

use crate::{
    config::AnalysisConfig,
    model::{annotation_int, flag_positions},
    symbol_table::SymbolTable,
    typing,
};

/// Widest bitset and bitmask.
const MAX_BITS: i128 = 64;
/// Widest enum.
const MAX_ENUM_BITS: i128 = 32;
/// Most digits of a `fixed<digits, scale>` type.
const MAX_FIXED_DIGITS: i128 = 31;

/// Check `spec` against the IDL rules that a grammar cannot express.
pub fn validate(
    spec: &Specification,
    symbols: &SymbolTable,
    config: &AnalysisConfig,
) -> Vec<Diagnostic> {
    let mut validator = Validator {
        symbols,
        diagnostics: Vec::new(),
        bitset_bits: HashMap::new(),
    };
    validator.redeclarations();
    validator.definitions(&spec.definitions);
    validator.dangling_forwards(config);
    log::debug!("validated: diagnostics={}", validator.diagnostics.len());
    validator.diagnostics
}

struct Validator<'a> {
    symbols: &'a SymbolTable,
    diagnostics: Vec<Diagnostic>,
    /// Total width of each bitset seen so far, for derived bitsets.
    bitset_bits: HashMap<DefId, i128>,
}

impl Validator<'_> {
    fn redeclarations(&mut self) {
        let symbols = self.symbols;
        for redeclaration in symbols.redeclarations() {
            let scope = if redeclaration.scope == DefId::ROOT {
                "the global scope".to_string()
            } else {
                format!("`{}`", symbols.qualified_name(redeclaration.scope))
            };
            let message = format!(
                "duplicate identifier `{}` in {scope} (previous declaration at {})",
                redeclaration.name, redeclaration.previous
            );
            self.error(message, redeclaration.span);
        }
    }

    fn dangling_forwards(&mut self, config: &AnalysisConfig) {
        let symbols = self.symbols;
        for symbol in symbols.dangling_forwards() {
            let message = format!(
                "{} `{}` is forward-declared but never defined",
                symbol.kind.describe(),
                symbols.qualified_name(symbol.id)
            );
            let diagnostic = if config.dangling_forward_as_error {
                Diagnostic::error(Phase::Semantic, message, symbol.span)
            } else {
                Diagnostic::warning(Phase::Semantic, message, symbol.span)
            };
            self.diagnostics.push(diagnostic);
        }
    }

    fn definitions(&mut self, definitions: &[Definition]) {
        for definition in definitions {
            self.definition(definition);
        }
    }

    fn definition(&mut self, definition: &Definition) {
        let annotations = &definition.annotations;
        match &definition.kind {
            DefinitionKind::Module(module) => self.definitions(&module.definitions),
            DefinitionKind::Struct(s) => self.struct_type(s),
            DefinitionKind::Union(u) => self.union_type(u),
            DefinitionKind::Enum(e) => self.enum_type(e, annotations),
            DefinitionKind::Bitset(b) => self.bitset_type(b),
            DefinitionKind::Bitmask(b) => self.bitmask_type(b, annotations),
            DefinitionKind::Typedef(typedef) => {
                self.type_spec(&typedef.ty);
                for declarator in &typedef.declarators {
                    self.dims(declarator);
                }
            }
            DefinitionKind::Const(c) => self.type_spec(&c.ty),
            DefinitionKind::Exception(e) => {
                self.unique_members("exception", &e.name, member_names(&e.members));
                self.members(&e.members);
            }
            DefinitionKind::Interface(i) => self.exports(&i.body),
            DefinitionKind::ValueType(v) | DefinitionKind::Event(v) => self.exports(&v.body),
            DefinitionKind::Component(c) => self.exports(&c.body),
            DefinitionKind::Home(h) => self.exports(&h.body),
            DefinitionKind::ValueBox(v) => self.type_spec(&v.ty),
            DefinitionKind::Native(_)
            | DefinitionKind::Forward(_)
            | DefinitionKind::TypeId(_)
            | DefinitionKind::TypePrefix(_)
            | DefinitionKind::Annotation(_) => {}
        }
    }

    fn exports(&mut self, body: &[Export]) {
        for export in body {
            match export {
                Export::Definition(definition) => self.definition(definition),
                Export::StateMember(state) => self.members(std::slice::from_ref(&state.member)),
                _ => {}
            }
        }
    }

    fn members(&mut self, members: &[Member]) {
        for member in members {
            self.type_spec(&member.ty);
            for declarator in &member.declarators {
                self.dims(declarator);
            }
        }
    }

    fn type_spec(&mut self, ty: &TypeSpec) {
        match ty {
            TypeSpec::Primitive(_) | TypeSpec::Named(_) => {}
            TypeSpec::Template(template) => match template {
                TemplateType::Sequence { elem, bound } | TemplateType::Set { elem, bound } => {
                    self.type_spec(elem);
                    self.positive(bound.as_ref(), "sequence bound");
                }
                TemplateType::Map { key, value, bound } => {
                    self.type_spec(key);
                    self.type_spec(value);
                    self.positive(bound.as_ref(), "map bound");
                }
                TemplateType::String { bound } | TemplateType::WString { bound } => {
                    self.positive(bound.as_ref(), "string bound");
                }
                TemplateType::Fixed { digits, scale } => self.fixed(digits, scale),
            },
            TypeSpec::Constructed(constructed) => match constructed.as_ref() {
                ConstrType::Struct(s) => self.struct_type(s),
                ConstrType::Union(u) => self.union_type(u),
                ConstrType::Enum(e) => self.enum_type(e, &[]),
                ConstrType::Bitset(b) => self.bitset_type(b),
                ConstrType::Bitmask(b) => self.bitmask_type(b, &[]),
            },
        }
    }

    fn struct_type(&mut self, s: &StructType) {
        self.unique_members("struct", &s.name, member_names(&s.members));
        self.members(&s.members);
    }

    fn union_type(&mut self, u: &UnionType) {
        let names = u.cases.iter().map(|case| case.element.declarator.name());
        self.unique_members("union", &u.name, names);

        self.discriminant(u);

        let mut labels: Vec<(&ConstValue, Span)> = Vec::new();
        let mut default: Option<Span> = None;
        for case in &u.cases {
            for label in &case.labels {
                match label {
                    CaseLabel::Value(expr) => {
                        let Some(value) = expr.value.as_ref().map(|v| &v.value) else {
                            continue;
                        };
                        if let Some((_, previous)) = labels.iter().find(|(v, _)| *v == value) {
                            let message = format!(
                                "duplicate case label `{value}` in union `{}` (previous label at {previous})",
                                u.name
                            );
                            self.error(message, expr.span);
                        } else {
                            labels.push((value, expr.span));
                        }
                    }
                    CaseLabel::Default(span) => {
                        if let Some(previous) = default {
                            let message = format!(
                                "union `{}` has more than one default case (previous at {previous})",
                                u.name
                            );
                            self.error(message, *span);
                        } else {
                            default = Some(*span);
                        }
                    }
                }
            }
            self.type_spec(&case.element.ty);
            self.dims(&case.element.declarator);
        }
    }

    fn discriminant(&mut self, u: &UnionType) {
        let ty = &u.discriminant.ty;
        if let TypeSpec::Named(named) = ty {
            // Unresolved names were already reported.
            if named.target.is_none() {
                return;
            }
        }
        self.type_spec(ty);
        if typing::discriminant_type(ty, self.symbols).is_none() {
            let spelled = format_type_spec(ty).unwrap_or_default();
            let message = format!(
                "`{spelled}` cannot discriminate union `{}`; use an integer, char, wchar, boolean, octet or enum type",
                u.name
            );
            self.error(message, u.discriminant.span);
        }
    }

    fn enum_type(&mut self, e: &EnumType, annotations: &[Annotation]) {
        let Some((bound, span)) = self.bit_bound(annotations, MAX_ENUM_BITS) else {
            return;
        };
        let count = e.enumerators.len() as i128;
        if count > 1i128 << bound {
            let message = format!(
                "enum `{}` has {count} enumerators, more than @bit_bound({bound}) can hold",
                e.name
            );
            self.error(message, span);
        }
    }

    fn bitmask_type(&mut self, b: &BitmaskType, annotations: &[Annotation]) {
        let names = b.values.iter().map(|v| &v.name);
        self.unique_members("bitmask", &b.name, names);

        let bound = match self.bit_bound(annotations, MAX_BITS) {
            Some((bound, _)) => bound,
            None if find_annotation(annotations, "bit_bound").is_some() => return,
            None => 32,
        };
        let mut used: HashMap<i128, &Identifier> = HashMap::new();
        for (value, position) in b.values.iter().zip(flag_positions(&b.values)) {
            if !(0..bound).contains(&position) {
                let message = format!(
                    "position {position} of `{}` is outside bitmask `{}` (bit bound {bound})",
                    value.name, b.name
                );
                self.error(message, value.name.span);
            } else if let Some(previous) = used.get(&position) {
                let message = format!(
                    "`{}` and `{}` both use bit {position} of bitmask `{}`",
                    previous, value.name, b.name
                );
                self.error(message, value.name.span);
            } else {
                used.insert(position, &value.name);
            }
        }
    }

    fn bitset_type(&mut self, b: &BitsetType) {
        let names = b.bitfields.iter().flat_map(|f| f.names.iter());
        self.unique_members("bitset", &b.name, names);

        let mut total = b
            .base
            .as_ref()
            .and_then(|base| base.target)
            .and_then(|id| self.bitset_bits.get(&id).copied())
            .unwrap_or(0);
        for bitfield in &b.bitfields {
            let Some(width) = bitfield.width.value.as_ref().and_then(|v| v.value.as_int()) else {
                continue;
            };
            let max = bitfield
                .ty
                .and_then(|ty| ty.bit_width())
                .map_or(MAX_BITS, i128::from);
            if (1..=max).contains(&width) {
                total += width;
            } else {
                let message = format!("bitfield width {width} is out of range 1..={max}");
                self.error(message, bitfield.width.span);
            }
        }
        if total > MAX_BITS {
            let message = format!(
                "bitset `{}` spans {total} bits, more than {MAX_BITS}",
                b.name
            );
            self.error(message, b.name.span);
        }
        if let Some(id) = self.symbols.defined_at(b.name.span) {
            self.bitset_bits.insert(id, total);
        }
    }

    /// Valid `@bit_bound` value with its span, or `None` when absent or
    /// invalid (and then reported).
    fn bit_bound(&mut self, annotations: &[Annotation], max: i128) -> Option<(i128, Span)> {
        let annotation = find_annotation(annotations, "bit_bound")?;
        let bound = annotation_int(annotations, "bit_bound")?;
        if (1..=max).contains(&bound) {
            Some((bound, annotation.span))
        } else {
            let message = format!("@bit_bound({bound}) is out of range 1..={max}");
            self.error(message, annotation.span);
            None
        }
    }

    fn fixed(&mut self, digits: &Option<Box<ConstExpr>>, scale: &Option<Box<ConstExpr>>) {
        let value = |e: &ConstExpr| e.value.as_ref().and_then(|v| v.value.as_int());
        let Some(digits_expr) = digits else {
            return;
        };
        let Some(d) = value(digits_expr) else {
            return;
        };
        if !(1..=MAX_FIXED_DIGITS).contains(&d) {
            let message = format!("fixed-point digits must be in 1..={MAX_FIXED_DIGITS}, found {d}");
            self.error(message, digits_expr.span);
            return;
        }
        if let Some(scale_expr) = scale {
            if let Some(s) = value(scale_expr) {
                if !(0..=d).contains(&s) {
                    let message = format!("fixed-point scale must be in 0..={d}, found {s}");
                    self.error(message, scale_expr.span);
                }
            }
        }
    }

    fn dims(&mut self, declarator: &Declarator) {
        for dim in declarator.dims() {
            self.positive(Some(dim), "array dimension");
        }
    }

    /// Sizes must be strictly positive. Expressions that failed to evaluate
    /// were already reported.
    fn positive(&mut self, expr: Option<&ConstExpr>, what: &str) {
        let Some(expr) = expr else {
            return;
        };
        if let Some(value) = expr.value.as_ref().and_then(|v| v.value.as_int()) {
            if value <= 0 {
                self.error(format!("{what} must be positive, found {value}"), expr.span);
            }
        }
    }

    fn unique_members<'n>(
        &mut self,
        owner_kind: &str,
        owner: &Identifier,
        names: impl Iterator<Item = &'n Identifier>,
    ) {
        let mut seen: HashMap<&str, Span> = HashMap::new();
        for name in names {
            if let Some(previous) = seen.get(name.name.as_str()) {
                let message = format!(
                    "duplicate member `{}` in {owner_kind} `{}` (previous declaration at {previous})",
                    name.name, owner.name
                );
                self.error(message, name.span);
            } else {
                seen.insert(&name.name, name.span);
            }
        }
    }

    fn error(&mut self, message: String, span: Span) {
        self.diagnostics
            .push(Diagnostic::error(Phase::Semantic, message, span));
    }
}

fn member_names(members: &[Member]) -> impl Iterator<Item = &Identifier> {
    members
        .iter()
        .flat_map(|member| member.declarators.iter().map(Declarator::name))
}
