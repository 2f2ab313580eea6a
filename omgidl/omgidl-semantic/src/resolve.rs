//! Second semantic pass: bind type references and evaluate constants.
//!
//! The walk is in document order, so a constant can only see constants
//! declared before it, while type references may point anywhere in the
//! (already complete) symbol table. Typedefs are bound to their aliased
//! type up front so that a constant or union discriminant typed through a
//! later typedef still gets an evaluation context.

use omgidl_core::{
    ConstType, DefId, Diagnostic, IntKind, Phase, Span,
    ast::{
        Annotation, BitmaskType, BitsetType, CaseLabel, ConstDecl, ConstExpr, ConstrType,
        Declarator, Definition, DefinitionKind, EnumType, Export, Identifier, Member, NamedType,
        Specification, StructType, TemplateType, TypeSpec, UnionType,
    },
    format_type_spec,
};

use crate::{
    eval,
    symbol_table::{Alias, ConstSlot, SymbolKind, SymbolTable},
    typing,
};

/// Sizes (bounds, dimensions, widths) evaluate in a signed 64-bit context
/// so that zero and negative results reach the validator.
const SIZE: ConstType = ConstType::Integer(IntKind::I64);

/// Fill in [`NamedType::target`] and [`ConstExpr::value`] throughout `spec`.
pub fn resolve(spec: &mut Specification, symbols: &mut SymbolTable) -> Vec<Diagnostic> {
    let mut resolver = Resolver {
        symbols,
        diagnostics: Vec::new(),
        evaluated: 0,
    };
    resolver.bind_aliases(DefId::ROOT, &spec.definitions);
    resolver.definitions(DefId::ROOT, &mut spec.definitions);
    log::debug!(
        "names resolved: evaluated_constants={}, diagnostics={}",
        resolver.evaluated,
        resolver.diagnostics.len()
    );
    resolver.diagnostics
}

struct Resolver<'a> {
    symbols: &'a mut SymbolTable,
    diagnostics: Vec<Diagnostic>,
    evaluated: usize,
}

impl Resolver<'_> {
    /// Record every typedef's aliased type with its names bound. Bounds are
    /// left unevaluated and lookup failures are reported later by the main
    /// walk.
    fn bind_aliases(&mut self, scope: DefId, definitions: &[Definition]) {
        for definition in definitions {
            match &definition.kind {
                DefinitionKind::Module(module) => {
                    if let Some(id) = self.scope_of(&module.name) {
                        self.bind_aliases(id, &module.definitions);
                    }
                }
                DefinitionKind::Typedef(typedef) => {
                    let mut ty = typedef.ty.clone();
                    self.bind_names(scope, &mut ty);
                    for declarator in &typedef.declarators {
                        if let Some(id) = self.scope_of(declarator.name()) {
                            self.symbols.get_mut(id).alias = Some(Alias {
                                ty: ty.clone(),
                                is_array: !declarator.dims().is_empty(),
                            });
                        }
                    }
                }
                DefinitionKind::Interface(i) => self.bind_export_aliases(scope, &i.name, &i.body),
                DefinitionKind::ValueType(v) | DefinitionKind::Event(v) => {
                    self.bind_export_aliases(scope, &v.name, &v.body)
                }
                DefinitionKind::Component(c) => self.bind_export_aliases(scope, &c.name, &c.body),
                DefinitionKind::Home(h) => self.bind_export_aliases(scope, &h.name, &h.body),
                _ => {}
            }
        }
    }

    fn bind_export_aliases(&mut self, scope: DefId, owner: &Identifier, body: &[Export]) {
        let id = self.scope_of(owner).unwrap_or(scope);
        for export in body {
            if let Export::Definition(definition) = export {
                self.bind_aliases(id, std::slice::from_ref(definition));
            }
        }
    }

    /// Set the targets of named types inside `ty` without reporting anything.
    fn bind_names(&self, scope: DefId, ty: &mut TypeSpec) {
        match ty {
            TypeSpec::Named(named) => {
                named.target = self
                    .symbols
                    .resolve(scope, &named.name)
                    .ok()
                    .filter(|id| self.symbols.get(*id).kind.is_type());
            }
            TypeSpec::Template(
                TemplateType::Sequence { elem, .. } | TemplateType::Set { elem, .. },
            ) => self.bind_names(scope, elem),
            TypeSpec::Template(TemplateType::Map { key, value, .. }) => {
                self.bind_names(scope, key);
                self.bind_names(scope, value);
            }
            TypeSpec::Primitive(_) | TypeSpec::Template(_) | TypeSpec::Constructed(_) => {}
        }
    }

    fn definitions(&mut self, scope: DefId, definitions: &mut [Definition]) {
        for definition in definitions {
            self.definition(scope, definition);
        }
    }

    fn definition(&mut self, scope: DefId, definition: &mut Definition) {
        self.annotations(scope, &mut definition.annotations);
        match &mut definition.kind {
            DefinitionKind::Module(module) => {
                if let Some(id) = self.scope_of(&module.name) {
                    self.definitions(id, &mut module.definitions);
                }
            }
            DefinitionKind::Struct(s) => self.struct_type(scope, s),
            DefinitionKind::Union(u) => self.union_type(scope, u),
            DefinitionKind::Enum(e) => self.enum_type(scope, e),
            DefinitionKind::Bitset(b) => self.bitset_type(scope, b),
            DefinitionKind::Bitmask(b) => self.bitmask_type(scope, b),
            DefinitionKind::Typedef(typedef) => {
                self.type_spec(scope, &mut typedef.ty);
                for declarator in &mut typedef.declarators {
                    self.dims(scope, declarator);
                    if let Some(id) = self.scope_of(declarator.name()) {
                        self.symbols.get_mut(id).alias = Some(Alias {
                            ty: typedef.ty.clone(),
                            is_array: !declarator.dims().is_empty(),
                        });
                    }
                }
            }
            DefinitionKind::Const(c) => self.const_decl(scope, c),
            DefinitionKind::Exception(e) => {
                let id = self.scope_of(&e.name).unwrap_or(scope);
                self.members(id, &mut e.members);
            }
            DefinitionKind::Interface(i) => {
                let id = self.scope_of(&i.name).unwrap_or(scope);
                self.exports(id, &mut i.body);
            }
            DefinitionKind::ValueType(v) | DefinitionKind::Event(v) => {
                let id = self.scope_of(&v.name).unwrap_or(scope);
                self.exports(id, &mut v.body);
            }
            DefinitionKind::ValueBox(v) => self.type_spec(scope, &mut v.ty),
            DefinitionKind::Component(c) => {
                let id = self.scope_of(&c.name).unwrap_or(scope);
                self.exports(id, &mut c.body);
            }
            DefinitionKind::Home(h) => {
                let id = self.scope_of(&h.name).unwrap_or(scope);
                self.exports(id, &mut h.body);
            }
            DefinitionKind::Native(_)
            | DefinitionKind::Forward(_)
            | DefinitionKind::TypeId(_)
            | DefinitionKind::TypePrefix(_)
            | DefinitionKind::Annotation(_) => {}
        }
    }

    /// Operations, attributes and ports stay opaque.
    fn exports(&mut self, scope: DefId, body: &mut [Export]) {
        for export in body {
            match export {
                Export::Definition(definition) => self.definition(scope, definition),
                Export::StateMember(state) => self.member(scope, &mut state.member),
                _ => {}
            }
        }
    }

    fn members(&mut self, scope: DefId, members: &mut [Member]) {
        for member in members {
            self.member(scope, member);
        }
    }

    fn member(&mut self, scope: DefId, member: &mut Member) {
        self.annotations(scope, &mut member.annotations);
        self.type_spec(scope, &mut member.ty);
        for declarator in &mut member.declarators {
            self.dims(scope, declarator);
        }
    }

    fn type_spec(&mut self, scope: DefId, ty: &mut TypeSpec) {
        match ty {
            TypeSpec::Primitive(_) => {}
            TypeSpec::Named(named) => self.named_type(scope, named),
            TypeSpec::Template(template) => match template {
                TemplateType::Sequence { elem, bound } | TemplateType::Set { elem, bound } => {
                    self.type_spec(scope, elem);
                    self.bound(scope, bound.as_mut());
                }
                TemplateType::Map { key, value, bound } => {
                    self.type_spec(scope, key);
                    self.type_spec(scope, value);
                    self.bound(scope, bound.as_mut());
                }
                TemplateType::String { bound } | TemplateType::WString { bound } => {
                    self.bound(scope, bound.as_mut());
                }
                TemplateType::Fixed { digits, scale } => {
                    self.bound(scope, digits.as_deref_mut());
                    self.bound(scope, scale.as_deref_mut());
                }
            },
            TypeSpec::Constructed(constructed) => match constructed.as_mut() {
                ConstrType::Struct(s) => self.struct_type(scope, s),
                ConstrType::Union(u) => self.union_type(scope, u),
                ConstrType::Enum(e) => self.enum_type(scope, e),
                ConstrType::Bitset(b) => self.bitset_type(scope, b),
                ConstrType::Bitmask(b) => self.bitmask_type(scope, b),
            },
        }
    }

    fn named_type(&mut self, scope: DefId, named: &mut NamedType) {
        match self.symbols.resolve(scope, &named.name) {
            Ok(id) => {
                let symbol = self.symbols.get(id);
                if symbol.kind.is_type() {
                    named.target = Some(id);
                } else {
                    let message = format!(
                        "`{}` is not a type ({} declared at {})",
                        named.name,
                        symbol.kind.describe(),
                        symbol.span
                    );
                    self.error(message, named.name.span);
                }
            }
            Err(err) => self.error(err.to_string(), named.name.span),
        }
    }

    /// Resolve a struct or bitset base and check its kind.
    fn base(&mut self, scope: DefId, base: &mut NamedType, owner: &Identifier, expected: SymbolKind) {
        self.named_type(scope, base);
        let Some(target) = base.target else {
            return;
        };
        let kind = self.symbols.get(target).kind;
        if kind != expected {
            let message = format!(
                "base of {} `{}` must be a {}, found {} `{}`",
                expected.describe(),
                owner.name,
                expected.describe(),
                kind.describe(),
                base.name
            );
            self.error(message, base.name.span);
            base.target = None;
        }
    }

    fn struct_type(&mut self, scope: DefId, s: &mut StructType) {
        if let Some(base) = &mut s.base {
            self.base(scope, base, &s.name, SymbolKind::Struct);
        }
        let id = self.scope_of(&s.name).unwrap_or(scope);
        self.members(id, &mut s.members);
    }

    fn union_type(&mut self, scope: DefId, u: &mut UnionType) {
        let id = self.scope_of(&u.name).unwrap_or(scope);
        self.annotations(id, &mut u.discriminant.annotations);
        self.type_spec(id, &mut u.discriminant.ty);
        let discriminant = typing::discriminant_type(&u.discriminant.ty, self.symbols);
        for case in &mut u.cases {
            if let Some(ty) = discriminant {
                for label in &mut case.labels {
                    if let CaseLabel::Value(expr) = label {
                        self.evaluate_into(id, expr, ty);
                    }
                }
            }
            let element = &mut case.element;
            self.annotations(id, &mut element.annotations);
            self.type_spec(id, &mut element.ty);
            self.dims(id, &mut element.declarator);
        }
    }

    fn enum_type(&mut self, scope: DefId, e: &mut EnumType) {
        for enumerator in &mut e.enumerators {
            self.annotations(scope, &mut enumerator.annotations);
        }
    }

    fn bitset_type(&mut self, scope: DefId, b: &mut BitsetType) {
        if let Some(base) = &mut b.base {
            self.base(scope, base, &b.name, SymbolKind::Bitset);
        }
        for bitfield in &mut b.bitfields {
            self.annotations(scope, &mut bitfield.annotations);
            self.evaluate_into(scope, &mut bitfield.width, SIZE);
        }
    }

    fn bitmask_type(&mut self, scope: DefId, b: &mut BitmaskType) {
        for value in &mut b.values {
            self.annotations(scope, &mut value.annotations);
        }
    }

    fn const_decl(&mut self, scope: DefId, c: &mut ConstDecl) {
        self.type_spec(scope, &mut c.ty);
        let value = match typing::const_type_of(&c.ty, self.symbols) {
            Some(ty) => self.evaluate_into(scope, &mut c.value, ty),
            None => {
                let ty = format_type_spec(&c.ty).unwrap_or_default();
                let message = format!("`{ty}` is not a valid type for constant `{}`", c.name);
                self.error(message, c.name.span);
                false
            }
        };
        if let Some(id) = self.scope_of(&c.name) {
            self.symbols.get_mut(id).constant = match (&c.value.value, value) {
                (Some(constant), true) => ConstSlot::Value(constant.clone()),
                _ => ConstSlot::Failed,
            };
        }
    }

    /// Evaluate the parameters of the annotations whose meaning the type
    /// model depends on.
    fn annotations(&mut self, scope: DefId, annotations: &mut [Annotation]) {
        for annotation in annotations {
            let ty = match annotation.simple_name() {
                "bit_bound" | "position" | "id" => SIZE,
                "key" | "optional" | "must_understand" | "external" => ConstType::Boolean,
                _ => continue,
            };
            if let Some(expr) = annotation.value_mut() {
                self.evaluate_into(scope, expr, ty);
            }
        }
    }

    fn dims(&mut self, scope: DefId, declarator: &mut Declarator) {
        for dim in declarator.dims_mut() {
            self.evaluate_into(scope, dim, SIZE);
        }
    }

    fn bound(&mut self, scope: DefId, bound: Option<&mut ConstExpr>) {
        if let Some(expr) = bound {
            self.evaluate_into(scope, expr, SIZE);
        }
    }

    /// Evaluate `expr` and store the value on it. Returns whether
    /// evaluation succeeded.
    fn evaluate_into(&mut self, scope: DefId, expr: &mut ConstExpr, ty: ConstType) -> bool {
        match eval::evaluate(expr, self.symbols, scope, ty) {
            Ok(value) => {
                expr.value = Some(value);
                self.evaluated += 1;
                true
            }
            Err(err) => {
                if !err.is_cascade() {
                    self.diagnostics.push(err.into());
                }
                false
            }
        }
    }

    fn scope_of(&self, name: &Identifier) -> Option<DefId> {
        self.symbols.defined_at(name.span)
    }

    fn error(&mut self, message: String, span: Span) {
        self.diagnostics
            .push(Diagnostic::error(Phase::Semantic, message, span));
    }
}
