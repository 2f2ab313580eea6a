//! First semantic pass: enter every named definition into the symbol table.

use omgidl_core::{
    ConstType, ConstValue, DefId, Diagnostic, EvaluatedConstant, Phase,
    ast::{
        BitmaskType, ConstrType, Definition, DefinitionKind, EnumType, Export, ForwardDecl,
        ForwardKind, Identifier, Member, Specification, StructType, TemplateType, TypeSpec,
        UnionType,
    },
};

use crate::symbol_table::{ConstSlot, DefState, Redeclaration, SymbolKind, SymbolTable};

/// Build the scope tree for `spec`.
///
/// Name clashes are recorded on the table as redeclarations and reported by
/// the validator; the diagnostics returned here are forward declarations
/// whose kind disagrees with the definition completing them.
pub fn build_scopes(spec: &Specification) -> (SymbolTable, Vec<Diagnostic>) {
    let mut builder = ScopeBuilder {
        table: SymbolTable::new(),
        diagnostics: Vec::new(),
    };
    builder.definitions(DefId::ROOT, &spec.definitions);
    log::debug!(
        "scopes built: symbols={}, redeclarations={}",
        builder.table.len(),
        builder.table.redeclarations().len()
    );
    (builder.table, builder.diagnostics)
}

struct ScopeBuilder {
    table: SymbolTable,
    diagnostics: Vec<Diagnostic>,
}

impl ScopeBuilder {
    fn definitions(&mut self, scope: DefId, definitions: &[Definition]) {
        for definition in definitions {
            self.definition(scope, definition);
        }
    }

    fn definition(&mut self, scope: DefId, definition: &Definition) {
        match &definition.kind {
            DefinitionKind::Module(module) => {
                let id = self.module(scope, &module.name);
                self.definitions(id, &module.definitions);
            }
            DefinitionKind::Struct(s) => self.struct_type(scope, s),
            DefinitionKind::Union(u) => self.union_type(scope, u),
            DefinitionKind::Enum(e) => self.enum_type(scope, e),
            DefinitionKind::Bitset(b) => {
                self.declare(scope, &b.name, SymbolKind::Bitset);
            }
            DefinitionKind::Bitmask(b) => self.bitmask_type(scope, b),
            DefinitionKind::Typedef(typedef) => {
                self.type_spec(scope, &typedef.ty);
                for declarator in &typedef.declarators {
                    self.declare(scope, declarator.name(), SymbolKind::Typedef);
                }
            }
            DefinitionKind::Const(c) => {
                let id = self.declare(scope, &c.name, SymbolKind::Const);
                self.table.get_mut(id).constant = ConstSlot::Pending;
            }
            DefinitionKind::Exception(e) => {
                let id = self.declare(scope, &e.name, SymbolKind::Exception);
                self.members(id, &e.members);
            }
            DefinitionKind::Native(name) => {
                self.declare(scope, name, SymbolKind::Native);
            }
            DefinitionKind::Forward(forward) => self.forward(scope, forward),
            DefinitionKind::Interface(i) => {
                let id = self.complete(scope, &i.name, ForwardKind::Interface);
                self.exports(id, &i.body);
            }
            DefinitionKind::ValueType(v) => {
                let id = self.complete(scope, &v.name, ForwardKind::ValueType);
                self.exports(id, &v.body);
            }
            DefinitionKind::Event(v) => {
                let id = self.complete(scope, &v.name, ForwardKind::Event);
                self.exports(id, &v.body);
            }
            DefinitionKind::ValueBox(v) => {
                self.declare(scope, &v.name, SymbolKind::ValueBox);
            }
            DefinitionKind::Component(c) => {
                let id = self.complete(scope, &c.name, ForwardKind::Component);
                self.exports(id, &c.body);
            }
            DefinitionKind::Home(h) => {
                let id = self.declare(scope, &h.name, SymbolKind::Home);
                self.exports(id, &h.body);
            }
            // Annotation names live in their own namespace.
            DefinitionKind::Annotation(_)
            | DefinitionKind::TypeId(_)
            | DefinitionKind::TypePrefix(_) => {}
        }
    }

    fn exports(&mut self, scope: DefId, body: &[Export]) {
        for export in body {
            match export {
                Export::Definition(definition) => self.definition(scope, definition),
                Export::StateMember(state) => self.type_spec(scope, &state.member.ty),
                _ => {}
            }
        }
    }

    fn members(&mut self, scope: DefId, members: &[Member]) {
        for member in members {
            self.type_spec(scope, &member.ty);
        }
    }

    /// Inline constructed types are declared in the scope they appear in.
    fn type_spec(&mut self, scope: DefId, ty: &TypeSpec) {
        match ty {
            TypeSpec::Constructed(constructed) => match constructed.as_ref() {
                ConstrType::Struct(s) => self.struct_type(scope, s),
                ConstrType::Union(u) => self.union_type(scope, u),
                ConstrType::Enum(e) => self.enum_type(scope, e),
                ConstrType::Bitset(b) => {
                    self.declare(scope, &b.name, SymbolKind::Bitset);
                }
                ConstrType::Bitmask(b) => self.bitmask_type(scope, b),
            },
            TypeSpec::Template(
                TemplateType::Sequence { elem, .. } | TemplateType::Set { elem, .. },
            ) => self.type_spec(scope, elem),
            TypeSpec::Template(TemplateType::Map { key, value, .. }) => {
                self.type_spec(scope, key);
                self.type_spec(scope, value);
            }
            TypeSpec::Template(_) | TypeSpec::Primitive(_) | TypeSpec::Named(_) => {}
        }
    }

    fn struct_type(&mut self, scope: DefId, s: &StructType) {
        let id = self.complete(scope, &s.name, ForwardKind::Struct);
        self.members(id, &s.members);
    }

    fn union_type(&mut self, scope: DefId, u: &UnionType) {
        let id = self.complete(scope, &u.name, ForwardKind::Union);
        self.type_spec(id, &u.discriminant.ty);
        for case in &u.cases {
            self.type_spec(id, &case.element.ty);
        }
    }

    fn enum_type(&mut self, scope: DefId, e: &EnumType) {
        let enum_id = self.declare(scope, &e.name, SymbolKind::Enum);
        for (ordinal, enumerator) in (0u32..).zip(&e.enumerators) {
            let name = &enumerator.name;
            let kind = SymbolKind::Enumerator { enum_id, ordinal };
            let (id, duplicate) = match self.table.lookup_member(enum_id, &name.name) {
                None => (self.table.add(enum_id, &name.name, kind, name.span), false),
                Some(previous) => {
                    self.redeclared(enum_id, name, previous);
                    let id = self.table.add_detached(enum_id, &name.name, kind, name.span);
                    (id, true)
                }
            };
            self.table.get_mut(id).constant = ConstSlot::Value(EvaluatedConstant::new(
                ConstType::Enum(enum_id),
                ConstValue::Enumerator {
                    enum_id,
                    ordinal,
                    name: name.name.clone(),
                },
            ));
            if duplicate {
                continue;
            }
            if let Err(previous) = self.table.alias_into(scope, &name.name, id) {
                self.redeclared(scope, name, previous);
            }
        }
    }

    fn bitmask_type(&mut self, scope: DefId, b: &BitmaskType) {
        let bitmask = self.declare(scope, &b.name, SymbolKind::Bitmask);
        for (index, value) in (0u32..).zip(&b.values) {
            self.declare(bitmask, &value.name, SymbolKind::BitValue { bitmask, index });
        }
    }

    /// Modules with an existing name reopen the existing scope.
    fn module(&mut self, scope: DefId, name: &Identifier) -> DefId {
        match self.table.lookup_member(scope, &name.name) {
            Some(existing) if self.table.get(existing).kind == SymbolKind::Module => {
                self.table.bind_span(name.span, existing);
                existing
            }
            Some(previous) => {
                self.redeclared(scope, name, previous);
                self.table
                    .add_detached(scope, &name.name, SymbolKind::Module, name.span)
            }
            None => self.table.add(scope, &name.name, SymbolKind::Module, name.span),
        }
    }

    fn declare(&mut self, scope: DefId, name: &Identifier, kind: SymbolKind) -> DefId {
        match self.table.lookup_member(scope, &name.name) {
            None => self.table.add(scope, &name.name, kind, name.span),
            Some(previous) => {
                self.redeclared(scope, name, previous);
                self.table.add_detached(scope, &name.name, kind, name.span)
            }
        }
    }

    /// Declare a full definition that a forward declaration may have
    /// announced. The forward's slot is reused.
    fn complete(&mut self, scope: DefId, name: &Identifier, kind: ForwardKind) -> DefId {
        let symbol_kind = SymbolKind::of_forward(kind);
        let Some(existing) = self.table.lookup_member(scope, &name.name) else {
            return self.table.add(scope, &name.name, symbol_kind, name.span);
        };
        let symbol = self.table.get(existing);
        if symbol.state != DefState::Forward {
            self.redeclared(scope, name, existing);
            return self
                .table
                .add_detached(scope, &name.name, symbol_kind, name.span);
        }
        if symbol.kind != symbol_kind {
            let message = format!(
                "`{}` was forward-declared as {} but is defined as {}",
                name.name,
                symbol.kind.describe(),
                symbol_kind.describe()
            );
            self.diagnostics
                .push(Diagnostic::error(Phase::Semantic, message, name.span));
            return self
                .table
                .add_detached(scope, &name.name, symbol_kind, name.span);
        }
        let symbol = self.table.get_mut(existing);
        symbol.state = DefState::Defined;
        symbol.span = name.span;
        self.table.bind_span(name.span, existing);
        existing
    }

    fn forward(&mut self, scope: DefId, forward: &ForwardDecl) {
        let kind = SymbolKind::of_forward(forward.kind);
        let name = &forward.name;
        match self.table.lookup_member(scope, &name.name) {
            None => {
                let id = self.table.add(scope, &name.name, kind, name.span);
                self.table.get_mut(id).state = DefState::Forward;
            }
            // Repeating a forward, or forwarding an already defined type,
            // is allowed.
            Some(existing) if self.table.get(existing).kind == kind => {
                self.table.bind_span(name.span, existing);
            }
            Some(previous) => self.redeclared(scope, name, previous),
        }
    }

    fn redeclared(&mut self, scope: DefId, name: &Identifier, previous: DefId) {
        let previous = self.table.get(previous).span;
        self.table.record_redeclaration(Redeclaration {
            scope,
            name: name.name.clone(),
            span: name.span,
            previous,
        });
    }
}
