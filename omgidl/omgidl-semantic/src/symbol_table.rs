//! Arena symbol table for IDL scopes.
//!
//! Every named definition gets a [`DefId`] slot. Scopes are symbols that own
//! a member map; lookups walk the parent chain. A forward declaration
//! allocates its slot up front and the full definition completes that same
//! slot, so references resolved against the forward stay valid.

use std::collections::HashMap;

use indexmap::IndexMap;
use omgidl_core::{
    DefId, EvaluatedConstant, Span,
    ast::{ForwardKind, ScopedName, TypeSpec},
};

use crate::error::LookupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Root,
    Module,
    Struct,
    Union,
    Enum,
    Enumerator { enum_id: DefId, ordinal: u32 },
    Bitset,
    Bitmask,
    BitValue { bitmask: DefId, index: u32 },
    Typedef,
    Const,
    Exception,
    Native,
    Interface,
    ValueType,
    ValueBox,
    Event,
    Component,
    Home,
}

impl SymbolKind {
    /// Kinds that may appear where a type is expected.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            SymbolKind::Struct
                | SymbolKind::Union
                | SymbolKind::Enum
                | SymbolKind::Bitset
                | SymbolKind::Bitmask
                | SymbolKind::Typedef
                | SymbolKind::Exception
                | SymbolKind::Native
                | SymbolKind::Interface
                | SymbolKind::ValueType
                | SymbolKind::ValueBox
                | SymbolKind::Event
                | SymbolKind::Component
                | SymbolKind::Home
        )
    }

    pub fn describe(&self) -> &'static str {
        match self {
            SymbolKind::Root => "global scope",
            SymbolKind::Module => "module",
            SymbolKind::Struct => "struct",
            SymbolKind::Union => "union",
            SymbolKind::Enum => "enum",
            SymbolKind::Enumerator { .. } => "enumerator",
            SymbolKind::Bitset => "bitset",
            SymbolKind::Bitmask => "bitmask",
            SymbolKind::BitValue { .. } => "bitmask value",
            SymbolKind::Typedef => "typedef",
            SymbolKind::Const => "constant",
            SymbolKind::Exception => "exception",
            SymbolKind::Native => "native type",
            SymbolKind::Interface => "interface",
            SymbolKind::ValueType => "valuetype",
            SymbolKind::ValueBox => "value box",
            SymbolKind::Event => "eventtype",
            SymbolKind::Component => "component",
            SymbolKind::Home => "home",
        }
    }

    /// The symbol kind a forward declaration of `kind` stands for.
    pub fn of_forward(kind: ForwardKind) -> Self {
        match kind {
            ForwardKind::Struct => SymbolKind::Struct,
            ForwardKind::Union => SymbolKind::Union,
            ForwardKind::Interface => SymbolKind::Interface,
            ForwardKind::ValueType => SymbolKind::ValueType,
            ForwardKind::Event => SymbolKind::Event,
            ForwardKind::Component => SymbolKind::Component,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefState {
    /// Only a forward declaration has been seen.
    Forward,
    Defined,
}

/// Evaluation state of a constant or enumerator.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConstSlot {
    #[default]
    None,
    Pending,
    Failed,
    Value(EvaluatedConstant),
}

/// What a typedef declarator names.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub ty: TypeSpec,
    pub is_array: bool,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: DefId,
    pub name: String,
    pub kind: SymbolKind,
    /// `None` only for the root scope.
    pub parent: Option<DefId>,
    /// Span of the defining identifier; the forward declaration's while
    /// the symbol is still [`DefState::Forward`].
    pub span: Span,
    pub state: DefState,
    pub members: IndexMap<String, DefId>,
    pub constant: ConstSlot,
    pub alias: Option<Alias>,
}

impl Symbol {
    fn new(id: DefId, name: String, kind: SymbolKind, parent: Option<DefId>, span: Span) -> Self {
        Self {
            id,
            name,
            kind,
            parent,
            span,
            state: DefState::Defined,
            members: IndexMap::new(),
            constant: ConstSlot::None,
            alias: None,
        }
    }
}

/// A name declared twice in the same scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeclaration {
    pub scope: DefId,
    pub name: String,
    pub span: Span,
    pub previous: Span,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    /// Defining identifier offset → symbol, for walking the AST back into
    /// the table.
    by_span: HashMap<usize, DefId>,
    redeclarations: Vec<Redeclaration>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let root = Symbol::new(DefId::ROOT, String::new(), SymbolKind::Root, None, Span::default());
        Self {
            symbols: vec![root],
            by_span: HashMap::new(),
            redeclarations: Vec::new(),
        }
    }

    pub fn get(&self, id: DefId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: DefId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.len() == 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn redeclarations(&self) -> &[Redeclaration] {
        &self.redeclarations
    }

    /// Symbol introduced by the identifier at `span`.
    pub fn defined_at(&self, span: Span) -> Option<DefId> {
        self.by_span.get(&span.offset).copied()
    }

    /// Allocate a symbol and enter it into `parent`'s scope.
    pub(crate) fn add(&mut self, parent: DefId, name: &str, kind: SymbolKind, span: Span) -> DefId {
        let id = self.add_detached(parent, name, kind, span);
        self.get_mut(parent).members.insert(name.to_string(), id);
        id
    }

    /// Allocate a symbol that is not reachable by name, used for
    /// redeclarations so their bodies can still be walked.
    pub(crate) fn add_detached(
        &mut self,
        parent: DefId,
        name: &str,
        kind: SymbolKind,
        span: Span,
    ) -> DefId {
        let id = DefId::from_index(self.symbols.len());
        self.symbols
            .push(Symbol::new(id, name.to_string(), kind, Some(parent), span));
        self.by_span.insert(span.offset, id);
        id
    }

    /// Make an existing symbol visible under `name` in `scope` as well.
    /// Returns the symbol already holding the name on conflict.
    pub(crate) fn alias_into(&mut self, scope: DefId, name: &str, id: DefId) -> Result<(), DefId> {
        match self.lookup_member(scope, name) {
            Some(existing) => Err(existing),
            None => {
                self.get_mut(scope).members.insert(name.to_string(), id);
                Ok(())
            }
        }
    }

    pub(crate) fn bind_span(&mut self, span: Span, id: DefId) {
        self.by_span.insert(span.offset, id);
    }

    pub(crate) fn record_redeclaration(&mut self, redeclaration: Redeclaration) {
        self.redeclarations.push(redeclaration);
    }

    /// Name declared directly in `scope`.
    pub fn lookup_member(&self, scope: DefId, name: &str) -> Option<DefId> {
        self.get(scope).members.get(name).copied()
    }

    /// Resolve `name` as written inside `scope`.
    ///
    /// The first segment is searched outward through the enclosing scopes
    /// (only in the global scope for `::`-prefixed names); the remaining
    /// segments are looked up strictly inside whatever the first one found.
    pub fn resolve(&self, scope: DefId, name: &ScopedName) -> Result<DefId, LookupError> {
        let first = &name.first().name;
        let hit = if name.absolute {
            self.lookup_member(DefId::ROOT, first)
        } else {
            self.lookup_outward(scope, first)
        };
        let mut found = hit.ok_or_else(|| LookupError::Undeclared {
            name: name.to_string(),
        })?;

        for segment in &name.segments[1..] {
            found = self
                .lookup_member(found, &segment.name)
                .ok_or_else(|| LookupError::NotInScope {
                    segment: segment.name.clone(),
                    scope: self.qualified_name(found),
                })?;
        }
        Ok(found)
    }

    fn lookup_outward(&self, scope: DefId, name: &str) -> Option<DefId> {
        let mut current = Some(scope);
        while let Some(s) = current {
            if let Some(id) = self.lookup_member(s, name) {
                return Some(id);
            }
            current = self.get(s).parent;
        }
        None
    }

    /// Resolve a `::`-separated path from the global scope, e.g. `"A::B::S"`.
    pub fn resolve_path(&self, path: &str) -> Option<DefId> {
        path.trim_start_matches("::")
            .split("::")
            .try_fold(DefId::ROOT, |scope, segment| self.lookup_member(scope, segment))
    }

    /// Fully-qualified name without a leading `::`, e.g. `A::B::S`.
    pub fn qualified_name(&self, id: DefId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let symbol = self.get(c);
            if symbol.kind != SymbolKind::Root {
                parts.push(symbol.name.as_str());
            }
            current = symbol.parent;
        }
        parts.reverse();
        parts.join("::")
    }

    /// Forward declarations never completed by a full definition.
    pub fn dangling_forwards(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.state == DefState::Forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omgidl_core::ast::Identifier;

    fn name(path: &str, absolute: bool) -> ScopedName {
        ScopedName {
            segments: path
                .split("::")
                .map(|s| Identifier::new(s, Span::default()))
                .collect(),
            absolute,
            span: Span::default(),
        }
    }

    fn span(offset: usize) -> Span {
        Span::new(offset, 1, 1, offset as u32 + 1)
    }

    #[test]
    fn resolution_stops_at_first_matching_scope() {
        let mut table = SymbolTable::new();
        let a = table.add(DefId::ROOT, "A", SymbolKind::Module, span(1));
        let a_s = table.add(a, "S", SymbolKind::Struct, span(2));
        let b = table.add(a, "B", SymbolKind::Module, span(3));
        let b_s = table.add(b, "S", SymbolKind::Struct, span(4));
        let _x = table.add(DefId::ROOT, "X", SymbolKind::Module, span(5));

        assert_eq!(table.resolve(b, &name("S", false)), Ok(b_s));
        assert_eq!(table.resolve(b, &name("A::S", false)), Ok(a_s));
        assert_eq!(table.resolve(DefId::ROOT, &name("A::B::S", true)), Ok(b_s));
        // `X` is found at the root, and `S` is not searched outward from it.
        assert_eq!(
            table.resolve(b, &name("X::S", false)),
            Err(LookupError::NotInScope {
                segment: "S".into(),
                scope: "X".into()
            })
        );
        assert_eq!(table.qualified_name(b_s), "A::B::S");
        assert_eq!(table.resolve_path("::A::B"), Some(b));
        assert_eq!(table.defined_at(span(4)), Some(b_s));
    }

    #[test]
    fn absolute_names_only_search_the_root() {
        let mut table = SymbolTable::new();
        let a = table.add(DefId::ROOT, "A", SymbolKind::Module, span(1));
        table.add(a, "T", SymbolKind::Typedef, span(2));

        assert!(table.resolve(a, &name("T", false)).is_ok());
        assert!(matches!(
            table.resolve(a, &name("T", true)),
            Err(LookupError::Undeclared { .. })
        ));
    }
}
