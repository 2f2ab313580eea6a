//! CORBA constructs: interfaces, value types, event types, components,
//! homes, `typeid`/`typeprefix` and `import`.
//!
//! These are parsed in full so documents using them stay readable, but the
//! semantic passes treat them as opaque.

use omgidl_core::{
    Keyword, LiteralKind, Punct, Span, TokenKind,
    ast::{
        Annotation, Attribute, Component, Definition, DefinitionKind, Export, ForwardKind, Home, Import,
        ImportTarget, Initializer, InitializerKind, Interface, InterfaceKind, Member, Operation,
        Param, ParamDirection, Port, PortKind, ScopedName, StateMember, TypeIdDecl,
        TypePrefixDecl, ValueBox, ValueInheritance, ValueKind, ValueType,
    },
};

use super::{PResult, Parser, forward};

impl Parser<'_> {
    pub(crate) fn import(&mut self) -> PResult<Import> {
        let start = self.expect_keyword(Keyword::Import)?;
        let target = if self.peek_kind() == TokenKind::Literal(LiteralKind::String) {
            ImportTarget::File(self.string_literal()?)
        } else {
            ImportTarget::Scope(self.scoped_name()?)
        };
        self.expect_punct(Punct::Semi)?;
        Ok(Import {
            target,
            span: self.span_from(start),
        })
    }

    pub(crate) fn corba_definition(&mut self) -> PResult<DefinitionKind> {
        let qualifier = match self.peek_kind() {
            TokenKind::Keyword(kw @ (Keyword::Abstract | Keyword::Local | Keyword::Custom)) => {
                self.bump();
                Some(kw)
            }
            _ => None,
        };
        match (qualifier, self.peek_kind()) {
            (None | Some(Keyword::Abstract | Keyword::Local), TokenKind::Keyword(Keyword::Interface)) => {
                self.interface(qualifier)
            }
            (None | Some(Keyword::Abstract | Keyword::Custom), TokenKind::Keyword(Keyword::ValueType)) => {
                self.value_type(qualifier, false)
            }
            (None | Some(Keyword::Abstract | Keyword::Custom), TokenKind::Keyword(Keyword::EventType)) => {
                self.value_type(qualifier, true)
            }
            (None, TokenKind::Keyword(Keyword::Component)) => self.component(),
            (None, TokenKind::Keyword(Keyword::Home)) => self.home().map(DefinitionKind::Home),
            (None, TokenKind::Keyword(Keyword::TypeId)) => {
                self.bump();
                let target = self.scoped_name()?;
                let id = self.string_literal()?;
                Ok(DefinitionKind::TypeId(TypeIdDecl { target, id }))
            }
            (None, TokenKind::Keyword(Keyword::TypePrefix)) => {
                self.bump();
                let target = self.scoped_name()?;
                let prefix = self.string_literal()?;
                Ok(DefinitionKind::TypePrefix(TypePrefixDecl { target, prefix }))
            }
            (Some(Keyword::Local), _) => Err(self.expected("`interface`")),
            (Some(_), _) => Err(self.expected("`interface`, `valuetype` or `eventtype`")),
            _ => Err(self.expected("definition")),
        }
    }

    fn interface(&mut self, qualifier: Option<Keyword>) -> PResult<DefinitionKind> {
        self.expect_keyword(Keyword::Interface)?;
        let name = self.ident()?;
        if self.at_punct(Punct::Semi) {
            let qualifier = qualifier.map(|kw| kw.as_str());
            return Ok(forward(ForwardKind::Interface, name, qualifier));
        }
        let bases = if self.eat_punct(Punct::Colon) {
            self.scoped_name_list()?
        } else {
            Vec::new()
        };
        let body = self.export_body()?;
        let kind = match qualifier {
            Some(Keyword::Abstract) => InterfaceKind::Abstract,
            Some(Keyword::Local) => InterfaceKind::Local,
            _ => InterfaceKind::Unconstrained,
        };
        Ok(DefinitionKind::Interface(Interface {
            name,
            kind,
            bases,
            body,
        }))
    }

    /// `valuetype` and `eventtype` share a grammar; only `valuetype` has
    /// the boxed form.
    fn value_type(&mut self, qualifier: Option<Keyword>, event: bool) -> PResult<DefinitionKind> {
        self.bump();
        let name = self.ident()?;
        if self.at_punct(Punct::Semi) {
            let kind = if event {
                ForwardKind::Event
            } else {
                ForwardKind::ValueType
            };
            return Ok(forward(kind, name, qualifier.map(|kw| kw.as_str())));
        }

        let opens_body = self.at_punct(Punct::Colon)
            || self.at_punct(Punct::LBrace)
            || self.at_keyword(Keyword::Supports);
        if !opens_body {
            if event || qualifier.is_some() {
                return Err(self.expected("`:`, `supports` or `{`"));
            }
            let ty = self.type_spec()?;
            return Ok(DefinitionKind::ValueBox(ValueBox { name, ty }));
        }

        let mut inheritance = ValueInheritance::default();
        if self.eat_punct(Punct::Colon) {
            inheritance.truncatable = self.eat_keyword(Keyword::Truncatable);
            inheritance.bases = self.scoped_name_list()?;
        }
        if self.eat_keyword(Keyword::Supports) {
            inheritance.supports = self.scoped_name_list()?;
        }
        let body = self.export_body()?;
        let value = ValueType {
            name,
            kind: match qualifier {
                Some(Keyword::Abstract) => ValueKind::Abstract,
                Some(Keyword::Custom) => ValueKind::Custom,
                _ => ValueKind::Concrete,
            },
            inheritance,
            body,
        };
        Ok(if event {
            DefinitionKind::Event(value)
        } else {
            DefinitionKind::ValueType(value)
        })
    }

    fn component(&mut self) -> PResult<DefinitionKind> {
        self.expect_keyword(Keyword::Component)?;
        let name = self.ident()?;
        if self.at_punct(Punct::Semi) {
            return Ok(forward(ForwardKind::Component, name, None));
        }
        let base = if self.eat_punct(Punct::Colon) {
            Some(self.scoped_name()?)
        } else {
            None
        };
        let supports = self.supports()?;
        let body = self.export_body()?;
        Ok(DefinitionKind::Component(Component {
            name,
            base,
            supports,
            body,
        }))
    }

    fn home(&mut self) -> PResult<Home> {
        self.expect_keyword(Keyword::Home)?;
        let name = self.ident()?;
        let base = if self.eat_punct(Punct::Colon) {
            Some(self.scoped_name()?)
        } else {
            None
        };
        let supports = self.supports()?;
        self.expect_keyword(Keyword::Manages)?;
        let manages = self.scoped_name()?;
        let primary_key = if self.eat_keyword(Keyword::PrimaryKey) {
            Some(self.scoped_name()?)
        } else {
            None
        };
        let body = self.export_body()?;
        Ok(Home {
            name,
            base,
            supports,
            manages,
            primary_key,
            body,
        })
    }

    fn supports(&mut self) -> PResult<Vec<ScopedName>> {
        if self.eat_keyword(Keyword::Supports) {
            self.scoped_name_list()
        } else {
            Ok(Vec::new())
        }
    }

    fn export_body(&mut self) -> PResult<Vec<Export>> {
        self.expect_punct(Punct::LBrace)?;
        let body = self.item_list(true, Self::export);
        self.expect_punct(Punct::RBrace)?;
        Ok(body)
    }

    /// One body item of an interface, value type, component or home.
    fn export(&mut self) -> PResult<Export> {
        self.nested(|p| {
            let start = p.peek_span();
            let annotations = p.annotations()?;
            if p.at_type_or_const_definition() {
                let kind = p.definition_kind()?;
                p.expect_punct(Punct::Semi)?;
                return Ok(Export::Definition(Definition {
                    annotations,
                    kind,
                    span: p.span_from(start),
                }));
            }

            let export = match p.peek_kind() {
                TokenKind::Keyword(Keyword::Readonly | Keyword::Attribute) => {
                    Export::Attribute(p.attribute(annotations)?)
                }
                TokenKind::Keyword(kw @ (Keyword::Public | Keyword::Private)) => {
                    p.bump();
                    let ty = p.type_spec()?;
                    let declarators = p.declarators()?;
                    Export::StateMember(StateMember {
                        public: kw == Keyword::Public,
                        member: Member {
                            annotations,
                            ty,
                            declarators,
                            span: p.span_from(start),
                        },
                    })
                }
                TokenKind::Keyword(kw @ (Keyword::Factory | Keyword::Finder)) => {
                    p.bump();
                    let name = p.ident()?;
                    let params = p.params()?;
                    let raises = p.raises(Keyword::Raises)?;
                    Export::Initializer(Initializer {
                        kind: if kw == Keyword::Factory {
                            InitializerKind::Factory
                        } else {
                            InitializerKind::Finder
                        },
                        name,
                        params,
                        raises,
                        span: p.span_from(start),
                    })
                }
                TokenKind::Keyword(
                    kw @ (Keyword::Provides
                    | Keyword::Uses
                    | Keyword::Emits
                    | Keyword::Publishes
                    | Keyword::Consumes),
                ) => {
                    p.bump();
                    let kind = match kw {
                        Keyword::Provides => PortKind::Provides,
                        Keyword::Uses => PortKind::Uses {
                            multiple: p.eat_keyword(Keyword::Multiple),
                        },
                        Keyword::Emits => PortKind::Emits,
                        Keyword::Publishes => PortKind::Publishes,
                        _ => PortKind::Consumes,
                    };
                    let ty = p.scoped_name()?;
                    let name = p.ident()?;
                    Export::Port(Port {
                        kind,
                        ty,
                        name,
                        span: p.span_from(start),
                    })
                }
                _ => Export::Operation(p.operation(annotations, start)?),
            };
            p.expect_punct(Punct::Semi)?;
            Ok(export)
        })
    }

    fn attribute(&mut self, annotations: Vec<Annotation>) -> PResult<Attribute> {
        let start = self.peek_span();
        let readonly = self.eat_keyword(Keyword::Readonly);
        self.expect_keyword(Keyword::Attribute)?;
        let ty = self.type_spec()?;
        let mut names = vec![self.ident()?];
        while self.eat_punct(Punct::Comma) {
            names.push(self.ident()?);
        }
        let (get_raises, set_raises) = if readonly {
            (self.raises(Keyword::Raises)?, Vec::new())
        } else {
            let get = self.raises(Keyword::GetRaises)?;
            (get, self.raises(Keyword::SetRaises)?)
        };
        Ok(Attribute {
            annotations,
            readonly,
            ty,
            names,
            get_raises,
            set_raises,
            span: self.span_from(start),
        })
    }

    fn operation(&mut self, annotations: Vec<Annotation>, start: Span) -> PResult<Operation> {
        let oneway = self.eat_keyword(Keyword::Oneway);
        let return_type = if self.eat_keyword(Keyword::Void) {
            None
        } else {
            Some(self.type_spec()?)
        };
        let name = self.ident()?;
        let params = self.params()?;
        let raises = self.raises(Keyword::Raises)?;
        let mut context = Vec::new();
        if self.eat_keyword(Keyword::Context) {
            self.expect_punct(Punct::LParen)?;
            context.push(self.string_literal()?);
            while self.eat_punct(Punct::Comma) {
                context.push(self.string_literal()?);
            }
            self.expect_punct(Punct::RParen)?;
        }
        Ok(Operation {
            annotations,
            oneway,
            return_type,
            name,
            params,
            raises,
            context,
            span: self.span_from(start),
        })
    }

    fn params(&mut self) -> PResult<Vec<Param>> {
        self.expect_punct(Punct::LParen)?;
        let mut params = Vec::new();
        if !self.at_punct(Punct::RParen) {
            loop {
                params.push(self.param()?);
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(Punct::RParen)?;
        Ok(params)
    }

    fn param(&mut self) -> PResult<Param> {
        let annotations = self.annotations()?;
        let direction = match self.peek_kind() {
            TokenKind::Keyword(Keyword::In) => ParamDirection::In,
            TokenKind::Keyword(Keyword::Out) => ParamDirection::Out,
            TokenKind::Keyword(Keyword::InOut) => ParamDirection::InOut,
            _ => return Err(self.expected("`in`, `out` or `inout`")),
        };
        self.bump();
        let ty = self.type_spec()?;
        let name = self.ident()?;
        Ok(Param {
            annotations,
            direction,
            ty,
            name,
        })
    }

    /// `raises(A, B)`, `getraises(...)` or `setraises(...)`; empty when the
    /// keyword is absent.
    fn raises(&mut self, keyword: Keyword) -> PResult<Vec<ScopedName>> {
        if !self.eat_keyword(keyword) {
            return Ok(Vec::new());
        }
        self.expect_punct(Punct::LParen)?;
        let names = self.scoped_name_list()?;
        self.expect_punct(Punct::RParen)?;
        Ok(names)
    }
}
