//! Recursive-descent parser producing the typed AST.
//!
//! One method per grammar production family. Lookahead is bounded to the next
//! two tokens; nothing backtracks. A syntax error inside a definition abandons
//! that definition and skips to the next `;` at the brace depth where it
//! started (or to a balancing `}`), so one mistake costs one definition.

mod annotation;
mod corba;
mod expr;
mod types;

use omgidl_core::{
    Keyword, Punct, Span, Token, TokenKind,
    ast::{
        BitValue, Bitfield, BitmaskType, BitsetType, CaseLabel, ConstDecl, Declarator,
        Definition, DefinitionKind, ElementSpec, EnumType, Enumerator, Exception, ForwardDecl,
        ForwardKind, Identifier, Member, Module, NamedType, ScopedName, Specification,
        StructType, SwitchType, Typedef, UnionCase, UnionType,
    },
};

use crate::{config::ParserConfig, error::SyntaxError};

pub(crate) type PResult<T> = Result<T, SyntaxError>;

/// Parse a token stream (as produced by [`tokenize`](crate::tokenize)) into a
/// [`Specification`], collecting every syntax error instead of stopping at
/// the first. [`TokenKind::Invalid`] tokens are skipped; the lexer has
/// already reported them.
pub fn parse(tokens: &[Token], config: &ParserConfig) -> (Specification, Vec<SyntaxError>) {
    let mut parser = Parser::new(tokens, config);
    let spec = parser.specification();
    (spec, parser.errors)
}

pub(crate) struct Parser<'t> {
    tokens: Vec<&'t Token>,
    eof: Token,
    pos: usize,
    prev_span: Span,
    brace_depth: usize,
    nesting: usize,
    max_nesting: usize,
    /// Open template argument lists. Inside one, `>>` closes two lists
    /// instead of shifting.
    template_args: usize,
    /// Binary operators seen in the constant expression being parsed.
    operators: usize,
    errors: Vec<SyntaxError>,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token], config: &ParserConfig) -> Self {
        let end = tokens
            .last()
            .map(|t| Span::new(t.span.end(), 0, t.span.line, t.span.column + t.span.len as u32))
            .unwrap_or_default();
        Self {
            tokens: tokens
                .iter()
                .filter(|t| !matches!(t.kind, TokenKind::Invalid | TokenKind::Eof))
                .collect(),
            eof: Token::new(TokenKind::Eof, "", end),
            pos: 0,
            prev_span: Span::default(),
            brace_depth: 0,
            nesting: 0,
            max_nesting: config.max_nesting,
            template_args: 0,
            operators: 0,
            errors: Vec::new(),
        }
    }

    // ── token cursor ──────────────────────────────────────────────────────────

    fn nth(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).copied().unwrap_or(&self.eof)
    }

    fn peek(&self) -> &Token {
        self.nth(0)
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_span(&self) -> Span {
        self.peek().span
    }

    fn at_punct(&self, punct: Punct) -> bool {
        self.peek().is_punct(punct)
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.peek().is_keyword(keyword)
    }

    fn at_eof(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
            self.prev_span = token.span;
            match token.kind {
                TokenKind::Punct(Punct::LBrace) => self.brace_depth += 1,
                TokenKind::Punct(Punct::RBrace) => {
                    self.brace_depth = self.brace_depth.saturating_sub(1)
                }
                _ => {}
            }
        }
        token
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        let hit = self.at_punct(punct);
        if hit {
            self.bump();
        }
        hit
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        let hit = self.at_keyword(keyword);
        if hit {
            self.bump();
        }
        hit
    }

    fn expect_punct(&mut self, punct: Punct) -> PResult<Span> {
        if self.at_punct(punct) {
            Ok(self.bump().span)
        } else {
            Err(self.expected(format!("`{}`", punct.as_str())))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> PResult<Span> {
        if self.at_keyword(keyword) {
            Ok(self.bump().span)
        } else {
            Err(self.expected(format!("`{}`", keyword.as_str())))
        }
    }

    fn expected(&self, what: impl Into<String>) -> SyntaxError {
        let found = self.peek();
        SyntaxError::Expected {
            expected: what.into(),
            found: found.describe(),
            span: found.span,
        }
    }

    fn span_from(&self, start: Span) -> Span {
        start.to(self.prev_span)
    }

    /// Run `f` one nesting level deeper, failing once the configured limit
    /// is reached.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.nesting >= self.max_nesting {
            return Err(SyntaxError::NestingTooDeep {
                limit: self.max_nesting,
                span: self.peek_span(),
            });
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    // ── recovery ──────────────────────────────────────────────────────────────

    /// Parse items until `}` (when `closing`) or end of input, recovering
    /// from each failed item independently.
    fn item_list<T>(
        &mut self,
        closing: bool,
        mut item: impl FnMut(&mut Self) -> PResult<T>,
    ) -> Vec<T> {
        let mut items = Vec::new();
        loop {
            if self.at_eof() || (closing && self.at_punct(Punct::RBrace)) {
                break;
            }
            let depth = self.brace_depth;
            let start = self.pos;
            match item(self) {
                Ok(value) => items.push(value),
                Err(err) => {
                    self.errors.push(err);
                    self.recover(depth);
                    if self.pos == start && !self.at_eof() {
                        self.bump();
                    }
                }
            }
        }
        items
    }

    /// Skip to the `;` ending the current statement at brace depth `depth`,
    /// or stop in front of the `}` closing the enclosing scope.
    fn recover(&mut self, depth: usize) {
        loop {
            match self.peek_kind() {
                TokenKind::Eof => return,
                TokenKind::Punct(Punct::Semi) if self.brace_depth == depth => {
                    self.bump();
                    return;
                }
                TokenKind::Punct(Punct::RBrace) if self.brace_depth == depth => {
                    if depth > 0 {
                        return;
                    }
                    // Unbalanced at top level: drop it and keep skipping.
                    self.bump();
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    // ── names ─────────────────────────────────────────────────────────────────

    fn ident(&mut self) -> PResult<Identifier> {
        if self.peek_kind() == TokenKind::Ident {
            let token = self.bump();
            Ok(Identifier::new(token.lexeme, token.span))
        } else {
            Err(self.expected("identifier"))
        }
    }

    fn scoped_name(&mut self) -> PResult<ScopedName> {
        let start = self.peek_span();
        let absolute = self.eat_punct(Punct::ColonColon);
        let mut segments = vec![self.ident()?];
        while self.eat_punct(Punct::ColonColon) {
            segments.push(self.ident()?);
        }
        Ok(ScopedName {
            segments,
            absolute,
            span: self.span_from(start),
        })
    }

    fn scoped_name_list(&mut self) -> PResult<Vec<ScopedName>> {
        let mut names = vec![self.scoped_name()?];
        while self.eat_punct(Punct::Comma) {
            names.push(self.scoped_name()?);
        }
        Ok(names)
    }

    // ── definitions ───────────────────────────────────────────────────────────

    fn specification(&mut self) -> Specification {
        let mut spec = Specification::default();
        while self.at_keyword(Keyword::Import) {
            match self.import() {
                Ok(import) => spec.imports.push(import),
                Err(err) => {
                    self.errors.push(err);
                    self.recover(0);
                }
            }
        }
        spec.definitions = self.item_list(false, Self::definition);
        spec
    }

    fn definition(&mut self) -> PResult<Definition> {
        self.nested(|p| {
            let start = p.peek_span();
            let annotations = p.annotations()?;
            let kind = p.definition_kind()?;
            p.expect_punct(Punct::Semi)?;
            Ok(Definition {
                annotations,
                kind,
                span: p.span_from(start),
            })
        })
    }

    /// `true` when the current token starts a definition that may also
    /// appear inside interface-like bodies.
    fn at_type_or_const_definition(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Keyword(
                Keyword::Struct
                    | Keyword::Union
                    | Keyword::Enum
                    | Keyword::Bitset
                    | Keyword::Bitmask
                    | Keyword::TypeDef
                    | Keyword::Native
                    | Keyword::Const
                    | Keyword::Exception
                    | Keyword::TypeId
                    | Keyword::TypePrefix
            )
        )
    }

    fn definition_kind(&mut self) -> PResult<DefinitionKind> {
        let TokenKind::Keyword(keyword) = self.peek_kind() else {
            if self.at_annotation_decl() {
                return self.annotation_decl().map(DefinitionKind::Annotation);
            }
            return Err(self.expected("definition"));
        };
        match keyword {
            Keyword::Module => self.module().map(DefinitionKind::Module),
            Keyword::Struct => self.struct_definition(),
            Keyword::Union => self.union_definition(),
            Keyword::Enum => self.enum_type().map(DefinitionKind::Enum),
            Keyword::Bitset => self.bitset_type().map(DefinitionKind::Bitset),
            Keyword::Bitmask => self.bitmask_type().map(DefinitionKind::Bitmask),
            Keyword::TypeDef => self.typedef().map(DefinitionKind::Typedef),
            Keyword::Native => {
                self.bump();
                self.ident().map(DefinitionKind::Native)
            }
            Keyword::Const => self.const_decl().map(DefinitionKind::Const),
            Keyword::Exception => self.exception().map(DefinitionKind::Exception),
            Keyword::Interface
            | Keyword::Abstract
            | Keyword::Local
            | Keyword::ValueType
            | Keyword::Custom
            | Keyword::EventType
            | Keyword::Component
            | Keyword::Home
            | Keyword::TypeId
            | Keyword::TypePrefix => self.corba_definition(),
            _ => Err(self.expected("definition")),
        }
    }

    fn module(&mut self) -> PResult<Module> {
        self.expect_keyword(Keyword::Module)?;
        let name = self.ident()?;
        self.expect_punct(Punct::LBrace)?;
        let definitions = self.item_list(true, Self::definition);
        self.expect_punct(Punct::RBrace)?;
        Ok(Module { name, definitions })
    }

    fn struct_definition(&mut self) -> PResult<DefinitionKind> {
        let start = self.expect_keyword(Keyword::Struct)?;
        let name = self.ident()?;
        if self.at_punct(Punct::Semi) {
            return Ok(forward(ForwardKind::Struct, name, None));
        }
        self.struct_body(start, name).map(DefinitionKind::Struct)
    }

    /// Everything after `struct Name`.
    fn struct_body(&mut self, start: Span, name: Identifier) -> PResult<StructType> {
        let base = if self.eat_punct(Punct::Colon) {
            Some(NamedType::new(self.scoped_name()?))
        } else {
            None
        };
        self.expect_punct(Punct::LBrace)?;
        let members = self.members()?;
        self.expect_punct(Punct::RBrace)?;
        Ok(StructType {
            name,
            base,
            members,
            span: self.span_from(start),
        })
    }

    fn members(&mut self) -> PResult<Vec<Member>> {
        let mut members = Vec::new();
        while !self.at_punct(Punct::RBrace) && !self.at_eof() {
            members.push(self.member()?);
        }
        Ok(members)
    }

    fn member(&mut self) -> PResult<Member> {
        let start = self.peek_span();
        let annotations = self.annotations()?;
        let ty = self.type_spec()?;
        let declarators = self.declarators()?;
        self.expect_punct(Punct::Semi)?;
        Ok(Member {
            annotations,
            ty,
            declarators,
            span: self.span_from(start),
        })
    }

    fn declarators(&mut self) -> PResult<Vec<Declarator>> {
        let mut declarators = vec![self.declarator()?];
        while self.eat_punct(Punct::Comma) {
            declarators.push(self.declarator()?);
        }
        Ok(declarators)
    }

    fn declarator(&mut self) -> PResult<Declarator> {
        let name = self.ident()?;
        let mut dims = Vec::new();
        while self.eat_punct(Punct::LBracket) {
            dims.push(self.const_expr()?);
            self.expect_punct(Punct::RBracket)?;
        }
        Ok(if dims.is_empty() {
            Declarator::Simple(name)
        } else {
            Declarator::Array(name, dims)
        })
    }

    fn union_definition(&mut self) -> PResult<DefinitionKind> {
        let start = self.expect_keyword(Keyword::Union)?;
        let name = self.ident()?;
        if self.at_punct(Punct::Semi) {
            return Ok(forward(ForwardKind::Union, name, None));
        }
        self.union_body(start, name).map(DefinitionKind::Union)
    }

    /// Everything after `union Name`.
    fn union_body(&mut self, start: Span, name: Identifier) -> PResult<UnionType> {
        self.expect_keyword(Keyword::Switch)?;
        let switch_start = self.expect_punct(Punct::LParen)?;
        let annotations = self.annotations()?;
        let ty = self.type_spec()?;
        self.expect_punct(Punct::RParen)?;
        let discriminant = SwitchType {
            annotations,
            ty,
            span: self.span_from(switch_start),
        };

        self.expect_punct(Punct::LBrace)?;
        let mut cases = Vec::new();
        while !self.at_punct(Punct::RBrace) && !self.at_eof() {
            cases.push(self.union_case()?);
        }
        if cases.is_empty() {
            return Err(self.expected("`case` or `default`"));
        }
        self.expect_punct(Punct::RBrace)?;
        Ok(UnionType {
            name,
            discriminant,
            cases,
            span: self.span_from(start),
        })
    }

    fn union_case(&mut self) -> PResult<UnionCase> {
        let start = self.peek_span();
        let mut labels = Vec::new();
        loop {
            if self.eat_keyword(Keyword::Case) {
                labels.push(CaseLabel::Value(self.const_expr()?));
            } else if self.at_keyword(Keyword::Default) {
                labels.push(CaseLabel::Default(self.bump().span));
            } else {
                break;
            }
            self.expect_punct(Punct::Colon)?;
        }
        if labels.is_empty() {
            return Err(self.expected("`case` or `default`"));
        }
        let annotations = self.annotations()?;
        let ty = self.type_spec()?;
        let declarator = self.declarator()?;
        self.expect_punct(Punct::Semi)?;
        Ok(UnionCase {
            labels,
            element: ElementSpec {
                annotations,
                ty,
                declarator,
            },
            span: self.span_from(start),
        })
    }

    pub(crate) fn enum_type(&mut self) -> PResult<EnumType> {
        let start = self.expect_keyword(Keyword::Enum)?;
        let name = self.ident()?;
        self.expect_punct(Punct::LBrace)?;
        let mut enumerators = Vec::new();
        loop {
            let annotations = self.annotations()?;
            let name = self.ident()?;
            enumerators.push(Enumerator { annotations, name });
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RBrace)?;
        Ok(EnumType {
            name,
            enumerators,
            span: self.span_from(start),
        })
    }

    pub(crate) fn bitset_type(&mut self) -> PResult<BitsetType> {
        let start = self.expect_keyword(Keyword::Bitset)?;
        let name = self.ident()?;
        let base = if self.eat_punct(Punct::Colon) {
            Some(NamedType::new(self.scoped_name()?))
        } else {
            None
        };
        self.expect_punct(Punct::LBrace)?;
        let mut bitfields = Vec::new();
        while !self.at_punct(Punct::RBrace) && !self.at_eof() {
            bitfields.push(self.bitfield()?);
        }
        self.expect_punct(Punct::RBrace)?;
        Ok(BitsetType {
            name,
            base,
            bitfields,
            span: self.span_from(start),
        })
    }

    fn bitfield(&mut self) -> PResult<Bitfield> {
        let start = self.peek_span();
        let annotations = self.annotations()?;
        self.expect_keyword(Keyword::Bitfield)?;
        let (width, ty) = self.angle_bracketed(|p| {
            let width = p.const_expr()?;
            let ty = if p.eat_punct(Punct::Comma) {
                match p.primitive_type()? {
                    Some(kind) if kind.bit_width().is_some() => Some(kind),
                    _ => return Err(p.expected("integer, `boolean` or `octet` type")),
                }
            } else {
                None
            };
            Ok((width, ty))
        })?;
        let mut names = Vec::new();
        if !self.at_punct(Punct::Semi) {
            names.push(self.ident()?);
            while self.eat_punct(Punct::Comma) {
                names.push(self.ident()?);
            }
        }
        self.expect_punct(Punct::Semi)?;
        Ok(Bitfield {
            annotations,
            width,
            ty,
            names,
            span: self.span_from(start),
        })
    }

    pub(crate) fn bitmask_type(&mut self) -> PResult<BitmaskType> {
        let start = self.expect_keyword(Keyword::Bitmask)?;
        let name = self.ident()?;
        self.expect_punct(Punct::LBrace)?;
        let mut values = Vec::new();
        loop {
            let annotations = self.annotations()?;
            let name = self.ident()?;
            values.push(BitValue { annotations, name });
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RBrace)?;
        Ok(BitmaskType {
            name,
            values,
            span: self.span_from(start),
        })
    }

    fn typedef(&mut self) -> PResult<Typedef> {
        self.expect_keyword(Keyword::TypeDef)?;
        let ty = self.type_spec()?;
        let declarators = self.declarators()?;
        Ok(Typedef { ty, declarators })
    }

    fn const_decl(&mut self) -> PResult<ConstDecl> {
        self.expect_keyword(Keyword::Const)?;
        let ty = self.type_spec()?;
        let name = self.ident()?;
        self.expect_punct(Punct::Eq)?;
        let value = self.const_expr()?;
        Ok(ConstDecl { ty, name, value })
    }

    fn exception(&mut self) -> PResult<Exception> {
        self.expect_keyword(Keyword::Exception)?;
        let name = self.ident()?;
        self.expect_punct(Punct::LBrace)?;
        let members = self.members()?;
        self.expect_punct(Punct::RBrace)?;
        Ok(Exception { name, members })
    }
}

fn forward(kind: ForwardKind, name: Identifier, qualifier: Option<&str>) -> DefinitionKind {
    DefinitionKind::Forward(ForwardDecl {
        kind,
        name,
        qualifier: qualifier.map(str::to_string),
    })
}
