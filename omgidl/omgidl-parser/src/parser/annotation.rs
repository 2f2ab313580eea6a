//! Annotation applications (`@key`, `@range(min = 0)`) and `@annotation`
//! declarations.

use omgidl_core::{
    Keyword, Punct, TokenKind,
    ast::{Annotation, AnnotationDecl, AnnotationMember, AnnotationParams, Identifier, ScopedName},
};

use super::{PResult, Parser};

impl Parser<'_> {
    /// Zero or more annotation applications prefixing a declaration.
    pub(crate) fn annotations(&mut self) -> PResult<Vec<Annotation>> {
        let mut annotations = Vec::new();
        while self.at_punct(Punct::At) && !self.at_annotation_decl() {
            annotations.push(self.annotation()?);
        }
        Ok(annotations)
    }

    fn annotation(&mut self) -> PResult<Annotation> {
        let start = self.expect_punct(Punct::At)?;
        let name = self.annotation_name()?;
        let params = if self.eat_punct(Punct::LParen) {
            let saved = std::mem::take(&mut self.template_args);
            let params = self.annotation_params();
            self.template_args = saved;
            let params = params?;
            self.expect_punct(Punct::RParen)?;
            params
        } else {
            AnnotationParams::None
        };
        Ok(Annotation {
            name,
            params,
            span: self.span_from(start),
        })
    }

    /// Built-in annotations such as `@default` reuse keyword spellings.
    fn annotation_name(&mut self) -> PResult<ScopedName> {
        if let TokenKind::Keyword(_) = self.peek_kind() {
            let token = self.bump();
            return Ok(ScopedName {
                segments: vec![Identifier::new(token.lexeme, token.span)],
                absolute: false,
                span: token.span,
            });
        }
        self.scoped_name()
    }

    fn annotation_params(&mut self) -> PResult<AnnotationParams> {
        if self.at_punct(Punct::RParen) {
            return Ok(AnnotationParams::None);
        }
        let named = self.peek_kind() == TokenKind::Ident && self.nth(1).is_punct(Punct::Eq);
        if !named {
            return Ok(AnnotationParams::Single(self.const_expr()?));
        }
        let mut params = Vec::new();
        loop {
            let name = self.ident()?;
            self.expect_punct(Punct::Eq)?;
            params.push((name, self.const_expr()?));
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        Ok(AnnotationParams::Named(params))
    }

    /// `@annotation Name {`: the only place `annotation` acts as a keyword.
    pub(crate) fn at_annotation_decl(&self) -> bool {
        self.at_punct(Punct::At)
            && self.nth(1).kind == TokenKind::Ident
            && self.nth(1).lexeme == "annotation"
            && self.nth(2).kind == TokenKind::Ident
            && self.nth(3).is_punct(Punct::LBrace)
    }

    pub(crate) fn annotation_decl(&mut self) -> PResult<AnnotationDecl> {
        self.expect_punct(Punct::At)?;
        self.ident()?;
        let name = self.ident()?;
        self.expect_punct(Punct::LBrace)?;

        let mut members = Vec::new();
        let mut definitions = Vec::new();
        while !self.at_punct(Punct::RBrace) && !self.at_eof() {
            if self.at_type_or_const_definition() {
                definitions.push(self.definition()?);
                continue;
            }
            let ty = self.type_spec()?;
            let name = self.ident()?;
            let default = if self.eat_keyword(Keyword::Default) {
                Some(self.const_expr()?)
            } else {
                None
            };
            self.expect_punct(Punct::Semi)?;
            members.push(AnnotationMember { ty, name, default });
        }
        self.expect_punct(Punct::RBrace)?;
        Ok(AnnotationDecl {
            name,
            members,
            definitions,
        })
    }
}
