//! Render an AST back to IDL-like text.
//!
//! Output is normalised (one declaration per line, four-space indentation)
//! and re-parses to a structurally equal tree, minus comments.

use std::fmt::{Error, Result, Write as _};

use crate::ast::*;

/// Format a whole compilation unit.
pub fn format_specification(spec: &Specification) -> std::result::Result<String, Error> {
    let mut out = String::new();
    for import in &spec.imports {
        match &import.target {
            ImportTarget::Scope(name) => writeln!(out, "import {name};")?,
            ImportTarget::File(path) => writeln!(out, "import {path:?};")?,
        }
    }
    for def in &spec.definitions {
        format_definition(def, 0, &mut out)?;
    }
    Ok(out)
}

/// Format a single constant expression.
pub fn format_expr(expr: &ConstExpr) -> std::result::Result<String, Error> {
    let mut out = String::new();
    write_expr(expr, &mut out)?;
    Ok(out)
}

/// Format a type specification as it would appear in a member declaration.
pub fn format_type_spec(ty: &TypeSpec) -> std::result::Result<String, Error> {
    let mut out = String::new();
    write_type(ty, 0, &mut out)?;
    Ok(out)
}

fn format_definition(def: &Definition, indent: usize, out: &mut String) -> Result {
    let pad = " ".repeat(indent);
    write_annotations(&def.annotations, &pad, out)?;
    out.push_str(&pad);
    write_definition_kind(&def.kind, indent, out)?;
    out.push_str(";\n");
    Ok(())
}

fn write_definition_kind(kind: &DefinitionKind, indent: usize, out: &mut String) -> Result {
    let pad = " ".repeat(indent);
    match kind {
        DefinitionKind::Module(module) => {
            writeln!(out, "module {} {{", module.name)?;
            for def in &module.definitions {
                format_definition(def, indent + 4, out)?;
            }
            write!(out, "{pad}}}")?;
        }
        DefinitionKind::Struct(s) => write_struct(s, indent, out)?,
        DefinitionKind::Union(u) => write_union(u, indent, out)?,
        DefinitionKind::Enum(e) => write_enum(e, indent, out)?,
        DefinitionKind::Bitset(b) => write_bitset(b, indent, out)?,
        DefinitionKind::Bitmask(b) => write_bitmask(b, indent, out)?,
        DefinitionKind::Typedef(t) => {
            out.push_str("typedef ");
            write_type(&t.ty, indent, out)?;
            out.push(' ');
            write_declarators(&t.declarators, out)?;
        }
        DefinitionKind::Const(c) => {
            out.push_str("const ");
            write_type(&c.ty, indent, out)?;
            write!(out, " {} = ", c.name)?;
            write_expr(&c.value, out)?;
        }
        DefinitionKind::Exception(e) => {
            writeln!(out, "exception {} {{", e.name)?;
            write_members(&e.members, indent + 4, out)?;
            write!(out, "{pad}}}")?;
        }
        DefinitionKind::Native(name) => write!(out, "native {name}")?,
        DefinitionKind::Forward(f) => {
            if let Some(q) = &f.qualifier {
                write!(out, "{q} ")?;
            }
            write!(out, "{} {}", f.kind, f.name)?;
        }
        DefinitionKind::Interface(i) => {
            match i.kind {
                InterfaceKind::Abstract => out.push_str("abstract "),
                InterfaceKind::Local => out.push_str("local "),
                InterfaceKind::Unconstrained => {}
            }
            write!(out, "interface {}", i.name)?;
            write_name_list(" : ", &i.bases, out)?;
            out.push_str(" {\n");
            write_exports(&i.body, indent + 4, out)?;
            write!(out, "{pad}}}")?;
        }
        DefinitionKind::ValueType(v) => write_value("valuetype", v, indent, out)?,
        DefinitionKind::Event(v) => write_value("eventtype", v, indent, out)?,
        DefinitionKind::ValueBox(v) => {
            write!(out, "valuetype {} ", v.name)?;
            write_type(&v.ty, indent, out)?;
        }
        DefinitionKind::Component(c) => {
            write!(out, "component {}", c.name)?;
            if let Some(base) = &c.base {
                write!(out, " : {base}")?;
            }
            write_name_list(" supports ", &c.supports, out)?;
            out.push_str(" {\n");
            write_exports(&c.body, indent + 4, out)?;
            write!(out, "{pad}}}")?;
        }
        DefinitionKind::Home(h) => {
            write!(out, "home {}", h.name)?;
            if let Some(base) = &h.base {
                write!(out, " : {base}")?;
            }
            write_name_list(" supports ", &h.supports, out)?;
            write!(out, " manages {}", h.manages)?;
            if let Some(key) = &h.primary_key {
                write!(out, " primarykey {key}")?;
            }
            out.push_str(" {\n");
            write_exports(&h.body, indent + 4, out)?;
            write!(out, "{pad}}}")?;
        }
        DefinitionKind::TypeId(t) => write!(out, "typeid {} {:?}", t.target, t.id)?,
        DefinitionKind::TypePrefix(t) => write!(out, "typeprefix {} {:?}", t.target, t.prefix)?,
        DefinitionKind::Annotation(a) => {
            writeln!(out, "@annotation {} {{", a.name)?;
            let inner = " ".repeat(indent + 4);
            for member in &a.members {
                out.push_str(&inner);
                write_type(&member.ty, indent + 4, out)?;
                write!(out, " {}", member.name)?;
                if let Some(default) = &member.default {
                    out.push_str(" default ");
                    write_expr(default, out)?;
                }
                out.push_str(";\n");
            }
            for def in &a.definitions {
                format_definition(def, indent + 4, out)?;
            }
            write!(out, "{pad}}}")?;
        }
    }
    Ok(())
}

fn write_struct(s: &StructType, indent: usize, out: &mut String) -> Result {
    write!(out, "struct {}", s.name)?;
    if let Some(base) = &s.base {
        write!(out, " : {}", base.name)?;
    }
    out.push_str(" {\n");
    write_members(&s.members, indent + 4, out)?;
    write!(out, "{}}}", " ".repeat(indent))
}

fn write_union(u: &UnionType, indent: usize, out: &mut String) -> Result {
    write!(out, "union {} switch (", u.name)?;
    for annotation in &u.discriminant.annotations {
        write_annotation(annotation, out)?;
        out.push(' ');
    }
    write_type(&u.discriminant.ty, indent, out)?;
    out.push_str(") {\n");
    let case_pad = " ".repeat(indent + 4);
    for case in &u.cases {
        for label in &case.labels {
            out.push_str(&case_pad);
            match label {
                CaseLabel::Value(expr) => {
                    out.push_str("case ");
                    write_expr(expr, out)?;
                    out.push_str(":\n");
                }
                CaseLabel::Default(_) => out.push_str("default:\n"),
            }
        }
        let elem_pad = " ".repeat(indent + 8);
        write_annotations(&case.element.annotations, &elem_pad, out)?;
        out.push_str(&elem_pad);
        write_type(&case.element.ty, indent + 8, out)?;
        out.push(' ');
        write_declarator(&case.element.declarator, out)?;
        out.push_str(";\n");
    }
    write!(out, "{}}}", " ".repeat(indent))
}

fn write_enum(e: &EnumType, indent: usize, out: &mut String) -> Result {
    writeln!(out, "enum {} {{", e.name)?;
    let pad = " ".repeat(indent + 4);
    for (i, enumerator) in e.enumerators.iter().enumerate() {
        out.push_str(&pad);
        for annotation in &enumerator.annotations {
            write_annotation(annotation, out)?;
            out.push(' ');
        }
        out.push_str(&enumerator.name.name);
        if i + 1 < e.enumerators.len() {
            out.push(',');
        }
        out.push('\n');
    }
    write!(out, "{}}}", " ".repeat(indent))
}

fn write_bitset(b: &BitsetType, indent: usize, out: &mut String) -> Result {
    write!(out, "bitset {}", b.name)?;
    if let Some(base) = &b.base {
        write!(out, " : {}", base.name)?;
    }
    out.push_str(" {\n");
    let pad = " ".repeat(indent + 4);
    for field in &b.bitfields {
        write_annotations(&field.annotations, &pad, out)?;
        write!(out, "{pad}bitfield<")?;
        write_expr(&field.width, out)?;
        if let Some(ty) = field.ty {
            write!(out, ", {ty}")?;
        }
        out.push('>');
        for (i, name) in field.names.iter().enumerate() {
            out.push_str(if i == 0 { " " } else { ", " });
            out.push_str(&name.name);
        }
        out.push_str(";\n");
    }
    write!(out, "{}}}", " ".repeat(indent))
}

fn write_bitmask(b: &BitmaskType, indent: usize, out: &mut String) -> Result {
    writeln!(out, "bitmask {} {{", b.name)?;
    let pad = " ".repeat(indent + 4);
    for (i, value) in b.values.iter().enumerate() {
        out.push_str(&pad);
        for annotation in &value.annotations {
            write_annotation(annotation, out)?;
            out.push(' ');
        }
        out.push_str(&value.name.name);
        if i + 1 < b.values.len() {
            out.push(',');
        }
        out.push('\n');
    }
    write!(out, "{}}}", " ".repeat(indent))
}

fn write_value(keyword: &str, v: &ValueType, indent: usize, out: &mut String) -> Result {
    match v.kind {
        ValueKind::Abstract => out.push_str("abstract "),
        ValueKind::Custom => out.push_str("custom "),
        ValueKind::Concrete => {}
    }
    write!(out, "{keyword} {}", v.name)?;
    if !v.inheritance.bases.is_empty() {
        out.push_str(" : ");
        if v.inheritance.truncatable {
            out.push_str("truncatable ");
        }
        write_name_list("", &v.inheritance.bases, out)?;
    }
    write_name_list(" supports ", &v.inheritance.supports, out)?;
    out.push_str(" {\n");
    write_exports(&v.body, indent + 4, out)?;
    write!(out, "{}}}", " ".repeat(indent))
}

fn write_exports(exports: &[Export], indent: usize, out: &mut String) -> Result {
    let pad = " ".repeat(indent);
    for export in exports {
        match export {
            Export::Definition(def) => {
                format_definition(def, indent, out)?;
                continue;
            }
            Export::Attribute(attr) => {
                write_annotations(&attr.annotations, &pad, out)?;
                out.push_str(&pad);
                if attr.readonly {
                    out.push_str("readonly ");
                }
                out.push_str("attribute ");
                write_type(&attr.ty, indent, out)?;
                for (i, name) in attr.names.iter().enumerate() {
                    out.push_str(if i == 0 { " " } else { ", " });
                    out.push_str(&name.name);
                }
                if attr.readonly {
                    write_raises("raises", &attr.get_raises, out)?;
                } else {
                    write_raises("getraises", &attr.get_raises, out)?;
                    write_raises("setraises", &attr.set_raises, out)?;
                }
            }
            Export::Operation(op) => {
                write_annotations(&op.annotations, &pad, out)?;
                out.push_str(&pad);
                if op.oneway {
                    out.push_str("oneway ");
                }
                match &op.return_type {
                    Some(ty) => write_type(ty, indent, out)?,
                    None => out.push_str("void"),
                }
                write!(out, " {}", op.name)?;
                write_params(&op.params, indent, out)?;
                write_raises("raises", &op.raises, out)?;
                if !op.context.is_empty() {
                    let quoted: Vec<String> = op.context.iter().map(|c| format!("{c:?}")).collect();
                    write!(out, " context({})", quoted.join(", "))?;
                }
            }
            Export::StateMember(state) => {
                write_annotations(&state.member.annotations, &pad, out)?;
                out.push_str(&pad);
                out.push_str(if state.public { "public " } else { "private " });
                write_type(&state.member.ty, indent, out)?;
                out.push(' ');
                write_declarators(&state.member.declarators, out)?;
            }
            Export::Initializer(init) => {
                out.push_str(&pad);
                match init.kind {
                    InitializerKind::Factory => out.push_str("factory "),
                    InitializerKind::Finder => out.push_str("finder "),
                }
                out.push_str(&init.name.name);
                write_params(&init.params, indent, out)?;
                write_raises("raises", &init.raises, out)?;
            }
            Export::Port(port) => {
                out.push_str(&pad);
                let keyword = match port.kind {
                    PortKind::Provides => "provides",
                    PortKind::Uses { multiple: true } => "uses multiple",
                    PortKind::Uses { multiple: false } => "uses",
                    PortKind::Emits => "emits",
                    PortKind::Publishes => "publishes",
                    PortKind::Consumes => "consumes",
                };
                write!(out, "{keyword} {} {}", port.ty, port.name)?;
            }
        }
        out.push_str(";\n");
    }
    Ok(())
}

fn write_params(params: &[Param], indent: usize, out: &mut String) -> Result {
    out.push('(');
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        for annotation in &param.annotations {
            write_annotation(annotation, out)?;
            out.push(' ');
        }
        out.push_str(match param.direction {
            ParamDirection::In => "in ",
            ParamDirection::Out => "out ",
            ParamDirection::InOut => "inout ",
        });
        write_type(&param.ty, indent, out)?;
        write!(out, " {}", param.name)?;
    }
    out.push(')');
    Ok(())
}

fn write_raises(keyword: &str, names: &[ScopedName], out: &mut String) -> Result {
    if names.is_empty() {
        return Ok(());
    }
    write!(out, " {keyword}(")?;
    write_name_list("", names, out)?;
    out.push(')');
    Ok(())
}

fn write_name_list(prefix: &str, names: &[ScopedName], out: &mut String) -> Result {
    if names.is_empty() {
        return Ok(());
    }
    out.push_str(prefix);
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write!(out, "{name}")?;
    }
    Ok(())
}

fn write_members(members: &[Member], indent: usize, out: &mut String) -> Result {
    let pad = " ".repeat(indent);
    for member in members {
        write_annotations(&member.annotations, &pad, out)?;
        out.push_str(&pad);
        write_type(&member.ty, indent, out)?;
        out.push(' ');
        write_declarators(&member.declarators, out)?;
        out.push_str(";\n");
    }
    Ok(())
}

fn write_declarators(declarators: &[Declarator], out: &mut String) -> Result {
    for (i, declarator) in declarators.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_declarator(declarator, out)?;
    }
    Ok(())
}

fn write_declarator(declarator: &Declarator, out: &mut String) -> Result {
    out.push_str(&declarator.name().name);
    for dim in declarator.dims() {
        out.push('[');
        write_expr(dim, out)?;
        out.push(']');
    }
    Ok(())
}

fn write_annotations(annotations: &[Annotation], pad: &str, out: &mut String) -> Result {
    for annotation in annotations {
        out.push_str(pad);
        write_annotation(annotation, out)?;
        out.push('\n');
    }
    Ok(())
}

fn write_annotation(annotation: &Annotation, out: &mut String) -> Result {
    write!(out, "@{}", annotation.name)?;
    match &annotation.params {
        AnnotationParams::None => {}
        AnnotationParams::Single(expr) => {
            out.push('(');
            write_expr(expr, out)?;
            out.push(')');
        }
        AnnotationParams::Named(params) => {
            out.push('(');
            for (i, (name, expr)) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write!(out, "{name} = ")?;
                write_expr(expr, out)?;
            }
            out.push(')');
        }
    }
    Ok(())
}

fn write_type(ty: &TypeSpec, indent: usize, out: &mut String) -> Result {
    match ty {
        TypeSpec::Primitive(kind) => out.push_str(kind.as_str()),
        TypeSpec::Named(named) => write!(out, "{}", named.name)?,
        TypeSpec::Constructed(constr) => match constr.as_ref() {
            ConstrType::Struct(s) => write_struct(s, indent, out)?,
            ConstrType::Union(u) => write_union(u, indent, out)?,
            ConstrType::Enum(e) => write_enum(e, indent, out)?,
            ConstrType::Bitset(b) => write_bitset(b, indent, out)?,
            ConstrType::Bitmask(b) => write_bitmask(b, indent, out)?,
        },
        TypeSpec::Template(template) => match template {
            TemplateType::Sequence { elem, bound } => {
                out.push_str("sequence<");
                write_type(elem, indent, out)?;
                write_bound(bound.as_ref(), out)?;
                out.push('>');
            }
            TemplateType::Set { elem, bound } => {
                out.push_str("set<");
                write_type(elem, indent, out)?;
                write_bound(bound.as_ref(), out)?;
                out.push('>');
            }
            TemplateType::Map { key, value, bound } => {
                out.push_str("map<");
                write_type(key, indent, out)?;
                out.push_str(", ");
                write_type(value, indent, out)?;
                write_bound(bound.as_ref(), out)?;
                out.push('>');
            }
            TemplateType::String { bound } => {
                out.push_str("string");
                write_string_bound(bound.as_ref(), out)?;
            }
            TemplateType::WString { bound } => {
                out.push_str("wstring");
                write_string_bound(bound.as_ref(), out)?;
            }
            TemplateType::Fixed { digits, scale } => {
                out.push_str("fixed");
                if let (Some(digits), Some(scale)) = (digits, scale) {
                    out.push('<');
                    write_expr(digits, out)?;
                    out.push_str(", ");
                    write_expr(scale, out)?;
                    out.push('>');
                }
            }
        },
    }
    Ok(())
}

fn write_bound(bound: Option<&ConstExpr>, out: &mut String) -> Result {
    if let Some(bound) = bound {
        out.push_str(", ");
        write_expr(bound, out)?;
    }
    Ok(())
}

fn write_string_bound(bound: Option<&ConstExpr>, out: &mut String) -> Result {
    if let Some(bound) = bound {
        out.push('<');
        write_expr(bound, out)?;
        out.push('>');
    }
    Ok(())
}

fn write_expr(expr: &ConstExpr, out: &mut String) -> Result {
    match &expr.kind {
        ExprKind::Binary { op, lhs, rhs } => {
            out.push('(');
            write_expr(lhs, out)?;
            write!(out, " {} ", op.as_str())?;
            write_expr(rhs, out)?;
            out.push(')');
        }
        ExprKind::Unary { op, operand } => {
            out.push_str(op.as_str());
            write_expr(operand, out)?;
        }
        ExprKind::Name(name) => write!(out, "{name}")?,
        ExprKind::Literal(literal) => write_literal(literal, out)?,
    }
    Ok(())
}

fn write_literal(literal: &Literal, out: &mut String) -> Result {
    match literal {
        Literal::Integer(v, Radix::Decimal) => write!(out, "{v}"),
        Literal::Integer(v, Radix::Octal) => write!(out, "0{v:o}"),
        Literal::Integer(v, Radix::Hex) => write!(out, "0x{v:x}"),
        Literal::Float(v) => write!(out, "{v:?}"),
        Literal::Fixed(v) => write!(out, "{v}d"),
        Literal::Char(c) => write_quoted('\'', &c.to_string(), "", out),
        Literal::WChar(c) => write_quoted('\'', &c.to_string(), "L", out),
        Literal::String(s) => write_quoted('"', s, "", out),
        Literal::WString(s) => write_quoted('"', s, "L", out),
        Literal::Boolean(true) => write!(out, "TRUE"),
        Literal::Boolean(false) => write!(out, "FALSE"),
    }
}

fn write_quoted(quote: char, text: &str, prefix: &str, out: &mut String) -> Result {
    out.push_str(prefix);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\\' => out.push_str("\\\\"),
            '\'' if quote == '\'' => out.push_str("\\'"),
            '"' if quote == '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out.push(quote);
    Ok(())
}
