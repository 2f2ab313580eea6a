use std::fmt::{Error, Result, Write as _};

use omgidl_core::{ConstType, ConstValue};

use super::{Field, ResolvedType, TypeEntry, TypeKind, TypeModel};

/// Render the layout facts of every entry, one block per type.
pub fn format_type_model(model: &TypeModel) -> std::result::Result<String, Error> {
    let mut out = String::new();
    for entry in model.iter() {
        write_entry(model, entry, &mut out)?;
    }
    Ok(out)
}

fn write_entry(model: &TypeModel, entry: &TypeEntry, out: &mut String) -> Result {
    let name = &entry.name;
    match &entry.kind {
        TypeKind::Struct(layout) | TypeKind::Exception(layout) => {
            let keyword = if matches!(entry.kind, TypeKind::Struct(_)) {
                "struct"
            } else {
                "exception"
            };
            write!(out, "{keyword} {name}")?;
            if let Some(base) = layout.base {
                write!(out, " : {}", model.type_name(&ResolvedType::Named(base)))?;
            }
            out.push('\n');
            for field in &layout.fields {
                write_field(model, field, "    ", out)?;
            }
        }
        TypeKind::Union(layout) => {
            writeln!(
                out,
                "union {name} switch ({})",
                model.type_name(&layout.discriminant)
            )?;
            for case in &layout.cases {
                let mut labels: Vec<String> = case.labels.iter().map(ConstValue::to_string).collect();
                if case.is_default {
                    labels.push("default".to_string());
                }
                let prefix = format!("    case {}: ", labels.join(", "));
                write_field(model, &case.field, &prefix, out)?;
            }
        }
        TypeKind::Enum(layout) => {
            writeln!(out, "enum {name} (bit_bound {})", layout.bit_bound)?;
            for (ordinal, enumerator) in layout.enumerators.iter().enumerate() {
                writeln!(out, "    {enumerator} = {ordinal}")?;
            }
        }
        TypeKind::Bitmask(layout) => {
            writeln!(out, "bitmask {name} (bit_bound {})", layout.bit_bound)?;
            for flag in &layout.flags {
                writeln!(out, "    {} @ bit {}", flag.name, flag.position)?;
            }
        }
        TypeKind::Bitset(layout) => {
            write!(out, "bitset {name}")?;
            if let Some(base) = layout.base {
                write!(out, " : {}", model.type_name(&ResolvedType::Named(base)))?;
            }
            writeln!(out, " ({} bits)", layout.total_bits)?;
            for field in &layout.fields {
                let label = field.name.as_deref().unwrap_or("_");
                writeln!(
                    out,
                    "    {label}: {} bits @ {} -> {}",
                    field.width, field.offset, field.ty
                )?;
            }
        }
        TypeKind::Alias(alias) => {
            write!(out, "typedef {name} = {}", model.type_name(&alias.ty))?;
            write_dims(&alias.dims, out)?;
            out.push('\n');
        }
        TypeKind::Const(constant) => {
            let ty = match constant.ty {
                ConstType::Enum(id) => model.type_name(&ResolvedType::Named(id)),
                other => other.to_string(),
            };
            writeln!(out, "const {name}: {ty} = {}", constant.value)?;
        }
        TypeKind::Native => writeln!(out, "native {name}")?,
        TypeKind::Opaque(kind) => writeln!(out, "{kind} {name} (opaque)")?,
    }
    Ok(())
}

fn write_field(model: &TypeModel, field: &Field, prefix: &str, out: &mut String) -> Result {
    write!(out, "{prefix}{}: {}", field.name, model.type_name(&field.ty))?;
    write_dims(&field.dims, out)?;
    if field.key {
        out.push_str(" @key");
    }
    if field.optional {
        out.push_str(" @optional");
    }
    out.push('\n');
    Ok(())
}

fn write_dims(dims: &[u64], out: &mut String) -> Result {
    for dim in dims {
        write!(out, "[{dim}]")?;
    }
    Ok(())
}
