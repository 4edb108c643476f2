//! Link-name mangling (spec §4.6). Loosely inspired by the Itanium C++ ABI
//! — a `_K` prefix, a symbol-kind tag, then a length-prefixed qualified
//! name (`N3fooE`) and, for functions, the concatenated mangled parameter
//! types. Nothing here consults the resolver; mangling is purely a
//! function of a [`Function`]'s or [`Variable`]'s already-built shape.

use crate::model::{FunctionId, Model, VariableId};
use crate::types::{PrimitiveKind, TypeId, TypeKind};

const PREFIX: &str = "_K";
const TAG_FUNCTION: &str = "F";
const TAG_VARIABLE: &str = "V";
const TAG_CONST: &str = "K";
const TAG_MEMBER: &str = "M";
const QUALIFIED_OPEN: &str = "N";
const QUALIFIED_CLOSE: &str = "E";
const MOD_POINTER: &str = "P";
const MOD_REFERENCE: &str = "R";
const NO_PARAMETERS: &str = "v";

fn primitive_tag(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "b",
        PrimitiveKind::Char => "c",
        PrimitiveKind::UnsignedChar => "h",
        PrimitiveKind::Short => "s",
        PrimitiveKind::UnsignedShort => "t",
        PrimitiveKind::Int => "i",
        PrimitiveKind::UnsignedInt => "j",
        PrimitiveKind::Long => "x",
        PrimitiveKind::UnsignedLong => "y",
        PrimitiveKind::Float => "f",
        PrimitiveKind::Double => "d",
    }
}

fn mangle_short_name(short_name: &str) -> String {
    format!("{}{}", short_name.len(), short_name)
}

/// `N` + one length-prefixed segment per qualified-name part + `E`,
/// optionally preceded by the `_K` prefix (used both for top-level symbol
/// names and, recursively, for struct-typed parameters).
fn mangle_fq_name(parts: &[String], with_k_prefix: bool) -> String {
    let mut out = String::new();
    if with_k_prefix {
        out.push_str(PREFIX);
    }
    out.push_str(QUALIFIED_OPEN);
    for part in parts {
        out.push_str(&mangle_short_name(part));
    }
    out.push_str(QUALIFIED_CLOSE);
    out
}

/// Mangles a type for use in a function's parameter suffix or as a nested
/// struct name. Array and function-reference types have no mangled form
/// in this scheme (the original compiler never produces one either) and
/// mangle to the empty string.
pub fn mangle_type(model: &Model, ty: TypeId) -> String {
    match model.types.kind(ty) {
        TypeKind::Primitive(p) => primitive_tag(*p).to_string(),
        TypeKind::Pointer(inner) => format!("{MOD_POINTER}{}", mangle_type(model, *inner)),
        TypeKind::Reference(inner) => format!("{MOD_REFERENCE}{}", mangle_type(model, *inner)),
        TypeKind::Struct(st) => mangle_fq_name(&st.name.parts, true),
        TypeKind::UnsizedArray(_) | TypeKind::SizedArray(_, _) | TypeKind::FunctionRef(_) | TypeKind::Unresolved(_, _) | TypeKind::Alias(_) => String::new(),
    }
}

/// Mangles a function's link name (spec §6.7): `_KF` (`+K` if `const`,
/// `+M` if a member function) + the fully qualified name + either `v` for
/// an empty parameter list or the concatenated mangled parameter types.
pub fn mangle_function(model: &Model, fid: FunctionId) -> String {
    let func = model.function(fid);
    let mut out = String::new();
    out.push_str(PREFIX);
    out.push_str(TAG_FUNCTION);
    if func.specifiers.is_const {
        out.push_str(TAG_CONST);
    }
    if func.this_param.is_some() {
        out.push_str(TAG_MEMBER);
    }
    out.push_str(&mangle_fq_name(&func.qualified_name.parts, false));
    if func.parameters.is_empty() {
        out.push_str(NO_PARAMETERS);
    } else {
        for &pid in &func.parameters {
            out.push_str(&mangle_type(model, model.parameter(pid).type_id));
        }
    }
    out
}

/// Mangles a namespace-level variable's link name: `_KV` (`+K` if
/// `const`) + the fully qualified name. Locals and parameters are never
/// mangled — they have no external linkage.
pub fn mangle_global_variable(model: &Model, vid: VariableId) -> String {
    let var = model.variable(vid);
    let qualified_name = match var.parent {
        crate::model::ParentId::Namespace(ns) => model.namespace(ns).qualified_name.joined(&crate::ast::QualifiedName::simple(var.name.clone())),
        _ => crate::ast::QualifiedName::simple(var.name.clone()),
    };
    let mut out = String::new();
    out.push_str(PREFIX);
    out.push_str(TAG_VARIABLE);
    if var.is_const {
        out.push_str(TAG_CONST);
    }
    out.push_str(&mangle_fq_name(&qualified_name.parts, false));
    out
}

#[cfg(test)]
mod tests;
