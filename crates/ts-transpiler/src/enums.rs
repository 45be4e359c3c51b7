//! Enum desugaring.

use crate::parse::SpanBase;
use swc_common::Spanned;
use swc_ecma_ast::{Expr, Lit, TsEnumDecl, TsEnumMemberId};

/// Renders a TS enum as the classic `var` + IIFE pattern. Numeric members
/// auto-increment, string members assign directly, other initializers are
/// spliced from the source text.
pub(crate) fn desugar_enum(decl: &TsEnumDecl, source: &str, base: SpanBase) -> String {
    let name = decl.id.sym.as_str();
    let mut out = format!("var {name};\n(function ({name}) {{\n");

    let mut next_value: Option<f64> = Some(0.0);
    for member in &decl.members {
        let member_name = escape(&member_id(&member.id));
        match member.init.as_deref() {
            Some(Expr::Lit(Lit::Num(num))) => {
                out.push_str(&format!(
                    "    {name}[{name}[\"{member_name}\"] = {}] = \"{member_name}\";\n",
                    format_number(num.value)
                ));
                next_value = Some(num.value + 1.0);
            }
            Some(Expr::Lit(Lit::Str(s))) => {
                out.push_str(&format!(
                    "    {name}[\"{member_name}\"] = \"{}\";\n",
                    escape(&s.value.to_string_lossy())
                ));
                next_value = None;
            }
            Some(expr) => {
                let text = base.rel(expr.span()).slice(source);
                out.push_str(&format!(
                    "    {name}[{name}[\"{member_name}\"] = {text}] = \"{member_name}\";\n"
                ));
                next_value = None;
            }
            None => {
                let value = match next_value {
                    Some(v) => {
                        next_value = Some(v + 1.0);
                        format_number(v)
                    }
                    None => "void 0".to_owned(),
                };
                out.push_str(&format!(
                    "    {name}[{name}[\"{member_name}\"] = {value}] = \"{member_name}\";\n"
                ));
            }
        }
    }

    out.push_str(&format!("}})({name} || ({name} = {{}}));"));
    out
}

fn member_id(id: &TsEnumMemberId) -> String {
    match id {
        TsEnumMemberId::Ident(ident) => ident.sym.to_string(),
        TsEnumMemberId::Str(s) => s.value.to_string_lossy().into_owned(),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
