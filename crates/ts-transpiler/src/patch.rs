//! Structural patches applied after type erasure: enum desugaring and
//! constructor parameter properties.

use crate::edit::Edit;
use crate::enums::desugar_enum;
use crate::parse::SpanBase;
use source_map::Span;
use swc_common::Spanned;
use swc_ecma_ast::{
    Callee, Constructor, Expr, ParamOrTsParamProp, Pat, Stmt, TsEnumDecl, TsParamPropParam,
};
use swc_ecma_visit::{Visit, VisitWith};

pub(crate) fn collect_patches(
    module: &swc_ecma_ast::Module,
    source: &str,
    base: SpanBase,
) -> Vec<Edit> {
    let mut patcher = Patcher {
        source,
        base,
        edits: Vec::new(),
    };
    module.visit_with(&mut patcher);
    patcher.edits
}

struct Patcher<'a> {
    source: &'a str,
    base: SpanBase,
    edits: Vec<Edit>,
}

impl Visit for Patcher<'_> {
    fn visit_ts_enum_decl(&mut self, n: &TsEnumDecl) {
        let span = self.base.rel(n.span);
        self.edits
            .push(Edit::Replace(span, desugar_enum(n, self.source, self.base)));
    }

    fn visit_constructor(&mut self, n: &Constructor) {
        let mut property_names = Vec::new();
        for param in &n.params {
            let ParamOrTsParamProp::TsParamProp(prop) = param else {
                continue;
            };
            let ident = match &prop.param {
                TsParamPropParam::Ident(binding) => &binding.id,
                TsParamPropParam::Assign(assign) => match assign.left.as_ref() {
                    Pat::Ident(binding) => &binding.id,
                    _ => continue,
                },
            };
            // Erase the modifiers between the parameter start (past any
            // decorators) and the name.
            let modifiers_start = prop
                .decorators
                .last()
                .map(|d| self.base.offset(d.span.hi))
                .unwrap_or_else(|| self.base.offset(prop.span.lo));
            let name_start = self.base.offset(ident.span.lo);
            if modifiers_start < name_start {
                self.edits
                    .push(Edit::Blank(Span::new(modifiers_start, name_start)));
            }
            property_names.push(ident.sym.to_string());
        }

        if let (Some(body), false) = (&n.body, property_names.is_empty()) {
            // Assignments go after a leading super(...) call when present.
            let insert_at = match body.stmts.first() {
                Some(Stmt::Expr(stmt)) if is_super_call(&stmt.expr) => {
                    self.base.offset(stmt.span.hi)
                }
                _ => self.base.offset(body.span.lo) + 1,
            };
            let mut text = String::new();
            for name in &property_names {
                text.push_str(&format!("\n        this.{name} = {name};"));
            }
            self.edits.push(Edit::Insert(insert_at.into(), text));
        }

        n.visit_children_with(self);
    }
}

fn is_super_call(expr: &Expr) -> bool {
    matches!(expr, Expr::Call(call) if matches!(call.callee, Callee::Super(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::apply_edits;
    use crate::options::FileKind;
    use crate::parse::parse_module;

    fn patch(source: &str) -> String {
        let parsed = parse_module(source, FileKind::Ts);
        let module = parsed.module.expect("fixture must parse");
        let edits = collect_patches(&module, source, parsed.base);
        let (out, _) = apply_edits(source, edits);
        out
    }

    #[test]
    fn test_param_properties_assign_in_body() {
        let out = patch("class A {\n  constructor(private x, readonly y = 2) {}\n}");
        assert!(out.contains("this.x = x;"));
        assert!(out.contains("this.y = y;"));
        assert!(!out.contains("private"));
        assert!(!out.contains("readonly"));
    }

    #[test]
    fn test_param_properties_after_super() {
        let out = patch("class B extends A {\n  constructor(private x) { super(x); doWork() }\n}");
        let super_at = out.find("super(x);").unwrap();
        let assign_at = out.find("this.x = x;").unwrap();
        let work_at = out.find("doWork()").unwrap();
        assert!(super_at < assign_at);
        assert!(assign_at < work_at);
    }

    #[test]
    fn test_enum_is_replaced_in_place() {
        let out = patch("const before = 1\nenum E { A }\nconst after = 2\n");
        assert!(out.contains("const before = 1"));
        assert!(out.contains("var E;\n(function (E) {"));
        assert!(out.contains("E[E[\"A\"] = 0] = \"A\";"));
        assert!(out.contains("const after = 2"));
    }
}
