//! Type-only syntax erasure.
//!
//! Collects spans of type-only syntax to blank out with same-length
//! whitespace. Blanking never moves positions, so the stripped text can be
//! re-parsed and patched with line and column numbers intact. Spans may
//! overlap; blanking is idempotent.

use crate::parse::SpanBase;
use source_map::Span;
use swc_common::Spanned;
use swc_ecma_ast::{
    Class, ClassMember, Decl, DefaultDecl, ExportSpecifier, ImportDecl, ImportSpecifier, Module,
    ModuleDecl, ModuleItem, NamedExport, Pat, Stmt, TsEnumDecl, TsModuleDecl, TsModuleRef,
    TsNamespaceBody,
};
use swc_ecma_visit::{Visit, VisitWith};
use ts_diagnostics::{codes, Diagnostic};

pub(crate) struct StripOutput {
    pub spans: Vec<Span>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Collects the spans of all type-only syntax in `module`.
pub(crate) fn collect_type_spans(module: &Module, source: &str, base: SpanBase) -> StripOutput {
    let mut stripper = TypeStripper {
        source,
        base,
        spans: Vec::new(),
        diagnostics: Vec::new(),
    };
    module.visit_with(&mut stripper);
    StripOutput {
        spans: stripper.spans,
        diagnostics: stripper.diagnostics,
    }
}

struct TypeStripper<'a> {
    source: &'a str,
    base: SpanBase,
    spans: Vec<Span>,
    diagnostics: Vec<Diagnostic>,
}

impl TypeStripper<'_> {
    fn blank(&mut self, span: Span) {
        if !span.is_empty() {
            self.spans.push(span);
        }
    }

    fn blank_swc(&mut self, span: swc_common::Span) {
        let span = self.base.rel(span);
        self.blank(span);
    }

    fn unsupported(&mut self, span: swc_common::Span, message: &str) {
        let mut diagnostic =
            Diagnostic::error(codes::UNSUPPORTED_UNDER_ISOLATED_MODULES, message);
        diagnostic.span = Some(self.base.rel(span));
        self.diagnostics.push(diagnostic);
    }

    /// Extends a type annotation span backward over the `:` that introduces
    /// it, in case the parser's span starts at the type itself.
    fn with_leading_colon(&self, span: Span) -> Span {
        let bytes = self.source.as_bytes();
        let mut i = usize::from(span.start);
        while i > 0 && bytes[i - 1].is_ascii_whitespace() {
            i -= 1;
        }
        if i > 0 && bytes[i - 1] == b':' {
            Span::new((i - 1) as u32, span.end)
        } else {
            span
        }
    }

    /// Extends a specifier span over one adjacent comma so the list stays
    /// well formed after blanking.
    fn with_adjacent_comma(&self, span: Span) -> Span {
        let bytes = self.source.as_bytes();
        let mut i = usize::from(span.end);
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) == Some(&b',') {
            return Span::new(span.start, (i + 1) as u32);
        }
        let mut j = usize::from(span.start);
        while j > 0 && bytes[j - 1].is_ascii_whitespace() {
            j -= 1;
        }
        if j > 0 && bytes[j - 1] == b',' {
            return Span::new((j - 1) as u32, span.end);
        }
        span
    }

    /// Blanks a single marker character (`?` or `!`) following `after`.
    fn blank_marker_after(&mut self, after: u32, marker: u8) {
        let bytes = self.source.as_bytes();
        let mut i = after as usize;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) == Some(&marker) {
            self.blank(Span::with_len(i as u32, 1));
        }
    }

    /// Blanks TS-only modifier keywords at the start of a class member,
    /// stopping at the member name. `static` and `async` are kept.
    fn blank_member_modifiers(&mut self, from: u32) {
        let bytes = self.source.as_bytes();
        let mut pos = from as usize;
        loop {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            let start = pos;
            while pos < bytes.len()
                && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_' || bytes[pos] == b'$')
            {
                pos += 1;
            }
            if pos == start {
                break;
            }
            let word = &self.source[start..pos];
            let mut look = pos;
            while look < bytes.len() && bytes[look].is_ascii_whitespace() {
                look += 1;
            }
            // A keyword followed by a terminator is the member name itself.
            let next = bytes.get(look).copied().unwrap_or(b';');
            let at_name = matches!(next, b'=' | b';' | b':' | b'?' | b'!' | b'(' | b')' | b',' | b'<' | b'}');
            match word {
                "public" | "private" | "protected" | "readonly" | "abstract" | "override"
                | "declare"
                    if !at_name =>
                {
                    self.blank(Span::new(start as u32, pos as u32));
                }
                "static" | "async" => {}
                _ => break,
            }
        }
    }

    /// Blanks a keyword found immediately before `before`, searching backward
    /// over whitespace and other modifiers.
    fn blank_word_before(&mut self, before: u32, word: &str) {
        let region_start = (before as usize).saturating_sub(word.len() + 16);
        let region = &self.source[region_start..before as usize];
        if let Some(rel) = region.rfind(word) {
            let start = (region_start + rel) as u32;
            self.blank(Span::with_len(start, word.len() as u32));
        }
    }

    /// Returns true (and blanks) when the declaration is fully erasable.
    fn try_erase_decl(&mut self, decl: &Decl, outer: swc_common::Span) -> bool {
        match decl {
            Decl::TsInterface(_) | Decl::TsTypeAlias(_) => {
                self.blank_swc(outer);
                true
            }
            Decl::Var(v) if v.declare => {
                self.blank_swc(outer);
                true
            }
            Decl::Fn(f) if f.declare || f.function.body.is_none() => {
                self.blank_swc(outer);
                true
            }
            Decl::Class(c) if c.declare => {
                self.blank_swc(outer);
                true
            }
            Decl::TsEnum(e) if e.declare => {
                self.blank_swc(outer);
                true
            }
            Decl::TsModule(m) => {
                if !m.declare && !m.global && is_instantiated(m) {
                    self.unsupported(
                        m.span,
                        "Namespaces with runtime code cannot be transpiled one file at a time.",
                    );
                }
                self.blank_swc(outer);
                true
            }
            _ => false,
        }
    }
}

/// Returns true if the namespace body contains anything beyond erasable
/// type declarations.
fn is_instantiated(module: &TsModuleDecl) -> bool {
    let Some(TsNamespaceBody::TsModuleBlock(block)) = &module.body else {
        return false;
    };
    block.body.iter().any(|item| {
        let decl = match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => decl,
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => &export.decl,
            ModuleItem::ModuleDecl(_) => return true,
            ModuleItem::Stmt(_) => return true,
        };
        match decl {
            Decl::TsInterface(_) | Decl::TsTypeAlias(_) => false,
            Decl::TsModule(inner) => is_instantiated(inner),
            Decl::Var(v) => !v.declare,
            Decl::Fn(f) => !f.declare,
            Decl::Class(c) => !c.declare,
            Decl::TsEnum(e) => !e.declare,
            _ => true,
        }
    })
}

impl Visit for TypeStripper<'_> {
    fn visit_module_item(&mut self, n: &ModuleItem) {
        match n {
            ModuleItem::ModuleDecl(decl) => match decl {
                ModuleDecl::Import(import) if import.type_only => self.blank_swc(import.span),
                ModuleDecl::ExportNamed(named) if named.type_only => self.blank_swc(named.span),
                ModuleDecl::ExportAll(all) if all.type_only => self.blank_swc(all.span),
                ModuleDecl::ExportDecl(export) => {
                    if !self.try_erase_decl(&export.decl, export.span) {
                        n.visit_children_with(self);
                    }
                }
                ModuleDecl::ExportDefaultDecl(default) => match &default.decl {
                    DefaultDecl::TsInterfaceDecl(_) => self.blank_swc(default.span),
                    DefaultDecl::Fn(f) if f.function.body.is_none() => {
                        self.blank_swc(default.span)
                    }
                    _ => n.visit_children_with(self),
                },
                ModuleDecl::TsImportEquals(ie) => {
                    if ie.is_type_only {
                        self.blank_swc(ie.span);
                    } else if matches!(ie.module_ref, TsModuleRef::TsEntityName(_)) {
                        self.unsupported(
                            ie.span,
                            "Import assignments referencing namespaces cannot be transpiled one file at a time.",
                        );
                        self.blank_swc(ie.span);
                    }
                }
                _ => n.visit_children_with(self),
            },
            ModuleItem::Stmt(_) => n.visit_children_with(self),
        }
    }

    fn visit_stmt(&mut self, n: &Stmt) {
        if let Stmt::Decl(decl) = n {
            if self.try_erase_decl(decl, decl.span()) {
                return;
            }
        }
        n.visit_children_with(self);
    }

    fn visit_import_decl(&mut self, n: &ImportDecl) {
        for specifier in &n.specifiers {
            if let ImportSpecifier::Named(named) = specifier {
                if named.is_type_only {
                    let span = self.with_adjacent_comma(self.base.rel(named.span));
                    self.blank(span);
                }
            }
        }
    }

    fn visit_named_export(&mut self, n: &NamedExport) {
        for specifier in &n.specifiers {
            if let ExportSpecifier::Named(named) = specifier {
                if named.is_type_only {
                    let span = self.with_adjacent_comma(self.base.rel(named.span));
                    self.blank(span);
                }
            }
        }
    }

    fn visit_ts_type_ann(&mut self, n: &swc_ecma_ast::TsTypeAnn) {
        let span = self.with_leading_colon(self.base.rel(n.span));
        self.blank(span);
    }

    fn visit_ts_type_param_decl(&mut self, n: &swc_ecma_ast::TsTypeParamDecl) {
        self.blank_swc(n.span);
    }

    fn visit_ts_type_param_instantiation(&mut self, n: &swc_ecma_ast::TsTypeParamInstantiation) {
        self.blank_swc(n.span);
    }

    fn visit_ts_as_expr(&mut self, n: &swc_ecma_ast::TsAsExpr) {
        self.blank(Span::new(
            self.base.offset(n.expr.span().hi),
            self.base.offset(n.span.hi),
        ));
        n.expr.visit_with(self);
    }

    fn visit_ts_satisfies_expr(&mut self, n: &swc_ecma_ast::TsSatisfiesExpr) {
        self.blank(Span::new(
            self.base.offset(n.expr.span().hi),
            self.base.offset(n.span.hi),
        ));
        n.expr.visit_with(self);
    }

    fn visit_ts_const_assertion(&mut self, n: &swc_ecma_ast::TsConstAssertion) {
        self.blank(Span::new(
            self.base.offset(n.expr.span().hi),
            self.base.offset(n.span.hi),
        ));
        n.expr.visit_with(self);
    }

    fn visit_ts_non_null_expr(&mut self, n: &swc_ecma_ast::TsNonNullExpr) {
        self.blank(Span::new(
            self.base.offset(n.expr.span().hi),
            self.base.offset(n.span.hi),
        ));
        n.expr.visit_with(self);
    }

    fn visit_ts_type_assertion(&mut self, n: &swc_ecma_ast::TsTypeAssertion) {
        self.blank(Span::new(
            self.base.offset(n.span.lo),
            self.base.offset(n.expr.span().lo),
        ));
        n.expr.visit_with(self);
    }

    fn visit_ts_instantiation(&mut self, n: &swc_ecma_ast::TsInstantiation) {
        self.blank_swc(n.type_args.span);
        n.expr.visit_with(self);
    }

    fn visit_binding_ident(&mut self, n: &swc_ecma_ast::BindingIdent) {
        if n.id.optional {
            self.blank_marker_after(u32::from(self.base.rel(n.id.span).end), b'?');
        }
        n.visit_children_with(self);
    }

    fn visit_var_declarator(&mut self, n: &swc_ecma_ast::VarDeclarator) {
        if n.definite {
            self.blank_marker_after(u32::from(self.base.rel(n.name.span()).end), b'!');
        }
        n.visit_children_with(self);
    }

    fn visit_function(&mut self, n: &swc_ecma_ast::Function) {
        // A TS `this` parameter is erased together with its trailing comma.
        if let Some(first) = n.params.first() {
            if let Pat::Ident(binding) = &first.pat {
                if binding.id.sym == *"this" {
                    let span = self.with_adjacent_comma(self.base.rel(first.span));
                    self.blank(span);
                }
            }
        }
        n.visit_children_with(self);
    }

    fn visit_class(&mut self, n: &Class) {
        if n.is_abstract {
            self.blank_word_before(self.base.offset(n.span.lo) + 1, "abstract");
        }
        if let (Some(first), Some(last)) = (n.implements.first(), n.implements.last()) {
            let first_lo = self.base.offset(first.span.lo);
            let last_hi = self.base.offset(last.span.hi);
            self.blank_word_before(first_lo, "implements");
            self.blank(Span::new(first_lo, last_hi));
        }
        n.visit_children_with(self);
    }

    fn visit_class_member(&mut self, n: &ClassMember) {
        match n {
            ClassMember::Method(method) => {
                if method.function.body.is_none() {
                    self.blank_swc(method.span);
                    return;
                }
                self.blank_member_modifiers(self.base.offset(method.span.lo));
                if method.is_optional {
                    self.blank_marker_after(self.base.offset(method.key.span().hi), b'?');
                }
            }
            ClassMember::ClassProp(prop) => {
                if prop.declare || prop.is_abstract {
                    self.blank_swc(prop.span);
                    return;
                }
                self.blank_member_modifiers(self.base.offset(prop.span.lo));
                if prop.is_optional {
                    self.blank_marker_after(self.base.offset(prop.key.span().hi), b'?');
                }
                if prop.definite {
                    self.blank_marker_after(self.base.offset(prop.key.span().hi), b'!');
                }
            }
            ClassMember::PrivateProp(prop) => {
                self.blank_member_modifiers(self.base.offset(prop.span.lo));
                if prop.is_optional {
                    self.blank_marker_after(self.base.offset(prop.key.span.hi), b'?');
                }
                if prop.definite {
                    self.blank_marker_after(self.base.offset(prop.key.span.hi), b'!');
                }
            }
            ClassMember::Constructor(ctor) => {
                if ctor.body.is_none() {
                    self.blank_swc(ctor.span);
                    return;
                }
                self.blank_member_modifiers(self.base.offset(ctor.span.lo));
            }
            ClassMember::TsIndexSignature(sig) => {
                self.blank_swc(sig.span);
                return;
            }
            _ => {}
        }
        n.visit_children_with(self);
    }

    // Enums survive blanking; they are desugared as a patch afterwards.
    fn visit_ts_enum_decl(&mut self, _n: &TsEnumDecl) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::blank_spans;
    use crate::options::FileKind;
    use crate::parse::parse_module;
    use pretty_assertions::assert_eq;

    fn strip(source: &str) -> String {
        let parsed = parse_module(source, FileKind::Ts);
        let module = parsed.module.expect("fixture must parse");
        let output = collect_type_spans(&module, source, parsed.base);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        blank_spans(source, &output.spans)
    }

    #[test]
    fn test_strips_annotations() {
        let src = "const f = (v: number): number => v";
        let out = strip(src);
        assert_eq!(out.len(), src.len());
        assert!(!out.contains("number"));
        assert!(!out.contains(':'));
        assert!(out.starts_with("const f = (v"));
        assert_eq!(out.find("=> v"), src.find("=> v"));
    }

    #[test]
    fn test_strips_interface_and_alias() {
        let src = "interface A { x: number }\ntype B = A\nconst a = 1\n";
        let out = strip(src);
        assert_eq!(out.len(), src.len());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0].trim(), "");
        assert_eq!(lines[1].trim(), "");
        assert_eq!(lines[2], "const a = 1");
    }

    #[test]
    fn test_strips_as_and_nonnull() {
        let src = "const a = b as string";
        assert_eq!(strip(src), format!("const a = b{}", " ".repeat(10)));
        assert_eq!(strip("const a = b!.c"), "const a = b .c");
    }

    #[test]
    fn test_strips_type_only_import() {
        let src = "import type { A } from './a'\nimport { type B, c } from './c'\n";
        let out = strip(src);
        assert_eq!(out.len(), src.len());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0].trim(), "");
        assert!(!lines[1].contains("type"));
        assert!(!lines[1].contains('B'));
        assert!(lines[1].contains("c } from './c'"));
    }

    #[test]
    fn test_strips_generics() {
        let src = "function id<T>(x: T) { return x }";
        let out = strip(src);
        assert_eq!(out.len(), src.len());
        assert!(!out.contains('<'));
        assert!(!out.contains(": T"));
        assert_eq!(out.find("{ return x }"), src.find("{ return x }"));

        assert_eq!(strip("id<string>(x)"), format!("id{}(x)", " ".repeat(8)));
    }

    #[test]
    fn test_strips_class_modifiers() {
        let src = "class A {\n  private readonly x = 1\n  static y = 2\n}";
        let out = strip(src);
        assert_eq!(out.len(), src.len());
        assert!(!out.contains("private"));
        assert!(!out.contains("readonly"));
        assert_eq!(out.find("x = 1"), src.find("x = 1"));
        assert_eq!(out.find("static y = 2"), src.find("static y = 2"));
    }

    #[test]
    fn test_strips_optional_and_definite() {
        let src = "function f(a?: number) {}\nlet b!: string\n";
        let out = strip(src);
        assert_eq!(out.len(), src.len());
        assert!(!out.contains('?'));
        assert!(!out.contains('!'));
        assert!(!out.contains("number"));
        assert!(!out.contains("string"));
        assert_eq!(out.find("{}"), src.find("{}"));
    }

    #[test]
    fn test_strips_overloads() {
        let src = "function f(a: string): void\nfunction f(a) { return a }\n";
        let out = strip(src);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0].trim(), "");
        assert_eq!(lines[1], "function f(a) { return a }");
    }

    #[test]
    fn test_instantiated_namespace_reports() {
        let source = "namespace N { export const x = 1 }\n";
        let parsed = parse_module(source, FileKind::Ts);
        let output = collect_type_spans(&parsed.module.unwrap(), source, parsed.base);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(
            output.diagnostics[0].code,
            codes::UNSUPPORTED_UNDER_ISOLATED_MODULES
        );
    }

    #[test]
    fn test_type_only_namespace_is_silently_erased() {
        let source = "namespace N { export type T = string }\nconst a = 1\n";
        let parsed = parse_module(source, FileKind::Ts);
        let output = collect_type_spans(&parsed.module.unwrap(), source, parsed.base);
        assert!(output.diagnostics.is_empty());
        assert!(blank_spans(source, &output.spans).contains("const a = 1"));
    }
}
