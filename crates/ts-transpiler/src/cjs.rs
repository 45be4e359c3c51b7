//! ESM to CommonJS lowering.
//!
//! Rewrites top-level import/export statements as `require`/`exports`
//! operations. Bindings stay `const`, so live-binding semantics are
//! approximated, which is the usual trade-off for per-file lowering.

use crate::edit::Edit;
use crate::parse::SpanBase;
use source_map::Span;
use swc_common::Spanned;
use swc_ecma_ast::{
    Decl, DefaultDecl, ExportSpecifier, Module, ModuleDecl, ModuleExportName, ModuleItem, Pat,
    TsModuleRef,
};

const DEFAULT_IMPORT_HELPER: &str = "var __importDefault = (this && this.__importDefault) || function (mod) {\n    return (mod && mod.__esModule) ? mod : { \"default\": mod };\n};\n";

pub(crate) fn lower_module(module: &Module, source: &str, base: SpanBase) -> Vec<Edit> {
    let mut lowering = Lowering {
        source,
        base,
        edits: Vec::new(),
        saw_esm: false,
        needs_default_helper: false,
        temp_count: 0,
    };
    for item in &module.body {
        if let ModuleItem::ModuleDecl(decl) = item {
            lowering.lower_decl(decl);
        }
    }

    let mut prologue = String::new();
    if lowering.saw_esm {
        prologue.push_str("\"use strict\";\n");
        if lowering.needs_default_helper {
            prologue.push_str(DEFAULT_IMPORT_HELPER);
        }
        prologue.push_str("Object.defineProperty(exports, \"__esModule\", { value: true });\n");
    }
    if !prologue.is_empty() {
        lowering.edits.insert(0, Edit::Insert(0u32.into(), prologue));
    }
    lowering.edits
}

struct Lowering<'a> {
    source: &'a str,
    base: SpanBase,
    edits: Vec<Edit>,
    saw_esm: bool,
    needs_default_helper: bool,
    temp_count: usize,
}

impl Lowering<'_> {
    fn temp_name(&mut self, module_src: &str) -> String {
        self.temp_count += 1;
        let stem = module_src
            .rsplit('/')
            .next()
            .unwrap_or(module_src)
            .trim_end_matches(".js")
            .trim_end_matches(".ts");
        let sanitized: String = stem
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{sanitized}_{}", self.temp_count)
    }

    fn lower_decl(&mut self, decl: &ModuleDecl) {
        match decl {
            ModuleDecl::Import(import) => {
                self.saw_esm = true;
                let src = escape(&import.src.value.to_string_lossy());
                let mut lines = Vec::new();
                let mut destructured = Vec::new();
                for specifier in &import.specifiers {
                    match specifier {
                        swc_ecma_ast::ImportSpecifier::Default(default) => {
                            self.needs_default_helper = true;
                            lines.push(format!(
                                "const {} = __importDefault(require(\"{src}\")).default;",
                                default.local.sym
                            ));
                        }
                        swc_ecma_ast::ImportSpecifier::Namespace(ns) => {
                            lines.push(format!("const {} = require(\"{src}\");", ns.local.sym));
                        }
                        swc_ecma_ast::ImportSpecifier::Named(named) => {
                            let local = named.local.sym.to_string();
                            let entry = match &named.imported {
                                Some(imported) => {
                                    let source_name = export_name_text(imported);
                                    if source_name == local {
                                        local
                                    } else {
                                        format!("{source_name}: {local}")
                                    }
                                }
                                None => local,
                            };
                            destructured.push(entry);
                        }
                    }
                }
                if !destructured.is_empty() {
                    lines.push(format!(
                        "const {{ {} }} = require(\"{src}\");",
                        destructured.join(", ")
                    ));
                }
                if lines.is_empty() {
                    lines.push(format!("require(\"{src}\");"));
                }
                self.edits
                    .push(Edit::Replace(self.base.rel(import.span), lines.join("\n")));
            }
            ModuleDecl::ExportDecl(export) => {
                self.saw_esm = true;
                let keyword = Span::new(
                    self.base.offset(export.span.lo),
                    self.base.offset(export.decl.span().lo),
                );
                self.edits.push(Edit::Blank(keyword));
                let mut assignments = String::new();
                for name in declared_names(&export.decl) {
                    assignments.push_str(&format!("\nexports.{name} = {name};"));
                }
                if !assignments.is_empty() {
                    self.edits.push(Edit::Insert(
                        self.base.offset(export.span.hi).into(),
                        assignments,
                    ));
                }
            }
            ModuleDecl::ExportDefaultExpr(export) => {
                self.saw_esm = true;
                let keyword = Span::new(
                    self.base.offset(export.span.lo),
                    self.base.offset(export.expr.span().lo),
                );
                self.edits
                    .push(Edit::Replace(keyword, "exports.default = ".to_owned()));
            }
            ModuleDecl::ExportDefaultDecl(export) => {
                self.saw_esm = true;
                let keyword = self.export_default_keyword(export.span.lo);
                let name = match &export.decl {
                    DefaultDecl::Fn(f) => f.ident.as_ref().map(|i| i.sym.to_string()),
                    DefaultDecl::Class(c) => c.ident.as_ref().map(|i| i.sym.to_string()),
                    DefaultDecl::TsInterfaceDecl(_) => return,
                };
                match name {
                    Some(name) => {
                        self.edits.push(Edit::Blank(keyword));
                        self.edits.push(Edit::Insert(
                            self.base.offset(export.span.hi).into(),
                            format!("\nexports.default = {name};"),
                        ));
                    }
                    None => {
                        self.edits
                            .push(Edit::Replace(keyword, "exports.default =".to_owned()));
                    }
                }
            }
            ModuleDecl::ExportNamed(named) => {
                self.saw_esm = true;
                let mut lines = Vec::new();
                match &named.src {
                    Some(src) => {
                        let src = escape(&src.value.to_string_lossy());
                        let temp = self.temp_name(&src);
                        lines.push(format!("const {temp} = require(\"{src}\");"));
                        for specifier in &named.specifiers {
                            match specifier {
                                ExportSpecifier::Named(spec) => {
                                    let orig = export_name_text(&spec.orig);
                                    let exported = spec
                                        .exported
                                        .as_ref()
                                        .map(export_name_text)
                                        .unwrap_or_else(|| orig.clone());
                                    lines.push(format!("exports.{exported} = {temp}.{orig};"));
                                }
                                ExportSpecifier::Namespace(spec) => {
                                    let name = export_name_text(&spec.name);
                                    lines.push(format!("exports.{name} = {temp};"));
                                }
                                ExportSpecifier::Default(_) => {}
                            }
                        }
                    }
                    None => {
                        for specifier in &named.specifiers {
                            if let ExportSpecifier::Named(spec) = specifier {
                                let orig = export_name_text(&spec.orig);
                                let exported = spec
                                    .exported
                                    .as_ref()
                                    .map(export_name_text)
                                    .unwrap_or_else(|| orig.clone());
                                lines.push(format!("exports.{exported} = {orig};"));
                            }
                        }
                    }
                }
                self.edits
                    .push(Edit::Replace(self.base.rel(named.span), lines.join("\n")));
            }
            ModuleDecl::ExportAll(all) => {
                self.saw_esm = true;
                let src = escape(&all.src.value.to_string_lossy());
                self.edits.push(Edit::Replace(
                    self.base.rel(all.span),
                    format!("Object.assign(exports, require(\"{src}\"));"),
                ));
            }
            ModuleDecl::TsImportEquals(ie) => {
                if let TsModuleRef::TsExternalModuleRef(external) = &ie.module_ref {
                    let src = escape(&external.expr.value.to_string_lossy());
                    self.edits.push(Edit::Replace(
                        self.base.rel(ie.span),
                        format!("const {} = require(\"{src}\");", ie.id.sym),
                    ));
                }
            }
            ModuleDecl::TsExportAssignment(ea) => {
                let keyword = Span::new(
                    self.base.offset(ea.span.lo),
                    self.base.offset(ea.expr.span().lo),
                );
                self.edits
                    .push(Edit::Replace(keyword, "module.exports = ".to_owned()));
            }
            ModuleDecl::TsNamespaceExport(_) => {}
        }
    }

    /// Returns the span of the literal `export default` keywords.
    fn export_default_keyword(&self, lo: swc_common::BytePos) -> Span {
        let start = self.base.offset(lo) as usize;
        let rest = &self.source[start..];
        let after_export = rest.find("default").map(|i| i + "default".len()).unwrap_or(0);
        Span::new(start as u32, (start + after_export) as u32)
    }
}

fn declared_names(decl: &Decl) -> Vec<String> {
    match decl {
        Decl::Var(var) => var
            .decls
            .iter()
            .filter_map(|d| match &d.name {
                Pat::Ident(binding) => Some(binding.id.sym.to_string()),
                _ => None,
            })
            .collect(),
        Decl::Fn(f) => vec![f.ident.sym.to_string()],
        Decl::Class(c) => vec![c.ident.sym.to_string()],
        Decl::TsEnum(e) => vec![e.id.sym.to_string()],
        _ => Vec::new(),
    }
}

fn export_name_text(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(s) => s.value.to_string_lossy().into_owned(),
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::apply_edits;
    use crate::options::FileKind;
    use crate::parse::parse_module;

    fn lower(source: &str) -> String {
        let parsed = parse_module(source, FileKind::Ts);
        let module = parsed.module.expect("fixture must parse");
        let edits = lower_module(&module, source, parsed.base);
        let (out, _) = apply_edits(source, edits);
        out
    }

    #[test]
    fn test_export_default_expr() {
        let out = lower("export default 42");
        assert!(out.starts_with("\"use strict\";\n"));
        assert!(out.contains("Object.defineProperty(exports, \"__esModule\", { value: true });"));
        assert!(out.contains("exports.default = 42"));
    }

    #[test]
    fn test_named_imports_destructure() {
        let out = lower("import { a, b as c } from \"./m\"\nconsole.log(a, c)\n");
        assert!(out.contains("const { a, b: c } = require(\"./m\");"));
        assert!(out.contains("console.log(a, c)"));
        assert!(!out.contains("import"));
    }

    #[test]
    fn test_default_import_uses_helper() {
        let out = lower("import d from \"./m\"\nd()\n");
        assert!(out.contains("__importDefault = (this && this.__importDefault)"));
        assert!(out.contains("const d = __importDefault(require(\"./m\")).default;"));
    }

    #[test]
    fn test_export_decl_keeps_declaration() {
        let out = lower("export const x = 1\nexport function f() {}\n");
        assert!(out.contains("const x = 1"));
        assert!(out.contains("exports.x = x;"));
        assert!(out.contains("function f() {}"));
        assert!(out.contains("exports.f = f;"));
        assert!(!out.contains("export const"));
    }

    #[test]
    fn test_reexports() {
        let out = lower("export { a as b } from \"./m\"\nexport * from \"./n\"\n");
        assert!(out.contains("exports.b = "));
        assert!(out.contains(".a;"));
        assert!(out.contains("Object.assign(exports, require(\"./n\"));"));
    }

    #[test]
    fn test_import_equals_and_export_assignment() {
        let out = lower("import x = require(\"./m\")\nexport = x\n");
        assert!(out.contains("const x = require(\"./m\");"));
        assert!(out.contains("module.exports = x"));
    }

    #[test]
    fn test_plain_script_untouched() {
        let out = lower("const a = 1\nmodule.exports = a\n");
        assert_eq!(out, "const a = 1\nmodule.exports = a\n");
    }

    #[test]
    fn test_export_default_named_function() {
        let out = lower("export default function main() { return 1 }");
        assert!(out.contains("function main() { return 1 }"));
        assert!(out.contains("exports.default = main;"));
    }
}
