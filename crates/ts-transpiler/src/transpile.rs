//! Transpile entry point.

use crate::cjs::lower_module;
use crate::edit::{apply_edits, blank_spans, Edit};
use crate::jsx::{collect_jsx_edits, JsxContext};
use crate::options::{FileKind, JsxMode, ModuleKind, TranspileOptions};
use crate::parse::{parse_module, SpanBase};
use crate::patch::collect_patches;
use crate::strip::collect_type_spans;
use source_map::{MappingTable, MappingTableBuilder};
use swc_ecma_ast::{Module, ModuleDecl, ModuleItem, TsModuleRef};
use ts_diagnostics::{codes, Diagnostic};

/// The output of one isolated transpile call.
#[derive(Debug)]
pub struct TranspileResult {
    /// The generated JavaScript.
    pub code: String,
    /// Generated-to-original position mappings.
    pub mappings: MappingTable,
    /// Syntactic diagnostics. Any entry here means the input could not be
    /// transpiled faithfully; callers treat them as fatal.
    pub diagnostics: Vec<Diagnostic>,
}

/// Derives the logical output file name for an input path.
pub fn output_file_name(file_path: &str, jsx: JsxMode) -> String {
    let name = file_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_path);
    let (stem, ext) = name.rsplit_once('.').unwrap_or((name, ""));
    let out_ext = match ext {
        "tsx" | "jsx" if jsx == JsxMode::Preserve => "jsx",
        "mts" | "mjs" => "mjs",
        "cts" | "cjs" => "cjs",
        _ => "js",
    };
    format!("{stem}.{out_ext}")
}

/// Transpiles one source file with no cross-file information.
///
/// Works in two passes over the text: type-only syntax is first blanked out
/// with same-length whitespace (so every surviving token keeps its position),
/// then the stripped text is re-parsed and the transforms that do move text
/// (enums, parameter properties, JSX and module lowering) are applied as
/// spliced edits with a mapping table.
pub fn transpile(source: &str, kind: FileKind, options: &TranspileOptions) -> TranspileResult {
    let parsed = parse_module(source, kind);
    let mut diagnostics = parsed.diagnostics;
    let Some(module) = parsed.module else {
        return fallback(source.to_owned(), diagnostics);
    };

    let mut type_spans = Vec::new();
    if kind.is_typescript() {
        let stripped = collect_type_spans(&module, source, parsed.base);
        type_spans = stripped.spans;
        diagnostics.extend(stripped.diagnostics);
    }

    let blanked;
    let reparsed;
    let (text, patched_module, base): (&str, &Module, SpanBase) = if type_spans.is_empty() {
        (source, &module, parsed.base)
    } else {
        blanked = blank_spans(source, &type_spans);
        reparsed = parse_module(&blanked, kind);
        match &reparsed.module {
            Some(module) => (blanked.as_str(), module, reparsed.base),
            None => {
                // Should not happen for inputs that parsed before blanking;
                // surface whatever the second parse reported.
                diagnostics.extend(reparsed.diagnostics);
                return fallback(blanked.clone(), diagnostics);
            }
        }
    };

    let mut edits = collect_patches(patched_module, text, base);

    if kind.has_jsx() && options.jsx == JsxMode::React {
        let ctx = JsxContext {
            source: text,
            base,
            factory: &options.jsx_factory,
            fragment_factory: &options.jsx_fragment_factory,
        };
        edits.extend(collect_jsx_edits(patched_module, &ctx));
    }

    match options.module {
        ModuleKind::CommonJs => {
            edits.extend(lower_module(patched_module, text, base));
        }
        ModuleKind::EsNext => {
            diagnostics.extend(esm_assignment_diagnostics(patched_module, base));
        }
    }

    let (code, mappings) = apply_edits(text, edits);
    TranspileResult {
        code,
        mappings,
        diagnostics,
    }
}

/// Import/export assignments have no ESM equivalent; under `module: esnext`
/// they are reported instead of lowered.
fn esm_assignment_diagnostics(module: &Module, base: SpanBase) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for item in &module.body {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::TsImportEquals(ie))
                if matches!(ie.module_ref, TsModuleRef::TsExternalModuleRef(_)) =>
            {
                let mut d = Diagnostic::error(
                    codes::IMPORT_ASSIGNMENT_ESM,
                    "Import assignment cannot be used when targeting ECMAScript modules.",
                );
                d.span = Some(base.rel(ie.span));
                diagnostics.push(d);
            }
            ModuleItem::ModuleDecl(ModuleDecl::TsExportAssignment(ea)) => {
                let mut d = Diagnostic::error(
                    codes::EXPORT_ASSIGNMENT_ESM,
                    "Export assignment cannot be used when targeting ECMAScript modules.",
                );
                d.span = Some(base.rel(ea.span));
                diagnostics.push(d);
            }
            _ => {}
        }
    }
    diagnostics
}

fn fallback(code: String, diagnostics: Vec<Diagnostic>) -> TranspileResult {
    let mut builder = MappingTableBuilder::new();
    builder.push_verbatim(0u32.into(), &code);
    TranspileResult {
        code,
        mappings: builder.build(),
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use source_map::ByteOffset;

    fn opts() -> TranspileOptions {
        TranspileOptions::default()
    }

    #[test]
    fn test_js_passthrough() {
        let source = "export default 42\n";
        let result = transpile(source, FileKind::Js, &opts());
        assert_eq!(result.code, source);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_js_commonjs_lowering() {
        let source = "export default 42\n";
        let options = TranspileOptions {
            module: ModuleKind::CommonJs,
            ..opts()
        };
        let result = transpile(source, FileKind::Js, &options);
        assert!(result.code.contains("exports.default = 42"));
        assert!(result.code.contains("__esModule"));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_type_annotations_erased_in_place() {
        let source = "const f = (v: number) => v\nconst t: number = f(5)\n";
        let result = transpile(source, FileKind::Ts, &opts());
        assert!(result.diagnostics.is_empty());
        assert!(!result.code.contains("number"));
        assert_eq!(result.code.lines().count(), source.lines().count());
        // Surviving tokens keep their exact positions.
        assert_eq!(result.code.find("f(5)"), source.find("f(5)"));
        let offset = ByteOffset::from(result.code.find("f(5)").unwrap() as u32);
        assert_eq!(result.mappings.original_position(offset), Some(offset));
    }

    #[test]
    fn test_parse_error_is_syntactic_diagnostic() {
        let source = "const f = (v: number) = v\n";
        let result = transpile(source, FileKind::Ts, &opts());
        assert!(!result.diagnostics.is_empty());
        assert!(result.diagnostics.iter().all(|d| d.is_syntactic()));
    }

    #[test]
    fn test_jsx_preserve_keeps_syntax() {
        let source = "const el = <div>hi</div>\n";
        let result = transpile(source, FileKind::Tsx, &opts());
        assert!(result.code.contains("<div>hi</div>"));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_jsx_react_lowering() {
        let source = "const el = <div>hi</div>\n";
        let options = TranspileOptions {
            jsx: JsxMode::React,
            ..opts()
        };
        let result = transpile(source, FileKind::Tsx, &options);
        assert!(result
            .code
            .contains("React.createElement(\"div\", null, \"hi\")"));
    }

    #[test]
    fn test_custom_jsx_factory() {
        let source = "const el = <div />\n";
        let options = TranspileOptions {
            jsx: JsxMode::React,
            jsx_factory: "h".to_owned(),
            ..opts()
        };
        let result = transpile(source, FileKind::Tsx, &options);
        assert!(result.code.contains("h(\"div\", null)"));
    }

    #[test]
    fn test_enum_desugars() {
        let source = "enum Color { Red, Green }\nconst c = Color.Red\n";
        let result = transpile(source, FileKind::Ts, &opts());
        assert!(result.code.contains("var Color;"));
        assert!(result.code.contains("Color[Color[\"Red\"] = 0] = \"Red\";"));
        assert!(result.code.contains("const c = Color.Red"));
    }

    #[test]
    fn test_exported_enum_commonjs() {
        let source = "export enum Color { Red }\n";
        let options = TranspileOptions {
            module: ModuleKind::CommonJs,
            ..opts()
        };
        let result = transpile(source, FileKind::Ts, &options);
        assert!(result.code.contains("var Color;"));
        assert!(result.code.contains("exports.Color = Color;"));
        assert!(!result.code.contains("export "));
    }

    #[test]
    fn test_parameter_properties() {
        let source = "class A {\n  constructor(private x: number) {}\n}\n";
        let result = transpile(source, FileKind::Ts, &opts());
        assert!(result.code.contains("this.x = x;"));
        assert!(!result.code.contains("private"));
        assert!(!result.code.contains("number"));
    }

    #[test]
    fn test_export_assignment_under_esnext_reports() {
        let source = "const x = 1\nexport = x\n";
        let result = transpile(source, FileKind::Ts, &opts());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::EXPORT_ASSIGNMENT_ESM));
    }

    #[test]
    fn test_typescript_imports_survive_esnext() {
        let source = "import { a } from \"./m\"\nexport const b: number = a\n";
        let result = transpile(source, FileKind::Ts, &opts());
        assert!(result.code.contains("import { a } from \"./m\""));
        assert!(result.code.contains("export const b"));
        assert!(!result.code.contains(": number"));
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("/a/b/foo.ts", JsxMode::Preserve), "foo.js");
        assert_eq!(output_file_name("/a/b/foo.tsx", JsxMode::Preserve), "foo.jsx");
        assert_eq!(output_file_name("/a/b/foo.tsx", JsxMode::React), "foo.js");
        assert_eq!(output_file_name("foo.mts", JsxMode::Preserve), "foo.mjs");
        assert_eq!(output_file_name("foo.jsx", JsxMode::React), "foo.js");
    }
}
