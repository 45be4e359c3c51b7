//! Parsing front end over swc.

use crate::options::FileKind;
use source_map::Span;
use swc_common::{sync::Lrc, FileName, SourceMap, Spanned};
use swc_ecma_ast::Module;
use swc_ecma_parser::{error::Error, lexer::Lexer, EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use ts_diagnostics::{codes, Diagnostic};

/// Translates swc byte positions (offset by the source file's start position
/// inside the shared source map) back to offsets into the input string.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpanBase(pub u32);

impl SpanBase {
    /// Converts an swc span to a span relative to the input text.
    pub fn rel(&self, span: swc_common::Span) -> Span {
        Span::new(
            span.lo.0.saturating_sub(self.0),
            span.hi.0.saturating_sub(self.0),
        )
    }

    /// Converts an swc byte position to an offset into the input text.
    pub fn offset(&self, pos: swc_common::BytePos) -> u32 {
        pos.0.saturating_sub(self.0)
    }
}

/// A parsed module with its span base and any parse diagnostics.
pub(crate) struct Parsed {
    /// `None` when the parse failed beyond recovery.
    pub module: Option<Module>,
    pub base: SpanBase,
    pub diagnostics: Vec<Diagnostic>,
}

pub(crate) fn syntax_for(kind: FileKind) -> Syntax {
    match kind {
        FileKind::Ts | FileKind::Tsx => Syntax::Typescript(TsSyntax {
            tsx: kind == FileKind::Tsx,
            decorators: true,
            ..Default::default()
        }),
        FileKind::Js | FileKind::Jsx => Syntax::Es(EsSyntax {
            jsx: kind == FileKind::Jsx,
            ..Default::default()
        }),
    }
}

/// Parses `source` as a module, collecting recovered parse errors as
/// syntactic diagnostics.
pub(crate) fn parse_module(source: &str, kind: FileKind) -> Parsed {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(Lrc::new(FileName::Anon), source.to_string());
    let base = SpanBase(fm.start_pos.0);

    let lexer = Lexer::new(
        syntax_for(kind),
        Default::default(),
        StringInput::from(&*fm),
        None,
    );
    let mut parser = Parser::new_from(lexer);

    let result = parser.parse_module();
    let mut diagnostics: Vec<Diagnostic> = parser
        .take_errors()
        .into_iter()
        .map(|e| to_diagnostic(e, base))
        .collect();

    let module = match result {
        Ok(module) => Some(module),
        Err(e) => {
            diagnostics.push(to_diagnostic(e, base));
            None
        }
    };

    Parsed {
        module,
        base,
        diagnostics,
    }
}

fn to_diagnostic(error: Error, base: SpanBase) -> Diagnostic {
    let span = base.rel(error.span());
    let message = error.into_kind().msg().into_owned();
    let mut diagnostic = Diagnostic::error(codes::EXPECTED_TOKEN, message);
    diagnostic.span = Some(span);
    diagnostic
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_typescript() {
        let parsed = parse_module("const a: number = 1;\n", FileKind::Ts);
        assert!(parsed.module.is_some());
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_reports_parse_error() {
        let parsed = parse_module("const f = (v: number) = v\n", FileKind::Ts);
        assert!(!parsed.diagnostics.is_empty());
        assert!(parsed.diagnostics.iter().all(|d| d.is_syntactic()));
    }

    #[test]
    fn test_jsx_requires_tsx_kind() {
        let parsed = parse_module("const el = <div>hi</div>;\n", FileKind::Tsx);
        assert!(parsed.module.is_some());
        assert!(parsed.diagnostics.is_empty());
    }
}
