//! Plain-text diagnostic rendering in the tsc line format.

use crate::{Diagnostic, DiagnosticCategory};
use camino::Utf8Path;
use source_map::LineIndex;
use std::fmt::Write;

/// Renders diagnostics one per line as `path(line,col): error TS1234:
/// message`, with 1-indexed positions. `text_of` supplies the source text
/// for a file so spans can be resolved; diagnostics whose text is
/// unavailable, or which carry no location, render without the position
/// prefix. The output is deterministic for a given input order.
pub fn render_diagnostics(
    diagnostics: &[Diagnostic],
    text_of: impl Fn(&Utf8Path) -> Option<String>,
) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        let category = match diagnostic.category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };
        let position = diagnostic.file.as_deref().and_then(|file| {
            let span = diagnostic.span?;
            let text = text_of(file)?;
            let pos = LineIndex::new(&text).line_col(span.start);
            Some((file, pos))
        });
        match position {
            Some((file, pos)) => {
                let _ = writeln!(
                    out,
                    "{}({},{}): {} TS{}: {}",
                    file,
                    pos.line + 1,
                    pos.col + 1,
                    category,
                    diagnostic.code,
                    diagnostic.message
                );
            }
            None => {
                let _ = writeln!(out, "{} TS{}: {}", category, diagnostic.code, diagnostic.message);
            }
        }
    }
    out
}
