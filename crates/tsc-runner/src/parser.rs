//! Compiler output parser.
//!
//! With `--pretty false` the compiler prints one diagnostic per line:
//!
//! ```text
//! src/app.ts(10,5): error TS2322: Type 'string' is not assignable to type 'number'.
//! error TS18003: No inputs were found in config file 'tsconfig.json'.
//! ```
//!
//! Everything else on stdout (summaries, progress) is ignored.

use camino::Utf8PathBuf;
use ts_diagnostics::DiagnosticCategory;

/// One diagnostic line as printed by the compiler, before the staged path is
/// mapped back to the original source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDiagnostic {
    /// Path as printed by the compiler, relative to its working directory.
    /// `None` for project-level diagnostics that name no file.
    pub path: Option<Utf8PathBuf>,
    /// 1-indexed line, 0 when the diagnostic names no file.
    pub line: u32,
    /// 1-indexed column, 0 when the diagnostic names no file.
    pub column: u32,
    pub category: DiagnosticCategory,
    pub code: u32,
    pub message: String,
}

/// Parses the compiler's stdout into raw diagnostics, one per matching line.
pub fn parse_compiler_output(output: &str) -> Vec<RawDiagnostic> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<RawDiagnostic> {
    let line = line.trim_end();
    if line.is_empty() {
        return None;
    }

    // Split off the optional `path(line,col): ` location prefix. The location
    // sits in parentheses, so paths containing ':' are unambiguous.
    let (location, rest) = match split_location(line) {
        Some((loc, rest)) => (Some(loc), rest),
        None => (None, line),
    };

    let (category, rest) = if let Some(rest) = rest.strip_prefix("error TS") {
        (DiagnosticCategory::Error, rest)
    } else if let Some(rest) = rest.strip_prefix("warning TS") {
        (DiagnosticCategory::Warning, rest)
    } else if let Some(rest) = rest.strip_prefix("message TS") {
        (DiagnosticCategory::Message, rest)
    } else {
        return None;
    };

    let colon = rest.find(':')?;
    let code: u32 = rest[..colon].parse().ok()?;
    let message = rest[colon + 1..].trim().to_string();

    let (path, line_num, column) = match location {
        Some((path, line_num, column)) => (Some(path), line_num, column),
        None => (None, 0, 0),
    };

    Some(RawDiagnostic {
        path,
        line: line_num,
        column,
        category,
        code,
        message,
    })
}

/// Splits `path(line,col): rest` into its pieces. Returns `None` when the
/// line carries no location prefix.
fn split_location(line: &str) -> Option<((Utf8PathBuf, u32, u32), &str)> {
    let sep = line.find("): ")?;
    let open = line[..sep].rfind('(')?;
    let path = &line[..open];
    if path.is_empty() {
        return None;
    }
    let (line_num, column) = line[open + 1..sep].split_once(',')?;
    let line_num: u32 = line_num.trim().parse().ok()?;
    let column: u32 = column.trim().parse().ok()?;
    Some(((Utf8PathBuf::from(path), line_num, column), &line[sep + 3..]))
}
