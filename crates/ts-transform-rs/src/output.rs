//! Output formatting for the CLI.

use crate::cli::OutputFormat;
use crate::compiler::CompileResult;
use crate::error::CompileError;
use camino::Utf8Path;
use serde::Serialize;
use ts_diagnostics::{render_diagnostics, Diagnostic};

/// One file's outcome in JSON output mode.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    file: &'a Utf8Path,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_map: Option<&'a str>,
    diagnostics: &'a [Diagnostic],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Formats compile outcomes for the terminal.
pub struct Formatter {
    format: OutputFormat,
    emit_map: bool,
}

impl Formatter {
    pub fn new(format: OutputFormat, emit_map: bool) -> Self {
        Self { format, emit_map }
    }

    /// Formats a successful compile.
    pub fn success(&self, file: &Utf8Path, source: &str, result: &CompileResult) -> String {
        match self.format {
            OutputFormat::Human => {
                let mut out = String::new();
                if !result.diagnostics.is_empty() {
                    out.push_str(&render_diagnostics(&result.diagnostics, |_| {
                        Some(source.to_owned())
                    }));
                }
                out.push_str(&result.code);
                if !result.code.ends_with('\n') {
                    out.push('\n');
                }
                if self.emit_map {
                    out.push_str(&result.source_map_text);
                    out.push('\n');
                }
                out
            }
            OutputFormat::Json => {
                let report = JsonReport {
                    file,
                    ok: true,
                    code: Some(&result.code),
                    source_map: self.emit_map.then_some(result.source_map_text.as_str()),
                    diagnostics: &result.diagnostics,
                    error: None,
                };
                to_json_line(&report)
            }
        }
    }

    /// Formats a failed compile.
    pub fn failure(&self, file: &Utf8Path, error: &CompileError) -> String {
        match self.format {
            OutputFormat::Human => {
                let message = error.to_string();
                if message.ends_with('\n') {
                    message
                } else {
                    format!("{message}\n")
                }
            }
            OutputFormat::Json => {
                let report = JsonReport {
                    file,
                    ok: false,
                    code: None,
                    source_map: None,
                    diagnostics: error.diagnostics(),
                    error: Some(error.to_string()),
                };
                to_json_line(&report)
            }
        }
    }
}

fn to_json_line(report: &JsonReport<'_>) -> String {
    let mut line = serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string());
    line.push('\n');
    line
}
