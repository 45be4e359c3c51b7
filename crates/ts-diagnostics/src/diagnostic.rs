//! Diagnostic types.

use camino::Utf8PathBuf;
use serde::Serialize;
use source_map::Span;

/// A diagnostic produced by the checker or the transpiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The numeric TS diagnostic code, e.g. 2322.
    pub code: u32,
    /// The severity category.
    pub category: DiagnosticCategory,
    /// The diagnostic message.
    pub message: String,
    /// The file the diagnostic points at, if any. Options-level
    /// diagnostics carry no file.
    pub file: Option<Utf8PathBuf>,
    /// The source location within `file`, if known.
    pub span: Option<Span>,
}

impl Diagnostic {
    /// Creates an error diagnostic with no location.
    pub fn error(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            category: DiagnosticCategory::Error,
            message: message.into(),
            file: None,
            span: None,
        }
    }

    /// Attaches a file and span to this diagnostic.
    pub fn with_location(mut self, file: impl Into<Utf8PathBuf>, span: Span) -> Self {
        self.file = Some(file.into());
        self.span = Some(span);
        self
    }

    /// Sets the severity category.
    pub fn with_category(mut self, category: DiagnosticCategory) -> Self {
        self.category = category;
        self
    }

    /// Returns true if this is a syntactic diagnostic.
    ///
    /// TS reserves the 1xxx code range for parse errors. Syntactic
    /// diagnostics are always fatal and never subject to filtering.
    #[inline]
    pub fn is_syntactic(&self) -> bool {
        (1000..2000).contains(&self.code)
    }

    /// Returns true if this diagnostic is an error.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

/// Diagnostic severity, mirroring the TS `DiagnosticCategory` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    /// Informational message.
    Message,
    /// A suggested improvement.
    Suggestion,
    /// A warning that does not block emit.
    Warning,
    /// An error.
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_syntactic_range() {
        assert!(Diagnostic::error(1005, "';' expected.").is_syntactic());
        assert!(Diagnostic::error(1999, "x").is_syntactic());
        assert!(!Diagnostic::error(2322, "Type mismatch.").is_syntactic());
        assert!(!Diagnostic::error(6059, "rootDir").is_syntactic());
    }

    #[test]
    fn test_with_location() {
        let diag = Diagnostic::error(2322, "Type 'number' is not assignable to type 'string'.")
            .with_location("src/foo.ts", Span::new(10u32, 14u32));
        assert_eq!(diag.file.as_deref().map(|p| p.as_str()), Some("src/foo.ts"));
        assert!(diag.is_error());
    }
}
