//! The compile error taxonomy.
//!
//! Every failing compile surfaces one aggregate error. Diagnostic-carrying
//! variants hold the surviving diagnostics plus a deterministic rendering of
//! them, so callers can either pattern-match on the records or print the
//! message as-is.

use crate::program::BackendError;
use camino::Utf8PathBuf;
use source_map::SourceMapError;
use ts_diagnostics::{render_diagnostics, Diagnostic};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Parse-level failure, fatal in both modes and never filtered.
    #[error("{rendered}")]
    Syntactic {
        diagnostics: Vec<Diagnostic>,
        rendered: String,
    },

    /// Type-checking failure in full-program mode that survived filtering.
    #[error("{rendered}")]
    Semantic {
        diagnostics: Vec<Diagnostic>,
        rendered: String,
    },

    /// The configuration rejects the request before any compilation runs,
    /// e.g. a JS input without `allowJs`.
    #[error("{rendered}")]
    Configuration {
        diagnostics: Vec<Diagnostic>,
        rendered: String,
    },

    /// Compilation succeeded but produced no output artifact for the file.
    #[error("no output was emitted for {file}")]
    NoEmit { file: Utf8PathBuf },

    /// The backing compiler process itself failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// An emitted source map could not be parsed or re-serialized.
    #[error("invalid source map for {file}: {source}")]
    SourceMap {
        file: Utf8PathBuf,
        source: SourceMapError,
    },
}

impl CompileError {
    pub(crate) fn syntactic(diagnostics: Vec<Diagnostic>, source_text: &str) -> Self {
        let rendered = render_diagnostics(&diagnostics, |_| Some(source_text.to_owned()));
        Self::Syntactic {
            diagnostics,
            rendered,
        }
    }

    pub(crate) fn semantic(diagnostics: Vec<Diagnostic>, source_text: &str) -> Self {
        let rendered = render_diagnostics(&diagnostics, |_| Some(source_text.to_owned()));
        Self::Semantic {
            diagnostics,
            rendered,
        }
    }

    pub(crate) fn configuration(diagnostic: Diagnostic) -> Self {
        let rendered = render_diagnostics(std::slice::from_ref(&diagnostic), |_| None);
        Self::Configuration {
            diagnostics: vec![diagnostic],
            rendered,
        }
    }

    /// The diagnostics this error carries, empty for non-diagnostic variants.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Syntactic { diagnostics, .. }
            | Self::Semantic { diagnostics, .. }
            | Self::Configuration { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use source_map::Span;

    #[test]
    fn test_message_renders_from_diagnostics() {
        let text = "const f = (v: number) = v\n";
        let diag = Diagnostic::error(1005, "'=>' expected.")
            .with_location("/p/a.ts", Span::new(23u32, 24u32));
        let err = CompileError::syntactic(vec![diag], text);
        assert_eq!(err.to_string(), "/p/a.ts(1,24): error TS1005: '=>' expected.\n");
        assert_eq!(err.diagnostics().len(), 1);
    }

    #[test]
    fn test_no_emit_message() {
        let err = CompileError::NoEmit {
            file: Utf8PathBuf::from("/p/a.d.ts"),
        };
        assert_eq!(err.to_string(), "no output was emitted for /p/a.d.ts");
        assert!(err.diagnostics().is_empty());
    }
}
