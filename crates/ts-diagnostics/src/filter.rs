//! Reporting filter applied to semantic diagnostics.

use crate::codes;
use crate::Diagnostic;
use regex::Regex;
use rustc_hash::FxHashSet;

/// Decides which semantic diagnostics are reported.
///
/// The filter is pure: it never mutates diagnostics, it only answers
/// whether a given one should be surfaced. Syntactic diagnostics are not
/// routed through it.
#[derive(Debug, Clone)]
pub struct DiagnosticFilter {
    ignore_codes: FxHashSet<u32>,
    path_pattern: Option<Regex>,
}

impl Default for DiagnosticFilter {
    fn default() -> Self {
        Self::new(codes::DEFAULT_IGNORED, None)
    }
}

impl DiagnosticFilter {
    /// Creates a filter from the codes to ignore and an optional path
    /// pattern restricting which files get diagnostics reported at all.
    pub fn new(ignore_codes: impl IntoIterator<Item = u32>, path_pattern: Option<Regex>) -> Self {
        Self {
            ignore_codes: ignore_codes.into_iter().collect(),
            path_pattern,
        }
    }

    /// Returns true if `diagnostic` should be reported.
    ///
    /// A diagnostic is dropped when its code is ignored, or when a path
    /// pattern is configured and the diagnostic's file does not match it.
    /// Diagnostics without a file are never dropped by the path pattern.
    pub fn is_reportable(&self, diagnostic: &Diagnostic) -> bool {
        if self.ignore_codes.contains(&diagnostic.code) {
            return false;
        }
        match (&self.path_pattern, &diagnostic.file) {
            (Some(pattern), Some(file)) => pattern.is_match(file.as_str()),
            _ => true,
        }
    }

    /// Retains only the reportable diagnostics.
    pub fn retain_reportable(&self, diagnostics: &mut Vec<Diagnostic>) {
        diagnostics.retain(|d| self.is_reportable(d));
    }
}
