//! Diagnostic types, well-known codes, and reporting filters.

mod diagnostic;
mod filter;
mod render;

pub mod codes;

pub use diagnostic::{Diagnostic, DiagnosticCategory};
pub use filter::DiagnosticFilter;
pub use render::render_diagnostics;
