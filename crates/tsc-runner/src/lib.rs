//! tsc process runner for full type-checked compilation.
//!
//! This crate drives an external TypeScript compiler binary (`tsc`, or the
//! Go-based `tsgo` when available) to type-check and emit registry snapshots.
//! Sources are staged into a stable out-of-tree directory with content-compare
//! writes so the compiler's incremental build info stays valid between runs,
//! then the binary is invoked synchronously with a generated tsconfig and its
//! diagnostic output is parsed back into [`ts_diagnostics::Diagnostic`]s.

mod parser;
mod runner;

pub use parser::{parse_compiler_output, RawDiagnostic};
pub use runner::{
    EmitArtifacts, StagedFile, StagingStats, TscCheckOutput, TscError, TscRunner, TSC_PATH_ENV,
};
