//! Per-file TypeScript compilation orchestrator.
//!
//! The public entry point is [`Compiler::compile`], called once per file by a
//! host test runner. Depending on configuration it either routes the file
//! through a long-lived, incrementally synchronized type-checking program
//! (backed by an external `tsc`/`tsgo` process) or through the stateless
//! isolated transpiler, filters the resulting diagnostics, and returns
//! generated code plus a source map that always references the original
//! input path and text.

pub mod backend;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod output;
pub mod program;
pub mod registry;

pub use backend::TscProgramBackend;
pub use compiler::{Compiler, CompileResult};
pub use config::{CompilerConfig, CompilerOptions, ConfigError, DiagnosticsConfig};
pub use error::CompileError;
pub use program::{BackendError, EmitOutput, ProgramBackend, ProgramManager};
pub use registry::{FileSnapshot, SourceFileRegistry};
