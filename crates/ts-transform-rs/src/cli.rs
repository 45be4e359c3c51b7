//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};

/// Per-file TypeScript compiler with type-checked and isolated modes.
#[derive(Debug, Parser)]
#[command(name = "ts-transform-rs")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Files to compile
    #[arg(required = true)]
    pub files: Vec<Utf8PathBuf>,

    /// Path to tsconfig.json
    #[arg(long)]
    pub project: Option<Utf8PathBuf>,

    /// Transpile each file in isolation, skipping type-checking
    #[arg(long = "isolated-modules")]
    pub isolated_modules: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Print the source map after each compiled file
    #[arg(long = "emit-map")]
    pub emit_map: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output, one object per file
    Json,
}
