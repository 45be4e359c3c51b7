//! ts-transform-rs: per-file TypeScript compiler CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;
use ts_transform_rs::cli::Args;
use ts_transform_rs::output::Formatter;
use ts_transform_rs::{Compiler, CompilerConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.project {
        Some(project) => match CompilerConfig::from_tsconfig(project) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => CompilerConfig::new(current_dir()),
    };
    if args.isolated_modules {
        config.isolated_modules = true;
    }

    let mut compiler = match Compiler::new(config) {
        Ok(compiler) => compiler,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let formatter = Formatter::new(args.output, args.emit_map);
    let mut failed = false;

    for file in &args.files {
        let source = match std::fs::read_to_string(file) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("Error: failed to read {file}: {e}");
                failed = true;
                continue;
            }
        };
        match compiler.compile(&source, file.as_str()) {
            Ok(result) => print!("{}", formatter.success(file, &source, &result)),
            Err(e) => {
                print!("{}", formatter.failure(file, &e));
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn current_dir() -> Utf8PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|p| Utf8PathBuf::try_from(p).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}
