//! Production program backend wrapping the external compiler.

use crate::config::CompilerConfig;
use crate::program::{BackendError, EmitOutput, ProgramBackend};
use crate::registry::FileSnapshot;
use camino::Utf8Path;
use ts_diagnostics::Diagnostic;
use tsc_runner::{StagedFile, TscRunner};

/// A [`ProgramBackend`] that stages snapshots and shells out to `tsc`/`tsgo`.
///
/// Each synchronization is one compiler run over the full root set; the
/// runner's content-compare staging and the compiler's own incremental build
/// info keep repeat runs cheap. Diagnostics from the last run are retained
/// and served per file.
#[derive(Debug)]
pub struct TscProgramBackend {
    runner: TscRunner,
    diagnostics: Vec<Diagnostic>,
}

impl TscProgramBackend {
    /// Discovers a compiler binary and prepares a runner for `config`.
    pub fn new(config: &CompilerConfig) -> Result<Self, BackendError> {
        let tsc_path = TscRunner::find_tsc(Some(&config.project_root)).ok_or_else(|| {
            BackendError::Unavailable(format!(
                "no tsc or tsgo binary found; install one or set {}",
                tsc_runner::TSC_PATH_ENV
            ))
        })?;
        let runner = TscRunner::new(
            tsc_path,
            config.project_root.clone(),
            config.options.out_dir.clone(),
            config.options.tsconfig_map(),
        )?;
        Ok(Self {
            runner,
            diagnostics: Vec::new(),
        })
    }
}

impl ProgramBackend for TscProgramBackend {
    fn synchronize(&mut self, snapshots: &[FileSnapshot]) -> Result<(), BackendError> {
        let files: Vec<StagedFile<'_>> = snapshots
            .iter()
            .map(|s| StagedFile {
                path: &s.path,
                text: &s.text,
            })
            .collect();
        let output = self.runner.check(&files)?;
        self.diagnostics = output.diagnostics;
        Ok(())
    }

    fn emit(&mut self, path: &Utf8Path) -> Result<Option<EmitOutput>, BackendError> {
        let artifacts = self.runner.emitted(path)?;
        Ok(artifacts.map(|a| EmitOutput {
            code: a.code,
            source_map: a.source_map,
            declaration: a.declaration,
        }))
    }

    fn diagnostics(&mut self, path: &Utf8Path) -> Result<Vec<Diagnostic>, BackendError> {
        Ok(self
            .diagnostics
            .iter()
            .filter(|d| match &d.file {
                Some(file) => file == path,
                None => true,
            })
            .cloned()
            .collect())
    }
}
