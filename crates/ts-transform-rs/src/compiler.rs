//! The compile orchestrator.

use crate::backend::TscProgramBackend;
use crate::config::{CompilerConfig, DiagnosticsConfig};
use crate::error::CompileError;
use crate::program::{BackendError, ProgramBackend, ProgramManager};
use crate::registry::SourceFileRegistry;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use source_map::SourceMapJson;
use ts_diagnostics::{codes, Diagnostic, DiagnosticFilter};
use ts_transpiler::{output_file_name, transpile, FileKind};

/// The outcome of one successful compile call.
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// The generated JavaScript.
    pub code: String,
    /// The JSON source map, referencing the original path and text.
    pub source_map_text: String,
    /// Warnings and suggestions that passed the filter. Errors never appear
    /// here; they fail the call instead.
    pub diagnostics: Vec<Diagnostic>,
}

/// The public entry point: compiles one file per call, routing it through
/// the type-checking program or the isolated transpiler per configuration.
///
/// One instance owns its registry and program state exclusively. Calls are
/// synchronous and must not overlap.
#[derive(Debug)]
pub struct Compiler<B = TscProgramBackend> {
    config: CompilerConfig,
    /// `None` means `diagnostics: false` (semantic reporting suppressed).
    filter: Option<DiagnosticFilter>,
    registry: SourceFileRegistry,
    /// Absent in isolated mode, which never consults a backend.
    program: Option<ProgramManager<B>>,
}

impl Compiler<TscProgramBackend> {
    /// Builds a compiler with the production backend. In isolated mode no
    /// backend is constructed and no external binary is required.
    pub fn new(config: CompilerConfig) -> Result<Self, CompileError> {
        let program = if config.isolated_modules {
            None
        } else {
            Some(ProgramManager::new(TscProgramBackend::new(&config)?))
        };
        Self::build(config, program)
    }
}

impl<B: ProgramBackend> Compiler<B> {
    /// Builds a compiler over a caller-supplied backend.
    pub fn with_backend(config: CompilerConfig, backend: B) -> Result<Self, CompileError> {
        let program = Some(ProgramManager::new(backend));
        Self::build(config, program)
    }

    fn build(
        config: CompilerConfig,
        program: Option<ProgramManager<B>>,
    ) -> Result<Self, CompileError> {
        let filter = match &config.diagnostics {
            DiagnosticsConfig::Disabled => None,
            DiagnosticsConfig::Enabled {
                ignore_codes,
                path_regex,
            } => {
                let pattern = path_regex
                    .as_deref()
                    .map(Regex::new)
                    .transpose()
                    .map_err(|e| {
                        CompileError::configuration(Diagnostic::error(
                            codes::CONFIG_OPTION_INVALID_VALUE,
                            format!("Compiler option 'diagnostics.pathRegex' requires a valid pattern: {e}"),
                        ))
                    })?;
                let ignore = ignore_codes
                    .clone()
                    .unwrap_or_else(|| codes::DEFAULT_IGNORED.to_vec());
                Some(DiagnosticFilter::new(ignore, pattern))
            }
        };
        Ok(Self {
            config,
            filter,
            registry: SourceFileRegistry::new(),
            program,
        })
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn registry(&self) -> &SourceFileRegistry {
        &self.registry
    }

    /// Compiles one file.
    ///
    /// Registers `source_text` in the registry, produces code and a source
    /// map whose `sources` is exactly `[file_path]` and `sourcesContent`
    /// exactly `[source_text]`, and fails with an aggregate [`CompileError`]
    /// when reportable error diagnostics survive filtering.
    pub fn compile(
        &mut self,
        source_text: &str,
        file_path: &str,
    ) -> Result<CompileResult, CompileError> {
        let path = self.normalize_path(file_path);

        let Some(kind) = FileKind::from_path(path.as_str()) else {
            return Err(CompileError::configuration(Diagnostic::error(
                codes::UNSUPPORTED_EXTENSION,
                format!("File '{path}' has an unsupported extension."),
            )));
        };
        if !kind.is_typescript() && !self.config.options.allow_js {
            return Err(CompileError::configuration(Diagnostic::error(
                codes::JS_FILE_WITHOUT_ALLOW_JS,
                format!("File '{path}' is a JavaScript file. Did you mean to enable the 'allowJs' option?"),
            )));
        }

        // The only write path into the registry.
        self.registry.update(&path, source_text);

        if self.config.isolated_modules {
            self.compile_isolated(source_text, &path, kind)
        } else {
            self.compile_program(source_text, &path)
        }
    }

    /// Isolated mode: single-file transpile, no semantic phase. Any
    /// diagnostic the transpiler reports is fatal.
    fn compile_isolated(
        &self,
        source_text: &str,
        path: &Utf8Path,
        kind: FileKind,
    ) -> Result<CompileResult, CompileError> {
        let options = self.config.options.transpile_options();
        let result = transpile(source_text, kind, &options);
        if !result.diagnostics.is_empty() {
            let diagnostics = result
                .diagnostics
                .into_iter()
                .map(|mut d| {
                    if d.file.is_none() {
                        d.file = Some(path.to_owned());
                    }
                    d
                })
                .collect();
            return Err(CompileError::syntactic(diagnostics, source_text));
        }

        let file = output_file_name(path.as_str(), options.jsx);
        let map =
            SourceMapJson::from_table(&result.mappings, source_text, &result.code, file, path.as_str());
        let source_map_text = map.to_json_string().map_err(|source| CompileError::SourceMap {
            file: path.to_owned(),
            source,
        })?;

        Ok(CompileResult {
            code: result.code,
            source_map_text,
            diagnostics: Vec::new(),
        })
    }

    /// Full-program mode: synchronize, collect diagnostics, filter, emit.
    fn compile_program(
        &mut self,
        source_text: &str,
        path: &Utf8Path,
    ) -> Result<CompileResult, CompileError> {
        let program = self.program.as_mut().ok_or_else(|| {
            BackendError::Unavailable("compiler was built without a type-checking backend".into())
        })?;
        program.synchronize(&self.registry)?;

        let (syntactic, semantic): (Vec<Diagnostic>, Vec<Diagnostic>) = program
            .diagnostics_for(path)?
            .into_iter()
            .partition(|d| d.is_syntactic());
        if !syntactic.is_empty() {
            return Err(CompileError::syntactic(syntactic, source_text));
        }

        let mut semantic = semantic;
        match &self.filter {
            Some(filter) => filter.retain_reportable(&mut semantic),
            None => semantic.clear(),
        }
        let (errors, warnings): (Vec<Diagnostic>, Vec<Diagnostic>) =
            semantic.into_iter().partition(|d| d.is_error());
        if !errors.is_empty() {
            // One aggregate failure carrying everything that survived.
            let mut surviving = errors;
            surviving.extend(warnings);
            return Err(CompileError::semantic(surviving, source_text));
        }

        let output = program.output(path)?.ok_or_else(|| CompileError::NoEmit {
            file: path.to_owned(),
        })?;

        let file = output_file_name(path.as_str(), self.config.options.jsx);
        let source_map_text = match output.source_map {
            Some(text) => {
                let mut map =
                    SourceMapJson::parse(&text).map_err(|source| CompileError::SourceMap {
                        file: path.to_owned(),
                        source,
                    })?;
                // The external compiler encodes paths relative to its staging
                // directory; rewrite them to the original input.
                map.normalize(&file, path.as_str(), source_text);
                map.to_json_string().map_err(|source| CompileError::SourceMap {
                    file: path.to_owned(),
                    source,
                })?
            }
            None => {
                let map = SourceMapJson {
                    version: 3,
                    file: Some(file),
                    source_root: None,
                    sources: vec![path.to_string()],
                    sources_content: Some(vec![source_text.to_owned()]),
                    names: Vec::new(),
                    mappings: String::new(),
                };
                map.to_json_string().map_err(|source| CompileError::SourceMap {
                    file: path.to_owned(),
                    source,
                })?
            }
        };

        Ok(CompileResult {
            code: output.code,
            source_map_text,
            diagnostics: warnings,
        })
    }

    fn normalize_path(&self, file_path: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from(file_path.replace('\\', "/"));
        if path.is_absolute() {
            path
        } else {
            self.config.project_root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{EmitOutput, ProgramBackend};
    use crate::registry::FileSnapshot;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct NullBackend;

    impl ProgramBackend for NullBackend {
        fn synchronize(&mut self, _snapshots: &[FileSnapshot]) -> Result<(), BackendError> {
            Ok(())
        }
        fn emit(&mut self, _path: &Utf8Path) -> Result<Option<EmitOutput>, BackendError> {
            Ok(None)
        }
        fn diagnostics(&mut self, _path: &Utf8Path) -> Result<Vec<Diagnostic>, BackendError> {
            Ok(Vec::new())
        }
    }

    fn isolated_config() -> CompilerConfig {
        CompilerConfig {
            isolated_modules: true,
            ..CompilerConfig::new("/project")
        }
    }

    #[test]
    fn test_unsupported_extension_is_configuration_error() {
        let mut compiler = Compiler::with_backend(isolated_config(), NullBackend).unwrap();
        let err = compiler.compile("body {}", "/project/styles.css").unwrap_err();
        assert!(matches!(err, CompileError::Configuration { .. }));
        assert_eq!(err.diagnostics()[0].code, codes::UNSUPPORTED_EXTENSION);
    }

    #[test]
    fn test_js_without_allow_js_is_configuration_error() {
        let mut compiler = Compiler::with_backend(isolated_config(), NullBackend).unwrap();
        let err = compiler.compile("module.exports = 1", "/project/a.js").unwrap_err();
        assert!(matches!(err, CompileError::Configuration { .. }));
        assert_eq!(err.diagnostics()[0].code, codes::JS_FILE_WITHOUT_ALLOW_JS);
    }

    #[test]
    fn test_relative_paths_resolve_against_project_root() {
        let mut compiler = Compiler::with_backend(isolated_config(), NullBackend).unwrap();
        compiler.compile("const a = 1\n", "src/a.ts").unwrap();
        assert!(compiler
            .registry()
            .get(Utf8Path::new("/project/src/a.ts"))
            .is_some());
    }

    #[test]
    fn test_invalid_path_regex_rejected_at_construction() {
        let config = CompilerConfig {
            diagnostics: DiagnosticsConfig::Enabled {
                ignore_codes: None,
                path_regex: Some("[unclosed".to_string()),
            },
            ..CompilerConfig::new("/project")
        };
        let err = Compiler::with_backend(config, NullBackend).unwrap_err();
        assert!(matches!(err, CompileError::Configuration { .. }));
    }
}
