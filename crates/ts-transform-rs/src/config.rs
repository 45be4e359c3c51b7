//! Resolved compiler configuration.
//!
//! One immutable [`CompilerConfig`] is constructed per [`Compiler`] instance,
//! either programmatically or from a `tsconfig.json`. Nothing mutates it
//! mid-call.
//!
//! [`Compiler`]: crate::compiler::Compiler

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use ts_transpiler::{JsxMode, ModuleKind, TranspileOptions};

/// Errors from loading or interpreting a tsconfig.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },

    #[error("unsupported module kind {0:?} (expected \"esnext\" or \"commonjs\")")]
    UnsupportedModule(String),

    #[error("unsupported jsx mode {0:?} (expected \"preserve\" or \"react\")")]
    UnsupportedJsx(String),
}

/// The resolved compiler options record, shared by both compilation modes.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    pub module: ModuleKind,
    pub jsx: JsxMode,
    pub jsx_factory: Option<String>,
    pub jsx_fragment_factory: Option<String>,
    /// Target ECMAScript version string, passed through to the external
    /// compiler; the isolated transpiler does not downlevel.
    pub target: Option<String>,
    pub allow_js: bool,
    pub strict: bool,
    /// Staging directory override for the external compiler. `None` means a
    /// stable per-project directory under the user cache dir.
    pub out_dir: Option<Utf8PathBuf>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            module: ModuleKind::EsNext,
            jsx: JsxMode::Preserve,
            jsx_factory: None,
            jsx_fragment_factory: None,
            target: None,
            allow_js: false,
            strict: false,
            out_dir: None,
        }
    }
}

impl CompilerOptions {
    /// The options the isolated transpiler consumes.
    pub fn transpile_options(&self) -> TranspileOptions {
        let mut options = TranspileOptions {
            module: self.module,
            jsx: self.jsx,
            ..TranspileOptions::default()
        };
        if let Some(factory) = &self.jsx_factory {
            options.jsx_factory = factory.clone();
        }
        if let Some(fragment) = &self.jsx_fragment_factory {
            options.jsx_fragment_factory = fragment.clone();
        }
        options
    }

    /// The `compilerOptions` object written into the generated tsconfig.
    pub fn tsconfig_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let module = match self.module {
            ModuleKind::EsNext => "esnext",
            ModuleKind::CommonJs => "commonjs",
        };
        map.insert("module".to_string(), Value::String(module.to_string()));
        let jsx = match self.jsx {
            JsxMode::Preserve => "preserve",
            JsxMode::React => "react",
        };
        map.insert("jsx".to_string(), Value::String(jsx.to_string()));
        if let Some(factory) = &self.jsx_factory {
            map.insert("jsxFactory".to_string(), Value::String(factory.clone()));
        }
        if let Some(fragment) = &self.jsx_fragment_factory {
            map.insert(
                "jsxFragmentFactory".to_string(),
                Value::String(fragment.clone()),
            );
        }
        if let Some(target) = &self.target {
            map.insert("target".to_string(), Value::String(target.clone()));
        }
        map.insert("allowJs".to_string(), Value::Bool(self.allow_js));
        map.insert("strict".to_string(), Value::Bool(self.strict));
        map.insert("skipLibCheck".to_string(), Value::Bool(true));
        map
    }
}

/// Diagnostics reporting configuration for full-program mode.
///
/// `Disabled` suppresses semantic reporting entirely; syntactic diagnostics
/// stay fatal in both settings.
#[derive(Debug, Clone)]
pub enum DiagnosticsConfig {
    Disabled,
    Enabled {
        /// Codes to drop. `None` means the default ignore set.
        ignore_codes: Option<Vec<u32>>,
        /// Only diagnostics in files matching this pattern are reported.
        path_regex: Option<String>,
    },
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self::Enabled {
            ignore_codes: None,
            path_regex: None,
        }
    }
}

/// Immutable per-instance configuration.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub project_root: Utf8PathBuf,
    /// Skip the type-checking program and transpile files in isolation.
    pub isolated_modules: bool,
    pub options: CompilerOptions,
    pub diagnostics: DiagnosticsConfig,
}

impl CompilerConfig {
    /// A default configuration rooted at `project_root`.
    pub fn new(project_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            isolated_modules: false,
            options: CompilerOptions::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }

    /// Loads configuration from a `tsconfig.json`, tolerating JSONC comments.
    pub fn from_tsconfig(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let content = remove_json_comments(&content);
        let raw: RawTsConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_owned(),
                source,
            })?;

        let project_root = path
            .parent()
            .map(|p| p.to_owned())
            .unwrap_or_else(|| Utf8PathBuf::from("."));
        let raw_options = raw.compiler_options;

        let module = match raw_options.module.as_deref() {
            None => ModuleKind::EsNext,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "esnext" | "es2022" | "es2020" | "es2015" | "es6" => ModuleKind::EsNext,
                "commonjs" => ModuleKind::CommonJs,
                other => return Err(ConfigError::UnsupportedModule(other.to_string())),
            },
        };
        let jsx = match raw_options.jsx.as_deref() {
            None | Some("preserve") => JsxMode::Preserve,
            Some("react") => JsxMode::React,
            Some(other) => return Err(ConfigError::UnsupportedJsx(other.to_string())),
        };

        Ok(Self {
            project_root,
            isolated_modules: raw_options.isolated_modules,
            options: CompilerOptions {
                module,
                jsx,
                jsx_factory: raw_options.jsx_factory,
                jsx_fragment_factory: raw_options.jsx_fragment_factory,
                target: raw_options.target,
                allow_js: raw_options.allow_js,
                strict: raw_options.strict,
                out_dir: None,
            },
            diagnostics: DiagnosticsConfig::default(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTsConfig {
    #[serde(default)]
    compiler_options: RawCompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    target: Option<String>,
    module: Option<String>,
    jsx: Option<String>,
    jsx_factory: Option<String>,
    jsx_fragment_factory: Option<String>,
    #[serde(default)]
    allow_js: bool,
    #[serde(default)]
    strict: bool,
    #[serde(default)]
    isolated_modules: bool,
}

/// Removes single-line and multi-line comments from JSON.
fn remove_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '"' {
                in_string = false;
            } else if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
        } else if c == '"' {
            result.push(c);
            in_string = true;
        } else if c == '/' {
            match chars.peek() {
                Some('/') => {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        chars.next();
                    }
                }
                Some('*') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '*' && chars.peek() == Some(&'/') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {
                    result.push(c);
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}
