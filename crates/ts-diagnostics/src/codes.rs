//! Well-known TS diagnostic codes.

/// `';' expected.` and friends. Generic parse error code used when the
/// parser gives no more specific one.
pub const EXPECTED_TOKEN: u32 = 1005;

/// `Import assignment cannot be used when targeting ECMAScript modules.`
pub const IMPORT_ASSIGNMENT_ESM: u32 = 1202;

/// `Export assignment cannot be used when targeting ECMAScript modules.`
pub const EXPORT_ASSIGNMENT_ESM: u32 = 1203;

/// `... cannot be used under --isolatedModules` family. Reported for
/// constructs that need whole-program knowledge, such as instantiated
/// namespaces, when transpiling file by file.
pub const UNSUPPORTED_UNDER_ISOLATED_MODULES: u32 = 1208;

/// `Compiler option '{0}' requires a value of type {1}.` Reported for
/// malformed configuration values, such as an invalid diagnostics pattern.
pub const CONFIG_OPTION_INVALID_VALUE: u32 = 5024;

/// `File has an unsupported extension.`
pub const UNSUPPORTED_EXTENSION: u32 = 6054;

/// `'rootDir' is expected to contain all source files.`
pub const ROOT_DIR_EXPECTED_TO_CONTAIN: u32 = 6059;

/// `File is a JavaScript file. Did you mean to enable the 'allowJs' option?`
pub const JS_FILE_WITHOUT_ALLOW_JS: u32 = 6504;

/// `The 'files' list in config file is empty.`
pub const EMPTY_FILES_LIST: u32 = 18002;

/// `No inputs were found in config file.`
pub const NO_INPUTS_FOUND: u32 = 18003;

/// Codes ignored by default. These fire when checking a single staged
/// file against a project-wide tsconfig and carry no signal about the
/// file itself.
pub const DEFAULT_IGNORED: [u32; 3] = [
    ROOT_DIR_EXPECTED_TO_CONTAIN,
    EMPTY_FILES_LIST,
    NO_INPUTS_FOUND,
];
