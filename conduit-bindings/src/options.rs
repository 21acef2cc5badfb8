//! Typed parameter resolution for the bindings.
//!
//! Each binding reads its loosely-typed [`ParameterMap`] into an options
//! struct exactly once. Resolution collects every violation instead of
//! stopping at the first.

use conduit_types::{ErrorCode, Failure, ParameterMap, ValidationResult};
use regex_lite::Regex;
use serde_json::Value;
use std::path::PathBuf;

/// Text encoding for file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Ascii,
}

impl Encoding {
    /// Accepts `utf-8`, `utf8` and `ascii`, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "ascii" | "us-ascii" => Some(Self::Ascii),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "ascii",
        }
    }

    pub fn decode(&self, bytes: Vec<u8>, code: ErrorCode, origin: &str) -> conduit_types::Result<String> {
        if *self == Self::Ascii && !bytes.is_ascii() {
            return Err(Failure::of(code, format!("{origin} is not valid ascii")));
        }
        String::from_utf8(bytes).map_err(|_| Failure::of(code, format!("{origin} is not valid utf-8")))
    }

    pub fn encode<'a>(&self, text: &'a str, code: ErrorCode, target: &str) -> conduit_types::Result<&'a [u8]> {
        if *self == Self::Ascii && !text.is_ascii() {
            return Err(Failure::of(code, format!("content for {target} is not valid ascii")));
        }
        Ok(text.as_bytes())
    }
}

/// Where a file import reads from.
#[derive(Debug, Clone)]
pub enum ImportSource {
    File(PathBuf),
    Directory { path: PathBuf, pattern: FilePattern },
}

/// A `*`/`?` wildcard over file names.
#[derive(Debug, Clone)]
pub struct FilePattern {
    raw: String,
    regex: Regex,
}

impl FilePattern {
    pub fn parse(raw: &str) -> Option<Self> {
        let mut expr = String::from("^");
        for ch in raw.chars() {
            match ch {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex_lite::escape(&other.to_string())),
            }
        }
        expr.push('$');
        Regex::new(&expr).ok().map(|regex| Self {
            raw: raw.to_string(),
            regex,
        })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

#[derive(Debug, Clone)]
pub struct FileImportOptions {
    pub source: ImportSource,
    pub encoding: Encoding,
}

impl FileImportOptions {
    pub fn resolve(parameters: &ParameterMap) -> Result<Self, ValidationResult> {
        let mut violations = ValidationResult::success();
        let encoding = resolve_encoding(parameters, &mut violations);
        let file_path = optional_string(parameters, "FilePath", &mut violations);
        let directory = optional_string(parameters, "Directory", &mut violations);
        let pattern = optional_string(parameters, "FilePattern", &mut violations)
            .unwrap_or_else(|| "*".to_string());

        let source = match (file_path, directory) {
            (Some(_), Some(_)) => {
                violations.add("FilePath", "FilePath and Directory are mutually exclusive");
                None
            }
            (Some(path), None) => Some(ImportSource::File(PathBuf::from(path))),
            (None, Some(dir)) => match FilePattern::parse(&pattern) {
                Some(pattern) => Some(ImportSource::Directory {
                    path: PathBuf::from(dir),
                    pattern,
                }),
                None => {
                    violations.add("FilePattern", format!("invalid file pattern '{pattern}'"));
                    None
                }
            },
            (None, None) => {
                violations.add("FilePath", "either FilePath or Directory is required");
                None
            }
        };

        match (source, violations.is_valid()) {
            (Some(source), true) => Ok(Self { source, encoding }),
            _ => Err(violations),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileExportOptions {
    pub file_path: PathBuf,
    pub append: bool,
    pub encoding: Encoding,
    pub create_directories: bool,
}

impl FileExportOptions {
    pub fn resolve(parameters: &ParameterMap) -> Result<Self, ValidationResult> {
        let mut violations = ValidationResult::success();
        let encoding = resolve_encoding(parameters, &mut violations);
        let append = optional_bool(parameters, "Append", false, &mut violations);
        let create_directories = optional_bool(parameters, "CreateDirectories", true, &mut violations);
        let file_path = optional_string(parameters, "FilePath", &mut violations);
        if file_path.is_none() && !parameters.is_present("FilePath") {
            violations.add("FilePath", "FilePath is required");
        }

        match file_path {
            Some(path) if violations.is_valid() => Ok(Self {
                file_path: PathBuf::from(path),
                append,
                encoding,
                create_directories,
            }),
            _ => Err(violations),
        }
    }
}

/// JSON transformations offered by the JSON processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformationType {
    Minify,
    Prettify,
    Extract,
    Flatten,
}

impl TransformationType {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "minify" => Some(Self::Minify),
            "prettify" => Some(Self::Prettify),
            "extract" => Some(Self::Extract),
            "flatten" => Some(Self::Flatten),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonProcessOptions {
    pub transformation: TransformationType,
    /// JSON pointer, required by `Extract`.
    pub path: Option<String>,
}

impl JsonProcessOptions {
    pub fn resolve(parameters: &ParameterMap) -> Result<Self, ValidationResult> {
        let mut violations = ValidationResult::success();
        let path = optional_string(parameters, "Path", &mut violations);
        if let Some(p) = &path {
            if !p.is_empty() && !p.starts_with('/') {
                violations.add("Path", format!("'{p}' is not a JSON pointer"));
            }
        }

        let transformation = match optional_string(parameters, "TransformationType", &mut violations) {
            None => {
                if !parameters.is_present("TransformationType") {
                    violations.add("TransformationType", "TransformationType is required");
                }
                None
            }
            Some(name) => {
                let parsed = TransformationType::parse(&name);
                if parsed.is_none() {
                    violations.add(
                        "TransformationType",
                        format!("unsupported transformation '{name}'"),
                    );
                }
                parsed
            }
        };
        if transformation == Some(TransformationType::Extract) && path.is_none() {
            violations.add("Path", "Path is required for Extract");
        }

        match transformation {
            Some(transformation) if violations.is_valid() => Ok(Self { transformation, path }),
            _ => Err(violations),
        }
    }
}

/// Reads `key` as a non-blank string. A present value of another shape is a
/// violation.
fn optional_string(parameters: &ParameterMap, key: &str, violations: &mut ValidationResult) -> Option<String> {
    match parameters.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::String(_)) => {
            violations.add(key, format!("{key} must not be empty"));
            None
        }
        Some(_) => {
            violations.add(key, format!("{key} must be a string"));
            None
        }
    }
}

fn optional_bool(parameters: &ParameterMap, key: &str, default: bool, violations: &mut ValidationResult) -> bool {
    if !parameters.is_present(key) {
        return default;
    }
    parameters.get_bool(key).unwrap_or_else(|| {
        violations.add(key, format!("{key} must be true or false"));
        default
    })
}

fn resolve_encoding(parameters: &ParameterMap, violations: &mut ValidationResult) -> Encoding {
    match optional_string(parameters, "Encoding", violations) {
        None => Encoding::default(),
        Some(name) => Encoding::parse(&name).unwrap_or_else(|| {
            violations.add("Encoding", format!("unsupported encoding '{name}'"));
            Encoding::default()
        }),
    }
}

/// Collapses an options resolution into the validation verdict.
pub(crate) fn verdict<T>(resolved: Result<T, ValidationResult>) -> ValidationResult {
    match resolved {
        Ok(_) => ValidationResult::success(),
        Err(violations) => violations,
    }
}

/// Resolves options inside a hook, turning violations into a failure.
pub(crate) fn resolved<T>(resolved: Result<T, ValidationResult>) -> conduit_types::Result<T> {
    resolved.or_else(|violations| {
        violations.into_result(ErrorCode::ParameterError)?;
        Err(Failure::of(ErrorCode::ParameterError, "invalid parameters"))
    })
}
