//! Configuration sources
//!
//! Where settings come from on disk: the [`FileSource`] that answers "does
//! this exist" and "read it", the document [`Format`]s understood, and the
//! ordered [`PathSpec`] of candidate files a loader walks.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result, SourceLocation};
use crate::value::Value;

/// Filesystem access used by the loader
pub trait FileSource: Send + Sync {
    /// Whether `path` names an existing file
    fn exists(&self, path: &Path) -> bool;

    /// Read the whole file as UTF-8 text
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;
}

/// The local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl FileSource for LocalFiles {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Structured document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick the format from the file extension; anything but `.json` is YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Parse document text into a settings tree
///
/// An empty document parses to `Value::Null`. `origin` names the document in
/// error locations.
pub fn parse_document(text: &str, format: Format, origin: &str) -> Result<Value> {
    match format {
        Format::Yaml => {
            let mut raw: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| {
                Error::parse(e.to_string()).with_source_location(SourceLocation {
                    file: origin.to_string(),
                    line: e.location().map(|l| l.line()),
                    column: e.location().map(|l| l.column()),
                })
            })?;
            // resolve `<<: *anchor` merge keys
            raw.apply_merge().map_err(|e| {
                Error::parse(e.to_string()).with_source_location(SourceLocation::file(origin))
            })?;
            serde_yaml::from_value(raw).map_err(|e| {
                Error::parse(e.to_string())
                    .with_source_location(SourceLocation::file(origin))
                    .with_help("Mapping keys must be strings")
            })
        }
        Format::Json => {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(text).map_err(|e| {
                Error::parse(e.to_string()).with_source_location(SourceLocation {
                    file: origin.to_string(),
                    line: Some(e.line()),
                    column: Some(e.column()),
                })
            })
        }
    }
}

/// Read and parse one file
pub fn load_document(files: &dyn FileSource, path: &Path) -> Result<Value> {
    let origin = path.display().to_string();
    let text = files
        .read_to_string(path)
        .map_err(|e| Error::io(&origin, &e))?;
    parse_document(&text, Format::from_path(path), &origin)
}

/// One candidate configuration file and how its absence is treated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSpec {
    /// The defaults document - error if not found
    Defaults(PathBuf),
    /// An override that may be absent - silently skipped
    Optional(PathBuf),
    /// An override that must exist - error if not found
    Required(PathBuf),
}

impl FileSpec {
    /// Get the path for this file spec
    pub fn path(&self) -> &Path {
        match self {
            FileSpec::Defaults(p) | FileSpec::Optional(p) | FileSpec::Required(p) => p,
        }
    }

    /// Check if this file spec is optional
    pub fn is_optional(&self) -> bool {
        matches!(self, FileSpec::Optional(_))
    }

    /// Short label for listings
    pub fn role(&self) -> &'static str {
        match self {
            FileSpec::Defaults(_) => "defaults",
            FileSpec::Optional(_) => "optional",
            FileSpec::Required(_) => "required",
        }
    }
}

/// Ordered candidate files, lowest precedence first
///
/// The first entry is always the defaults document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpec {
    files: Vec<FileSpec>,
}

impl PathSpec {
    /// Start a spec with its defaults document
    pub fn new(defaults: impl Into<PathBuf>) -> Self {
        Self {
            files: vec![FileSpec::Defaults(defaults.into())],
        }
    }

    /// Append an override that may be absent
    pub fn optional(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(FileSpec::Optional(path.into()));
        self
    }

    /// Append an override that must exist
    pub fn required(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(FileSpec::Required(path.into()));
        self
    }

    pub fn defaults(&self) -> &Path {
        self.files[0].path()
    }

    /// Every override, in the order they are merged
    pub fn overrides(&self) -> &[FileSpec] {
        &self.files[1..]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileSpec> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    // never empty; the defaults entry is always present
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<'a> IntoIterator for &'a PathSpec {
    type Item = &'a FileSpec;
    type IntoIter = std::slice::Iter<'a, FileSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}
