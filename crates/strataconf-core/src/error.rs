//! Error types for strataconf
//!
//! Errors are structured: every error carries its kind, the dotted key it
//! concerns, the file it came from when known, and an actionable help message.

use std::fmt;

/// Result type alias for strataconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for strataconf operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Dotted key the error concerns (e.g., "database.port")
    pub path: Option<String>,
    /// Source location (file, line) if available
    pub source_location: Option<SourceLocation>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Location in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl SourceLocation {
    /// A location that only names the file
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            column: None,
        }
    }
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// Bad constructor input or malformed key
    #[error("Invalid argument")]
    InvalidArgument,
    /// The defaults document does not exist
    #[error("Default file missing. Expected path is: {path}")]
    MissingDefaults { path: String },
    /// A file that must exist (the command-line config file) does not
    #[error("File not found: {path}")]
    FileNotFound { path: String },
    /// Malformed YAML/JSON content
    #[error("Parse error")]
    Parse,
    /// A file exists but could not be read
    #[error("I/O error")]
    Io,
    /// Dotted lookup did not resolve
    #[error("Could not find configuration for \"{key}\".")]
    KeyNotFound { key: String },
    /// An override names a key that the defaults do not define (strict mode)
    #[error("Key is not defined in defaults: {key}")]
    UnknownKey { key: String },
    /// An override would change a mapping into a scalar or the reverse (strict mode)
    #[error("Override changes the shape of '{key}'")]
    ShapeMismatch { key: String },
    /// Attempt to add a key to a shape-locked mapping
    #[error("Cannot add '{key}': configuration shape is locked")]
    ShapeLocked { key: String },
    /// Attempt to reassign or remove a key in a value-locked mapping
    #[error("Cannot modify '{key}': configuration values are locked")]
    ValueLocked { key: String },
    /// Typed getter could not convert the value
    #[error("Type coercion failed")]
    TypeCoercion,
}

impl Error {
    fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            source_location: None,
            help: None,
            cause: None,
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::InvalidArgument)
        }
    }

    /// Create a missing defaults error
    pub fn missing_defaults(path: impl Into<String>) -> Self {
        Self {
            help: Some(
                "Every setting must be declared in the defaults file; create it or pass its location explicitly"
                    .into(),
            ),
            ..Self::from_kind(ErrorKind::MissingDefaults { path: path.into() })
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self {
            help: Some("Check the path given with --config".into()),
            ..Self::from_kind(ErrorKind::FileNotFound { path: path.into() })
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::Parse)
        }
    }

    /// Create an I/O error for a file that exists but could not be read
    pub fn io(file: impl Into<String>, err: &std::io::Error) -> Self {
        Self {
            source_location: Some(SourceLocation::file(file)),
            cause: Some(err.to_string()),
            ..Self::from_kind(ErrorKind::Io)
        }
    }

    /// Create a key not found error
    pub fn key_not_found(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            path: Some(key.clone()),
            help: Some(format!(
                "Declare '{}' in the defaults file before reading it",
                key
            )),
            ..Self::from_kind(ErrorKind::KeyNotFound { key })
        }
    }

    /// Create an unknown key error
    pub fn unknown_key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            path: Some(key.clone()),
            help: Some("Add the key to the defaults file or remove it from the override".into()),
            ..Self::from_kind(ErrorKind::UnknownKey { key })
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            path: Some(key.clone()),
            help: Some("Overrides must keep mappings as mappings and scalars as scalars".into()),
            ..Self::from_kind(ErrorKind::ShapeMismatch { key })
        }
    }

    /// Create a shape locked error
    pub fn shape_locked(key: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::ShapeLocked { key: key.into() })
    }

    /// Create a value locked error
    pub fn value_locked(key: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::ValueLocked { key: key.into() })
    }

    /// Create a type coercion error
    pub fn type_coercion(
        path: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        Self {
            path: Some(path.into()),
            help: Some(format!(
                "Ensure the value can be converted to {}",
                expected.into()
            )),
            cause: Some(format!("Got: {}", got.into())),
            ..Self::from_kind(ErrorKind::TypeCoercion)
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add source location to the error
    pub fn with_source_location(mut self, loc: SourceLocation) -> Self {
        self.source_location = Some(loc);
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        if let Some(loc) = &self.source_location {
            write!(f, "\n  File: {}", loc.file)?;
            if let Some(line) = loc.line {
                write!(f, ":{}", line)?;
            }
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
