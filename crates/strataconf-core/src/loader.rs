//! Layered loading
//!
//! A [`Loader`] resolves the candidate files for an application, parses the
//! defaults document, closes its shape, merges every override in increasing
//! precedence, freezes the result and hands it to a [`Config`].
//!
//! Precedence, lowest first:
//! 1. the defaults document (required)
//! 2. each override path in order (skipped when absent)
//! 3. the command-line config file (required when given)
//!
//! Environment variables sit above all of these, at lookup time.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::env::{Environment, ProcessEnv};
use crate::error::{Error, Result, SourceLocation};
use crate::lock::{self, SequencePolicy};
use crate::merge;
use crate::source::{self, FileSource, FileSpec, LocalFiles, PathSpec};
use crate::value::{Table, Value};

/// Defaults document location, relative to the application directory
pub const DEFAULTS_FILE: &str = "config/defaults.yml";

/// Argument-map flag naming the command-line config file
pub const CONFIG_FLAG: &str = "config";

/// Options for locating and merging configuration files
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    /// Application directory; the defaults and local overrides live under it
    pub app_path: Option<PathBuf>,
    /// Explicit defaults document, instead of `<app_path>/config/defaults.yml`
    pub defaults_path: Option<PathBuf>,
    /// Explicit override files, instead of the conventional locations
    pub paths: Option<Vec<PathBuf>>,
    /// Highest-precedence config file; must exist when set
    pub cli_config_path: Option<PathBuf>,
    /// Whether mappings inside sequences are locked
    pub sequence_policy: SequencePolicy,
    /// Fail on override keys the defaults do not define, instead of dropping them
    pub strict: bool,
}

impl ConfigOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.app_path = Some(path.into());
        self
    }

    pub fn with_defaults_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.defaults_path = Some(path.into());
        self
    }

    pub fn with_paths<P: Into<PathBuf>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
        self.paths = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_cli_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cli_config_path = Some(path.into());
        self
    }

    pub fn with_sequence_policy(mut self, policy: SequencePolicy) -> Self {
        self.sequence_policy = policy;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// What a loader is constructed from
///
/// `Paths` is the bare list form: the first path is the defaults document,
/// the rest are optional overrides in increasing precedence.
#[derive(Debug, Clone)]
pub enum LoadSpec {
    Paths(Vec<PathBuf>),
    Options(ConfigOptions),
}

impl From<ConfigOptions> for LoadSpec {
    fn from(options: ConfigOptions) -> Self {
        LoadSpec::Options(options)
    }
}

impl<P: Into<PathBuf>> From<Vec<P>> for LoadSpec {
    fn from(paths: Vec<P>) -> Self {
        LoadSpec::Paths(paths.into_iter().map(Into::into).collect())
    }
}

impl<P: AsRef<Path>> From<&[P]> for LoadSpec {
    fn from(paths: &[P]) -> Self {
        LoadSpec::Paths(paths.iter().map(|p| p.as_ref().to_path_buf()).collect())
    }
}

impl<P: Into<PathBuf>, const N: usize> From<[P; N]> for LoadSpec {
    fn from(paths: [P; N]) -> Self {
        LoadSpec::Paths(paths.into_iter().map(Into::into).collect())
    }
}

/// Conventional override locations for an application, in increasing precedence
pub fn conventional_paths(app_name: &str, app_path: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("/etc").join(app_name).join("config.yml"),
        PathBuf::from("/private/etc").join(app_name).join("config.yml"),
    ];
    if let Some(app_path) = app_path {
        paths.push(app_path.join("config").join("config.yml"));
        paths.push(app_path.join("config.yml"));
    }
    paths
}

/// Builds a locked [`Config`] from layered files
#[derive(Clone)]
pub struct Loader {
    app_name: String,
    defaults: PathBuf,
    options: ConfigOptions,
    files: Arc<dyn FileSource>,
    env: Arc<dyn Environment>,
}

impl Loader {
    /// Validate the inputs and prepare a loader
    ///
    /// Fails with `InvalidArgument` when the app name is empty, when a bare
    /// path list is empty, or when options give neither an application
    /// directory nor a defaults path.
    pub fn new(app_name: impl Into<String>, spec: impl Into<LoadSpec>) -> Result<Self> {
        let app_name = app_name.into();
        if app_name.trim().is_empty() {
            return Err(Error::invalid_argument(
                "app name must be provided as a non-empty string",
            ));
        }

        let options = match spec.into() {
            LoadSpec::Options(options) => options,
            LoadSpec::Paths(paths) => {
                let mut paths = paths.into_iter();
                let defaults = paths
                    .next()
                    .ok_or_else(|| Error::invalid_argument("\"paths\" contains no items"))?;
                ConfigOptions {
                    defaults_path: Some(defaults),
                    paths: Some(paths.collect()),
                    ..ConfigOptions::default()
                }
            }
        };

        let defaults = match (&options.defaults_path, &options.app_path) {
            (Some(path), _) => path.clone(),
            (None, Some(app_path)) => app_path.join(DEFAULTS_FILE),
            (None, None) => {
                return Err(Error::invalid_argument(
                    "either app_path or defaults_path must be set",
                )
                .with_help("Pass the application directory with ConfigOptions::with_app_path"));
            }
        };

        Ok(Self {
            app_name,
            defaults,
            options,
            files: Arc::new(LocalFiles),
            env: Arc::new(ProcessEnv),
        })
    }

    /// Read files through `files` instead of the local filesystem
    pub fn with_file_source(mut self, files: impl FileSource + 'static) -> Self {
        self.files = Arc::new(files);
        self
    }

    /// Give the loaded config `env` for lookup-time overrides
    pub fn with_environment(mut self, env: impl Environment + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Take the command-line config file from a parsed flag map
    ///
    /// Only the `config` flag is read; an empty value is ignored.
    pub fn with_cli_args(mut self, args: &HashMap<String, String>) -> Self {
        if let Some(path) = args.get(CONFIG_FLAG).filter(|p| !p.is_empty()) {
            self.options.cli_config_path = Some(PathBuf::from(path));
        }
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    /// Every candidate file, lowest precedence first
    pub fn path_spec(&self) -> PathSpec {
        let overrides = match &self.options.paths {
            Some(paths) => paths.clone(),
            None => conventional_paths(&self.app_name, self.options.app_path.as_deref()),
        };

        let mut spec = PathSpec::new(&self.defaults);
        for path in overrides {
            spec = spec.optional(path);
        }
        if let Some(cli) = &self.options.cli_config_path {
            spec = spec.required(cli);
        }
        spec
    }

    /// Load, merge and lock
    ///
    /// Reads happen in precedence order. Either the whole tree is built and
    /// locked or an error is returned.
    pub fn load(&self) -> Result<Config> {
        let spec = self.path_spec();
        let policy = self.options.sequence_policy;
        let mut sources: HashMap<String, String> = HashMap::new();

        let defaults_origin = spec.defaults().display().to_string();
        let mut tree = self.load_defaults(spec.defaults())?;
        for leaf in tree.leaf_paths() {
            sources.insert(leaf, defaults_origin.clone());
        }

        // Everything must be declared in the defaults from here on
        lock::lock_shape(&mut tree, policy);

        for file in spec.overrides() {
            let path = file.path();
            if !self.files.exists(path) {
                if file.is_optional() {
                    log::debug!("Skipping missing config file {}", path.display());
                    continue;
                }
                return Err(Error::file_not_found(path.display().to_string()));
            }

            self.merge_file(&mut tree, file, &mut sources)?;
        }

        lock::lock_values(&mut tree, policy);

        log::debug!(
            "Loaded configuration for {} from {} file(s)",
            self.app_name,
            spec.len()
        );
        Ok(Config::from_parts(tree, sources, Arc::clone(&self.env)))
    }

    fn load_defaults(&self, path: &Path) -> Result<Value> {
        if !self.files.exists(path) {
            return Err(Error::missing_defaults(path.display().to_string()));
        }

        log::debug!("Loading defaults from {}", path.display());
        match source::load_document(self.files.as_ref(), path)? {
            Value::Null => Ok(Value::Mapping(Table::new())),
            tree @ Value::Mapping(_) => Ok(tree),
            other => Err(Error::parse(format!(
                "defaults document must be a mapping, found {}",
                other.type_name()
            ))
            .with_source_location(SourceLocation::file(path.display().to_string()))),
        }
    }

    fn merge_file(
        &self,
        tree: &mut Value,
        file: &FileSpec,
        sources: &mut HashMap<String, String>,
    ) -> Result<()> {
        let path = file.path();
        let origin = path.display().to_string();
        log::debug!("Merging {} config file {}", file.role(), origin);

        let document = source::load_document(self.files.as_ref(), path)?;
        if !document.is_null() && !document.is_mapping() {
            if self.options.strict {
                return Err(Error::parse(format!(
                    "config document must be a mapping, found {}",
                    document.type_name()
                ))
                .with_source_location(SourceLocation::file(origin)));
            }
            log::warn!("Ignoring {}: document is a {}", origin, document.type_name());
            return Ok(());
        }

        let report = merge::merge_into(tree, document);

        if self.options.strict {
            if let Some(key) = report.dropped.first() {
                return Err(Error::unknown_key(key).with_source_location(SourceLocation::file(origin)));
            }
            if let Some(key) = report.rejected.first() {
                return Err(
                    Error::shape_mismatch(key).with_source_location(SourceLocation::file(origin))
                );
            }
        }
        for key in &report.dropped {
            log::warn!("Ignoring '{}' from {}: not defined in defaults", key, origin);
        }
        for key in &report.rejected {
            log::warn!("Ignoring '{}' from {}: would change its shape", key, origin);
        }

        for key in report.applied {
            sources.insert(key, origin.clone());
        }
        Ok(())
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("app_name", &self.app_name)
            .field("defaults", &self.defaults)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
