//! Main Config type for strataconf
//!
//! The Config type is the read side of a loaded settings tree: dotted
//! lookups with environment overrides, typed getters, and exports.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::env::{self, Environment, ProcessEnv};
use crate::error::{Error, Result};
use crate::loader::{LoadSpec, Loader};
use crate::lock::{self, SequencePolicy};
use crate::source::{self, Format};
use crate::value::{Table, Value};

/// A loaded, locked configuration
///
/// Cloning is cheap; clones share the tree.
pub struct Config {
    /// The file-derived settings tree
    raw: Arc<Value>,
    /// Source file for each leaf path
    source_map: Arc<HashMap<String, String>>,
    /// Consulted before the tree on every `get`
    env: Arc<dyn Environment>,
}

impl Config {
    pub(crate) fn from_parts(
        raw: Value,
        source_map: HashMap<String, String>,
        env: Arc<dyn Environment>,
    ) -> Self {
        Self {
            raw: Arc::new(raw),
            source_map: Arc::new(source_map),
            env,
        }
    }

    /// Load the configuration for `app_name`
    ///
    /// Shorthand for `Loader::new(app_name, spec)?.load()`.
    pub fn load(app_name: impl Into<String>, spec: impl Into<LoadSpec>) -> Result<Self> {
        Loader::new(app_name, spec)?.load()
    }

    /// Build a locked configuration from a YAML string
    ///
    /// The document plays the part of the defaults: its keys are the only
    /// ones that can be read.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut raw = match source::parse_document(yaml, Format::Yaml, "<string>")? {
            Value::Null => Value::Mapping(Table::new()),
            tree @ Value::Mapping(_) => tree,
            other => {
                return Err(Error::parse(format!(
                    "configuration root must be a mapping, found {}",
                    other.type_name()
                )))
            }
        };
        lock::lock_values(&mut raw, SequencePolicy::default());
        Ok(Self::from_parts(raw, HashMap::new(), Arc::new(ProcessEnv)))
    }

    /// Replace the environment consulted on lookups
    pub fn with_environment(mut self, env: impl Environment + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Get a value by dotted key
    ///
    /// A non-empty environment variable named after the key (uppercase, `.`
    /// replaced by `__`) wins over the tree and is returned as a string.
    /// Otherwise the key must exist in the tree.
    pub fn get(&self, key: &str) -> Result<Value> {
        crate::value::parse_key(key)?;
        if let Some(value) = env::lookup(self.env.as_ref(), key) {
            return Ok(Value::String(value));
        }
        self.raw.get_path(key).cloned()
    }

    /// Get the file-derived value at a key, ignoring the environment
    pub fn get_raw(&self, key: &str) -> Result<&Value> {
        self.raw.get_path(key)
    }

    /// Get a string value, with type coercion if needed
    pub fn get_string(&self, key: &str) -> Result<String> {
        let value = self.get(key)?;
        match value {
            Value::String(s) => Ok(s),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok("null".to_string()),
            _ => Err(Error::type_coercion(key, "string", value.type_name())),
        }
    }

    /// Get an integer value, with type coercion if needed
    pub fn get_i64(&self, key: &str) -> Result<i64> {
        let value = self.get(key)?;
        match value {
            Value::Integer(i) => Ok(i),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::type_coercion(key, "integer", format!("string (\"{}\")", s))),
            _ => Err(Error::type_coercion(key, "integer", value.type_name())),
        }
    }

    /// Get a float value, with type coercion if needed
    pub fn get_f64(&self, key: &str) -> Result<f64> {
        let value = self.get(key)?;
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::type_coercion(key, "float", format!("string (\"{}\")", s))),
            _ => Err(Error::type_coercion(key, "float", value.type_name())),
        }
    }

    /// Get a boolean value
    ///
    /// Strings coerce only from `true` or `false`, in any case.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get(key)?;
        match value {
            Value::Bool(b) => Ok(b),
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(Error::type_coercion(
                    key,
                    "boolean",
                    format!("string (\"{}\") - only \"true\" or \"false\" allowed", s),
                )),
            },
            _ => Err(Error::type_coercion(key, "boolean", value.type_name())),
        }
    }

    /// Whether the tree defines `key`
    ///
    /// The environment is not consulted: a variable cannot make an
    /// undeclared key exist.
    pub fn contains(&self, key: &str) -> bool {
        self.raw.get_path(key).is_ok()
    }

    /// Every leaf key in the tree, in document order
    pub fn keys(&self) -> Vec<String> {
        self.raw.leaf_paths()
    }

    /// Attempt to change a value
    ///
    /// A loaded tree is locked, so this fails with `ShapeLocked` for a key
    /// the defaults do not declare and `ValueLocked` for one they do.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        Arc::make_mut(&mut self.raw).set_path(key, value)
    }

    /// Export the file-derived tree
    pub fn to_value(&self) -> Value {
        (*self.raw).clone()
    }

    /// Export the file-derived tree as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self.raw.as_ref()).map_err(|e| Error::parse(e.to_string()))
    }

    /// Export the file-derived tree as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self.raw.as_ref()).map_err(|e| Error::parse(e.to_string()))
    }

    /// Get the source file for a leaf key
    ///
    /// For merged configs, this returns the file that last set the value.
    pub fn get_source(&self, key: &str) -> Option<&str> {
        self.source_map.get(key).map(|s| s.as_str())
    }

    /// Get all source mappings
    pub fn dump_sources(&self) -> &HashMap<String, String> {
        &self.source_map
    }
}

impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            raw: Arc::clone(&self.raw),
            source_map: Arc::clone(&self.source_map),
            env: Arc::clone(&self.env),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("raw", &self.raw)
            .field("sources", &self.source_map.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    const YAML: &str = r#"
parent:
  string: string
  boolean: true
  nullable: value
database:
  host: localhost
  port: 5432
  ratio: 0.5
servers: [a, b]
"#;

    fn config() -> Config {
        Config::from_yaml(YAML).unwrap().with_environment(MapEnv::new())
    }

    #[test]
    fn test_get_scalars_and_mappings() {
        let config = config();

        assert_eq!(config.get("database.host").unwrap().as_str(), Some("localhost"));
        assert_eq!(config.get("database.port").unwrap().as_i64(), Some(5432));

        let parent = config.get("parent").unwrap();
        let parent = parent.as_mapping().unwrap();
        assert_eq!(parent.len(), 3);
        assert_eq!(parent.get("boolean"), Some(&Value::Bool(true)));

        let servers = config.get("servers").unwrap();
        assert_eq!(servers, Value::from(vec!["a", "b"]));
    }

    #[test]
    fn test_missing_key_names_first_unresolved_segment() {
        let config = config();

        let err = config.get("does.not.exist").unwrap_err();
        assert_eq!(err.kind, ErrorKind::KeyNotFound { key: "does".into() });
        assert_eq!(err.path.as_deref(), Some("does"));

        let err = config.get("parent.missing.deeper").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::KeyNotFound {
                key: "parent.missing".into()
            }
        );

        // descending through a scalar
        let err = config.get("parent.string.inner").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::KeyNotFound {
                key: "parent.string.inner".into()
            }
        );
    }

    #[test]
    fn test_malformed_keys() {
        let config = config();
        for key in ["", ".", "parent.", ".parent", "parent..string"] {
            let err = config.get(key).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidArgument, "key {:?}", key);
        }
    }

    #[test]
    fn test_environment_overrides_tree() {
        let config = Config::from_yaml(YAML)
            .unwrap()
            .with_environment(MapEnv::new().with("PARENT__STRING", "env-value"));

        assert_eq!(config.get("parent.string").unwrap(), Value::from("env-value"));
        assert_eq!(config.get_raw("parent.string").unwrap().as_str(), Some("string"));
        // siblings untouched
        assert_eq!(config.get("parent.boolean").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_environment_override_for_mapping_key() {
        let config = Config::from_yaml(YAML)
            .unwrap()
            .with_environment(MapEnv::new().with("DATABASE", "flat"));

        assert_eq!(config.get("database").unwrap(), Value::from("flat"));
        assert_eq!(config.get("database.host").unwrap().as_str(), Some("localhost"));
    }

    #[test]
    fn test_empty_environment_value_is_ignored() {
        let config = Config::from_yaml(YAML)
            .unwrap()
            .with_environment(MapEnv::new().with("PARENT__STRING", ""));

        assert_eq!(config.get("parent.string").unwrap().as_str(), Some("string"));
    }

    #[test]
    fn test_environment_is_read_on_every_lookup() {
        let key = "STRATACONF_CONFIG_TEST__VALUE";
        let config = Config::from_yaml("strataconf_config_test:\n  value: file\n").unwrap();

        assert_eq!(config.get_string("strataconf_config_test.value").unwrap(), "file");
        std::env::set_var(key, "process");
        assert_eq!(config.get_string("strataconf_config_test.value").unwrap(), "process");
        std::env::remove_var(key);
        assert_eq!(config.get_string("strataconf_config_test.value").unwrap(), "file");
    }

    #[test]
    fn test_typed_getters_coerce_environment_strings() {
        let config = Config::from_yaml(YAML).unwrap().with_environment(
            MapEnv::new()
                .with("DATABASE__PORT", "6543")
                .with("DATABASE__RATIO", "0.75")
                .with("PARENT__BOOLEAN", "FALSE"),
        );

        assert_eq!(config.get_i64("database.port").unwrap(), 6543);
        assert_eq!(config.get_f64("database.ratio").unwrap(), 0.75);
        assert!(!config.get_bool("parent.boolean").unwrap());
        assert_eq!(config.get_string("database.port").unwrap(), "6543");
    }

    #[test]
    fn test_strict_boolean_coercion() {
        let config = Config::from_yaml(YAML)
            .unwrap()
            .with_environment(MapEnv::new().with("PARENT__BOOLEAN", "1"));

        let err = config.get_bool("parent.boolean").unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeCoercion);
    }

    #[test]
    fn test_type_coercion_failures() {
        let config = config();

        assert_eq!(
            config.get_i64("parent.string").unwrap_err().kind,
            ErrorKind::TypeCoercion
        );
        assert_eq!(config.get_string("servers").unwrap_err().kind, ErrorKind::TypeCoercion);
        assert_eq!(config.get_f64("database.port").unwrap(), 5432.0);
    }

    #[test]
    fn test_contains_and_keys() {
        let config = Config::from_yaml(YAML)
            .unwrap()
            .with_environment(MapEnv::new().with("UNDECLARED", "x"));

        assert!(config.contains("database.host"));
        assert!(config.contains("parent"));
        assert!(!config.contains("undeclared"));
        assert_eq!(
            config.keys(),
            vec![
                "parent.string",
                "parent.boolean",
                "parent.nullable",
                "database.host",
                "database.port",
                "database.ratio",
                "servers",
            ]
        );
    }

    #[test]
    fn test_set_fails_on_locked_tree() {
        let mut config = config();

        let err = config.set("database.host", Value::from("other")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueLocked { key: "host".into() });
        assert_eq!(err.path.as_deref(), Some("database.host"));

        let err = config.set("database.user", Value::from("admin")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ShapeLocked { key: "user".into() });

        assert_eq!(config.get_string("database.host").unwrap(), "localhost");
    }

    #[test]
    fn test_set_does_not_affect_clones() {
        let config = config();
        let mut copy = config.clone();

        assert!(copy.set("database.host", Value::from("other")).is_err());
        assert_eq!(config.get_string("database.host").unwrap(), "localhost");
    }

    #[test]
    fn test_exports() {
        let config = Config::from_yaml("a: 1\nb:\n  c: [x]\n").unwrap();

        let yaml: Value = serde_yaml::from_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(yaml, config.to_value());
        let json: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"a": 1, "b": {"c": ["x"]}}));
        assert_eq!(config.to_value().get_path("b.c").unwrap(), &Value::from(vec!["x"]));
    }

    #[test]
    fn test_from_yaml_edge_cases() {
        let empty = Config::from_yaml("").unwrap();
        assert!(empty.keys().is_empty());

        let err = Config::from_yaml("- a\n- b\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);

        assert!(empty.get_source("anything").is_none());
        assert!(empty.dump_sources().is_empty());
    }

    #[test]
    fn test_config_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Config>();
    }
}
