//! Environment overrides
//!
//! A dotted key maps to one variable name: uppercase the key and replace
//! every `.` with `__`, so `parent.string` is shadowed by `PARENT__STRING`.
//! The environment is consulted on every lookup.

use std::collections::HashMap;

/// Source of environment variables
pub trait Environment: Send + Sync {
    /// Value bound to `name`, if any
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed, in-memory environment
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable (builder style)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Environment variable name that shadows a dotted key
pub fn var_name(key: &str) -> String {
    key.to_uppercase().replace('.', "__")
}

/// Non-empty override for `key`, if the environment has one
pub fn lookup(env: &dyn Environment, key: &str) -> Option<String> {
    let name = var_name(key);
    match env.var(&name) {
        Some(value) if !value.is_empty() => {
            log::trace!("{} overridden by ${}", key, name);
            Some(value)
        }
        _ => None,
    }
}
