// Environment variable loading

use crate::{ConfigError, Result};
use std::env;
use std::fmt;
use std::str::FromStr;

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Environment variable loader
///
/// Keys passed to the `load_*` methods are upper-cased and joined to the
/// prefix with `_`, so `EnvLoader::new(Some("BANYAN")).load_var("port")`
/// reads `BANYAN_PORT`. Empty values count as unset.
pub struct EnvLoader {
    prefix: Option<String>,
    lookup: Lookup,
}

impl EnvLoader {
    /// Create a loader over the process environment
    pub fn new(prefix: Option<&str>) -> Self {
        Self::with_lookup(prefix, |key| env::var(key).ok())
    }

    /// Create a loader over an arbitrary lookup function
    pub fn with_lookup<F>(prefix: Option<&str>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            prefix: prefix.map(str::to_string),
            lookup: Box::new(lookup),
        }
    }

    /// Full variable name for a key
    pub fn full_key(&self, key: &str) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }

    /// Read a variable by its exact name, ignoring the prefix
    pub fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    /// Read an optional variable
    pub fn get(&self, key: &str) -> Option<String> {
        self.raw(&self.full_key(key))
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        self.get(key)
            .ok_or_else(|| ConfigError::Missing(self.full_key(key)))
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Load and parse an optional variable
    pub fn parse_var<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::invalid(&self.full_key(key), &value, e.to_string())),
            None => Ok(None),
        }
    }

    /// Load an optional boolean flag (`1/true/yes/on`, `0/false/no/off`)
    pub fn load_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            Some(value) => parse_bool(&value)
                .map(Some)
                .ok_or_else(|| ConfigError::invalid(&self.full_key(key), &value, "expected a boolean")),
            None => Ok(None),
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for EnvLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvLoader")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
