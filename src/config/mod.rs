//! Configuration module for flowproc
//!
//! Every process is constructed from a [`Config`] snapshot: a flat, ordered
//! map of string keys to string-encoded values. Nested blocks are expressed
//! with `:` in the key (`detector:threshold`), which is also how nested TOML
//! tables are flattened when a snapshot is loaded from a file.
//!
//! The per-process view of those values is the [`ConfigRegistry`]: it knows
//! which keys exist, their defaults, and whether they may change after
//! initialization.
//!
//! # Example
//!
//! ```ignore
//! use flowproc::config::Config;
//!
//! let config = Config::from_toml_str(r#"
//!     _name = "reader"
//!     _type = "video_reader"
//!
//!     [decoder]
//!     threads = 4
//! "#)?;
//!
//! assert_eq!(config.get_value::<u32>("decoder:threads")?, 4);
//! ```

pub mod registry;

pub use registry::{ConfInfo, ConfigRegistry};

use crate::error::{FlowError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

/// Key holding the process name within its graph.
pub const CONFIG_NAME: &str = "_name";

/// Key holding the process type.
pub const CONFIG_TYPE: &str = "_type";

/// Separator between nested block names in a key.
pub const BLOCK_SEP: &str = ":";

/// Prefix of the config keys backing static input ports.
pub const STATIC_INPUT_PREFIX: &str = "static/";

/// Name used when a snapshot carries no `_name`.
pub const DEFAULT_PROCESS_NAME: &str = "(unnamed)";

/// Type used when a snapshot carries no `_type`.
pub const DEFAULT_PROCESS_TYPE: &str = "(unknown)";

/// Immutable-by-convention configuration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    values: BTreeMap<String, String>,
}

impl Config {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a snapshot carrying the two reserved identity keys.
    pub fn for_process(name: impl Into<String>, process_type: impl Into<String>) -> Self {
        let mut config = Self::new();
        config.set_value(CONFIG_NAME, name.into());
        config.set_value(CONFIG_TYPE, process_type.into());
        config
    }

    /// Builder-style setter.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set_value(key, value);
        self
    }

    /// Raw string value for `key`, if present.
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Typed lookup. Fails if the key is absent or the value does not parse.
    pub fn get_value<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self
            .get_raw(key)
            .ok_or_else(|| FlowError::UnknownConfigKey(key.to_string()))?;
        parse_value(key, raw)
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    pub fn unset_value(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn has_value(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// All keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Extract the keys under `block`, with the `block:` prefix removed.
    pub fn subblock(&self, block: &str) -> Config {
        let prefix = format!("{block}{BLOCK_SEP}");
        let values = self
            .values
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(prefix.as_str())
                    .map(|rest| (rest.to_string(), v.clone()))
            })
            .collect();
        Config { values }
    }

    /// Overlay `other` onto this snapshot. Keys in `other` win.
    pub fn merge(&mut self, other: &Config) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    /// Parse a TOML document, flattening nested tables into `a:b` keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(text)?;
        let mut config = Config::new();
        flatten_table("", &table, &mut config)?;
        Ok(config)
    }

    /// Load a snapshot from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(FlowError::from)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

impl FromIterator<(String, String)> for Config {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Config {
            values: iter.into_iter().collect(),
        }
    }
}

/// Convert a stored string into `T`, reporting the key on failure.
pub(crate) fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>()
        .map_err(|e| FlowError::BadValueConversion {
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut Config) -> Result<()> {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{BLOCK_SEP}{key}")
        };
        match value {
            toml::Value::Table(inner) => flatten_table(&full_key, inner, out)?,
            toml::Value::String(s) => out.set_value(full_key, s),
            toml::Value::Integer(i) => out.set_value(full_key, i),
            toml::Value::Float(f) => out.set_value(full_key, f),
            toml::Value::Boolean(b) => out.set_value(full_key, b),
            toml::Value::Datetime(d) => out.set_value(full_key, d),
            toml::Value::Array(_) => {
                return Err(FlowError::Config(format!(
                    "arrays are not supported as configuration values (key '{full_key}')"
                )));
            }
        }
    }
    Ok(())
}
