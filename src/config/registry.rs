//! Per-process configuration registry.
//!
//! A process declares each key it understands together with a default, a
//! description, and whether the key is tunable. Lookups resolve against the
//! construction snapshot first and fall back to the declared default.
//! Values never change after construction except through
//! [`ConfigRegistry::reconfigure`], which only touches tunable keys.

use crate::config::{parse_value, Config};
use crate::error::{FlowError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

/// Information about a declared configuration key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfInfo {
    /// String-encoded default value.
    pub default: String,
    pub description: String,
    /// Whether the value may change after initialization.
    pub tunable: bool,
}

impl ConfInfo {
    pub fn new(default: impl ToString, description: impl Into<String>, tunable: bool) -> Self {
        Self {
            default: default.to_string(),
            description: description.into(),
            tunable,
        }
    }
}

/// Declared keys plus the current values for one process.
#[derive(Debug, Clone)]
pub struct ConfigRegistry {
    infos: BTreeMap<String, Arc<ConfInfo>>,
    values: Config,
}

impl ConfigRegistry {
    /// Create a registry over a construction snapshot. No keys are declared yet.
    pub fn new(snapshot: Config) -> Self {
        Self {
            infos: BTreeMap::new(),
            values: snapshot,
        }
    }

    /// Declare `key`. Each key may be declared once.
    pub fn declare(&mut self, key: impl Into<String>, info: ConfInfo) -> Result<()> {
        let key = key.into();
        if self.infos.contains_key(&key) {
            return Err(FlowError::DuplicateConfigKey(key));
        }
        self.infos.insert(key, Arc::new(info));
        Ok(())
    }

    pub fn is_declared(&self, key: &str) -> bool {
        self.infos.contains_key(key)
    }

    /// Current string value: the configured one, else the declared default.
    pub fn value_raw(&self, key: &str) -> Result<&str> {
        let info = self
            .infos
            .get(key)
            .ok_or_else(|| FlowError::UnknownConfigKey(key.to_string()))?;
        Ok(self.values.get_raw(key).unwrap_or(info.default.as_str()))
    }

    /// Typed lookup of a declared key.
    pub fn value<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.value_raw(key)?;
        parse_value(key, raw)
    }

    pub fn info(&self, key: &str) -> Result<Arc<ConfInfo>> {
        self.infos
            .get(key)
            .cloned()
            .ok_or_else(|| FlowError::UnknownConfigKey(key.to_string()))
    }

    /// All declared keys, sorted.
    pub fn available(&self) -> Vec<String> {
        self.infos.keys().cloned().collect()
    }

    /// Declared keys that may change after initialization.
    pub fn available_tunable(&self) -> Vec<String> {
        self.infos
            .iter()
            .filter(|(_, info)| info.tunable)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// The snapshot as currently held, including reconfigured values.
    pub fn snapshot(&self) -> &Config {
        &self.values
    }

    /// Apply the tunable keys of `update`. Returns the keys that changed.
    ///
    /// Undeclared and non-tunable keys are ignored.
    pub fn reconfigure(&mut self, update: &Config) -> Vec<String> {
        let mut applied = Vec::new();
        for (key, value) in update.iter() {
            match self.infos.get(key) {
                Some(info) if info.tunable => {
                    if self.values.get_raw(key) != Some(value) {
                        self.values.set_value(key, value);
                        applied.push(key.to_string());
                    }
                }
                Some(_) => {
                    tracing::debug!("Ignoring reconfiguration of non-tunable key '{}'", key);
                }
                None => {
                    tracing::trace!("Ignoring reconfiguration of undeclared key '{}'", key);
                }
            }
        }
        applied
    }
}
