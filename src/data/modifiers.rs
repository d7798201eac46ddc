//! Modifier table: the nested lookup from property values to level modifiers.
//! Loaded once from YAML and shared read-only between evaluations.

use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::ability::value::{render, single_entry};
use crate::error::ConfigurationError;

pub const DEFAULT_MODIFIERS_PATH: &str = "data/modifiers.yaml";

const ROOT_TABLE: &str = "<root>";

#[derive(Debug, Clone, PartialEq)]
pub struct ModifierTable {
    root: Mapping,
}

impl ModifierTable {
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigurationError> {
        match serde_yaml::from_str::<Value>(raw)? {
            Value::Mapping(root) => Ok(Self { root }),
            _ => Err(ConfigurationError::NotAMapping),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_yaml_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            categories = table.root.len(),
            "loaded modifier table"
        );
        Ok(table)
    }

    /// Resolve `value` under `category`. A single-key mapping value such as
    /// `{normal: low}` descends one sub-table per wrapping key.
    pub fn resolve(&self, category: &str, value: &Value) -> Result<f64, ConfigurationError> {
        self.lookup(category, &[], value)
    }

    /// Descend through the fixed sub-table names in `path`, then resolve
    /// `value` there.
    pub fn lookup(
        &self,
        category: &str,
        path: &[&str],
        value: &Value,
    ) -> Result<f64, ConfigurationError> {
        let mut node = self
            .root
            .get(category)
            .ok_or_else(|| ConfigurationError::MissingKey {
                key: category.to_string(),
                table: ROOT_TABLE.to_string(),
            })?;
        let mut table = category.to_string();
        for key in path {
            node = child(node, &Value::String((*key).to_string()), &table)?;
            table.push('.');
            table.push_str(key);
        }
        descend(node, value, table)
    }
}

fn child<'a>(node: &'a Value, key: &Value, table: &str) -> Result<&'a Value, ConfigurationError> {
    let Value::Mapping(entries) = node else {
        return Err(ConfigurationError::NotATable {
            key: render(key),
            table: table.to_string(),
        });
    };
    entries.get(key).ok_or_else(|| ConfigurationError::MissingKey {
        key: render(key),
        table: table.to_string(),
    })
}

fn descend(node: &Value, value: &Value, table: String) -> Result<f64, ConfigurationError> {
    match value {
        Value::Mapping(wrapper) => {
            let Some((key, inner)) = single_entry(wrapper) else {
                return Err(ConfigurationError::AmbiguousValue {
                    value: render(value),
                    table,
                });
            };
            let next = child(node, key, &table)?;
            descend(next, inner, format!("{table}.{}", render(key)))
        }
        _ => {
            let terminal = child(node, value, &table)?;
            terminal.as_f64().ok_or_else(|| ConfigurationError::NotNumeric {
                table: format!("{table}.{}", render(value)),
            })
        }
    }
}
