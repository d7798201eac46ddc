//! Ability catalogues: a YAML mapping of ability name to property mapping,
//! with `$ref: parent` inheritance resolved at load time.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::ability::value::render;

pub const DEFAULT_SPELLS_PATH: &str = "data/spells.yaml";
pub const DEFAULT_ITEMS_PATH: &str = "data/magic_items.yaml";

const REF_KEY: &str = "$ref";

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("unable to read catalogue '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse catalogue: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("catalogue root must be a mapping of ability names")]
    NotAMapping,

    #[error("ability name '{0}' is not a string")]
    InvalidName(String),

    #[error("ability '{ability}' must be a mapping of properties")]
    EntryNotAMapping { ability: String },

    #[error("ability '{ability}' has a $ref that is not an ability name")]
    InvalidReference { ability: String },

    #[error("ability '{ability}' has undefined $ref to parent '{parent}'")]
    UndefinedParent { ability: String, parent: String },

    #[error("$ref cycle: {chain}")]
    ReferenceCycle { chain: String },
}

/// Raw property mappings by ability name, inheritance already applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbilityCatalog {
    abilities: BTreeMap<String, Mapping>,
}

impl AbilityCatalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| LoaderError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_yaml_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            abilities = catalog.len(),
            "loaded ability catalogue"
        );
        Ok(catalog)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, LoaderError> {
        let Value::Mapping(root) = serde_yaml::from_str::<Value>(raw)? else {
            return Err(LoaderError::NotAMapping);
        };

        let mut authored = BTreeMap::new();
        for (key, value) in root {
            let Some(name) = key.as_str().map(str::to_string) else {
                return Err(LoaderError::InvalidName(render(&key)));
            };
            let Value::Mapping(properties) = value else {
                return Err(LoaderError::EntryNotAMapping { ability: name });
            };
            authored.insert(name, properties);
        }

        let mut resolved = BTreeMap::new();
        for name in authored.keys() {
            let mut chain = Vec::new();
            inherit(name, &authored, &mut resolved, &mut chain)?;
        }
        Ok(Self {
            abilities: resolved,
        })
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, Mapping)>) -> Self {
        Self {
            abilities: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Mapping> {
        self.abilities.get(name)
    }

    /// A catalogue holding only `name`, if it exists.
    pub fn only(&self, name: &str) -> Option<Self> {
        self.abilities.get(name).map(|properties| Self {
            abilities: BTreeMap::from([(name.to_string(), properties.clone())]),
        })
    }

    /// Abilities in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Mapping)> {
        self.abilities
            .iter()
            .map(|(name, properties)| (name.as_str(), properties))
    }

    pub fn names(&self) -> Vec<&str> {
        self.abilities.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

/// Shallow merge: parent properties first, the child's own override them.
fn inherit(
    name: &str,
    authored: &BTreeMap<String, Mapping>,
    resolved: &mut BTreeMap<String, Mapping>,
    chain: &mut Vec<String>,
) -> Result<Mapping, LoaderError> {
    if let Some(done) = resolved.get(name) {
        return Ok(done.clone());
    }
    if chain.iter().any(|seen| seen == name) {
        chain.push(name.to_string());
        return Err(LoaderError::ReferenceCycle {
            chain: chain.join(" -> "),
        });
    }
    let Some(own) = authored.get(name) else {
        return Err(LoaderError::UndefinedParent {
            ability: chain.last().cloned().unwrap_or_default(),
            parent: name.to_string(),
        });
    };

    let merged = match own.get(REF_KEY) {
        None => own.clone(),
        Some(parent) => {
            let Some(parent) = parent.as_str() else {
                return Err(LoaderError::InvalidReference {
                    ability: name.to_string(),
                });
            };
            chain.push(name.to_string());
            let mut merged = inherit(parent, authored, resolved, chain)?;
            chain.pop();
            for (key, value) in own {
                if key.as_str() != Some(REF_KEY) {
                    merged.insert(key.clone(), value.clone());
                }
            }
            merged
        }
    };

    resolved.insert(name.to_string(), merged.clone());
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_overrides_parent_and_drops_ref() {
        let catalog = AbilityCatalog::from_yaml_str(
            "fireball:\n  damage: high\n  area: medium burst zone\n  range: close\n\
             lesser fireball:\n  $ref: fireball\n  damage: medium\n",
        )
        .unwrap();
        let lesser = catalog.get("lesser fireball").unwrap();
        assert_eq!(lesser.get("damage"), Some(&Value::from("medium")));
        assert_eq!(lesser.get("range"), Some(&Value::from("close")));
        assert!(!lesser.contains_key(REF_KEY));
    }

    #[test]
    fn references_resolve_transitively() {
        let catalog = AbilityCatalog::from_yaml_str(
            "a:\n  damage: low\n  range: close\nb:\n  $ref: a\n  range: medium\nc:\n  $ref: b\n  targets: two\n",
        )
        .unwrap();
        let c = catalog.get("c").unwrap();
        assert_eq!(c.get("damage"), Some(&Value::from("low")));
        assert_eq!(c.get("range"), Some(&Value::from("medium")));
        assert_eq!(c.get("targets"), Some(&Value::from("two")));
    }

    #[test]
    fn undefined_parent_is_reported() {
        let err = AbilityCatalog::from_yaml_str("b:\n  $ref: missing\n  damage: low\n").unwrap_err();
        match err {
            LoaderError::UndefinedParent { ability, parent } => {
                assert_eq!(ability, "b");
                assert_eq!(parent, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cycles_are_rejected() {
        let err = AbilityCatalog::from_yaml_str("a:\n  $ref: b\nb:\n  $ref: a\n").unwrap_err();
        assert!(matches!(err, LoaderError::ReferenceCycle { .. }));
        assert_eq!(err.to_string(), "$ref cycle: a -> b -> a");
    }

    #[test]
    fn only_selects_a_single_ability() {
        let catalog =
            AbilityCatalog::from_yaml_str("a:\n  damage: low\nb:\n  damage: high\n").unwrap();
        assert_eq!(catalog.only("b").unwrap().names(), vec!["b"]);
        assert!(catalog.only("z").is_none());
    }
}
