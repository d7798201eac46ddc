//! Process configuration read from `SPELLCOST_*` environment variables.

use std::env;
use std::path::PathBuf;

use crate::data::{DEFAULT_ITEMS_PATH, DEFAULT_MODIFIERS_PATH, DEFAULT_SPELLS_PATH};
use crate::engine::{EngineSettings, DEFAULT_LEVEL_OFFSET};

pub const DEFAULT_LEVELS_OUT_PATH: &str = "levels.yaml";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub modifiers_path: PathBuf,
    pub spells_path: PathBuf,
    pub items_path: PathBuf,
    pub levels_out_path: PathBuf,
    /// 0 means the rayon default (one per core).
    pub workers: usize,
    pub level_offset: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            modifiers_path: PathBuf::from(DEFAULT_MODIFIERS_PATH),
            spells_path: PathBuf::from(DEFAULT_SPELLS_PATH),
            items_path: PathBuf::from(DEFAULT_ITEMS_PATH),
            levels_out_path: PathBuf::from(DEFAULT_LEVELS_OUT_PATH),
            workers: 0,
            level_offset: DEFAULT_LEVEL_OFFSET,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unparseable numbers fall back to their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let path = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);
        Self {
            modifiers_path: path("SPELLCOST_MODIFIERS", defaults.modifiers_path),
            spells_path: path("SPELLCOST_SPELLS", defaults.spells_path),
            items_path: path("SPELLCOST_ITEMS", defaults.items_path),
            levels_out_path: path("SPELLCOST_LEVELS_OUT", defaults.levels_out_path),
            workers: parse_or(lookup("SPELLCOST_WORKERS"), "SPELLCOST_WORKERS", defaults.workers),
            level_offset: parse_or(
                lookup("SPELLCOST_LEVEL_OFFSET"),
                "SPELLCOST_LEVEL_OFFSET",
                defaults.level_offset,
            ),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            level_offset: self.level_offset,
            ..EngineSettings::default()
        }
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %value, "invalid value, defaulting to {default}");
            default
        }),
    }
}
