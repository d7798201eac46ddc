//! Structured per-property breakdown of a level, for reporting tools.

use serde::Serialize;

use crate::ability::property::PropertyName;
use crate::ability::record::AbilityRecord;
use crate::ability::value::render;
use crate::engine::level::Evaluator;
use crate::engine::validate::ValidationDiagnostic;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub name: String,
    pub level: f64,
    pub spell_level: f64,
    pub modifiers: Vec<PropertyModifier>,
    /// Filled for the top-level ability only; nested records report through it.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ValidationDiagnostic>,
}

impl Explanation {
    pub fn modifier(&self, property: PropertyName) -> Option<&PropertyModifier> {
        self.modifiers
            .iter()
            .find(|entry| entry.property == property.as_str())
    }

    /// Properties that differ from their declared default.
    pub fn non_default(&self) -> impl Iterator<Item = &PropertyModifier> {
        self.modifiers.iter().filter(|entry| !entry.is_default)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyModifier {
    pub property: String,
    /// Inline rendering of the normalized value.
    pub value: String,
    pub modifier: f64,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchLevel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subabilities: Vec<Explanation>,
}

/// One attack branch: its own level and the level after shared effects
/// were folded in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchLevel {
    pub branch: String,
    pub raw: f64,
    pub folded: f64,
    pub explanation: Explanation,
}

impl Evaluator<'_> {
    /// Level and per-property breakdown of an already built record.
    pub fn explain_record(&self, record: &AbilityRecord) -> Result<Explanation> {
        let defaults = &self.settings().defaults;
        let mut level = 0.0;
        let mut modifiers = Vec::new();

        for property in record.properties.present() {
            let modifier = self.modifier(record, property)?;
            level += modifier;

            let value = record.properties.value(property).unwrap_or_default();
            let branches = match property {
                PropertyName::AttackSubeffects => {
                    let (levels, explained) = self.attack(record)?;
                    explained
                        .iter()
                        .map(|(branch, explanation)| BranchLevel {
                            branch: branch.to_string(),
                            raw: explanation.level,
                            folded: levels.folded(*branch).unwrap_or(explanation.level),
                            explanation: explanation.clone(),
                        })
                        .collect()
                }
                _ => Vec::new(),
            };
            let subabilities = match property {
                PropertyName::Subeffects => self.subabilities(record)?.to_vec(),
                _ => Vec::new(),
            };

            modifiers.push(PropertyModifier {
                property: property.to_string(),
                is_default: defaults.is_default(property, &value),
                value: render(&value),
                modifier,
                branches,
                subabilities,
            });
        }

        for (name, value) in &record.unknown_properties {
            let modifier = self.unknown_modifier(name, value)?;
            level += modifier;
            modifiers.push(PropertyModifier {
                property: name.clone(),
                value: render(value),
                modifier,
                is_default: false,
                branches: Vec::new(),
                subabilities: Vec::new(),
            });
        }

        tracing::debug!(ability = %record.name, level, "explained ability");
        Ok(Explanation {
            name: record.name.clone(),
            level,
            spell_level: level - self.settings().level_offset,
            modifiers,
            warnings: Vec::new(),
        })
    }
}
