//! The canonical ability record: raw property maps are normalized (aliases,
//! defaults) into typed optional fields before anything else looks at them.

use std::cell::{OnceCell, RefCell};
use std::collections::BTreeMap;
use std::str::FromStr;

use serde_yaml::{Mapping, Value};

use crate::ability::attack::{AttackBranch, AttackLevels, AttackSubeffects};
use crate::ability::derived::DerivedProperties;
use crate::ability::property::{PropertyDefaults, PropertyName, SKIP_VALIDATION_KEY};
use crate::ability::value::{is_null_sentinel, render, render_mapping};
use crate::engine::explain::Explanation;
use crate::error::ValidationError;

/// Suffix appended to a parent's name for each nested sub-effect.
pub const SUBABILITY_SUFFIX: &str = "**subability";

#[derive(Debug, Clone, PartialEq)]
pub struct Teleport {
    pub range: Value,
    pub kind: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub condition: Value,
    pub duration: Value,
}

/// One typed slot per known property; `None` means absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    pub attack_subeffects: Option<AttackSubeffects>,
    pub area: Option<String>,
    pub breakable: Option<Value>,
    pub buffs: Option<Vec<Value>>,
    pub casting_time: Option<Value>,
    pub choose_effect: Option<Value>,
    pub components: Option<Value>,
    pub conditions: Option<Vec<Value>>,
    pub damage: Option<Value>,
    pub dispellable: Option<bool>,
    pub duration: Option<Value>,
    pub expended: Option<Value>,
    pub instant_effect: Option<Value>,
    pub knowledge: Option<Value>,
    pub limit_affected: Option<Value>,
    pub misc: Option<f64>,
    pub noncombat: Option<bool>,
    pub range: Option<Value>,
    pub shapeable: Option<Value>,
    pub spell_resistance: Option<Value>,
    pub subeffects: Option<Vec<Mapping>>,
    pub targets: Option<Value>,
    pub teleport: Option<Teleport>,
    pub trigger: Option<Trigger>,
}

impl Properties {
    /// Store `value` in the slot for `name`. The error is a validation message.
    pub fn set(&mut self, name: PropertyName, value: Value) -> Result<(), String> {
        let invalid = || format!("has invalid value '{}' for property '{name}'", render(&value));
        match name {
            PropertyName::AttackSubeffects => {
                let Value::Mapping(branches) = &value else {
                    return Err(invalid());
                };
                self.attack_subeffects = Some(AttackSubeffects::new(branches.clone()));
            }
            PropertyName::Area => {
                let raw = value.as_str().ok_or_else(invalid)?;
                self.area = Some(raw.to_string());
            }
            PropertyName::Breakable => self.breakable = Some(value),
            PropertyName::Buffs => self.buffs = Some(entries(value)),
            PropertyName::CastingTime => self.casting_time = Some(value),
            PropertyName::ChooseEffect => self.choose_effect = Some(value),
            PropertyName::Components => self.components = Some(value),
            PropertyName::Conditions => self.conditions = Some(entries(value)),
            PropertyName::Damage => self.damage = Some(value),
            PropertyName::Dispellable => {
                self.dispellable = Some(value.as_bool().ok_or_else(invalid)?);
            }
            PropertyName::Duration => self.duration = Some(value),
            PropertyName::Expended => self.expended = Some(value),
            PropertyName::InstantEffect => self.instant_effect = Some(value),
            PropertyName::Knowledge => self.knowledge = Some(value),
            PropertyName::LimitAffected => self.limit_affected = Some(value),
            PropertyName::Misc => self.misc = Some(value.as_f64().ok_or_else(invalid)?),
            PropertyName::Noncombat => {
                self.noncombat = Some(value.as_bool().ok_or_else(invalid)?);
            }
            PropertyName::Range => self.range = Some(value),
            PropertyName::Shapeable => self.shapeable = Some(value),
            PropertyName::SpellResistance => self.spell_resistance = Some(value),
            PropertyName::Subeffects => {
                let Value::Sequence(items) = &value else {
                    return Err(invalid());
                };
                let mut subeffects = Vec::with_capacity(items.len());
                for item in items {
                    let Value::Mapping(mapping) = item else {
                        return Err(invalid());
                    };
                    subeffects.push(mapping.clone());
                }
                self.subeffects = Some(subeffects);
            }
            PropertyName::Targets => self.targets = Some(value),
            PropertyName::Teleport => {
                let range = value.get("range").cloned();
                let kind = value.get("type").cloned();
                match (range, kind) {
                    (Some(range), Some(kind)) => self.teleport = Some(Teleport { range, kind }),
                    (None, _) => return Err("has teleport without 'range'".to_string()),
                    (_, None) => return Err("has teleport without 'type'".to_string()),
                }
            }
            PropertyName::Trigger => {
                let condition = value.get("condition").cloned();
                let duration = value.get("duration").cloned();
                match (condition, duration) {
                    (Some(condition), Some(duration)) => {
                        self.trigger = Some(Trigger {
                            condition,
                            duration,
                        })
                    }
                    (None, _) => return Err("has trigger without 'condition'".to_string()),
                    (_, None) => return Err("has trigger without 'duration'".to_string()),
                }
            }
        }
        Ok(())
    }

    pub fn has(&self, name: PropertyName) -> bool {
        self.value(name).is_some()
    }

    /// The stored value for `name`, re-expressed in authoring form.
    pub fn value(&self, name: PropertyName) -> Option<Value> {
        match name {
            PropertyName::AttackSubeffects => self
                .attack_subeffects
                .as_ref()
                .map(|attack| Value::Mapping(attack.as_mapping().clone())),
            PropertyName::Area => self.area.clone().map(Value::String),
            PropertyName::Breakable => self.breakable.clone(),
            PropertyName::Buffs => self.buffs.clone().map(Value::Sequence),
            PropertyName::CastingTime => self.casting_time.clone(),
            PropertyName::ChooseEffect => self.choose_effect.clone(),
            PropertyName::Components => self.components.clone(),
            PropertyName::Conditions => self.conditions.clone().map(Value::Sequence),
            PropertyName::Damage => self.damage.clone(),
            PropertyName::Dispellable => self.dispellable.map(Value::Bool),
            PropertyName::Duration => self.duration.clone(),
            PropertyName::Expended => self.expended.clone(),
            PropertyName::InstantEffect => self.instant_effect.clone(),
            PropertyName::Knowledge => self.knowledge.clone(),
            PropertyName::LimitAffected => self.limit_affected.clone(),
            PropertyName::Misc => self.misc.map(Value::from),
            PropertyName::Noncombat => self.noncombat.map(Value::Bool),
            PropertyName::Range => self.range.clone(),
            PropertyName::Shapeable => self.shapeable.clone(),
            PropertyName::SpellResistance => self.spell_resistance.clone(),
            PropertyName::Subeffects => self
                .subeffects
                .clone()
                .map(|items| Value::Sequence(items.into_iter().map(Value::Mapping).collect())),
            PropertyName::Targets => self.targets.clone(),
            PropertyName::Teleport => self.teleport.as_ref().map(|teleport| {
                let mut mapping = Mapping::new();
                mapping.insert(Value::from("range"), teleport.range.clone());
                mapping.insert(Value::from("type"), teleport.kind.clone());
                Value::Mapping(mapping)
            }),
            PropertyName::Trigger => self.trigger.as_ref().map(|trigger| {
                let mut mapping = Mapping::new();
                mapping.insert(Value::from("condition"), trigger.condition.clone());
                mapping.insert(Value::from("duration"), trigger.duration.clone());
                Value::Mapping(mapping)
            }),
        }
    }

    /// Present property names in vocabulary order.
    pub fn present(&self) -> Vec<PropertyName> {
        PropertyName::all().filter(|name| self.has(*name)).collect()
    }

    pub fn has_subeffects(&self) -> bool {
        self.attack_subeffects.is_some() || self.subeffects.is_some()
    }
}

fn entries(value: Value) -> Vec<Value> {
    match value {
        Value::Sequence(items) => items,
        other => vec![other],
    }
}

/// Per-record results filled in while the record is evaluated.
#[derive(Debug, Default)]
pub(crate) struct EvaluationCache {
    pub(crate) modifiers: RefCell<BTreeMap<PropertyName, f64>>,
    pub(crate) subabilities: OnceCell<Vec<Explanation>>,
    pub(crate) attack: OnceCell<(AttackLevels, Vec<(AttackBranch, Explanation)>)>,
}

#[derive(Debug)]
pub struct AbilityRecord {
    pub name: String,
    pub properties: Properties,
    /// Authored names outside the known vocabulary, kept for the validator.
    pub unknown_properties: Vec<(String, Value)>,
    pub skip_validation: bool,
    /// Sub-effect nesting depth; 0 for a top-level ability.
    pub depth: usize,
    pub derived: DerivedProperties,
    pub(crate) cache: EvaluationCache,
}

impl AbilityRecord {
    /// Strip the `skip validation` flag, expand singular aliases, fill
    /// defaults, then infer the derived classification fields.
    pub fn normalize(
        name: impl Into<String>,
        raw: &Mapping,
        defaults: &PropertyDefaults,
        depth: usize,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let fail = |message: String| ValidationError {
            ability: name.clone(),
            message,
            properties: render_mapping(raw),
        };

        let mut skip_validation = false;
        let mut known: BTreeMap<PropertyName, Value> = BTreeMap::new();
        let mut unknown = Vec::new();

        for (key, value) in raw {
            let Some(key) = key.as_str() else {
                return Err(fail(format!("has non-string property name '{}'", render(key))));
            };
            if key == SKIP_VALIDATION_KEY {
                skip_validation = match value {
                    Value::Null => false,
                    Value::Bool(flag) => *flag,
                    other => {
                        return Err(fail(format!(
                            "has invalid value '{}' for '{SKIP_VALIDATION_KEY}'",
                            render(other)
                        )))
                    }
                };
                continue;
            }

            let (property, value) = match PropertyName::from_alias(key) {
                Some(plural) => (plural, Value::Sequence(vec![value.clone()])),
                None => match PropertyName::from_str(key) {
                    Ok(property) => (property, value.clone()),
                    Err(_) => {
                        unknown.push((key.to_string(), value.clone()));
                        continue;
                    }
                },
            };
            if known.insert(property, value).is_some() {
                return Err(fail(format!(
                    "has property '{property}' in both singular and plural form"
                )));
            }
        }

        for (property, default) in defaults.iter() {
            if known.get(&property).map_or(true, is_null_sentinel) {
                known.insert(property, default.clone());
            }
        }

        let mut properties = Properties::default();
        for (property, value) in known {
            if is_null_sentinel(&value) {
                continue;
            }
            properties.set(property, value).map_err(&fail)?;
        }

        let derived = DerivedProperties::infer(&properties).map_err(|message| ValidationError {
            ability: name.clone(),
            message,
            properties: render_mapping(&to_mapping(&properties, &unknown)),
        })?;

        Ok(Self {
            name,
            properties,
            unknown_properties: unknown,
            skip_validation,
            depth,
            derived,
            cache: EvaluationCache::default(),
        })
    }

    /// The normalized record in raw form. Normalizing this again yields the
    /// same properties.
    pub fn to_mapping(&self) -> Mapping {
        to_mapping(&self.properties, &self.unknown_properties)
    }

    pub fn subability_name(&self) -> String {
        format!("{}{SUBABILITY_SUFFIX}", self.name)
    }

    pub fn has_subeffects(&self) -> bool {
        self.properties.has_subeffects()
    }

    /// Fatal error for this record carrying its current property snapshot.
    pub fn fail(&self, message: impl Into<String>) -> ValidationError {
        ValidationError {
            ability: self.name.clone(),
            message: message.into(),
            properties: render_mapping(&self.to_mapping()),
        }
    }
}

fn to_mapping(properties: &Properties, unknown: &[(String, Value)]) -> Mapping {
    let mut mapping = Mapping::new();
    for name in PropertyName::all() {
        if let Some(value) = properties.value(name) {
            mapping.insert(Value::from(name.as_str()), value);
        }
    }
    for (name, value) in unknown {
        mapping.insert(Value::from(name.as_str()), value.clone());
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> Mapping {
        serde_yaml::from_str(text).unwrap()
    }

    fn normalize(text: &str) -> Result<AbilityRecord, ValidationError> {
        AbilityRecord::normalize("test", &raw(text), &PropertyDefaults::default(), 0)
    }

    #[test]
    fn defaults_fill_absent_and_null_properties() {
        let record = normalize("damage: low\nrange: null\ntargets: [null]").unwrap();
        assert_eq!(record.properties.range, Some(Value::from("touch")));
        assert_eq!(record.properties.targets, Some(Value::from("one")));
        assert_eq!(record.properties.casting_time, Some(Value::from("standard")));
        assert_eq!(record.properties.components, Some(Value::from("all")));
        assert_eq!(record.properties.dispellable, Some(true));
        assert_eq!(record.properties.spell_resistance, Some(Value::Bool(true)));
    }

    #[test]
    fn singular_aliases_become_one_element_lists() {
        let record = normalize("buff: haste\nduration: round").unwrap();
        assert_eq!(record.properties.buffs, Some(vec![Value::from("haste")]));

        let record = normalize("condition: {penalty: attack}\nduration: round").unwrap();
        let conditions = record.properties.conditions.unwrap();
        assert_eq!(conditions.len(), 1);
        assert!(conditions[0].is_mapping());
    }

    #[test]
    fn singular_and_plural_together_are_rejected() {
        let err = normalize("buff: haste\nbuffs: [fly]\nduration: round").unwrap_err();
        assert!(err.message.contains("both singular and plural"));
    }

    #[test]
    fn skip_validation_is_stripped() {
        let record = normalize("damage: low\nskip validation: true").unwrap();
        assert!(record.skip_validation);
        assert!(!record.to_mapping().contains_key("skip validation"));
        assert!(!normalize("damage: low").unwrap().skip_validation);
    }

    #[test]
    fn unknown_properties_are_preserved_for_validation() {
        let record = normalize("damage: low\nglitter: lots").unwrap();
        assert_eq!(record.unknown_properties.len(), 1);
        assert_eq!(record.unknown_properties[0].0, "glitter");
    }

    #[test]
    fn normalizing_normalized_output_is_a_no_op() {
        let first = normalize(
            "buff: {bonus: strength}\nduration: round\nrange: null\nteleport: null\nmisc: 1.5",
        )
        .unwrap();
        let second =
            AbilityRecord::normalize("test", &first.to_mapping(), &PropertyDefaults::default(), 0)
                .unwrap();
        assert_eq!(first.properties, second.properties);
        assert_eq!(first.derived, second.derived);
    }

    #[test]
    fn malformed_structured_properties_are_fatal() {
        assert!(normalize("misc: lots\ndamage: low").is_err());
        assert!(normalize("subeffects: {damage: low}").is_err());
        let err = normalize("teleport: {range: far}").unwrap_err();
        assert_eq!(err.message, "has teleport without 'type'");
        assert_eq!(err.ability, "test");
    }

    #[test]
    fn subability_names_are_suffixed() {
        let record = normalize("damage: low").unwrap();
        assert_eq!(record.subability_name(), "test**subability");
    }
}
