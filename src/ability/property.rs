//! The fixed property vocabulary an ability is authored in.

use std::collections::BTreeMap;

use serde_yaml::Value;
use strum::IntoEnumIterator;

/// Every property name an ability may carry. The string forms are the
/// authoring names and the modifier-table category names.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
pub enum PropertyName {
    #[strum(serialize = "attack subeffects")]
    AttackSubeffects,
    #[strum(serialize = "area")]
    Area,
    #[strum(serialize = "breakable")]
    Breakable,
    #[strum(serialize = "buffs")]
    Buffs,
    #[strum(serialize = "casting time")]
    CastingTime,
    #[strum(serialize = "choose effect")]
    ChooseEffect,
    #[strum(serialize = "components")]
    Components,
    #[strum(serialize = "conditions")]
    Conditions,
    #[strum(serialize = "damage")]
    Damage,
    #[strum(serialize = "dispellable")]
    Dispellable,
    #[strum(serialize = "duration")]
    Duration,
    #[strum(serialize = "expended")]
    Expended,
    #[strum(serialize = "instant effect")]
    InstantEffect,
    #[strum(serialize = "knowledge")]
    Knowledge,
    #[strum(serialize = "limit affected")]
    LimitAffected,
    #[strum(serialize = "misc")]
    Misc,
    #[strum(serialize = "noncombat")]
    Noncombat,
    #[strum(serialize = "range")]
    Range,
    #[strum(serialize = "shapeable")]
    Shapeable,
    #[strum(serialize = "spell resistance")]
    SpellResistance,
    #[strum(serialize = "subeffects")]
    Subeffects,
    #[strum(serialize = "targets")]
    Targets,
    #[strum(serialize = "teleport")]
    Teleport,
    #[strum(serialize = "trigger")]
    Trigger,
}

/// Exactly one of these defines what an ability fundamentally does.
pub const PRIMARY_PROPERTIES: &[PropertyName] = &[
    PropertyName::AttackSubeffects,
    PropertyName::Buffs,
    PropertyName::Conditions,
    PropertyName::Damage,
    PropertyName::Knowledge,
    PropertyName::InstantEffect,
    PropertyName::Subeffects,
    PropertyName::Teleport,
];

pub const REQUIRED_PROPERTIES: &[PropertyName] = &[PropertyName::Range, PropertyName::Targets];

/// Singular authoring forms and the plural property they stand for.
pub const PLURAL_ALIASES: &[(&str, PropertyName)] = &[
    ("buff", PropertyName::Buffs),
    ("condition", PropertyName::Conditions),
];

/// Meta key stripped from the raw record before it is normalized.
pub const SKIP_VALIDATION_KEY: &str = "skip validation";

impl PropertyName {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn all() -> impl Iterator<Item = PropertyName> {
        PropertyName::iter()
    }

    pub fn is_primary(self) -> bool {
        PRIMARY_PROPERTIES.contains(&self)
    }

    /// Plural property for a singular authoring alias such as `buff`.
    pub fn from_alias(raw: &str) -> Option<PropertyName> {
        PLURAL_ALIASES
            .iter()
            .find(|(alias, _)| *alias == raw)
            .map(|(_, plural)| *plural)
    }
}

/// Values filled in for absent or null properties before anything else runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDefaults {
    values: BTreeMap<PropertyName, Value>,
}

impl Default for PropertyDefaults {
    fn default() -> Self {
        let values = [
            (PropertyName::CastingTime, Value::from("standard")),
            (PropertyName::Components, Value::from("all")),
            (PropertyName::Dispellable, Value::Bool(true)),
            (PropertyName::Range, Value::from("touch")),
            (PropertyName::SpellResistance, Value::Bool(true)),
            (PropertyName::Targets, Value::from("one")),
        ];
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl PropertyDefaults {
    pub fn get(&self, name: PropertyName) -> Option<&Value> {
        self.values.get(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropertyName, &Value)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }

    pub fn without(mut self, name: PropertyName) -> Self {
        self.values.remove(&name);
        self
    }

    /// True if `value` is exactly the declared default for `name`.
    pub fn is_default(&self, name: PropertyName, value: &Value) -> bool {
        self.values.get(&name) == Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn names_round_trip_through_authoring_strings() {
        for name in PropertyName::all() {
            assert_eq!(PropertyName::from_str(name.as_str()).unwrap(), name);
        }
        assert_eq!(PropertyName::all().count(), 24);
        assert_eq!(
            PropertyName::from_str("attack subeffects").unwrap(),
            PropertyName::AttackSubeffects
        );
        assert!(PropertyName::from_str("attack_subeffects").is_err());
    }

    #[test]
    fn aliases_map_singular_to_plural() {
        assert_eq!(PropertyName::from_alias("buff"), Some(PropertyName::Buffs));
        assert_eq!(
            PropertyName::from_alias("condition"),
            Some(PropertyName::Conditions)
        );
        assert_eq!(PropertyName::from_alias("buffs"), None);
    }

    #[test]
    fn default_values_cover_required_properties() {
        let defaults = PropertyDefaults::default();
        for name in REQUIRED_PROPERTIES {
            assert!(defaults.get(*name).is_some(), "{name} should have a default");
        }
        assert!(defaults.is_default(PropertyName::Dispellable, &Value::Bool(true)));
        assert!(!defaults.is_default(PropertyName::Dispellable, &Value::Bool(false)));
    }

    #[test]
    fn primary_membership_follows_the_primary_list() {
        assert!(PropertyName::Buffs.is_primary());
        assert!(PropertyName::AttackSubeffects.is_primary());
        assert!(!PropertyName::Range.is_primary());
        assert!(!PropertyName::Duration.is_primary());
        assert_eq!(PropertyName::all().filter(|name| name.is_primary()).count(), 8);
    }
}
