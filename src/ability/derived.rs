//! Classification fields implied by an ability's raw properties. Computed once
//! when the record is built and used as sub-table keys by the evaluator.

use crate::ability::record::Properties;
use crate::ability::value::is_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub size: String,
    pub shape: String,
    pub kind: String,
}

impl Area {
    /// Parses `"<size> <shape> <type>"`, e.g. `"small burst zone"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut tokens = raw.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
            (Some(size), Some(shape), Some(kind), None) => Some(Self {
                size: size.to_string(),
                shape: shape.to_string(),
                kind: kind.to_string(),
            }),
            _ => None,
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr, strum::EnumString,
)]
pub enum DurationType {
    #[strum(serialize = "personal buff")]
    PersonalBuff,
    #[strum(serialize = "noncombat buff")]
    NoncombatBuff,
    #[strum(serialize = "trigger")]
    Trigger,
    #[strum(serialize = "nonpersonal buff")]
    NonpersonalBuff,
    #[strum(serialize = "condition")]
    Condition,
    #[strum(serialize = "damage over time")]
    DamageOverTime,
    /// The duration only exists to be handed to nested sub-effects.
    #[strum(serialize = "subeffect")]
    Subeffect,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr, strum::EnumString,
)]
pub enum LimitAffectedType {
    #[strum(serialize = "buff")]
    Buff,
    #[strum(serialize = "normal")]
    Normal,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr, strum::EnumString,
)]
pub enum TargetsType {
    #[strum(serialize = "area")]
    Area,
    #[strum(serialize = "normal")]
    Normal,
}

impl DurationType {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl LimitAffectedType {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl TargetsType {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedProperties {
    pub area: Option<Area>,
    pub duration_type: Option<DurationType>,
    pub limit_affected_type: Option<LimitAffectedType>,
    pub targets_type: TargetsType,
}

impl DerivedProperties {
    /// Errors carry the validation message for the record.
    pub fn infer(properties: &Properties) -> Result<Self, String> {
        let area = match properties.area.as_deref() {
            None => None,
            Some(raw) => Some(Area::parse(raw).ok_or_else(|| format!("has invalid area '{raw}'"))?),
        };

        Ok(Self {
            duration_type: duration_type(properties)?,
            limit_affected_type: properties.limit_affected.as_ref().map(|_| {
                if properties.buffs.is_some() {
                    LimitAffectedType::Buff
                } else {
                    LimitAffectedType::Normal
                }
            }),
            targets_type: if area.is_some() {
                TargetsType::Area
            } else {
                TargetsType::Normal
            },
            area,
        })
    }
}

fn duration_type(properties: &Properties) -> Result<Option<DurationType>, String> {
    if properties.duration.is_none() {
        return Ok(None);
    }
    let kind = if properties.buffs.is_some() {
        if properties.range.as_ref().is_some_and(|range| is_text(range, "personal")) {
            DurationType::PersonalBuff
        } else if properties.noncombat == Some(true) {
            DurationType::NoncombatBuff
        } else if properties.trigger.is_some() {
            DurationType::Trigger
        } else {
            DurationType::NonpersonalBuff
        }
    } else if properties.knowledge.is_some() {
        DurationType::PersonalBuff
    } else if properties.conditions.is_some() {
        DurationType::Condition
    } else if properties.damage.is_some() {
        DurationType::DamageOverTime
    } else if properties.has_subeffects() {
        DurationType::Subeffect
    } else {
        return Err("could not determine duration type".to_string());
    };
    Ok(Some(kind))
}
