//! Level evaluator: one exhaustive dispatch from property name to modifier,
//! recursing into nested sub-effects and attack branches.

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::ability::attack::{AttackBranch, AttackLevels};
use crate::ability::derived::{DurationType, TargetsType};
use crate::ability::property::PropertyName;
use crate::ability::record::AbilityRecord;
use crate::ability::value::is_text;
use crate::data::modifiers::ModifierTable;
use crate::engine::explain::Explanation;
use crate::engine::validate::{self, ValidationDiagnostic, ValidationSeverity};
use crate::engine::EngineSettings;
use crate::error::{EvaluationError, Result};

/// Evaluates one top-level ability and everything nested inside it.
/// Warnings from every record built along the way are collected here.
pub struct Evaluator<'t> {
    table: &'t ModifierTable,
    settings: &'t EngineSettings,
    warnings: RefCell<Vec<ValidationDiagnostic>>,
}

impl<'t> Evaluator<'t> {
    pub fn new(table: &'t ModifierTable, settings: &'t EngineSettings) -> Self {
        Self {
            table,
            settings,
            warnings: RefCell::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        self.settings
    }

    /// Normalize and validate one record. Fatal checks run here, before any
    /// level is computed for it.
    pub fn build(&self, name: impl Into<String>, raw: &Mapping, depth: usize) -> Result<AbilityRecord> {
        let name = name.into();
        if depth > self.settings.max_depth {
            return Err(EvaluationError::NestingTooDeep {
                ability: name,
                limit: self.settings.max_depth,
            });
        }
        let record = AbilityRecord::normalize(name, raw, &self.settings.defaults, depth)?;
        tracing::debug!(ability = %record.name, depth, "built ability record");
        if !record.skip_validation {
            validate::check(self, &record)?;
        }
        Ok(record)
    }

    /// Sum of the modifiers of every present property.
    pub fn level(&self, record: &AbilityRecord) -> Result<f64> {
        let mut level = 0.0;
        for property in record.properties.present() {
            level += self.modifier(record, property)?;
        }
        for (name, value) in &record.unknown_properties {
            level += self.unknown_modifier(name, value)?;
        }
        Ok(level)
    }

    /// Only reachable with `skip validation`; an unknown name has no table
    /// category, so this fails unless the table happens to carry one.
    pub(crate) fn unknown_modifier(&self, name: &str, value: &Value) -> Result<f64> {
        Ok(self.table.resolve(name, value)?)
    }

    pub fn spell_level(&self, record: &AbilityRecord) -> Result<f64> {
        Ok(self.level(record)? - self.settings.level_offset)
    }

    /// Modifier of one property, computed at most once per record.
    pub fn modifier(&self, record: &AbilityRecord, property: PropertyName) -> Result<f64> {
        let cached = record.cache.modifiers.borrow().get(&property).copied();
        if let Some(modifier) = cached {
            return Ok(modifier);
        }
        let modifier = self.compute(record, property)?;
        record.cache.modifiers.borrow_mut().insert(property, modifier);
        Ok(modifier)
    }

    pub(crate) fn warn(&self, record: &AbilityRecord, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(ability = %record.name, "{message}");
        self.warnings.borrow_mut().push(ValidationDiagnostic {
            severity: ValidationSeverity::Warning,
            context: record.name.clone(),
            message,
        });
    }

    pub fn into_warnings(self) -> Vec<ValidationDiagnostic> {
        self.warnings.into_inner()
    }

    fn compute(&self, record: &AbilityRecord, property: PropertyName) -> Result<f64> {
        let properties = &record.properties;
        match property {
            PropertyName::AttackSubeffects => Ok(self.attack(record)?.0.modifier()),
            PropertyName::Area => self.area_modifier(record),
            PropertyName::Breakable => self.simple(property, properties.breakable.as_ref()),
            PropertyName::Buffs => self.entries(property, properties.buffs.as_deref()),
            PropertyName::CastingTime => self.simple(property, properties.casting_time.as_ref()),
            PropertyName::ChooseEffect => self.simple(property, properties.choose_effect.as_ref()),
            PropertyName::Components => self.simple(property, properties.components.as_ref()),
            PropertyName::Conditions => self.entries(property, properties.conditions.as_deref()),
            PropertyName::Damage => self.simple(property, properties.damage.as_ref()),
            PropertyName::Dispellable => self.dispellable_modifier(record),
            PropertyName::Duration => self.duration_modifier(record),
            PropertyName::Expended => self.simple(property, properties.expended.as_ref()),
            PropertyName::InstantEffect => self.simple(property, properties.instant_effect.as_ref()),
            PropertyName::Knowledge => self.simple(property, properties.knowledge.as_ref()),
            PropertyName::LimitAffected => {
                match (record.derived.limit_affected_type, properties.limit_affected.as_ref()) {
                    (Some(kind), Some(value)) => {
                        Ok(self.table.lookup(property.as_str(), &[kind.as_str()], value)?)
                    }
                    _ => Ok(0.0),
                }
            }
            PropertyName::Misc => Ok(properties.misc.unwrap_or(0.0)),
            // only feeds duration-type inference
            PropertyName::Noncombat => Ok(0.0),
            PropertyName::Range => self.range_modifier(record),
            PropertyName::Shapeable => self.simple(property, properties.shapeable.as_ref()),
            PropertyName::SpellResistance => {
                self.simple(property, properties.spell_resistance.as_ref())
            }
            PropertyName::Subeffects => Ok(self
                .subabilities(record)?
                .iter()
                .map(|child| child.level)
                .sum()),
            PropertyName::Targets => self.targets_modifier(record),
            PropertyName::Teleport => match &properties.teleport {
                Some(teleport) => Ok(self.table.lookup(property.as_str(), &["range"], &teleport.range)?
                    + self.table.lookup(property.as_str(), &["type"], &teleport.kind)?),
                None => Ok(0.0),
            },
            PropertyName::Trigger => match &properties.trigger {
                Some(trigger) => Ok(self
                    .table
                    .lookup(property.as_str(), &["condition"], &trigger.condition)?
                    + self
                        .table
                        .lookup(property.as_str(), &["duration"], &trigger.duration)?),
                None => Ok(0.0),
            },
        }
    }

    fn simple(&self, property: PropertyName, value: Option<&Value>) -> Result<f64> {
        match value {
            Some(value) => Ok(self.table.resolve(property.as_str(), value)?),
            None => Ok(0.0),
        }
    }

    /// Buffs and conditions: each entry is a bare name or a wrapped
    /// `{group: name}` pair.
    fn entries(&self, property: PropertyName, entries: Option<&[Value]>) -> Result<f64> {
        let mut total = 0.0;
        for entry in entries.unwrap_or_default() {
            total += self.table.resolve(property.as_str(), entry)?;
        }
        Ok(total)
    }

    fn area_modifier(&self, record: &AbilityRecord) -> Result<f64> {
        let Some(area) = &record.derived.area else {
            return Ok(0.0);
        };
        let modifier = self.table.lookup(
            PropertyName::Area.as_str(),
            &[area.shape.as_str()],
            &Value::String(area.size.clone()),
        )?;
        // knowledge abilities pay half for their area
        if record.properties.knowledge.is_some() {
            Ok(modifier / 2.0)
        } else {
            Ok(modifier)
        }
    }

    fn range_modifier(&self, record: &AbilityRecord) -> Result<f64> {
        let Some(range) = &record.properties.range else {
            return Ok(0.0);
        };
        let table = if record.properties.buffs.is_some() {
            "buff"
        } else {
            "normal"
        };
        Ok(self
            .table
            .lookup(PropertyName::Range.as_str(), &[table], range)?)
    }

    fn targets_modifier(&self, record: &AbilityRecord) -> Result<f64> {
        let Some(targets) = &record.properties.targets else {
            return Ok(0.0);
        };
        let targets_type = record.derived.targets_type;
        if is_text(targets, "automatically find one") {
            return match targets_type {
                TargetsType::Area => Ok(-self.modifier(record, PropertyName::Area)? / 2.0),
                TargetsType::Normal => self.modifier(record, PropertyName::Range),
            };
        }
        if is_text(targets, "enemies") && targets_type == TargetsType::Area {
            let area = self.modifier(record, PropertyName::Area)?;
            return Ok(if area >= 5.0 { 2.0 } else { 1.0 });
        }
        Ok(self
            .table
            .lookup(PropertyName::Targets.as_str(), &[targets_type.as_str()], targets)?)
    }

    fn duration_modifier(&self, record: &AbilityRecord) -> Result<f64> {
        match (record.derived.duration_type, &record.properties.duration) {
            (Some(DurationType::Subeffect), _) | (None, _) | (_, None) => Ok(0.0),
            (Some(kind), Some(duration)) => Ok(self.table.lookup(
                PropertyName::Duration.as_str(),
                &[kind.as_str()],
                duration,
            )?),
        }
    }

    fn dispellable_modifier(&self, record: &AbilityRecord) -> Result<f64> {
        if record.properties.dispellable != Some(false) || record.properties.duration.is_none() {
            return Ok(0.0);
        }
        Ok(1.0 + 0.5 * self.modifier(record, PropertyName::Duration)?)
    }

    fn child(&self, parent: &AbilityRecord, raw: &Mapping) -> Result<Explanation> {
        let child = self.build(parent.subability_name(), raw, parent.depth + 1)?;
        self.explain_record(&child)
    }

    /// Explanations of the plain `subeffects` children, built once.
    pub(crate) fn subabilities<'r>(&self, record: &'r AbilityRecord) -> Result<&'r [Explanation]> {
        if let Some(children) = record.cache.subabilities.get() {
            return Ok(children);
        }
        let mut children = Vec::new();
        for raw in record.properties.subeffects.iter().flatten() {
            children.push(self.child(record, raw)?);
        }
        Ok(record.cache.subabilities.get_or_init(|| children))
    }

    /// Branch levels of `attack subeffects`, folded, with each branch's
    /// explanation. Built once.
    pub(crate) fn attack<'r>(
        &self,
        record: &'r AbilityRecord,
    ) -> Result<&'r (AttackLevels, Vec<(AttackBranch, Explanation)>)> {
        if let Some(attack) = record.cache.attack.get() {
            return Ok(attack);
        }
        let mut raw_levels = BTreeMap::new();
        let mut branches = Vec::new();
        if let Some(attack) = &record.properties.attack_subeffects {
            for (branch, value) in attack.branches() {
                let Value::Mapping(raw) = value else {
                    return Err(record
                        .fail(format!("has attack branch '{branch}' that is not a property mapping"))
                        .into());
                };
                let explanation = self.child(record, raw)?;
                raw_levels.insert(branch, explanation.level);
                branches.push((branch, explanation));
            }
        }
        let levels = AttackLevels::fold(raw_levels);
        Ok(record.cache.attack.get_or_init(|| (levels, branches)))
    }
}
