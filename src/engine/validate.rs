use std::fmt;

use serde::Serialize;
use serde_yaml::Value;

use crate::ability::property::{PropertyName, REQUIRED_PROPERTIES};
use crate::ability::record::AbilityRecord;
use crate::ability::value::{is_text, render, single_entry};
use crate::engine::level::Evaluator;
use crate::error::Result;

/// Durations too short to be worth protecting from dispelling.
const TRIVIAL_DURATIONS: &[&str] = &["round", "concentration"];
/// `targets: five` needs an area whose modifier exceeds this.
const FIVE_TARGETS_MIN_AREA: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One finding against one ability; `context` is the ability name, with
/// the sub-ability suffix for nested records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ability('{}') {}", self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = ValidationDiagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }
}

/// Fatal checks in order, then warnings. The first fatal check to fail
/// aborts the evaluation. Stray parent properties beside nested effects are
/// reported before any fatal check.
pub(crate) fn check(evaluator: &Evaluator<'_>, record: &AbilityRecord) -> Result<()> {
    warn_nested_only_properties(evaluator, record);
    check_fatal(evaluator, record)?;
    check_warnings(evaluator, record)
}

/// `duration` and `dispellable` are priced on the sub-effects, not on the
/// record that holds them.
fn warn_nested_only_properties(evaluator: &Evaluator<'_>, record: &AbilityRecord) {
    if !record.has_subeffects() {
        return;
    }
    let defaults = &evaluator.settings().defaults;
    for name in [PropertyName::Duration, PropertyName::Dispellable] {
        let stray = record
            .properties
            .value(name)
            .is_some_and(|value| !defaults.is_default(name, &value));
        if stray {
            evaluator.warn(
                record,
                format!("has property '{name}' that should only be in its subeffects"),
            );
        }
    }
}

fn check_fatal(evaluator: &Evaluator<'_>, record: &AbilityRecord) -> Result<()> {
    let properties = &record.properties;

    if let Some((name, _)) = record.unknown_properties.first() {
        return Err(record.fail(format!("has unknown property '{name}'")).into());
    }

    for name in REQUIRED_PROPERTIES {
        if !properties.has(*name) {
            return Err(record.fail(format!("must have property '{name}'")).into());
        }
    }

    let primaries = present_primaries(record);
    match primaries.len() {
        0 => return Err(record.fail("must have a primary property").into()),
        1 => {}
        _ => {
            let names: Vec<&str> = primaries.iter().map(|name| name.as_str()).collect();
            return Err(record
                .fail(format!("has too many primary properties: {}", names.join(", ")))
                .into());
        }
    }

    if properties.duration.is_some()
        && properties.buffs.is_none()
        && properties.conditions.is_none()
        && properties.knowledge.is_none()
        && !is_damage_over_time(properties.damage.as_ref())
    {
        return Err(record.fail("has duration with no purpose").into());
    }

    if properties.dispellable == Some(false) {
        let trivial = properties.duration.as_ref().map_or(true, |duration| {
            TRIVIAL_DURATIONS.iter().any(|text| is_text(duration, text))
        });
        if trivial {
            let duration = properties
                .duration
                .as_ref()
                .map_or_else(|| "none".to_string(), render);
            return Err(record
                .fail(format!("is not dispellable, but has trivial duration {duration}"))
                .into());
        }
    }

    if properties
        .targets
        .as_ref()
        .is_some_and(|targets| is_text(targets, "five"))
        && record.derived.area.is_some()
        && evaluator.modifier(record, PropertyName::Area)? <= FIVE_TARGETS_MIN_AREA
    {
        return Err(record
            .fail("has too small of an area for targets='five'")
            .into());
    }

    Ok(())
}

fn check_warnings(evaluator: &Evaluator<'_>, record: &AbilityRecord) -> Result<()> {
    for name in present_primaries(record) {
        if evaluator.modifier(record, name)? <= 0.0 {
            evaluator.warn(record, format!("has nonpositive property '{name}'"));
        }
    }

    if let Some(attack) = &record.properties.attack_subeffects {
        for key in attack.unexpected_keys() {
            evaluator.warn(
                record,
                format!("has unexpected key '{key}' in attack subeffects"),
            );
        }
        let (levels, _) = evaluator.attack(record)?;
        for message in levels.relationship_warnings() {
            evaluator.warn(record, message);
        }
    }

    Ok(())
}

fn present_primaries(record: &AbilityRecord) -> Vec<PropertyName> {
    record
        .properties
        .present()
        .into_iter()
        .filter(|name| name.is_primary())
        .collect()
}

/// `damage: over time`, or a wrapped `{over time: ...}` damage value.
fn is_damage_over_time(damage: Option<&Value>) -> bool {
    match damage {
        Some(Value::Mapping(mapping)) => {
            single_entry(mapping).is_some_and(|(key, _)| is_text(key, "over time"))
        }
        Some(value) => is_text(value, "over time"),
        None => false,
    }
}
