//! Evaluation entry points. Each call builds a fresh evaluator, so the only
//! shared state is the read-only modifier table.

pub mod explain;
pub mod level;
pub mod validate;

use serde::Serialize;
use serde_yaml::Mapping;

use crate::ability::property::PropertyDefaults;
use crate::ability::record::AbilityRecord;
use crate::ability::value::format_number;
use crate::data::modifiers::ModifierTable;
use crate::error::Result;

pub use explain::{BranchLevel, Explanation, PropertyModifier};
pub use level::Evaluator;
pub use validate::{ValidationDiagnostic, ValidationReport, ValidationSeverity};

/// A level this far below the raw sum is a zero-cost ability.
pub const DEFAULT_LEVEL_OFFSET: f64 = 4.0;
pub const DEFAULT_MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub level_offset: f64,
    /// Deepest sub-effect nesting accepted before evaluation is aborted.
    pub max_depth: usize,
    pub defaults: PropertyDefaults,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            level_offset: DEFAULT_LEVEL_OFFSET,
            max_depth: DEFAULT_MAX_DEPTH,
            defaults: PropertyDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub name: String,
    pub level: f64,
    pub spell_level: f64,
    pub warnings: Vec<ValidationDiagnostic>,
}

pub fn evaluate(
    table: &ModifierTable,
    settings: &EngineSettings,
    name: &str,
    raw: &Mapping,
) -> Result<Evaluation> {
    let evaluator = Evaluator::new(table, settings);
    let record = evaluator.build(name, raw, 0)?;
    let level = evaluator.level(&record)?;
    check_raw_level(&evaluator, &record, level);
    tracing::debug!(ability = name, level, "evaluated ability");

    Ok(Evaluation {
        name: record.name,
        level,
        spell_level: level - settings.level_offset,
        warnings: evaluator.into_warnings(),
    })
}

pub fn explain(
    table: &ModifierTable,
    settings: &EngineSettings,
    name: &str,
    raw: &Mapping,
) -> Result<Explanation> {
    let evaluator = Evaluator::new(table, settings);
    let record = evaluator.build(name, raw, 0)?;
    let mut explanation = evaluator.explain_record(&record)?;
    check_raw_level(&evaluator, &record, explanation.level);
    explanation.warnings = evaluator.into_warnings();
    Ok(explanation)
}

fn check_raw_level(evaluator: &Evaluator<'_>, record: &AbilityRecord, level: f64) {
    if level <= 0.0 && !record.skip_validation {
        evaluator.warn(
            record,
            format!("has nonpositive raw level {}", format_number(level)),
        );
    }
}
