//! Text output for levels, explanations and validation reports, and the
//! levels file.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::ability::value::format_number;
use crate::engine::{Evaluation, Explanation, ValidationReport, ValidationSeverity};
use crate::error::Result;

/// `name: spell_level` lines in the given order.
pub fn format_levels<'a>(levels: impl IntoIterator<Item = (&'a str, f64)>) -> String {
    let mut out = String::new();
    for (name, level) in levels {
        let _ = writeln!(out, "{name}: {}", format_number(level));
    }
    out
}

pub fn write_levels_file<'a>(
    path: impl AsRef<Path>,
    levels: impl IntoIterator<Item = (&'a str, f64)>,
) -> std::io::Result<()> {
    let path = path.as_ref();
    fs::write(path, format_levels(levels))?;
    tracing::info!(path = %path.display(), "wrote levels file");
    Ok(())
}

/// Non-default properties with their modifiers, nested levels, and the
/// final spell level.
pub fn format_explanation(explanation: &Explanation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Ability('{}')", explanation.name);
    for entry in explanation.non_default() {
        let _ = writeln!(
            out,
            "    {}: {}",
            entry.property,
            format_number(entry.modifier)
        );
        if !entry.branches.is_empty() {
            let branches: Vec<String> = entry
                .branches
                .iter()
                .map(|branch| {
                    if branch.raw == branch.folded {
                        format!("{}: {}", branch.branch, format_number(branch.folded))
                    } else {
                        format!(
                            "{}: {} (own {})",
                            branch.branch,
                            format_number(branch.folded),
                            format_number(branch.raw)
                        )
                    }
                })
                .collect();
            let _ = writeln!(out, "        {{{}}}", branches.join(", "));
        }
        for child in &entry.subabilities {
            let _ = writeln!(out, "        sub: {}", format_number(child.level));
        }
    }
    for warning in &explanation.warnings {
        let _ = writeln!(out, "Warning: {warning}");
    }
    let _ = writeln!(out, "total: {}", format_number(explanation.spell_level));
    out
}

/// Errors for abilities that failed to evaluate, warnings for the rest.
pub fn validation_report<'a>(
    results: impl IntoIterator<Item = &'a (String, Result<Evaluation>)>,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (name, result) in results {
        match result {
            Ok(evaluation) => report.extend(evaluation.warnings.iter().cloned()),
            Err(err) => report.push(ValidationSeverity::Error, name.as_str(), err.to_string()),
        }
    }
    report
}

pub fn format_report(report: &ValidationReport) -> String {
    let mut out = String::new();
    for diag in &report.diagnostics {
        match diag.severity {
            ValidationSeverity::Error => {
                let _ = writeln!(out, "{}: {}: {}", diag.severity, diag.context, diag.message);
            }
            ValidationSeverity::Warning => {
                let _ = writeln!(out, "{}: {diag}", diag.severity);
            }
        }
    }
    let _ = writeln!(
        out,
        "{} error(s), {} warning(s)",
        report.count(ValidationSeverity::Error),
        report.count(ValidationSeverity::Warning)
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BranchLevel, PropertyModifier, ValidationDiagnostic};

    fn entry(property: &str, modifier: f64, is_default: bool) -> PropertyModifier {
        PropertyModifier {
            property: property.to_string(),
            value: String::new(),
            modifier,
            is_default,
            branches: Vec::new(),
            subabilities: Vec::new(),
        }
    }

    fn explanation(name: &str, level: f64, modifiers: Vec<PropertyModifier>) -> Explanation {
        Explanation {
            name: name.to_string(),
            level,
            spell_level: level - 4.0,
            modifiers,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn levels_print_one_per_line() {
        let text = format_levels([("bolt", 1.0), ("haze", 2.5)]);
        assert_eq!(text, "bolt: 1\nhaze: 2.5\n");
    }

    #[test]
    fn explanation_skips_default_properties() {
        let text = format_explanation(&explanation(
            "bolt",
            6.0,
            vec![entry("damage", 5.0, false), entry("range", 0.0, true), entry("targets", 1.0, false)],
        ));
        assert_eq!(text, "Ability('bolt')\n    damage: 5\n    targets: 1\ntotal: 2\n");
    }

    #[test]
    fn explanation_lists_branches_and_subabilities() {
        let mut attack = entry("attack subeffects", 4.0, false);
        attack.branches.push(BranchLevel {
            branch: "success".to_string(),
            raw: 5.0,
            folded: 7.0,
            explanation: explanation("x**subability", 5.0, Vec::new()),
        });
        let mut subeffects = entry("subeffects", 3.0, false);
        subeffects
            .subabilities
            .push(explanation("x**subability", 3.0, Vec::new()));

        let text = format_explanation(&explanation("x", 7.0, vec![attack, subeffects]));
        assert!(text.contains("        {success: 7 (own 5)}\n"));
        assert!(text.contains("        sub: 3\n"));
        assert!(text.ends_with("total: 3\n"));
    }

    #[test]
    fn report_counts_by_severity() {
        let mut report = ValidationReport::default();
        report.push(ValidationSeverity::Error, "bolt", "must have a primary property");
        report.extend([ValidationDiagnostic {
            severity: ValidationSeverity::Warning,
            context: "haze".to_string(),
            message: "has nonpositive property 'conditions'".to_string(),
        }]);
        let text = format_report(&report);
        assert!(text.contains("error: bolt: must have a primary property\n"));
        assert!(text.contains("warning: Ability('haze') has nonpositive property 'conditions'\n"));
        assert!(text.ends_with("1 error(s), 1 warning(s)\n"));
        assert!(report.has_errors());
    }
}
