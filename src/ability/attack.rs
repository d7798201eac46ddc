//! Attack-structured abilities: named outcome branches, each a nested ability,
//! with shared effects folded into the branches they apply to.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde_yaml::{Mapping, Value};
use strum::IntoEnumIterator;

use crate::ability::value::{format_number, render};

/// Flat cost of an attack roll relative to its success branch.
pub const SUCCESS_OFFSET: f64 = 3.0;
/// A failure branch should sit this far below the base level.
pub const FAILURE_OFFSET: f64 = 3.0;
/// A critical success branch should sit this far above the base level.
pub const CRITICAL_SUCCESS_OFFSET: f64 = 9.0;
/// Branch levels within this distance of the expected level are accepted.
pub const LEVEL_TOLERANCE: f64 = 1.0;
// Legacy compatibility: having a critical success branch costs one level.
pub const CRITICAL_SUCCESS_SURCHARGE: f64 = 1.0;

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
pub enum AttackBranch {
    #[strum(serialize = "critical success")]
    CriticalSuccess,
    #[strum(serialize = "effect")]
    Effect,
    #[strum(serialize = "failure")]
    Failure,
    #[strum(serialize = "noncritical effect")]
    NoncriticalEffect,
    #[strum(serialize = "success")]
    Success,
}

impl AttackBranch {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// The raw branch mapping of an `attack subeffects` property.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackSubeffects(Mapping);

impl AttackSubeffects {
    pub fn new(branches: Mapping) -> Self {
        Self(branches)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    /// Present branches in canonical order.
    pub fn branches(&self) -> impl Iterator<Item = (AttackBranch, &Value)> + '_ {
        AttackBranch::iter()
            .filter_map(move |branch| self.0.get(branch.as_str()).map(|value| (branch, value)))
    }

    pub fn unexpected_keys(&self) -> Vec<String> {
        self.0
            .keys()
            .filter(|key| {
                key.as_str()
                    .map_or(true, |name| AttackBranch::from_str(name).is_err())
            })
            .map(render)
            .collect()
    }
}

/// Levels of each present branch, before and after shared-effect folding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackLevels {
    raw: BTreeMap<AttackBranch, f64>,
    folded: BTreeMap<AttackBranch, f64>,
}

impl AttackLevels {
    /// `effect` is added into success, failure and critical success;
    /// `noncritical effect` into success and failure only.
    pub fn fold(raw: BTreeMap<AttackBranch, f64>) -> Self {
        let mut folded = raw.clone();
        if let Some(effect) = raw.get(&AttackBranch::Effect).copied() {
            for branch in [
                AttackBranch::Success,
                AttackBranch::Failure,
                AttackBranch::CriticalSuccess,
            ] {
                if let Some(level) = folded.get_mut(&branch) {
                    *level += effect;
                }
            }
        }
        if let Some(noncritical) = raw.get(&AttackBranch::NoncriticalEffect).copied() {
            for branch in [AttackBranch::Success, AttackBranch::Failure] {
                if let Some(level) = folded.get_mut(&branch) {
                    *level += noncritical;
                }
            }
        }
        Self { raw, folded }
    }

    pub fn raw(&self, branch: AttackBranch) -> Option<f64> {
        self.raw.get(&branch).copied()
    }

    pub fn folded(&self, branch: AttackBranch) -> Option<f64> {
        self.folded.get(&branch).copied()
    }

    pub fn present(&self) -> impl Iterator<Item = AttackBranch> + '_ {
        self.raw.keys().copied()
    }

    fn raw_or_zero(&self, branch: AttackBranch) -> f64 {
        self.raw(branch).unwrap_or(0.0)
    }

    /// Level the attack is priced at before the critical-success surcharge.
    pub fn base(&self) -> f64 {
        match self.folded(AttackBranch::Success) {
            Some(success) => success - SUCCESS_OFFSET,
            None => {
                self.raw_or_zero(AttackBranch::Effect)
                    + self.raw_or_zero(AttackBranch::NoncriticalEffect)
            }
        }
    }

    /// Contribution of the whole `attack subeffects` property.
    pub fn modifier(&self) -> f64 {
        let surcharge = if self.raw.contains_key(&AttackBranch::CriticalSuccess) {
            CRITICAL_SUCCESS_SURCHARGE
        } else {
            0.0
        };
        self.base() + surcharge
    }

    /// Messages for branches whose levels are out of line with the base.
    pub fn relationship_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let base = self.base();

        if let Some(success) = self.folded(AttackBranch::Success) {
            let unfolded = success
                - self.raw_or_zero(AttackBranch::Effect)
                - self.raw_or_zero(AttackBranch::NoncriticalEffect)
                - SUCCESS_OFFSET;
            if unfolded <= 0.0 {
                warnings.push(format!(
                    "has success with nonpositive level {}",
                    format_number(unfolded)
                ));
            }
        }

        if let Some(failure) = self.folded(AttackBranch::Failure) {
            let expected = base - FAILURE_OFFSET;
            if !is_close(expected, failure, LEVEL_TOLERANCE) {
                warnings.push(format!(
                    "has failure with incorrect level {} instead of {}",
                    format_number(failure),
                    format_number(expected)
                ));
            }
        }

        if let Some(critical) = self.folded(AttackBranch::CriticalSuccess) {
            let expected = base + CRITICAL_SUCCESS_OFFSET;
            if !is_close(expected, critical, LEVEL_TOLERANCE) {
                warnings.push(format!(
                    "has critical success with incorrect level {} instead of {}",
                    format_number(critical),
                    format_number(expected)
                ));
            }
        }

        warnings
    }
}

fn is_close(x: f64, y: f64, threshold: f64) -> bool {
    (x - y).abs() <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(entries: &[(AttackBranch, f64)]) -> AttackLevels {
        AttackLevels::fold(entries.iter().copied().collect())
    }

    #[test]
    fn effect_folds_into_every_outcome_branch() {
        let levels = levels(&[
            (AttackBranch::Success, 6.0),
            (AttackBranch::Failure, 1.0),
            (AttackBranch::CriticalSuccess, 13.0),
            (AttackBranch::Effect, 2.0),
        ]);
        assert_eq!(levels.folded(AttackBranch::Success), Some(8.0));
        assert_eq!(levels.folded(AttackBranch::Failure), Some(3.0));
        assert_eq!(levels.folded(AttackBranch::CriticalSuccess), Some(15.0));
        assert_eq!(levels.folded(AttackBranch::Effect), Some(2.0));
        assert_eq!(levels.raw(AttackBranch::Success), Some(6.0));
    }

    #[test]
    fn noncritical_effect_skips_critical_success() {
        let levels = levels(&[
            (AttackBranch::Success, 6.0),
            (AttackBranch::Failure, 1.0),
            (AttackBranch::CriticalSuccess, 13.0),
            (AttackBranch::NoncriticalEffect, 2.0),
        ]);
        assert_eq!(levels.folded(AttackBranch::Success), Some(8.0));
        assert_eq!(levels.folded(AttackBranch::Failure), Some(3.0));
        assert_eq!(levels.folded(AttackBranch::CriticalSuccess), Some(13.0));
    }

    #[test]
    fn base_comes_from_success_or_shared_effects() {
        assert_eq!(levels(&[(AttackBranch::Success, 7.0)]).base(), 4.0);
        assert_eq!(
            levels(&[
                (AttackBranch::Effect, 2.0),
                (AttackBranch::NoncriticalEffect, 1.5)
            ])
            .base(),
            3.5
        );
        assert_eq!(levels(&[(AttackBranch::Failure, 2.0)]).base(), 0.0);
    }

    #[test]
    fn critical_success_adds_surcharge() {
        let levels = levels(&[
            (AttackBranch::Success, 7.0),
            (AttackBranch::CriticalSuccess, 13.0),
        ]);
        assert_eq!(levels.modifier(), 5.0);
        assert!(levels.relationship_warnings().is_empty());
    }

    #[test]
    fn misaligned_branches_produce_warnings() {
        let levels = levels(&[
            (AttackBranch::Success, 3.0),
            (AttackBranch::Failure, 4.0),
            (AttackBranch::CriticalSuccess, 2.0),
        ]);
        let warnings = levels.relationship_warnings();
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0], "has success with nonpositive level 0");
        assert_eq!(warnings[1], "has failure with incorrect level 4 instead of -3");
        assert_eq!(
            warnings[2],
            "has critical success with incorrect level 2 instead of 9"
        );
    }

    #[test]
    fn unexpected_branch_keys_are_listed() {
        let mapping: Mapping =
            serde_yaml::from_str("success: {damage: low}\nsucess: {damage: low}\n").unwrap();
        let attack = AttackSubeffects::new(mapping);
        assert_eq!(attack.unexpected_keys(), vec!["sucess".to_string()]);
        let present: Vec<_> = attack.branches().map(|(branch, _)| branch).collect();
        assert_eq!(present, vec![AttackBranch::Success]);
    }
}
