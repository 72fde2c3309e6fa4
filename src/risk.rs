use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::HazardKind;

/// Per-cell hazard → trigger probability.
///
/// Ordered by hazard so that households draw their trigger values in the same
/// sequence every run. Probabilities are not clamped: repeated growth or
/// shocks can push them above 1.0, at which point the hazard fires every step.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RiskProfile {
    risks: BTreeMap<HazardKind, f64>,
}

impl RiskProfile {
    pub fn new(risks: BTreeMap<HazardKind, f64>) -> Self {
        RiskProfile { risks }
    }

    pub fn get(&self, hazard: HazardKind) -> Option<f64> {
        self.risks.get(&hazard).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HazardKind, f64)> + '_ {
        self.risks.iter().map(|(h, p)| (*h, *p))
    }

    pub fn len(&self) -> usize {
        self.risks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.risks.is_empty()
    }

    /// Compound every hazard by `change_rate` (e.g. 0.01 = +1% per step).
    pub fn grow(&mut self, change_rate: f64) {
        self.scale(1.0 + change_rate);
    }

    /// Instantaneous multiplicative jump by `magnitude` (e.g. 0.5 = +50%).
    pub fn apply_shock(&mut self, magnitude: f64) {
        self.scale(1.0 + magnitude);
    }

    fn scale(&mut self, factor: f64) {
        for p in self.risks.values_mut() {
            *p *= factor;
        }
    }

    pub fn sum(&self) -> f64 {
        self.risks.values().sum()
    }
}
