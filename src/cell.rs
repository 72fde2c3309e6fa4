use crate::risk::RiskProfile;
use crate::types::{CellId, Pos};

/// One grid coordinate's climate state. Created once per coordinate at
/// initialization and never moved.
pub struct ClimateCell {
    pub id: CellId,
    pub pos: Pos,
    pub risk: RiskProfile,
}

impl ClimateCell {
    pub fn new(id: CellId, pos: Pos, risk: RiskProfile) -> Self {
        ClimateCell { id, pos, risk }
    }

    /// Scheduled update: compound every hazard by the climate-change rate.
    pub fn on_step(&mut self, climate_change_rate: f64) {
        self.risk.grow(climate_change_rate);
    }

    /// External shock. Permanent once applied.
    pub fn apply_shock(&mut self, magnitude: f64) {
        self.risk.apply_shock(magnitude);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::types::HazardKind;

    fn make_cell() -> ClimateCell {
        ClimateCell::new(
            CellId(0),
            Pos::new(1, 2),
            RiskProfile::new(BTreeMap::from([(HazardKind::Flood, 0.02), (HazardKind::Storm, 0.03)])),
        )
    }

    #[test]
    fn step_compounds_by_climate_rate() {
        let mut cell = make_cell();
        cell.on_step(0.01);
        assert_eq!(cell.risk.get(HazardKind::Flood), Some(0.02 * (1.0 + 0.01)));
        assert_eq!(cell.risk.get(HazardKind::Storm), Some(0.03 * (1.0 + 0.01)));
    }

    #[test]
    fn shock_is_applied_immediately() {
        let mut cell = make_cell();
        cell.apply_shock(0.5);
        assert_eq!(cell.risk.get(HazardKind::Flood), Some(0.02 * 1.5));
    }

    #[test]
    fn shocked_level_persists_through_later_steps() {
        let mut cell = make_cell();
        cell.apply_shock(1.0);
        for _ in 0..20 {
            cell.on_step(0.0);
        }
        assert_eq!(cell.risk.get(HazardKind::Flood), Some(0.04));
    }

    #[test]
    fn zero_rate_leaves_profile_unchanged() {
        let mut cell = make_cell();
        let before = cell.risk.clone();
        cell.on_step(0.0);
        assert_eq!(cell.risk, before);
    }
}
