use rand::Rng;

use crate::records::{ClaimRecord, InsurancePolicy};
use crate::risk::RiskProfile;
use crate::types::{HouseholdId, InsurerId, Pos, Step};

/// Share of house value paid out per claim, for every hazard kind.
pub const CLAIM_FRACTION: f64 = 0.1;

pub struct Household {
    pub id: HouseholdId,
    pub pos: Pos,
    pub house_value: f64,
    pub insurer: Option<InsurerId>,
    pub policy: Option<InsurancePolicy>,
    /// Append-only.
    pub claims: Vec<ClaimRecord>,
}

impl Household {
    pub fn new(id: HouseholdId, pos: Pos, house_value: f64) -> Self {
        Household { id, pos, house_value, insurer: None, policy: None, claims: Vec::new() }
    }

    pub fn is_insured(&self) -> bool {
        self.insurer.is_some() && self.policy.is_some()
    }

    pub fn claim_amount(&self) -> f64 {
        self.house_value * CLAIM_FRACTION
    }

    /// Test every hazard in the cell's profile against an independent uniform
    /// draw and file a claim for each one that fires.
    ///
    /// Returns the claims filed this step so the caller can route them to the
    /// insurer. Uninsured households return nothing and consume no draws.
    pub fn on_step(&mut self, step: Step, profile: &RiskProfile, rng: &mut impl Rng) -> Vec<ClaimRecord> {
        if !self.is_insured() {
            return vec![];
        }

        let mut filed = Vec::new();
        for (hazard, probability) in profile.iter() {
            if rng.random::<f64>() < probability {
                let claim = ClaimRecord { amount: self.claim_amount(), hazard, step };
                self.claims.push(claim);
                filed.push(claim);
            }
        }
        filed
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::types::HazardKind;

    fn insured(house_value: f64) -> Household {
        let mut h = Household::new(HouseholdId(1), Pos::new(0, 0), house_value);
        h.insurer = Some(InsurerId(0));
        h.policy = Some(InsurancePolicy { premium_rate: 0.001, risk_premium: 0.005, house_value });
        h
    }

    fn certain(hazards: &[HazardKind]) -> RiskProfile {
        RiskProfile::new(hazards.iter().map(|h| (*h, 1.0)).collect::<BTreeMap<_, _>>())
    }

    #[test]
    fn uninsured_household_files_nothing() {
        let mut h = Household::new(HouseholdId(1), Pos::new(0, 0), 2_000_000.0);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let claims = h.on_step(Step(0), &certain(&HazardKind::ALL), &mut rng);
        assert!(claims.is_empty());
        assert!(h.claims.is_empty());
    }

    #[test]
    fn insurer_without_policy_is_inert() {
        let mut h = Household::new(HouseholdId(1), Pos::new(0, 0), 2_000_000.0);
        h.insurer = Some(InsurerId(0));
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert!(h.on_step(Step(0), &certain(&HazardKind::ALL), &mut rng).is_empty());
    }

    #[test]
    fn uninsured_household_consumes_no_draws() {
        let mut h = Household::new(HouseholdId(1), Pos::new(0, 0), 1.0);
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let mut reference = ChaCha20Rng::seed_from_u64(9);
        h.on_step(Step(0), &certain(&HazardKind::ALL), &mut rng);
        assert_eq!(rng.random::<u64>(), reference.random::<u64>());
    }

    #[test]
    fn claim_is_ten_percent_of_house_value_for_every_hazard() {
        let mut h = insured(2_000_000.0);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let claims = h.on_step(Step(4), &certain(&HazardKind::ALL), &mut rng);
        assert_eq!(claims.len(), 3, "one claim per certain hazard");
        for c in &claims {
            assert_eq!(c.amount, 200_000.0);
            assert_eq!(c.step, Step(4));
        }
        let kinds: Vec<HazardKind> = claims.iter().map(|c| c.hazard).collect();
        assert_eq!(kinds, HazardKind::ALL.to_vec());
    }

    #[test]
    fn claims_history_is_append_only_across_steps() {
        let mut h = insured(1_000_000.0);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let profile = certain(&[HazardKind::Flood]);
        h.on_step(Step(0), &profile, &mut rng);
        h.on_step(Step(1), &profile, &mut rng);
        let steps: Vec<Step> = h.claims.iter().map(|c| c.step).collect();
        assert_eq!(steps, vec![Step(0), Step(1)]);
    }

    #[test]
    fn zero_probability_never_triggers() {
        let mut h = insured(1_000_000.0);
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let profile = RiskProfile::new(BTreeMap::from([(HazardKind::Storm, 0.0)]));
        for s in 0..500 {
            assert!(h.on_step(Step(s), &profile, &mut rng).is_empty());
        }
    }

    #[test]
    fn trigger_rate_tracks_probability() {
        let mut h = insured(1_000_000.0);
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let profile = RiskProfile::new(BTreeMap::from([(HazardKind::Flood, 0.25)]));
        let n = 20_000;
        let hits: usize = (0..n).map(|s| h.on_step(Step(s), &profile, &mut rng).len()).sum();
        let rate = hits as f64 / n as f64;
        assert!((rate - 0.25).abs() < 0.02, "empirical rate {rate} too far from 0.25");
    }
}
