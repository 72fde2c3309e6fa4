use std::collections::BTreeSet;

use crate::household::Household;
use crate::records::{InsuranceMetrics, InsurancePolicy};
use crate::types::{HouseholdId, InsurerId};

/// Number of trailing settlement windows consulted when repricing.
pub const PROFIT_LOOKBACK: usize = 5;
/// Risk-premium multiplier after a loss-making lookback window.
pub const TIGHTEN_FACTOR: f64 = 1.10;
/// Risk-premium multiplier otherwise (including an empty history).
pub const RELAX_FACTOR: f64 = 0.95;

/// An insurer holding a book of household policies.
/// No insolvency handling: capital is allowed to go negative.
pub struct Insurer {
    pub id: InsurerId,
    pub metrics: InsuranceMetrics,
    pub base_premium_rate: f64,
    /// Live risk loading. Read when issuing new policies; never pushed into
    /// policies already issued.
    pub risk_premium: f64,
    /// Back-references into the simulation's household list.
    pub insured: BTreeSet<HouseholdId>,
}

impl Insurer {
    pub fn new(id: InsurerId, initial_capital: f64, base_premium_rate: f64, risk_premium: f64) -> Self {
        Insurer {
            id,
            metrics: InsuranceMetrics::new(initial_capital),
            base_premium_rate,
            risk_premium,
            insured: BTreeSet::new(),
        }
    }

    /// Snapshot the insurer's current rates into a policy for `house_value`.
    pub fn issue_policy(&self, house_value: f64) -> InsurancePolicy {
        InsurancePolicy {
            premium_rate: self.base_premium_rate,
            risk_premium: self.risk_premium,
            house_value,
        }
    }

    pub fn enroll(&mut self, household: HouseholdId) {
        self.insured.insert(household);
    }

    /// Scheduled update: collect premiums, reprice, then close the window.
    pub fn on_step(&mut self, households: &[Household]) {
        self.collect_premiums(households);
        self.update_risk_premium();
        self.metrics.record_profit();
    }

    /// Bill every insured household at its own policy's frozen rates.
    /// Ids that no longer resolve to a household are skipped.
    pub fn collect_premiums(&mut self, households: &[Household]) {
        for id in &self.insured {
            let policy = households
                .get(id.0 as usize)
                .filter(|h| h.id == *id)
                .and_then(|h| h.policy);
            if let Some(policy) = policy {
                self.metrics.book_premium(policy.premium());
            }
        }
    }

    pub fn update_risk_premium(&mut self) {
        if self.metrics.trailing_profit(PROFIT_LOOKBACK) < 0.0 {
            self.risk_premium *= TIGHTEN_FACTOR;
        } else {
            self.risk_premium *= RELAX_FACTOR;
        }
    }

    /// Claim notification from a household, settled immediately.
    pub fn receive_claim(&mut self, amount: f64) {
        self.metrics.book_claim(amount);
    }
}
