use serde::Serialize;

use crate::types::{HazardKind, Step};

/// Pricing terms frozen when a household is enrolled. Later moves in the
/// insurer's `risk_premium` do not reach an issued policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InsurancePolicy {
    pub premium_rate: f64,
    pub risk_premium: f64,
    pub house_value: f64,
}

impl InsurancePolicy {
    /// Premium = house_value × premium_rate + house_value × risk_premium.
    pub fn premium(&self) -> f64 {
        let base = self.house_value * self.premium_rate;
        let risk_adjustment = self.house_value * self.risk_premium;
        base + risk_adjustment
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClaimRecord {
    pub amount: f64,
    pub hazard: HazardKind,
    pub step: Step,
}

/// An insurer's ledger. `claims_paid` and `premiums_collected` cover the
/// current settlement window only; `record_profit` closes the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsuranceMetrics {
    /// Signed; claims may drive it below zero.
    pub capital: f64,
    pub claims_paid: f64,
    pub premiums_collected: f64,
    pub profit_history: Vec<f64>,
}

impl InsuranceMetrics {
    pub fn new(capital: f64) -> Self {
        InsuranceMetrics {
            capital,
            claims_paid: 0.0,
            premiums_collected: 0.0,
            profit_history: Vec::new(),
        }
    }

    pub fn book_premium(&mut self, premium: f64) {
        self.capital += premium;
        self.premiums_collected += premium;
    }

    pub fn book_claim(&mut self, amount: f64) {
        self.capital -= amount;
        self.claims_paid += amount;
    }

    /// Append this window's profit and reset both accumulators.
    pub fn record_profit(&mut self) {
        let profit = self.premiums_collected - self.claims_paid;
        self.profit_history.push(profit);
        self.claims_paid = 0.0;
        self.premiums_collected = 0.0;
    }

    /// Sum of the last `n` recorded profits (fewer if history is shorter).
    pub fn trailing_profit(&self, n: usize) -> f64 {
        let start = self.profit_history.len().saturating_sub(n);
        self.profit_history[start..].iter().sum()
    }
}
