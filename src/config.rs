use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SimError};
use crate::types::HazardKind;

/// Immutable run parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub seed: u64,
    pub n_households: usize,
    pub n_insurers: usize,
    pub initial_insurer_capital: f64,
    /// Per-step compound growth applied to every cell's hazard probabilities.
    pub climate_change_rate: f64,
    pub grid_width: usize,
    pub grid_height: usize,
    /// Starting probability per hazard, copied into every cell.
    pub base_risk_levels: BTreeMap<HazardKind, f64>,
    /// Declared for calibration; not read by any component.
    pub risk_volatility: f64,
    /// Declared for calibration; not read by any component. Probabilities are
    /// not clamped to this level.
    pub max_risk_level: f64,
    pub base_premium_rate: f64,
    pub initial_risk_premium: f64,
    /// House values are drawn once from Normal(mean, std).
    pub house_value_mean: f64,
    pub house_value_std: f64,
}

impl ModelConfig {
    /// The reference run: 1000 households, 5 insurers on a 50×50 grid.
    pub fn canonical() -> Self {
        ModelConfig {
            seed: 42,
            n_households: 1_000,
            n_insurers: 5,
            initial_insurer_capital: 1_000_000.0,
            climate_change_rate: 0.01,
            grid_width: 50,
            grid_height: 50,
            base_risk_levels: BTreeMap::from([
                (HazardKind::Flood, 0.02),
                (HazardKind::Subsidence, 0.01),
                (HazardKind::Storm, 0.03),
            ]),
            risk_volatility: 0.1,
            max_risk_level: 0.5,
            base_premium_rate: 0.001,
            initial_risk_premium: 0.005,
            house_value_mean: 2_000_000.0,
            house_value_std: 500_000.0,
        }
    }

    /// Reject parameter combinations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(SimError::InvalidConfig(msg)) };

        if self.grid_width == 0 || self.grid_height == 0 {
            return invalid(format!("grid must be non-empty, got {}x{}", self.grid_width, self.grid_height));
        }
        if self.n_households > 0 && self.n_insurers == 0 {
            return invalid(format!("{} households need at least one insurer", self.n_households));
        }
        if !(self.house_value_std >= 0.0 && self.house_value_std.is_finite()) {
            return invalid(format!("house_value_std must be finite and >= 0, got {}", self.house_value_std));
        }
        if !self.house_value_mean.is_finite() {
            return invalid(format!("house_value_mean must be finite, got {}", self.house_value_mean));
        }
        for (hazard, p) in &self.base_risk_levels {
            if !(p.is_finite() && *p >= 0.0) {
                return invalid(format!("base risk for {} must be finite and >= 0, got {p}", hazard.as_str()));
            }
        }
        let rates = [
            ("climate_change_rate", self.climate_change_rate),
            ("initial_insurer_capital", self.initial_insurer_capital),
            ("base_premium_rate", self.base_premium_rate),
            ("initial_risk_premium", self.initial_risk_premium),
        ];
        for (name, value) in rates {
            if !value.is_finite() {
                return invalid(format!("{name} must be finite, got {value}"));
            }
        }
        Ok(())
    }

    /// Parse a TOML document. Keys that are absent keep their canonical value.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text)?;
        file.into_config()
    }

    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// On-disk shape of a config file; everything optional.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    seed: Option<u64>,
    n_households: Option<usize>,
    n_insurers: Option<usize>,
    initial_insurer_capital: Option<f64>,
    climate_change_rate: Option<f64>,
    grid_width: Option<usize>,
    grid_height: Option<usize>,
    base_risk_levels: Option<BTreeMap<String, f64>>,
    risk_volatility: Option<f64>,
    max_risk_level: Option<f64>,
    base_premium_rate: Option<f64>,
    initial_risk_premium: Option<f64>,
    house_value_mean: Option<f64>,
    house_value_std: Option<f64>,
}

impl ConfigFile {
    fn into_config(self) -> Result<ModelConfig> {
        let d = ModelConfig::canonical();
        let base_risk_levels = match self.base_risk_levels {
            Some(levels) => levels
                .into_iter()
                .map(|(k, p)| -> Result<(HazardKind, f64)> { Ok((k.parse()?, p)) })
                .collect::<Result<BTreeMap<_, _>>>()?,
            None => d.base_risk_levels,
        };
        let config = ModelConfig {
            seed: self.seed.unwrap_or(d.seed),
            n_households: self.n_households.unwrap_or(d.n_households),
            n_insurers: self.n_insurers.unwrap_or(d.n_insurers),
            initial_insurer_capital: self.initial_insurer_capital.unwrap_or(d.initial_insurer_capital),
            climate_change_rate: self.climate_change_rate.unwrap_or(d.climate_change_rate),
            grid_width: self.grid_width.unwrap_or(d.grid_width),
            grid_height: self.grid_height.unwrap_or(d.grid_height),
            base_risk_levels,
            risk_volatility: self.risk_volatility.unwrap_or(d.risk_volatility),
            max_risk_level: self.max_risk_level.unwrap_or(d.max_risk_level),
            base_premium_rate: self.base_premium_rate.unwrap_or(d.base_premium_rate),
            initial_risk_premium: self.initial_risk_premium.unwrap_or(d.initial_risk_premium),
            house_value_mean: self.house_value_mean.unwrap_or(d.house_value_mean),
            house_value_std: self.house_value_std.unwrap_or(d.house_value_std),
        };
        config.validate()?;
        Ok(config)
    }
}

/// A one-off shock injected by the driver at a fixed step.
#[derive(Debug, Clone, PartialEq)]
pub struct ShockConfig {
    pub at_step: u64,
    pub magnitude: f64,
    /// Positions are sampled from the simulation's own RNG.
    pub n_positions: usize,
    /// Accepted and logged; the shock does not expire.
    pub duration: u32,
}

/// Driver-level settings around a single simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub steps: u64,
    pub shock: Option<ShockConfig>,
}

impl RunConfig {
    pub fn canonical() -> Self {
        RunConfig { steps: 100, shock: None }
    }

    pub fn canonical_shock() -> ShockConfig {
        ShockConfig { at_step: 50, magnitude: 0.5, n_positions: 100, duration: 10 }
    }
}
