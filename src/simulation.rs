use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, info, trace};

use crate::cell::ClimateCell;
use crate::collector::{AgentRecord, DataCollector, ModelRecord};
use crate::config::{ModelConfig, RunConfig};
use crate::error::{Result, SimError};
use crate::grid::{Occupant, SpatialGrid};
use crate::household::Household;
use crate::insurer::Insurer;
use crate::risk::RiskProfile;
use crate::scheduler::Scheduler;
use crate::types::{AgentId, CellId, HouseholdId, InsurerId, Pos, Step};

/// Owns every agent, the grid, the scheduler and the single random stream.
///
/// Agents refer to each other by id; ids index directly into the agent
/// vectors (`CellId(i)` is `cells[i]`, and so on).
pub struct Simulation {
    config: ModelConfig,
    rng: ChaCha20Rng,
    grid: SpatialGrid,
    scheduler: Scheduler,
    pub cells: Vec<ClimateCell>,
    pub households: Vec<Household>,
    pub insurers: Vec<Insurer>,
    pub collector: DataCollector,
}

impl Simulation {
    /// Build the full population: one cell per coordinate, then the insurers,
    /// then `n_households` households placed uniformly at random, each with
    /// a normally drawn house value and a uniformly chosen insurer.
    pub fn from_config(config: ModelConfig) -> Result<Self> {
        let mut sim = Self::bare(config)?;

        let house_values = Normal::new(sim.config.house_value_mean, sim.config.house_value_std)
            .map_err(|e| SimError::InvalidConfig(format!("house value distribution: {e}")))?;

        for _ in 0..sim.config.n_households {
            let pos = sim.random_position();
            let house_value = house_values.sample(&mut sim.rng);
            let insurer = InsurerId(sim.rng.random_range(0..sim.insurers.len()) as u64);
            sim.add_household(pos, house_value, Some(insurer));
        }

        info!(
            seed = sim.config.seed,
            cells = sim.cells.len(),
            insurers = sim.insurers.len(),
            households = sim.households.len(),
            "simulation initialised"
        );
        Ok(sim)
    }

    /// Cells and insurers only; `n_households` is ignored. Households can
    /// then be placed explicitly with [`Simulation::add_household`].
    pub fn bare(config: ModelConfig) -> Result<Self> {
        config.validate()?;

        let mut grid = SpatialGrid::new(config.grid_width, config.grid_height);
        let mut scheduler = Scheduler::new();

        let mut cells = Vec::with_capacity(config.grid_width * config.grid_height);
        for pos in grid.positions().collect::<Vec<_>>() {
            let id = CellId(cells.len() as u64);
            cells.push(ClimateCell::new(id, pos, RiskProfile::new(config.base_risk_levels.clone())));
            grid.place(pos, Occupant::Cell(id));
            scheduler.add(AgentId::Cell(id));
        }

        let insurers: Vec<Insurer> = (0..config.n_insurers)
            .map(|i| {
                Insurer::new(
                    InsurerId(i as u64),
                    config.initial_insurer_capital,
                    config.base_premium_rate,
                    config.initial_risk_premium,
                )
            })
            .collect();
        for insurer in &insurers {
            scheduler.add(AgentId::Insurer(insurer.id));
        }

        Ok(Simulation {
            rng: ChaCha20Rng::seed_from_u64(config.seed),
            config,
            grid,
            scheduler,
            cells,
            households: Vec::new(),
            insurers,
            collector: DataCollector::new(),
        })
    }

    /// Place a household and, if `insurer` names an existing insurer, enroll
    /// it with a policy snapshot of that insurer's current rates.
    ///
    /// Panics if `pos` lies outside the grid.
    pub fn add_household(&mut self, pos: Pos, house_value: f64, insurer: Option<InsurerId>) -> HouseholdId {
        let id = HouseholdId(self.households.len() as u64);
        let mut household = Household::new(id, pos, house_value);

        if let Some(insurer) = insurer.and_then(|i| self.insurers.get_mut(i.0 as usize)) {
            household.insurer = Some(insurer.id);
            household.policy = Some(insurer.issue_policy(house_value));
            insurer.enroll(id);
        }

        self.grid.place(pos, Occupant::Household(id));
        self.scheduler.add(AgentId::Household(id));
        self.households.push(household);
        id
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn steps(&self) -> Step {
        self.scheduler.steps()
    }

    pub fn cell_at(&self, pos: Pos) -> Option<&ClimateCell> {
        self.grid.climate_cell_at(pos).map(|id| &self.cells[id.0 as usize])
    }

    pub fn random_position(&mut self) -> Pos {
        let x = self.rng.random_range(0..self.grid.width());
        let y = self.rng.random_range(0..self.grid.height());
        Pos::new(x, y)
    }

    pub fn random_positions(&mut self, n: usize) -> Vec<Pos> {
        (0..n).map(|_| self.random_position()).collect()
    }

    /// Record metrics, then activate every agent once in random order.
    pub fn step(&mut self) {
        self.collect();

        let Simulation { config, rng, grid, scheduler, cells, households, insurers, .. } = self;
        let climate_change_rate = config.climate_change_rate;

        scheduler.advance(rng, |rng, agent, step| match agent {
            AgentId::Cell(id) => cells[id.0 as usize].on_step(climate_change_rate),
            AgentId::Household(id) => {
                let household = &mut households[id.0 as usize];
                let Some(cell) = grid.climate_cell_at(household.pos) else {
                    return;
                };
                let claims = household.on_step(step, &cells[cell.0 as usize].risk, rng);
                if claims.is_empty() {
                    return;
                }
                if let Some(insurer) = household.insurer.and_then(|i| insurers.get_mut(i.0 as usize)) {
                    for claim in &claims {
                        trace!(household = id.0, insurer = insurer.id.0, hazard = claim.hazard.as_str(), amount = claim.amount, "claim filed");
                        insurer.receive_claim(claim.amount);
                    }
                }
            }
            AgentId::Insurer(id) => insurers[id.0 as usize].on_step(households.as_slice()),
        });

        debug!(
            step = self.scheduler.steps().0,
            mean_premium = self.mean_risk_premium(),
            total_capital = self.total_insurer_capital(),
            mean_climate_risk = self.mean_climate_risk(),
            "step complete"
        );
    }

    pub fn run(&mut self, steps: u64) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Run `run.steps` steps, injecting the scripted shock (if any) just
    /// before its step. Shock positions are drawn from the simulation's own
    /// stream; a shock scheduled at or past the horizon never fires.
    pub fn run_with(&mut self, run: &RunConfig) {
        for step in 0..run.steps {
            if let Some(shock) = &run.shock
                && shock.at_step == step
            {
                let positions = self.random_positions(shock.n_positions);
                self.apply_climate_shock(&positions, shock.magnitude, shock.duration);
            }
            self.step();
        }
    }

    /// Multiply the risk profile of the cell at each position by
    /// `1 + magnitude`. Positions without a cell, including ones off the
    /// grid, are skipped. Returns the number of cells shocked.
    ///
    /// `duration` is recorded in the log only; the elevation does not expire.
    pub fn apply_climate_shock(&mut self, positions: &[Pos], magnitude: f64, duration: u32) -> usize {
        let mut shocked = 0;
        for &pos in positions {
            if let Some(id) = self.grid.climate_cell_at(pos) {
                debug!(%pos, "applying shock to grid cell");
                self.cells[id.0 as usize].apply_shock(magnitude);
                shocked += 1;
            }
        }
        info!(
            step = self.steps().0,
            requested = positions.len(),
            shocked,
            magnitude,
            duration,
            "climate shock applied"
        );
        shocked
    }

    pub fn mean_risk_premium(&self) -> f64 {
        if self.insurers.is_empty() {
            return 0.0;
        }
        self.insurers.iter().map(|i| i.risk_premium).sum::<f64>() / self.insurers.len() as f64
    }

    pub fn total_insurer_capital(&self) -> f64 {
        self.insurers.iter().map(|i| i.metrics.capital).sum()
    }

    /// Mean over every (cell, hazard) probability.
    pub fn mean_climate_risk(&self) -> f64 {
        let n: usize = self.cells.iter().map(|c| c.risk.len()).sum();
        if n == 0 {
            return 0.0;
        }
        self.cells.iter().map(|c| c.risk.sum()).sum::<f64>() / n as f64
    }

    fn collect(&mut self) {
        let step = self.scheduler.steps();
        self.collector.model.push(ModelRecord {
            step,
            mean_premium: self.mean_risk_premium(),
            total_insurer_capital: self.total_insurer_capital(),
            mean_climate_risk: self.mean_climate_risk(),
        });

        for &agent in self.scheduler.agents() {
            let record = match agent {
                AgentId::Insurer(id) => {
                    let m = &self.insurers[id.0 as usize].metrics;
                    AgentRecord {
                        step,
                        agent,
                        capital: Some(m.capital),
                        claims_paid: Some(m.claims_paid),
                        premiums_collected: Some(m.premiums_collected),
                    }
                }
                other => AgentRecord::empty(step, other),
            };
            self.collector.agents.push(record);
        }
    }
}
