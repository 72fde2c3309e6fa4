use rand::Rng;
use rand::seq::SliceRandom;

use crate::types::{AgentId, Step};

/// Random-activation scheduler: every registered agent is activated exactly
/// once per round, in a fresh random order.
///
/// Activation is serial. An agent sees peers activated earlier in the same
/// round in their already-updated state.
#[derive(Default)]
pub struct Scheduler {
    agents: Vec<AgentId>,
    steps: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, agent: AgentId) {
        self.agents.push(agent);
    }

    /// Rounds completed so far.
    pub fn steps(&self) -> Step {
        Step(self.steps)
    }

    pub fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Run one round: draw a single permutation from `rng`, call `activate`
    /// for each agent in that order with the pre-round step count, then
    /// advance the counter. The same `rng` is handed to each activation.
    pub fn advance<R, F>(&mut self, rng: &mut R, mut activate: F)
    where
        R: Rng + ?Sized,
        F: FnMut(&mut R, AgentId, Step),
    {
        let mut order = self.agents.clone();
        order.shuffle(rng);
        let step = self.steps();
        for agent in order {
            activate(rng, agent, step);
        }
        self.steps += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::types::{CellId, HouseholdId, InsurerId};

    fn populated(n: u64) -> Scheduler {
        let mut s = Scheduler::new();
        for i in 0..n {
            s.add(AgentId::Cell(CellId(i)));
            s.add(AgentId::Household(HouseholdId(i)));
            s.add(AgentId::Insurer(InsurerId(i)));
        }
        s
    }

    #[test]
    fn counter_starts_at_zero() {
        assert_eq!(Scheduler::new().steps(), Step(0));
    }

    #[test]
    fn every_agent_activated_exactly_once_per_round() {
        let mut s = populated(10);
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let mut seen: HashMap<AgentId, usize> = HashMap::new();
        s.advance(&mut rng, |_, a, _| *seen.entry(a).or_insert(0) += 1);
        assert_eq!(seen.len(), 30);
        assert!(seen.values().all(|&n| n == 1));
    }

    #[test]
    fn agents_observe_pre_round_step_count() {
        let mut s = populated(3);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for expected in 0..4 {
            let mut stamps = Vec::new();
            s.advance(&mut rng, |_, _, step| stamps.push(step));
            assert!(stamps.iter().all(|&st| st == Step(expected)));
        }
        assert_eq!(s.steps(), Step(4));
    }

    #[test]
    fn order_is_reshuffled_between_rounds() {
        let mut s = populated(20);
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let mut first = Vec::new();
        let mut second = Vec::new();
        s.advance(&mut rng, |_, a, _| first.push(a));
        s.advance(&mut rng, |_, a, _| second.push(a));
        assert_ne!(first, second, "60 agents should not repeat the same permutation");
    }

    #[test]
    fn same_seed_same_order() {
        let run = || {
            let mut s = populated(8);
            let mut rng = ChaCha20Rng::seed_from_u64(99);
            let mut order = Vec::new();
            s.advance(&mut rng, |_, a, _| order.push(a));
            order
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn empty_scheduler_still_counts_rounds() {
        let mut s = Scheduler::new();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        s.advance(&mut rng, |_, _, _| panic!("no agents registered"));
        assert_eq!(s.steps(), Step(1));
    }
}
