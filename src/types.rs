use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CellId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HouseholdId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct InsurerId(pub u64);

/// Count of scheduler rounds completed. Agents activated during round `n`
/// observe `Step(n)`, so the first round stamps claims with `Step(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Step(pub u64);

/// Integer grid coordinate within `[0, width) × [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardKind {
    Flood,
    Subsidence,
    Storm,
}

impl HazardKind {
    pub const ALL: [HazardKind; 3] = [HazardKind::Flood, HazardKind::Subsidence, HazardKind::Storm];

    pub fn as_str(self) -> &'static str {
        match self {
            HazardKind::Flood => "flood",
            HazardKind::Subsidence => "subsidence",
            HazardKind::Storm => "storm",
        }
    }
}

impl FromStr for HazardKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HazardKind::ALL
            .into_iter()
            .find(|h| h.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SimError::UnknownHazard(s.to_string()))
    }
}

/// Every agent the scheduler can activate. The set is closed: cells, households
/// and insurers are the only kinds that take part in a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AgentId {
    Cell(CellId),
    Household(HouseholdId),
    Insurer(InsurerId),
}
