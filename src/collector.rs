//! Per-step traces of model-level and agent-level metrics.
//!
//! Records are taken at the start of each step, before any agent is
//! activated: row 0 is the initial state, and row `n > 0` is the state left
//! behind by round `n - 1` (plus any shock injected just before round `n`).

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::types::{AgentId, Step};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRecord {
    pub step: Step,
    /// Mean of the insurers' live risk premiums (0 with no insurers).
    pub mean_premium: f64,
    pub total_insurer_capital: f64,
    /// Mean over every cell's hazard probabilities.
    pub mean_climate_risk: f64,
}

/// Only insurers report values; every other agent kind reports `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRecord {
    pub step: Step,
    pub agent: AgentId,
    pub capital: Option<f64>,
    pub claims_paid: Option<f64>,
    pub premiums_collected: Option<f64>,
}

impl AgentRecord {
    pub fn empty(step: Step, agent: AgentId) -> Self {
        AgentRecord { step, agent, capital: None, claims_paid: None, premiums_collected: None }
    }
}

#[derive(Debug, Default)]
pub struct DataCollector {
    pub model: Vec<ModelRecord>,
    pub agents: Vec<AgentRecord>,
}

impl DataCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_model(&self) -> Option<&ModelRecord> {
        self.model.last()
    }

    /// Agent rows recorded at `step`, in registration order.
    pub fn agents_at(&self, step: Step) -> impl Iterator<Item = &AgentRecord> {
        self.agents.iter().filter(move |r| r.step == step)
    }
}

/// One header line, then one row per step.
pub fn write_model_csv<W: Write>(records: &[ModelRecord], mut w: W) -> Result<()> {
    writeln!(w, "step,mean_premium,total_insurer_capital,mean_climate_risk")?;
    for r in records {
        writeln!(
            w,
            "{},{:.8},{:.2},{:.8}",
            r.step.0, r.mean_premium, r.total_insurer_capital, r.mean_climate_risk
        )?;
    }
    w.flush()?;
    Ok(())
}

/// One JSON object per line.
pub fn write_ndjson<W: Write, T: Serialize>(records: &[T], mut w: W) -> Result<()> {
    for r in records {
        serde_json::to_writer(&mut w, r)?;
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellId, InsurerId};

    fn model_row(step: u64) -> ModelRecord {
        ModelRecord {
            step: Step(step),
            mean_premium: 0.005,
            total_insurer_capital: 5_000_000.0,
            mean_climate_risk: 0.02,
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_step() {
        let mut buf = Vec::new();
        write_model_csv(&[model_row(0), model_row(1)], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "step,mean_premium,total_insurer_capital,mean_climate_risk");
        assert_eq!(lines[1], "0,0.00500000,5000000.00,0.02000000");
        assert!(lines[2].starts_with("1,"));
    }

    #[test]
    fn non_insurer_agent_record_serializes_nulls() {
        let rec = AgentRecord::empty(Step(3), AgentId::Cell(CellId(1)));
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["step"], 3);
        assert!(v["capital"].is_null());
        assert!(v["claims_paid"].is_null());
        assert!(v["premiums_collected"].is_null());
    }

    #[test]
    fn ndjson_stream_one_line_per_record() {
        let records = vec![
            AgentRecord::empty(Step(0), AgentId::Cell(CellId(0))),
            AgentRecord {
                step: Step(0),
                agent: AgentId::Insurer(InsurerId(0)),
                capital: Some(1.0),
                claims_paid: Some(0.0),
                premiums_collected: Some(0.0),
            },
        ];
        let mut buf = Vec::new();
        write_ndjson(&records, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(v.get("agent").is_some(), "missing 'agent' key in: {line}");
        }
        assert!(lines[1].contains(r#""agent":{"Insurer":0}"#));
    }

    #[test]
    fn agents_at_filters_by_step() {
        let mut c = DataCollector::new();
        c.agents.push(AgentRecord::empty(Step(0), AgentId::Cell(CellId(0))));
        c.agents.push(AgentRecord::empty(Step(1), AgentId::Cell(CellId(0))));
        c.agents.push(AgentRecord::empty(Step(1), AgentId::Cell(CellId(1))));
        assert_eq!(c.agents_at(Step(1)).count(), 2);
    }
}
