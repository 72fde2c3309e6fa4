//! Discrete-time spatial model of households, insurers and a growing climate
//! hazard.
//!
//! A [`simulation::Simulation`] owns a grid of [`cell::ClimateCell`]s, a set
//! of [`insurer::Insurer`]s and the [`household::Household`]s they cover.
//! Each step every agent is activated once in a random order drawn from a
//! single seeded generator: cells compound their hazard probabilities,
//! households test those probabilities and file claims, and insurers collect
//! premiums and reprice from their trailing profit.

pub mod cell;
pub mod collector;
pub mod config;
pub mod error;
pub mod grid;
pub mod household;
pub mod insurer;
pub mod records;
pub mod risk;
pub mod scheduler;
pub mod simulation;
pub mod types;
