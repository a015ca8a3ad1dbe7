//! # Workflows Module
//!
//! The benchmark driver: everything between "here is a configuration" and
//! "here is a score".
//!
//! ## Overview
//!
//! A [`Simulation`](simulation::Simulation) is configured once, prepared
//! (plugins loaded, artifacts deserialized, context built and optionally
//! cross-checked against the reference platform) and then run through a timed
//! throughput loop. Progress, status messages and cancellation flow through an
//! [`Updater`](updater::Updater).
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - `SimulationConfig`, its builder and path resolution
//! - **Orchestrator** ([`simulation`]) - the prepare/run state machine
//! - **Benchmark Loop** ([`benchmark`]) - timed stepping with periodic correctness checks
//! - **Multi-device Sets** ([`batch`]) - one simulation per usable device, run in sequence
//! - **Callbacks** ([`updater`]) - progress, message and cancellation hooks
//! - **Results** ([`result`]) - `SimulationResult` and its status codes
//! - **Error Handling** ([`error`]) - fatal driver errors

pub mod batch;
pub mod benchmark;
pub mod config;
pub mod error;
pub mod result;
pub mod simulation;
pub mod updater;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch::{SetOptions, SimulationSet};
pub use config::{BenchPaths, SimulationConfig, SimulationConfigBuilder};
pub use error::SimulationError;
pub use result::{ResultStatus, SimulationResult};
pub use simulation::Simulation;
pub use updater::Updater;
