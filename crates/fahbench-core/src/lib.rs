//! # FAHBench Core Library
//!
//! Measures the sustained throughput of a molecular-dynamics engine on a
//! chosen compute device and reports it as simulated nanoseconds per day.
//!
//! ## Architectural Philosophy
//!
//! The library is split into three layers:
//!
//! - **[`core`]: The Foundation.** Stateless models (`System`, `Integrator`,
//!   `State`, `WorkUnit`), TOML serialization and the numerical correctness
//!   checks applied to state snapshots.
//!
//! - **[`engine`]: The Compute Layer.** The adapter traits the driver consumes,
//!   platform descriptors, plugin manifests, and a built-in engine with
//!   `Reference` and `CPU` platforms.
//!
//! - **[`workflows`]: The Public API.** The prepare/verify/benchmark state
//!   machine, its configuration, callbacks and results, and multi-device sets
//!   used by embedding front ends.

pub mod core;
pub mod engine;
pub mod workflows;
