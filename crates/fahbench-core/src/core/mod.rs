//! # Core Module
//!
//! Stateless building blocks shared by the engine and the benchmark driver.
//!
//! - **Models** ([`models`]) - engine-native objects (`System`, `Integrator`,
//!   `State`) and the `WorkUnit` descriptor that locates them on disk
//! - **Serialization** ([`io`]) - TOML (de)serialization of work-unit artifacts
//! - **Validation** ([`validation`]) - NaN scans, discrepancy checks and
//!   reference-versus-tested force/energy comparison

pub mod io;
pub mod models;
pub mod validation;
