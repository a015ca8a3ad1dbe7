//! # Engine Module
//!
//! The adapter between the benchmark driver and a molecular-dynamics engine.
//!
//! ## Overview
//!
//! The driver only ever talks to the [`Engine`] and [`EngineContext`] traits:
//! it asks for platforms, binds a deserialized system and integrator to one of
//! them, advances integration steps and extracts state snapshots. Everything
//! behind those traits is replaceable.
//!
//! ## Architecture
//!
//! - **Adapter traits** ([`traits`]) - the narrow interface consumed by the driver
//! - **Platforms** ([`platform`]) - platform/device descriptors and property maps
//! - **Plugins** ([`plugins`]) - manifest-described backends loaded from a directory
//! - **Native engine** ([`native`]) - the built-in engine with `Reference` and `CPU`
//!   platforms and velocity-Verlet contexts
//! - **Error Handling** ([`error`]) - engine-specific error types

pub mod context;
pub mod error;
pub(crate) mod kernels;
pub mod native;
pub mod platform;
pub mod plugins;
pub mod traits;

pub use context::NativeContext;
pub use error::EngineError;
pub use native::NativeEngine;
pub use platform::{DeviceInfo, PlatformInfo, Precision, PropertyMap};
pub use traits::{Engine, EngineContext};
