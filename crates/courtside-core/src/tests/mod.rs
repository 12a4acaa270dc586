//! Cross-module tests.
//!
//! - `helpers.rs`: host stubs (grid terrain, player registry, notifier) and
//!   fixture builders
//! - `integration.rs`: end-to-end scenarios through [`crate::Simulation`]
//! - `determinism.rs`: identical inputs give identical events and ball states
//! - `properties.rs`: `proptest` checks of the physics and lifecycle
//!   invariants

mod helpers;
mod properties;

pub use helpers::*;
