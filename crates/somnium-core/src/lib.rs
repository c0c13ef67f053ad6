//! Tick scheduler, configuration, and simulation runner for Somnium.
//!
//! This crate owns [`SimulationState`] and the fixed-order tick that
//! drives the behavior-mutation rules: doubt, dream, mutation, then
//! temporary goal expiry.
//!
//! # Modules
//!
//! - [`clock`] -- Monotonic tick counter with checked advance.
//! - [`config`] -- Configuration loading from `somnium-config.yaml` into
//!   strongly-typed structs.
//! - [`entropy`] -- [`EntropySource`] trait and the built-in schedules.
//! - [`runner`] -- Async run loop with pause, stop, and tick pacing.
//! - [`tick`] -- [`SimulationState`], its builder, and `advance`.
//!
//! [`EntropySource`]: entropy::EntropySource
//! [`SimulationState`]: tick::SimulationState

pub mod clock;
pub mod config;
pub mod entropy;
pub mod runner;
pub mod tick;

pub use config::SomniumConfig;
pub use tick::{SimulationBuilder, SimulationState, TickPhase, TickSummary};
