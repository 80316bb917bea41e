//! Application layer - Use case services.
//!
//! Turns configuration into a [`LaunchPlan`] and drives the listeners it
//! describes through their lifecycle with the [`Orchestrator`]. External
//! dependencies are reached through the traits in [`crate::ports`].

mod orchestrator;
mod plan;

pub use orchestrator::{
    InstanceInfo, Orchestrator, OrchestratorPhase, ShutdownReport, DEFAULT_STOP_TIMEOUT,
};
pub use plan::{LaunchPlan, ProtocolPlan};
