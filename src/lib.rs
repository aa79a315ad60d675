//! # fx-sensitivity
//!
//! Spot and volatility sensitivity scenarios for FX forward path simulations.
//!
//! Given base model parameters (GBM or OU) and a symmetric shock on either
//! spot or volatility, this crate plans three scenarios (Down, Base, Up),
//! requests path statistics for each from an external simulation service,
//! and combines the responses into scenario-tagged series for comparison.
//!
//! ## Architecture
//!
//! - **core** — Data model: model parameters, shock specification, path statistics
//! - **scenario** — Scenario planning and simulation request shaping
//! - **client** — Simulation service client and its error taxonomy
//! - **orchestration** — Result aggregation and the run controller state machine
//! - **config** — Service location, timeout and dispatch settings

pub mod client;
pub mod config;
pub mod core;
pub mod orchestration;
pub mod scenario;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::client::error::SimulationError;
    pub use crate::client::http::{HttpSimulationClient, SimulationClient};
    pub use crate::config::OrchestratorConfig;
    pub use crate::core::params::{ModelKind, ModelParameters, RunConfig};
    pub use crate::core::shock::{ShockMagnitude, ShockSpec, ShockTarget};
    pub use crate::core::stats::{RawScenarioResult, SensitivityResult, StatsPoint, TaggedStatsPoint};
    pub use crate::orchestration::aggregator::aggregate;
    pub use crate::orchestration::controller::{
        Dispatch, RunController, RunError, RunSnapshot, RunState,
    };
    pub use crate::scenario::planner::{plan, Scenario, ScenarioKind};
    pub use crate::scenario::request::{format_fixed4, RequestBuilder, SimulationRequest};
}
