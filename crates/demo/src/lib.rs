//! End-to-end cinema booking scenario wired from configuration.

pub mod config;
pub mod scenario;

pub use config::DemoConfig;
pub use scenario::{ScenarioReport, run_scenario};
