//! Application Layer
//!
//! User-facing CLI, configuration management, and the simulation harness
//! that drives a multiplexer with synthetic platform traffic.

pub mod cli;
pub mod config;
pub mod simulate;

pub use cli::Cli;
pub use config::Config;
pub use simulate::SimulationReport;
