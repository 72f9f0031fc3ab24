//! logwarden agent: configuration, host lifecycle collaborators and monitor wiring.

pub mod agent;
pub mod config;
pub mod lifecycle;

pub use agent::{build_monitor, prepare_host, run};
pub use config::{Config, ConfigError};
