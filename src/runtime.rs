//! Runtime glue: validated configuration and telemetry/tracing setup.

pub mod config;
pub mod telemetry;
