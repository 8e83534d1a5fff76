//! Suite orchestration and the ambient runtime setup.
//!
//! - [`SuiteDriver`] - runs the contract for each resource and gathers the report
//! - [`HarnessConfig`] - where the API lives, where the fixtures are, how long to wait
//! - [`setup_tracing`] - initializes the tracing/logging infrastructure

pub mod config;
pub mod suite;
pub mod tracing;

pub use config::*;
pub use suite::*;
pub use tracing::*;
