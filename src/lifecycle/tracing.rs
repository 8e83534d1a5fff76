//! # Observability & Tracing
//!
//! This module provides the tracing setup for the suite runner.
//!
//! ## Overview
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing` crate.
//! Spans nest the way the suite does: a resource span contains one span per
//! test case, which contains one span per contract phase, which contains the
//! client call it issues.
//!
//! ## Configuration
//!
//! The compact format hides the module prefix (`with_target(false)`), since
//! every event already carries `resource` and `phase` fields.
//!
//! ## What Gets Traced
//!
//! - **Fixtures**: record and case counts at load
//! - **Phases**: `Passed` at info, `Failed` at warn with the failure reason
//! - **Client calls**: verb span with resource and id, payload and status at debug
//! - **Suite**: per-failure warnings and a final passed/failed/skipped summary
//!
//! ## Usage Examples
//!
//! ```bash
//! # One line per phase
//! RUST_LOG=info crud-contract run
//!
//! # Payloads and response statuses too
//! RUST_LOG=debug crud-contract run
//!
//! # Only the verifier
//! RUST_LOG=crud_contract::verifier=debug crud-contract run
//! ```
//!
//! **With `RUST_LOG=info`**:
//!
//! ```text
//! INFO resource:case:create: Passed resource=albums phase=create
//! WARN resource:case:update: Failed resource=albums phase=update error=assertion failed: read updated: title: expected "title", got "omnis laborum odio"
//! INFO resource:case:teardown: Passed resource=albums phase=teardown
//! INFO Suite finished passed=61 failed=1 skipped=0
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
