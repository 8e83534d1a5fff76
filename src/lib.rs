//! # CRUD Contract
//!
//! > **An executable contract for resource-oriented REST APIs.**
//!
//! This crate verifies that a REST backend exposing six resource collections
//! (`posts`, `albums`, `comments`, `photos`, `todos`, `users`) honours a
//! uniform CRUD contract: listing, reading by id, rejecting malformed ids,
//! creating, rejecting duplicate ids, updating, rejecting updates and deletes
//! of absent ids, and deleting.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### One Contract, Six Resources
//!
//! Every resource obeys the same lifecycle. Instead of one hand-written suite
//! per resource, the contract is written **once** in [`verifier`] and
//! parameterized by a [`ResourceSpec`](model::ResourceSpec): the resource's
//! name plus its field schema, nested objects included. Adding a resource
//! means adding a schema and fixtures, not a new suite.
//!
//! ### Failures Are Values
//!
//! A phase never panics and never returns early out of the suite. It produces
//! a [`PhaseOutcome`](verifier::PhaseOutcome) and the driver moves on, so one
//! broken endpoint cannot hide the state of the others. Each failure keeps its
//! resource, test case and phase, and says whether it was a contract
//! violation, a transport error or a timeout.
//!
//! ### Teardown Is Guaranteed
//!
//! The Create phase hands back a [`CreatedHandle`](verifier::CreatedHandle).
//! The driver consumes it in the Teardown phase whatever happened in between,
//! so a run leaves no test data behind except where the backend itself
//! refuses the delete (which is then reported).
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Data ([`model`], [`fixtures`])
//! - **Role**: Resource schemas, the entity representation, test cases, and
//!   the validated, read-only fixture store.
//! - **Key items**: [`ResourceName`](model::ResourceName),
//!   [`TestCase`](model::TestCase), [`FixtureStore`](fixtures::FixtureStore).
//!
//! ### 2. The Interface ([`clients`])
//! - **Role**: The [`ResourceApi`](clients::ResourceApi) trait the verifier
//!   talks to, and its HTTP implementation with an explicit per-call timeout.
//! - **Key items**: [`HttpResourceClient`](clients::HttpResourceClient),
//!   [`ApiResponse`](clients::ApiResponse).
//!
//! ### 3. The Contract ([`verifier`])
//! - **Role**: One method per phase, and the structured report.
//! - **Key items**: [`ContractVerifier`](verifier::ContractVerifier),
//!   [`SuiteReport`](verifier::SuiteReport).
//!
//! ### 4. The Orchestrator ([`lifecycle`])
//! - **Role**: Drives the phases in order per resource, optionally running
//!   resources concurrently, and owns config and tracing setup.
//! - **Key items**: [`SuiteDriver`](lifecycle::SuiteDriver),
//!   [`HarnessConfig`](lifecycle::HarnessConfig).
//!
//! ### 5. The Backends ([`backend`], [`seed`])
//! - **Role**: An actor-backed in-memory API that behaves like the mock
//!   server, a scripted wrapper for injecting faults, and the seeding utility
//!   that resets a store to the dataset before a run.
//! - **Key items**: [`InMemoryBackend`](backend::InMemoryBackend),
//!   [`ScriptedApi`](backend::scripted::ScriptedApi),
//!   [`SqliteSeeder`](seed::SqliteSeeder).
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Verify a running API
//! RUST_LOG=info cargo run -- run --base-url http://localhost:3000
//!
//! # Verify the in-process backend, resources in parallel
//! cargo run -- run --in-memory --parallel
//!
//! # Reset a SQLite database to the dataset
//! cargo run -- seed --database api.db
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod backend;
pub mod clients;
pub mod fixtures;
pub mod lifecycle;
pub mod model;
pub mod seed;
pub mod verifier;
