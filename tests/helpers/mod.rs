//! Shared helpers for the integration tests.

#![allow(dead_code)]

pub mod api_stub;

use crud_contract::backend::InMemoryBackend;
use crud_contract::fixtures::FixtureStore;
use crud_contract::seed::Seeder;

pub const DATASET: &str = include_str!("../../fixtures/data.json");
pub const TEST_CASES: &str = include_str!("../../fixtures/test_cases.json");

pub fn fixtures() -> FixtureStore {
    FixtureStore::from_json(DATASET, TEST_CASES).expect("bundled fixtures are valid")
}

/// A fresh in-memory backend holding the bundled dataset.
pub async fn seeded_backend(fixtures: &FixtureStore) -> InMemoryBackend {
    let backend = InMemoryBackend::start();
    backend.reset(fixtures).await.expect("seed in-memory backend");
    backend
}
