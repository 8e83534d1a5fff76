//! # Contract Verifier
//!
//! [`ContractVerifier`] executes the CRUD contract of one resource against a
//! [`ResourceApi`]. Each phase is a single method returning a
//! [`PhaseOutcome`]; a failure is a value, never a panic or an early return,
//! so a failing phase cannot suppress the phases after it.
//!
//! ## Phases
//!
//! | Phase | Calls | Expected |
//! |-------|-------|----------|
//! | [`Phase::ReadCollection`] | `GET /r` | 200, non-empty array |
//! | [`Phase::ReadById`] | `GET /r/{first}` | 200, equals the first fixture |
//! | [`Phase::ReadInvalidId`] | `GET /r/no-id-like-this` | 404 |
//! | [`Phase::Create`] | `POST /r`, `GET /r/{new}` | 2xx + id, then 200 with every submitted field |
//! | [`Phase::CreateDuplicate`] | `POST /r` with an existing id | 5xx |
//! | [`Phase::Update`] | `PUT /r/{id}`, `GET /r/{id}` | 200, then 200 with every updated field |
//! | [`Phase::UpdateMissing`] | `PUT /r/{absent}`, `GET /r/{absent}` | 404, 404 |
//! | [`Phase::Delete`] | `DELETE /r/{id}`, `GET /r/{id}` | 200, 404 |
//! | [`Phase::DeleteMissing`] | `DELETE /r/{absent}` | 404 |
//! | [`Phase::Teardown`] | `DELETE /r/{new}`, `GET /r/{new}` | 2xx, 404 |
//!
//! The duplicate-id create answering 5xx (rather than 409) is how the mock
//! backend behaves; a 4xx there counts as a contract violation.

use super::compare::{diff, diff_exact};
use super::report::{FailureKind, Outcome, Phase, PhaseOutcome};
use crate::clients::{ApiResponse, ResourceApi};
use crate::fixtures::FixtureStore;
use crate::model::{Entity, EntityId, ResourceName, TestCase};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// Id of the wrong shape, expected to be rejected with 404.
pub const INVALID_ID: &str = "no-id-like-this";

/// An entity created during the Create phase, awaiting teardown.
///
/// Returned by [`ContractVerifier::create`] and consumed by
/// [`ContractVerifier::teardown`].
#[must_use = "a created entity must be torn down"]
#[derive(Debug, PartialEq, Eq)]
pub struct CreatedHandle {
    resource: ResourceName,
    id: EntityId,
}

impl CreatedHandle {
    pub fn resource(&self) -> ResourceName {
        self.resource
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }
}

type Check = Result<(), FailureKind>;

fn fail(message: impl Into<String>) -> FailureKind {
    FailureKind::Assertion(message.into())
}

fn expect_status(what: &str, response: &ApiResponse, expected: u16) -> Check {
    if response.status == expected {
        Ok(())
    } else {
        Err(fail(format!(
            "{what}: expected status {expected}, got {}",
            response.status
        )))
    }
}

fn expect_success(what: &str, response: &ApiResponse) -> Check {
    if response.is_success() {
        Ok(())
    } else {
        Err(fail(format!(
            "{what}: expected a 2xx status, got {}",
            response.status
        )))
    }
}

fn expect_fields(what: &str, expected: &Entity, response: &ApiResponse) -> Check {
    let actual = response.data().unwrap_or(&Value::Null);
    no_mismatches(what, diff(expected, actual))
}

fn expect_exact(what: &str, expected: &Entity, response: &ApiResponse) -> Check {
    let actual = response.data().unwrap_or(&Value::Null);
    no_mismatches(what, diff_exact(expected, actual))
}

fn no_mismatches(what: &str, mismatches: Vec<String>) -> Check {
    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(fail(format!("{what}: {}", mismatches.join("; "))))
    }
}

/// Runs the contract phases for one resource.
pub struct ContractVerifier<'a> {
    api: &'a dyn ResourceApi,
    fixtures: &'a FixtureStore,
    resource: ResourceName,
}

impl<'a> ContractVerifier<'a> {
    pub fn new(api: &'a dyn ResourceApi, fixtures: &'a FixtureStore, resource: ResourceName) -> Self {
        Self {
            api,
            fixtures,
            resource,
        }
    }

    pub fn resource(&self) -> ResourceName {
        self.resource
    }

    fn conclude(&self, phase: Phase, result: Check) -> PhaseOutcome {
        let outcome = match result {
            Ok(()) => {
                info!(resource = %self.resource, %phase, "Passed");
                Outcome::Passed
            }
            Err(kind) => {
                warn!(resource = %self.resource, %phase, error = %kind, "Failed");
                Outcome::Failed(kind)
            }
        };
        PhaseOutcome { phase, outcome }
    }

    /// The three resource-level read checks, in order.
    pub async fn verify_reads(&self) -> Vec<PhaseOutcome> {
        vec![
            self.read_collection().await,
            self.read_by_id().await,
            self.read_invalid_id().await,
        ]
    }

    #[instrument(skip_all, fields(resource = %self.resource))]
    pub async fn read_collection(&self) -> PhaseOutcome {
        let result: Check = async {
            let response = self.api.list(self.resource).await?;
            expect_status("list", &response, 200)?;
            match response.data().and_then(Value::as_array) {
                Some(items) if !items.is_empty() => Ok(()),
                Some(_) => Err(fail("list: collection is empty")),
                None => Err(fail("list: data is not an array")),
            }
        }
        .await;
        self.conclude(Phase::ReadCollection, result)
    }

    /// Reads the first fixture back. The body must equal the fixture record
    /// exactly, so a field the backend adds is a failure here.
    #[instrument(skip_all, fields(resource = %self.resource))]
    pub async fn read_by_id(&self) -> PhaseOutcome {
        let result: Check = async {
            let expected = self
                .fixtures
                .first_of(self.resource)
                .ok_or_else(|| fail("no fixture to read"))?;
            let id = EntityId::of(expected).ok_or_else(|| fail("first fixture has no id"))?;
            let response = self.api.read(self.resource, &id).await?;
            expect_status("read fixture", &response, 200)?;
            expect_exact("read fixture", expected, &response)
        }
        .await;
        self.conclude(Phase::ReadById, result)
    }

    #[instrument(skip_all, fields(resource = %self.resource))]
    pub async fn read_invalid_id(&self) -> PhaseOutcome {
        let result: Check = async {
            let response = self
                .api
                .read(self.resource, &EntityId::from(INVALID_ID))
                .await?;
            expect_status("read invalid id", &response, 404)
        }
        .await;
        self.conclude(Phase::ReadInvalidId, result)
    }

    /// Creates the case's entity and reads it back.
    ///
    /// The handle is returned whenever the backend handed out an id, even if
    /// the read-back failed, so the caller can always tear it down.
    #[instrument(skip_all, fields(resource = %self.resource))]
    pub async fn create(&self, case: &TestCase) -> (PhaseOutcome, Option<CreatedHandle>) {
        let payload = case.create_payload();
        let mut handle = None;

        let result: Check = async {
            let response = self.api.create(self.resource, &payload).await?;
            expect_success("create", &response)?;
            let id = response
                .data_id()
                .ok_or_else(|| fail("create: response carries no generated id"))?;
            debug!(%id, "Created");
            handle = Some(CreatedHandle {
                resource: self.resource,
                id: id.clone(),
            });

            let read = self.api.read(self.resource, &id).await?;
            expect_status("read created", &read, 200)?;
            if read.data_id().as_ref() != Some(&id) {
                return Err(fail(format!(
                    "read created: expected id {id}, got {:?}",
                    read.data_id()
                )));
            }
            expect_fields("read created", &payload, &read)
        }
        .await;

        (self.conclude(Phase::Create, result), handle)
    }

    /// Submitting a payload whose id already exists must fail with 5xx.
    ///
    /// A backend that accepts the duplicate anyway has created a record; its
    /// handle is returned so the caller can tear it down as well.
    #[instrument(skip_all, fields(resource = %self.resource))]
    pub async fn create_duplicate(&self, case: &TestCase) -> (PhaseOutcome, Option<CreatedHandle>) {
        let mut stray = None;
        let result: Check = async {
            let duplicate = case
                .duplicate_id
                .clone()
                .or_else(|| self.fixtures.first_of(self.resource).and_then(EntityId::of))
                .ok_or_else(|| fail("no existing id to duplicate"))?;
            let mut payload = case.create_payload();
            payload.insert("id".to_string(), duplicate.to_value());

            let response = self.api.create(self.resource, &payload).await?;
            if response.is_success() {
                stray = response.data_id().map(|id| CreatedHandle {
                    resource: self.resource,
                    id,
                });
            }
            if response.is_server_error() {
                Ok(())
            } else {
                Err(fail(format!(
                    "create with existing id {duplicate}: expected a 5xx status, got {}",
                    response.status
                )))
            }
        }
        .await;
        (self.conclude(Phase::CreateDuplicate, result), stray)
    }

    #[instrument(skip_all, fields(resource = %self.resource))]
    pub async fn update(&self, case: &TestCase) -> PhaseOutcome {
        let result: Check = async {
            let id = case
                .update_id()
                .ok_or_else(|| fail("update payload has no id"))?;
            let response = self.api.update(self.resource, &id, &case.update).await?;
            expect_status("update", &response, 200)?;

            let read = self.api.read(self.resource, &id).await?;
            expect_status("read updated", &read, 200)?;
            expect_fields("read updated", &case.update, &read)
        }
        .await;
        self.conclude(Phase::Update, result)
    }

    /// Updating an absent id must answer 404 and must not create a record.
    ///
    /// `created` holds every id handed out so far in the run; an absent id
    /// that collides with one of them is a broken test case, not something to
    /// probe the backend with.
    #[instrument(skip_all, fields(resource = %self.resource))]
    pub async fn update_missing(&self, case: &TestCase, created: &HashSet<EntityId>) -> PhaseOutcome {
        let id = &case.not_existing_id;
        let result: Check = async {
            if created.contains(id) {
                return Err(fail(format!(
                    "notExistingId {id} collides with an id created in this run"
                )));
            }
            let response = self.api.update(self.resource, id, &case.update).await?;
            expect_status("update missing", &response, 404)?;

            let read = self.api.read(self.resource, id).await?;
            expect_status("read after update missing", &read, 404)
        }
        .await;
        self.conclude(Phase::UpdateMissing, result)
    }

    #[instrument(skip_all, fields(resource = %self.resource))]
    pub async fn delete(&self, case: &TestCase) -> PhaseOutcome {
        let id = &case.id_to_delete;
        let result: Check = async {
            let response = self.api.delete(self.resource, id).await?;
            expect_status("delete", &response, 200)?;

            let read = self.api.read(self.resource, id).await?;
            expect_status("read deleted", &read, 404)
        }
        .await;
        self.conclude(Phase::Delete, result)
    }

    /// Deleting an absent id must answer 404, not a no-op success.
    #[instrument(skip_all, fields(resource = %self.resource))]
    pub async fn delete_missing(&self, case: &TestCase) -> PhaseOutcome {
        let result: Check = async {
            let response = self
                .api
                .delete(self.resource, &case.not_existing_id)
                .await?;
            expect_status("delete missing", &response, 404)
        }
        .await;
        self.conclude(Phase::DeleteMissing, result)
    }

    /// Deletes the entity behind `handle` and confirms it is gone.
    #[instrument(skip_all, fields(resource = %handle.resource, id = %handle.id))]
    pub async fn teardown(&self, handle: CreatedHandle) -> PhaseOutcome {
        let result: Check = async {
            let response = self.api.delete(handle.resource, &handle.id).await?;
            expect_success("teardown delete", &response)?;

            let read = self.api.read(handle.resource, &handle.id).await?;
            expect_status("read after teardown", &read, 404)
        }
        .await;
        self.conclude(Phase::Teardown, result)
    }
}
