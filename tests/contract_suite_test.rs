mod helpers;

use std::sync::Arc;

use crud_contract::backend::scripted::{ScriptedApi, Verb};
use crud_contract::clients::{ApiResponse, ClientError, ResourceApi};
use crud_contract::lifecycle::{run_resource, SuiteDriver};
use crud_contract::model::{EntityId, ResourceName};
use crud_contract::verifier::{ContractVerifier, FailureKind, Outcome, Phase};
use serde_json::json;

/// The whole suite against a conforming backend passes, and leaves every
/// collection with no records created during the run.
#[tokio::test]
async fn test_full_suite_passes_against_in_memory_backend() {
    let fixtures = Arc::new(helpers::fixtures());
    let backend = Arc::new(helpers::seeded_backend(&fixtures).await);

    let report = SuiteDriver::new(backend.clone(), fixtures.clone())
        .run()
        .await;

    assert!(report.passed(), "failures: {:#?}", report.failures());
    assert_eq!(report.resources.len(), 6);
    let (passed, failed, skipped) = report.counts();
    assert_eq!((failed, skipped), (0, 0));
    // 3 reads per resource, 7 phases per case.
    assert_eq!(passed, 6 * 3 + 7 * 7);

    for resource in ResourceName::ALL {
        let list = backend.list(resource).await.unwrap();
        let remaining = list.data().and_then(|d| d.as_array()).unwrap().len();
        let deleted = fixtures.test_cases_for(resource).len();
        assert_eq!(
            remaining,
            fixtures.records(resource).len() - deleted,
            "{resource} has leftovers"
        );
    }
}

#[tokio::test]
async fn test_album_create_read_back_and_teardown() {
    let fixtures = helpers::fixtures();
    let backend = helpers::seeded_backend(&fixtures).await;

    let payload = json!({ "userId": 1, "title": "title" });
    let created = backend
        .create(ResourceName::Albums, payload.as_object().unwrap())
        .await
        .unwrap();
    assert_eq!(created.status, 201);
    let id = created.data_id().expect("generated id");

    let read = backend.read(ResourceName::Albums, &id).await.unwrap();
    assert_eq!(read.status, 200);
    assert_eq!(read.data().unwrap()["title"], "title");
    assert_eq!(read.data().unwrap()["userId"], 1);

    assert_eq!(backend.delete(ResourceName::Albums, &id).await.unwrap().status, 200);
    assert_eq!(backend.read(ResourceName::Albums, &id).await.unwrap().status, 404);
}

#[tokio::test]
async fn test_update_of_absent_album_is_404_and_creates_nothing() {
    let fixtures = helpers::fixtures();
    let backend = helpers::seeded_backend(&fixtures).await;
    let id = EntityId::from(333u64);

    let payload = json!({ "id": 333, "userId": 1, "title": "title" });
    let update = backend
        .update(ResourceName::Albums, &id, payload.as_object().unwrap())
        .await
        .unwrap();
    assert_eq!(update.status, 404);
    assert_eq!(backend.read(ResourceName::Albums, &id).await.unwrap().status, 404);
}

#[tokio::test]
async fn test_post_with_existing_id_is_server_error() {
    let fixtures = helpers::fixtures();
    let backend = helpers::seeded_backend(&fixtures).await;

    let payload = json!({ "id": 49, "userId": 1, "title": "title", "body": "body" });
    let response = backend
        .create(ResourceName::Posts, payload.as_object().unwrap())
        .await
        .unwrap();
    assert_eq!(response.status, 500);
}

#[tokio::test]
async fn test_malformed_id_is_404_for_every_resource() {
    let fixtures = helpers::fixtures();
    let backend = helpers::seeded_backend(&fixtures).await;

    for resource in ResourceName::ALL {
        let verifier = ContractVerifier::new(&backend, &fixtures, resource);
        assert!(verifier.read_invalid_id().await.passed(), "{resource}");
    }
}

/// A failed read-back still leads to teardown, and the teardown's own
/// failure is reported next to the create failure rather than replacing it.
#[tokio::test]
async fn test_teardown_runs_after_failed_read_back_and_reports_both() {
    let fixtures = helpers::fixtures();
    let api = ScriptedApi::new(helpers::seeded_backend(&fixtures).await);

    // Todos are seeded with ids 1..=3, so the created todo gets 4.
    api.expect(Verb::Read, ResourceName::Todos)
        .with_id(4u64)
        .once()
        .return_response(ApiResponse::with_data(200, json!({ "id": 4, "title": "stale" })));
    api.expect(Verb::Delete, ResourceName::Todos)
        .with_id(4u64)
        .return_err(ClientError::Timeout(100));

    let report = run_resource(&api, &fixtures, ResourceName::Todos).await;
    let case = &report.cases[0];

    assert!(matches!(
        case.outcome_of(Phase::Create),
        Some(Outcome::Failed(FailureKind::Assertion(_)))
    ));
    assert_eq!(case.teardown.failure(), Some(&FailureKind::Timeout(100)));
    assert_eq!(api.calls_to(Verb::Delete, ResourceName::Todos).len(), 3);

    let failing: Vec<Phase> = report.failures().iter().map(|f| f.phase).collect();
    assert_eq!(failing, vec![Phase::Create, Phase::Teardown]);
}

#[tokio::test]
async fn test_transport_errors_are_not_contract_violations() {
    let fixtures = Arc::new(helpers::fixtures());
    let api = Arc::new(ScriptedApi::new(helpers::seeded_backend(&fixtures).await));
    api.expect(Verb::List, ResourceName::Comments)
        .return_err(ClientError::Transport("connection refused".into()));

    let report = SuiteDriver::new(api.clone(), fixtures)
        .with_resources(vec![ResourceName::Comments, ResourceName::Users])
        .run()
        .await;

    assert!(!report.passed());
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].resource, ResourceName::Comments);
    assert_eq!(failures[0].phase, Phase::ReadCollection);
    assert_eq!(
        failures[0].kind,
        FailureKind::Transport("connection refused".into())
    );
    assert!(report.resource(ResourceName::Users).unwrap().passed());
}

#[tokio::test]
async fn test_backend_treating_absent_delete_as_success_is_flagged() {
    let fixtures = helpers::fixtures();
    let api = ScriptedApi::new(helpers::seeded_backend(&fixtures).await);
    api.expect(Verb::Delete, ResourceName::Albums)
        .with_id(333u64)
        .return_response(ApiResponse::new(204, None));

    let report = run_resource(&api, &fixtures, ResourceName::Albums).await;
    let failures = report.failures();

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].phase, Phase::DeleteMissing);
    assert_eq!(failures[0].case.as_deref(), Some("albums#0"));
}
