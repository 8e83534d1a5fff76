use crate::clients::ResourceApi;
use crate::fixtures::FixtureStore;
use crate::model::{EntityId, ResourceName, TestCase};
use crate::verifier::{
    CaseReport, ContractVerifier, FailureKind, Outcome, Phase, PhaseOutcome, ResourceReport,
    SuiteReport,
};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

/// Runs the contract for every selected resource and collects a [`SuiteReport`].
///
/// Within a resource the three reads run first, against the untouched
/// dataset, then each test case runs its phases in a fixed order:
///
/// ```text
/// Create -> CreateDuplicate -> Update -> UpdateMissing -> Delete -> DeleteMissing -> Teardown
/// ```
///
/// Teardown runs whenever Create handed out an id, whatever happened in
/// between, including a panic in one of the phases. Records a phase created
/// though it should not have (an accepted duplicate) are removed as well. Resources run one after the other unless [`parallel`](Self::parallel)
/// is set, in which case each resource gets its own task; cases of one
/// resource never interleave.
///
/// # Example
///
/// ```ignore
/// let api = Arc::new(HttpResourceClient::new(&config.base_url, config.request_timeout())?);
/// let fixtures = Arc::new(FixtureStore::load(&config.dataset_path, &config.test_cases_path)?);
///
/// let report = SuiteDriver::new(api, fixtures).parallel(true).run().await;
/// assert!(report.passed());
/// ```
pub struct SuiteDriver {
    api: Arc<dyn ResourceApi>,
    fixtures: Arc<FixtureStore>,
    resources: Vec<ResourceName>,
    parallel: bool,
}

impl SuiteDriver {
    /// A driver over every resource, run sequentially.
    pub fn new(api: Arc<dyn ResourceApi>, fixtures: Arc<FixtureStore>) -> Self {
        Self {
            api,
            fixtures,
            resources: ResourceName::ALL.to_vec(),
            parallel: false,
        }
    }

    /// Restricts the run to `resources`. Reports keep the order given here.
    pub fn with_resources(mut self, resources: Vec<ResourceName>) -> Self {
        self.resources = resources;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub async fn run(&self) -> SuiteReport {
        info!(
            resources = self.resources.len(),
            parallel = self.parallel,
            "Starting suite"
        );

        let resources = if self.parallel {
            self.run_parallel().await
        } else {
            let mut reports = Vec::with_capacity(self.resources.len());
            for &resource in &self.resources {
                reports.push(run_resource(self.api.as_ref(), &self.fixtures, resource).await);
            }
            reports
        };

        let report = SuiteReport { resources };
        for failure in report.failures() {
            warn!("{failure}");
        }
        let (passed, failed, skipped) = report.counts();
        info!(passed, failed, skipped, "Suite finished");
        report
    }

    async fn run_parallel(&self) -> Vec<ResourceReport> {
        let handles: Vec<_> = self
            .resources
            .iter()
            .map(|&resource| {
                let api = Arc::clone(&self.api);
                let fixtures = Arc::clone(&self.fixtures);
                let handle = tokio::spawn(async move {
                    run_resource(api.as_ref(), &fixtures, resource).await
                });
                (resource, handle)
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for (resource, handle) in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(%resource, "Verification task failed: {:?}", e);
                    reports.push(aborted(resource, e.to_string()));
                }
            }
        }
        reports
    }
}

/// A resource whose task died is reported as failing its first read.
fn aborted(resource: ResourceName, reason: String) -> ResourceReport {
    ResourceReport {
        resource,
        reads: vec![PhaseOutcome {
            phase: Phase::ReadCollection,
            outcome: Outcome::Failed(FailureKind::Transport(format!(
                "verification task aborted: {reason}"
            ))),
        }],
        cases: Vec::new(),
    }
}

/// Verifies one resource: the reads, then each of its test cases in order.
pub async fn run_resource(
    api: &dyn ResourceApi,
    fixtures: &FixtureStore,
    resource: ResourceName,
) -> ResourceReport {
    let span = info_span!("resource", %resource);
    async {
        let verifier = ContractVerifier::new(api, fixtures, resource);
        let reads = verifier.verify_reads().await;

        let mut created = HashSet::new();
        let mut cases = Vec::new();
        for (index, case) in fixtures.test_cases_for(resource).iter().enumerate() {
            cases.push(run_case(&verifier, case, index, &mut created).await);
        }

        ResourceReport {
            resource,
            reads,
            cases,
        }
    }
    .instrument(span)
    .await
}

/// Phases a case runs before teardown, in order.
const CASE_PHASES: [Phase; 6] = [
    Phase::Create,
    Phase::CreateDuplicate,
    Phase::Update,
    Phase::UpdateMissing,
    Phase::Delete,
    Phase::DeleteMissing,
];

/// Runs one test case through Created, Verified and TornDown.
///
/// `created` accumulates the ids handed out by Create across the cases of a
/// resource. A phase that panics is reported as a transport failure, the
/// phases after it as skipped, and teardown still runs.
pub async fn run_case(
    verifier: &ContractVerifier<'_>,
    case: &TestCase,
    index: usize,
    created: &mut HashSet<EntityId>,
) -> CaseReport {
    let label = case.label(index);
    let span = info_span!("case", case = %label);
    async {
        let mut phases = Vec::with_capacity(CASE_PHASES.len());
        let mut handle = None;
        let mut stray_handles = Vec::new();

        let verified = AssertUnwindSafe(async {
            let (create, created_handle) = verifier.create(case).await;
            phases.push(create);
            if let Some(h) = &created_handle {
                created.insert(h.id().clone());
            }
            handle = created_handle;

            let (duplicate, stray) = verifier.create_duplicate(case).await;
            phases.push(duplicate);
            if let Some(stray) = stray {
                warn!(id = %stray.id(), "Duplicate create was accepted, removing the record");
                created.insert(stray.id().clone());
                stray_handles.push(stray);
            }

            phases.push(verifier.update(case).await);
            phases.push(verifier.update_missing(case, created).await);
            phases.push(verifier.delete(case).await);
            phases.push(verifier.delete_missing(case).await);
        })
        .catch_unwind()
        .await;

        if let Err(payload) = verified {
            let phase = CASE_PHASES[phases.len()];
            let message = panic_message(payload.as_ref());
            error!(%phase, "Phase panicked: {message}");
            phases.push(PhaseOutcome {
                phase,
                outcome: Outcome::Failed(FailureKind::Transport(format!(
                    "phase panicked: {message}"
                ))),
            });
            for &rest in &CASE_PHASES[phases.len()..] {
                phases.push(PhaseOutcome {
                    phase: rest,
                    outcome: Outcome::Skipped { blocked_by: phase },
                });
            }
        }

        let teardown = match handle {
            Some(handle) => verifier.teardown(handle).await,
            None => {
                warn!("Nothing to tear down, create yielded no id");
                PhaseOutcome {
                    phase: Phase::Teardown,
                    outcome: Outcome::Skipped {
                        blocked_by: Phase::Create,
                    },
                }
            }
        };

        let mut strays = Vec::with_capacity(stray_handles.len());
        for stray in stray_handles {
            strays.push(verifier.teardown(stray).await);
        }

        CaseReport {
            case: label.clone(),
            phases,
            teardown,
            strays,
        }
    }
    .instrument(span)
    .await
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
