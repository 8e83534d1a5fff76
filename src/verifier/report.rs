//! Phase outcomes and the reports they roll up into.

use crate::clients::ClientError;
use crate::model::ResourceName;
use std::fmt;
use thiserror::Error;

/// One step of the CRUD contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    ReadCollection,
    ReadById,
    ReadInvalidId,
    Create,
    CreateDuplicate,
    Update,
    UpdateMissing,
    Delete,
    DeleteMissing,
    Teardown,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::ReadCollection => "read-collection",
            Phase::ReadById => "read-by-id",
            Phase::ReadInvalidId => "read-invalid-id",
            Phase::Create => "create",
            Phase::CreateDuplicate => "create-duplicate",
            Phase::Update => "update",
            Phase::UpdateMissing => "update-missing",
            Phase::Delete => "delete",
            Phase::DeleteMissing => "delete-missing",
            Phase::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a phase failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FailureKind {
    /// The backend answered, but not as the contract requires.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// The call never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The call did not complete within the per-call timeout.
    #[error("timed out after {0} ms")]
    Timeout(u64),
}

impl From<ClientError> for FailureKind {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Timeout(ms) => FailureKind::Timeout(ms),
            ClientError::Transport(msg) => FailureKind::Transport(msg),
            ClientError::InvalidUrl(msg) => FailureKind::Transport(format!("invalid URL: {msg}")),
        }
    }
}

/// Result of running one phase.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    Failed(FailureKind),
    /// The phase could not run because an earlier phase it depends on failed.
    Skipped { blocked_by: Phase },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOutcome {
    pub phase: Phase,
    pub outcome: Outcome,
}

impl PhaseOutcome {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Passed)
    }

    pub fn failure(&self) -> Option<&FailureKind> {
        match &self.outcome {
            Outcome::Failed(kind) => Some(kind),
            _ => None,
        }
    }
}

/// A failed phase with enough context to find it: resource, case, phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub resource: ResourceName,
    /// `None` for resource-level read checks.
    pub case: Option<String>,
    pub phase: Phase,
    pub kind: FailureKind,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.case {
            Some(case) => write!(f, "[{} / {} / {}] {}", self.resource, case, self.phase, self.kind),
            None => write!(f, "[{} / {}] {}", self.resource, self.phase, self.kind),
        }
    }
}

/// Everything that happened to one test case.
///
/// Teardown is kept apart from the verification phases so a cleanup failure
/// is reported next to, never instead of, the failure that preceded it.
/// `strays` holds the teardowns of records that a phase created although it
/// should not have (a duplicate-id create the backend accepted).
#[derive(Debug, Clone, PartialEq)]
pub struct CaseReport {
    pub case: String,
    pub phases: Vec<PhaseOutcome>,
    pub teardown: PhaseOutcome,
    pub strays: Vec<PhaseOutcome>,
}

impl CaseReport {
    /// Verification phases, then the teardown, then stray cleanups.
    pub fn outcomes(&self) -> impl Iterator<Item = &PhaseOutcome> + '_ {
        self.phases
            .iter()
            .chain(std::iter::once(&self.teardown))
            .chain(self.strays.iter())
    }

    pub fn passed(&self) -> bool {
        self.outcomes().all(PhaseOutcome::passed)
    }

    pub fn outcome_of(&self, phase: Phase) -> Option<&Outcome> {
        self.outcomes()
            .find(|p| p.phase == phase)
            .map(|p| &p.outcome)
    }
}

/// Resource-level read checks plus every case of one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceReport {
    pub resource: ResourceName,
    pub reads: Vec<PhaseOutcome>,
    pub cases: Vec<CaseReport>,
}

impl ResourceReport {
    pub fn passed(&self) -> bool {
        self.reads.iter().all(PhaseOutcome::passed) && self.cases.iter().all(CaseReport::passed)
    }

    pub fn failures(&self) -> Vec<Failure> {
        let reads = self.reads.iter().filter_map(|p| {
            p.failure().map(|kind| Failure {
                resource: self.resource,
                case: None,
                phase: p.phase,
                kind: kind.clone(),
            })
        });
        let cases = self.cases.iter().flat_map(|case| {
            case.outcomes().filter_map(move |p| {
                p.failure().map(|kind| Failure {
                    resource: self.resource,
                    case: Some(case.case.clone()),
                    phase: p.phase,
                    kind: kind.clone(),
                })
            })
        });
        reads.chain(cases).collect()
    }
}

/// Outcome of a whole suite run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuiteReport {
    pub resources: Vec<ResourceReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.resources.iter().all(ResourceReport::passed)
    }

    pub fn failures(&self) -> Vec<Failure> {
        self.resources
            .iter()
            .flat_map(ResourceReport::failures)
            .collect()
    }

    pub fn resource(&self, resource: ResourceName) -> Option<&ResourceReport> {
        self.resources.iter().find(|r| r.resource == resource)
    }

    /// (passed, failed, skipped) phase counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        let phases = self.resources.iter().flat_map(|r| {
            r.reads
                .iter()
                .chain(r.cases.iter().flat_map(CaseReport::outcomes))
        });
        for phase in phases {
            match phase.outcome {
                Outcome::Passed => counts.0 += 1,
                Outcome::Failed(_) => counts.1 += 1,
                Outcome::Skipped { .. } => counts.2 += 1,
            }
        }
        counts
    }
}
