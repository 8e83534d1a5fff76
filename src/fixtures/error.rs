//! Error types for fixture loading.

use crate::model::{EntityId, ResourceName};
use thiserror::Error;

/// Errors raised while loading or validating the fixture dataset and the
/// test-case table.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not have the expected shape.
    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        source: serde_json::Error,
    },

    /// The dataset names a collection that is not one of the six resources.
    #[error("Unknown resource in dataset: {0}")]
    UnknownResource(String),

    /// A resource has no fixture records, so there is no read oracle.
    #[error("No fixtures for {0}")]
    Empty(ResourceName),

    /// A record or payload does not match its resource's field schema.
    #[error("{resource} {context}: missing or malformed field `{field}`")]
    Shape {
        resource: ResourceName,
        context: String,
        field: String,
    },

    /// A test case references ids inconsistently with the dataset.
    #[error("{resource} test case {case}: {reason}")]
    InvalidCase {
        resource: ResourceName,
        case: String,
        reason: String,
    },

    /// Two fixture records share an id.
    #[error("{0}: duplicate fixture id {1}")]
    DuplicateId(ResourceName, EntityId),
}
