//! # Collection Actor
//!
//! Each resource collection of the in-memory backend is owned by one
//! [`CollectionActor`] running in its own Tokio task. Requests arrive as
//! [`CollectionRequest`] messages over an mpsc channel and are answered via
//! oneshot channels, so a collection processes its requests strictly one at a
//! time without any locks, while different collections run in parallel.
//!
//! The actor reproduces the documented contract of the mock API:
//!
//! | Request | Outcome |
//! |---------|---------|
//! | non-canonical id (`abc`, `01`, `+1`) | [`BackendError::NotFound`] |
//! | create without id | next id from a counter that starts at max(id) + 1 and never goes back |
//! | create with an existing id | [`BackendError::DuplicateId`] (500 on the wire) |
//! | replace / delete of a missing id | [`BackendError::NotFound`] |

use crate::model::{Entity, EntityId, ResourceName};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Errors produced by the in-memory backend.
#[derive(Debug, Error, PartialEq)]
pub enum BackendError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Duplicate id: {0}")]
    DuplicateId(u64),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// One-shot response channel used by the collection actor.
pub type Response<T> = oneshot::Sender<Result<T, BackendError>>;

/// Messages understood by a [`CollectionActor`].
#[derive(Debug)]
pub enum CollectionRequest {
    List {
        respond_to: Response<Vec<Entity>>,
    },
    Get {
        id: EntityId,
        respond_to: Response<Entity>,
    },
    Create {
        payload: Entity,
        respond_to: Response<Entity>,
    },
    Replace {
        id: EntityId,
        payload: Entity,
        respond_to: Response<Entity>,
    },
    Delete {
        id: EntityId,
        respond_to: Response<Entity>,
    },
    /// Wipe the collection and insert `records`.
    Reset {
        records: Vec<Entity>,
        respond_to: Response<usize>,
    },
}

/// Owns the records of one collection.
pub struct CollectionActor {
    resource: ResourceName,
    receiver: mpsc::Receiver<CollectionRequest>,
    store: BTreeMap<u64, Entity>,
    /// Next generated id. Only ever grows, so deleted ids are never reissued.
    next_id: u64,
}

impl CollectionActor {
    pub fn new(resource: ResourceName, buffer_size: usize) -> (Self, CollectionClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            resource,
            receiver,
            store: BTreeMap::new(),
            next_id: 1,
        };
        (actor, CollectionClient::new(sender))
    }

    /// Processes requests until every client has been dropped.
    pub async fn run(mut self) {
        let resource = self.resource.as_str();
        info!(resource, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CollectionRequest::List { respond_to } => {
                    debug!(resource, size = self.store.len(), "List");
                    let _ = respond_to.send(Ok(self.store.values().cloned().collect()));
                }
                CollectionRequest::Get { id, respond_to } => {
                    let result = self.get(&id);
                    debug!(resource, %id, found = result.is_ok(), "Get");
                    let _ = respond_to.send(result);
                }
                CollectionRequest::Create {
                    payload,
                    respond_to,
                } => {
                    debug!(resource, ?payload, "Create");
                    let result = self.create(payload);
                    match &result {
                        Ok(entity) => {
                            info!(resource, id = %entity["id"], size = self.store.len(), "Created")
                        }
                        Err(e) => warn!(resource, error = %e, "Create failed"),
                    }
                    let _ = respond_to.send(result);
                }
                CollectionRequest::Replace {
                    id,
                    payload,
                    respond_to,
                } => {
                    debug!(resource, %id, ?payload, "Replace");
                    let result = self.replace(&id, payload);
                    match &result {
                        Ok(_) => info!(resource, %id, "Updated"),
                        Err(e) => warn!(resource, %id, error = %e, "Update failed"),
                    }
                    let _ = respond_to.send(result);
                }
                CollectionRequest::Delete { id, respond_to } => {
                    debug!(resource, %id, "Delete");
                    let result = self.delete(&id);
                    match &result {
                        Ok(_) => info!(resource, %id, size = self.store.len(), "Deleted"),
                        Err(e) => warn!(resource, %id, error = %e, "Delete failed"),
                    }
                    let _ = respond_to.send(result);
                }
                CollectionRequest::Reset {
                    records,
                    respond_to,
                } => {
                    let result = self.reset(records);
                    match &result {
                        Ok(size) => info!(resource, size, "Reset"),
                        Err(e) => warn!(resource, error = %e, "Reset failed"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(resource, size = self.store.len(), "Shutdown");
    }

    fn get(&self, id: &EntityId) -> Result<Entity, BackendError> {
        let key = parse_key(id)?;
        self.store
            .get(&key)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(id.to_string()))
    }

    fn create(&mut self, mut payload: Entity) -> Result<Entity, BackendError> {
        let key = match payload.get("id") {
            None | Some(Value::Null) => self.next_id,
            Some(value) => {
                let key = key_of(value)?;
                if self.store.contains_key(&key) {
                    return Err(BackendError::DuplicateId(key));
                }
                key
            }
        };
        self.next_id = self.next_id.max(key.saturating_add(1));
        payload.insert("id".to_string(), Value::from(key));
        self.store.insert(key, payload.clone());
        Ok(payload)
    }

    fn replace(&mut self, id: &EntityId, mut payload: Entity) -> Result<Entity, BackendError> {
        let key = parse_key(id)?;
        let slot = self
            .store
            .get_mut(&key)
            .ok_or_else(|| BackendError::NotFound(id.to_string()))?;
        payload.insert("id".to_string(), Value::from(key));
        *slot = payload.clone();
        Ok(payload)
    }

    fn delete(&mut self, id: &EntityId) -> Result<Entity, BackendError> {
        let key = parse_key(id)?;
        self.store
            .remove(&key)
            .ok_or_else(|| BackendError::NotFound(id.to_string()))
    }

    fn reset(&mut self, records: Vec<Entity>) -> Result<usize, BackendError> {
        let mut store = BTreeMap::new();
        for record in records {
            let value = record
                .get("id")
                .ok_or_else(|| BackendError::InvalidPayload("record without id".to_string()))?;
            let key = key_of(value)?;
            if store.insert(key, record).is_some() {
                return Err(BackendError::DuplicateId(key));
            }
        }
        self.next_id = store.keys().next_back().map_or(1, |max| max + 1);
        self.store = store;
        Ok(self.store.len())
    }
}

/// Canonical decimal only: no sign, no leading zeros, no whitespace.
fn canonical_key(raw: &str) -> Option<u64> {
    let digits_only = !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit());
    if !digits_only || (raw.len() > 1 && raw.starts_with('0')) {
        return None;
    }
    raw.parse().ok()
}

/// Path ids must be canonical numbers; anything else is simply not found.
fn parse_key(id: &EntityId) -> Result<u64, BackendError> {
    canonical_key(id.as_str()).ok_or_else(|| BackendError::NotFound(id.to_string()))
}

fn key_of(value: &Value) -> Result<u64, BackendError> {
    EntityId::from_value(value)
        .and_then(|id| canonical_key(id.as_str()))
        .ok_or_else(|| BackendError::InvalidPayload(format!("non-numeric id: {value}")))
}

/// Cloneable handle for sending requests to a [`CollectionActor`].
#[derive(Clone)]
pub struct CollectionClient {
    sender: mpsc::Sender<CollectionRequest>,
}

impl CollectionClient {
    pub fn new(sender: mpsc::Sender<CollectionRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> CollectionRequest,
    ) -> Result<T, BackendError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| BackendError::ActorClosed)?;
        response.await.map_err(|_| BackendError::ActorDropped)?
    }

    pub async fn list(&self) -> Result<Vec<Entity>, BackendError> {
        self.request(|respond_to| CollectionRequest::List { respond_to })
            .await
    }

    pub async fn get(&self, id: EntityId) -> Result<Entity, BackendError> {
        self.request(|respond_to| CollectionRequest::Get { id, respond_to })
            .await
    }

    pub async fn create(&self, payload: Entity) -> Result<Entity, BackendError> {
        self.request(|respond_to| CollectionRequest::Create {
            payload,
            respond_to,
        })
        .await
    }

    pub async fn replace(&self, id: EntityId, payload: Entity) -> Result<Entity, BackendError> {
        self.request(|respond_to| CollectionRequest::Replace {
            id,
            payload,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, id: EntityId) -> Result<Entity, BackendError> {
        self.request(|respond_to| CollectionRequest::Delete { id, respond_to })
            .await
    }

    pub async fn reset(&self, records: Vec<Entity>) -> Result<usize, BackendError> {
        self.request(|respond_to| CollectionRequest::Reset {
            records,
            respond_to,
        })
        .await
    }
}
