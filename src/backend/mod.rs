//! # In-Memory Backend
//!
//! An in-process stand-in for the mock REST API. It spawns one
//! [`CollectionActor`] per resource and implements [`ResourceApi`] on top of
//! them, translating actor results into the status codes the real backend
//! answers with (see the table in [`actor`]).
//!
//! The test suite verifies the contract against it, and the binary can target
//! it with `--in-memory` when no server is running.
//!
//! For injecting contract violations and transport errors, see [`scripted`].

pub mod actor;
pub mod scripted;

pub use actor::*;

use crate::clients::{ApiResponse, ClientError, ResourceApi};
use crate::model::{Entity, EntityId, ResourceName};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// All six collections, each served by its own actor task.
pub struct InMemoryBackend {
    collections: HashMap<ResourceName, CollectionClient>,
    handles: Vec<JoinHandle<()>>,
}

impl InMemoryBackend {
    /// Spawns an empty actor for every resource.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start() -> Self {
        let mut collections = HashMap::new();
        let mut handles = Vec::new();
        for resource in ResourceName::ALL {
            let (actor, client) = CollectionActor::new(resource, 32);
            handles.push(tokio::spawn(actor.run()));
            collections.insert(resource, client);
        }
        Self {
            collections,
            handles,
        }
    }

    pub fn collection(&self, resource: ResourceName) -> Result<&CollectionClient, ClientError> {
        self.collections
            .get(&resource)
            .ok_or_else(|| ClientError::Transport(format!("no collection for {resource}")))
    }

    /// Drops every client and waits for the actors to drain.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down in-memory backend...");
        drop(self.collections);
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }
        info!("In-memory backend shutdown complete.");
        Ok(())
    }
}

/// Maps an actor outcome to the status the mock API would answer with.
fn respond(success: u16, result: Result<Value, BackendError>) -> Result<ApiResponse, ClientError> {
    match result {
        Ok(data) => Ok(ApiResponse::with_data(success, data)),
        Err(e @ BackendError::NotFound(_)) => Ok(error_response(404, &e)),
        Err(e @ BackendError::DuplicateId(_)) => Ok(error_response(500, &e)),
        Err(e @ BackendError::InvalidPayload(_)) => Ok(error_response(400, &e)),
        Err(e @ (BackendError::ActorClosed | BackendError::ActorDropped)) => {
            Err(ClientError::Transport(e.to_string()))
        }
    }
}

fn error_response(status: u16, e: &BackendError) -> ApiResponse {
    ApiResponse::new(status, Some(json!({ "error": e.to_string() })))
}

#[async_trait]
impl ResourceApi for InMemoryBackend {
    async fn list(&self, resource: ResourceName) -> Result<ApiResponse, ClientError> {
        let result = self.collection(resource)?.list().await;
        respond(200, result.map(|records| records.into_iter().map(Value::Object).collect()))
    }

    async fn create(
        &self,
        resource: ResourceName,
        payload: &Entity,
    ) -> Result<ApiResponse, ClientError> {
        let result = self.collection(resource)?.create(payload.clone()).await;
        respond(201, result.map(Value::Object))
    }

    async fn read(
        &self,
        resource: ResourceName,
        id: &EntityId,
    ) -> Result<ApiResponse, ClientError> {
        let result = self.collection(resource)?.get(id.clone()).await;
        respond(200, result.map(Value::Object))
    }

    async fn update(
        &self,
        resource: ResourceName,
        id: &EntityId,
        payload: &Entity,
    ) -> Result<ApiResponse, ClientError> {
        let result = self
            .collection(resource)?
            .replace(id.clone(), payload.clone())
            .await;
        respond(200, result.map(Value::Object))
    }

    async fn delete(
        &self,
        resource: ResourceName,
        id: &EntityId,
    ) -> Result<ApiResponse, ClientError> {
        let result = self.collection(resource)?.delete(id.clone()).await;
        respond(200, result.map(Value::Object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(value: Value) -> Entity {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_status_codes_follow_mock_contract() {
        let backend = InMemoryBackend::start();
        let posts = ResourceName::Posts;

        let created = backend
            .create(posts, &entity(json!({ "id": 49, "title": "t" })))
            .await
            .unwrap();
        assert_eq!(created.status, 201);

        let duplicate = backend
            .create(posts, &entity(json!({ "id": 49, "title": "t" })))
            .await
            .unwrap();
        assert_eq!(duplicate.status, 500);

        let invalid = backend
            .read(posts, &EntityId::from("no-id-like-this"))
            .await
            .unwrap();
        assert_eq!(invalid.status, 404);

        let listed = backend.list(posts).await.unwrap();
        assert_eq!(listed.status, 200);
        assert_eq!(listed.data().and_then(Value::as_array).map(Vec::len), Some(1));

        backend.shutdown().await.unwrap();
    }
}
