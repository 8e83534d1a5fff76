use super::ClientError;
use crate::model::{Entity, EntityId, ResourceName};
use async_trait::async_trait;
use serde_json::Value;

/// Status and parsed body of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// `None` when the body was empty or not JSON.
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    /// A response wrapping `data` in the `{ "data": ... }` envelope.
    pub fn with_data(status: u16, data: Value) -> Self {
        Self::new(status, Some(serde_json::json!({ "data": data })))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// The payload inside the `data` envelope.
    pub fn data(&self) -> Option<&Value> {
        self.body.as_ref().and_then(|body| body.get("data"))
    }

    /// The payload inside the envelope, when it is a single entity.
    pub fn entity(&self) -> Option<&Entity> {
        self.data().and_then(Value::as_object)
    }

    /// `data.id`, when present and non-empty.
    pub fn data_id(&self) -> Option<EntityId> {
        self.data()
            .and_then(|data| data.get("id"))
            .and_then(EntityId::from_value)
    }
}

/// The four CRUD verbs (plus collection listing) against a named resource.
///
/// Each call is a single round-trip with no retries. Any response the backend
/// produces, including 404 and 5xx, is an `Ok`; only calls that never got a
/// response are `Err`.
///
/// The trait sits at the seam between the verifier and the backend so the
/// same contract can be checked over HTTP, against the in-memory backend, or
/// against a scripted double.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// `GET /{resource}`
    async fn list(&self, resource: ResourceName) -> Result<ApiResponse, ClientError>;

    /// `POST /{resource}`
    async fn create(
        &self,
        resource: ResourceName,
        payload: &Entity,
    ) -> Result<ApiResponse, ClientError>;

    /// `GET /{resource}/{id}`
    async fn read(&self, resource: ResourceName, id: &EntityId)
        -> Result<ApiResponse, ClientError>;

    /// `PUT /{resource}/{id}`
    async fn update(
        &self,
        resource: ResourceName,
        id: &EntityId,
        payload: &Entity,
    ) -> Result<ApiResponse, ClientError>;

    /// `DELETE /{resource}/{id}`
    async fn delete(
        &self,
        resource: ResourceName,
        id: &EntityId,
    ) -> Result<ApiResponse, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_accessors() {
        let response = ApiResponse::with_data(201, json!({ "id": 51, "title": "t" }));
        assert!(response.is_success());
        assert_eq!(response.data_id(), Some(EntityId::from(51)));
        assert_eq!(response.entity().unwrap()["title"], "t");

        let empty = ApiResponse::new(500, None);
        assert!(empty.is_server_error());
        assert!(empty.data().is_none());
        assert!(empty.data_id().is_none());
    }
}
