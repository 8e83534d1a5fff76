//! # HTTP Resource Client
//!
//! [`HttpResourceClient`] implements [`ResourceApi`] over HTTP with `reqwest`.
//! URLs are `{base}/{resource}` and `{base}/{resource}/{id}`. The id is pushed
//! as a single percent-encoded path segment, so a malformed id like
//! `no-id-like-this` or `a/b` reaches the backend verbatim and comes back as
//! whatever status it answers with (404 for this API), never as a client error.
//!
//! There are no retries. Each call carries the configured per-call timeout and
//! expiry surfaces as [`ClientError::Timeout`].

use super::{ApiResponse, ClientError, ResourceApi};
use crate::model::{Entity, EntityId, ResourceName};
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Client for a REST backend exposing the resource collections.
#[derive(Clone, Debug)]
pub struct HttpResourceClient {
    http: Client,
    base: Url,
    timeout: Duration,
}

impl HttpResourceClient {
    /// Builds a client for `base_url` with an explicit per-call timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!(
                "{base_url} cannot be used as a base URL"
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/{resource}` or `{base}/{resource}/{id}`.
    pub fn url(&self, resource: ResourceName, id: Option<&EntityId>) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?;
            segments.pop_if_empty().push(resource.as_str());
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        payload: Option<&Entity>,
    ) -> Result<ApiResponse, ClientError> {
        let mut request = self.http.request(method, url);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;
        let body = serde_json::from_slice(&bytes).ok();

        debug!(status, has_body = body.is_some(), "Response");
        Ok(ApiResponse::new(status, body))
    }

    fn map_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(self.timeout.as_millis() as u64)
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ResourceApi for HttpResourceClient {
    #[instrument(skip_all, fields(%resource))]
    async fn list(&self, resource: ResourceName) -> Result<ApiResponse, ClientError> {
        debug!("Sending request");
        self.send(Method::GET, self.url(resource, None)?, None).await
    }

    #[instrument(skip_all, fields(%resource))]
    async fn create(
        &self,
        resource: ResourceName,
        payload: &Entity,
    ) -> Result<ApiResponse, ClientError> {
        debug!(?payload, "Sending request");
        self.send(Method::POST, self.url(resource, None)?, Some(payload))
            .await
    }

    #[instrument(skip_all, fields(%resource, %id))]
    async fn read(
        &self,
        resource: ResourceName,
        id: &EntityId,
    ) -> Result<ApiResponse, ClientError> {
        debug!("Sending request");
        self.send(Method::GET, self.url(resource, Some(id))?, None)
            .await
    }

    #[instrument(skip_all, fields(%resource, %id))]
    async fn update(
        &self,
        resource: ResourceName,
        id: &EntityId,
        payload: &Entity,
    ) -> Result<ApiResponse, ClientError> {
        debug!(?payload, "Sending request");
        self.send(Method::PUT, self.url(resource, Some(id))?, Some(payload))
            .await
    }

    #[instrument(skip_all, fields(%resource, %id))]
    async fn delete(
        &self,
        resource: ResourceName,
        id: &EntityId,
    ) -> Result<ApiResponse, ClientError> {
        debug!("Sending request");
        self.send(Method::DELETE, self.url(resource, Some(id))?, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpResourceClient {
        HttpResourceClient::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_collection_and_item_urls() {
        let client = client("http://localhost:3000");
        assert_eq!(
            client.url(ResourceName::Posts, None).unwrap().as_str(),
            "http://localhost:3000/posts"
        );
        assert_eq!(
            client
                .url(ResourceName::Albums, Some(&EntityId::from(3)))
                .unwrap()
                .as_str(),
            "http://localhost:3000/albums/3"
        );
    }

    #[test]
    fn test_base_path_prefix_is_kept() {
        let client = client("http://localhost:3000/api/");
        assert_eq!(
            client.url(ResourceName::Todos, None).unwrap().as_str(),
            "http://localhost:3000/api/todos"
        );
    }

    #[test]
    fn test_malformed_id_stays_one_segment() {
        let client = client("http://localhost:3000");
        let url = client
            .url(ResourceName::Users, Some(&EntityId::from("a/b c")))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/users/a%2Fb%20c");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = HttpResourceClient::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));

        let result = HttpResourceClient::new("mailto:someone@example.com", Duration::from_secs(1));
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Port 9 (discard) is essentially never listening on localhost.
        let client = client("http://127.0.0.1:9");
        let result = client.list(ResourceName::Posts).await;
        assert!(matches!(result, Err(ClientError::Transport(_))), "{result:?}");
    }
}
