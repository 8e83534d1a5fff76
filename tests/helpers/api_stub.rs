//! Minimal REST server over an [`InMemoryBackend`], for driving the HTTP
//! client end to end.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use crud_contract::backend::InMemoryBackend;
use crud_contract::clients::{ApiResponse, ClientError, ResourceApi};
use crud_contract::model::{Entity, EntityId, ResourceName};
use serde_json::json;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

#[derive(Clone)]
struct StubState {
    backend: Arc<InMemoryBackend>,
    delay: Duration,
}

/// Handle for a running stub server. Dropping it stops the server.
pub struct ApiStubHandle {
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl ApiStubHandle {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl Drop for ApiStubHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Serves `backend` on an ephemeral local port.
pub async fn spawn_api_stub(backend: Arc<InMemoryBackend>) -> ApiStubHandle {
    spawn_api_stub_with_delay(backend, Duration::ZERO).await
}

/// Like [`spawn_api_stub`], but every response is held back for `delay`.
pub async fn spawn_api_stub_with_delay(
    backend: Arc<InMemoryBackend>,
    delay: Duration,
) -> ApiStubHandle {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");

    let app = Router::new()
        .route("/{resource}", get(list).post(create))
        .route("/{resource}/{id}", get(read).put(update).delete(delete))
        .with_state(StubState { backend, delay });

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let join = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let _ = server.await;
    });

    ApiStubHandle {
        base_url: format!("http://{addr}"),
        shutdown: Some(shutdown_tx),
        join: Some(join),
    }
}

fn reply(result: Result<ApiResponse, ClientError>) -> Response {
    match result {
        Ok(response) => {
            let status =
                StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            match response.body {
                Some(body) => (status, Json(body)).into_response(),
                None => status.into_response(),
            }
        }
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

fn unknown(resource: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("unknown resource {resource}") })),
    )
        .into_response()
}

async fn list(State(state): State<StubState>, Path(resource): Path<String>) -> Response {
    tokio::time::sleep(state.delay).await;
    let Ok(name) = resource.parse::<ResourceName>() else {
        return unknown(&resource);
    };
    reply(state.backend.list(name).await)
}

async fn create(
    State(state): State<StubState>,
    Path(resource): Path<String>,
    Json(payload): Json<Entity>,
) -> Response {
    tokio::time::sleep(state.delay).await;
    let Ok(name) = resource.parse::<ResourceName>() else {
        return unknown(&resource);
    };
    reply(state.backend.create(name, &payload).await)
}

async fn read(
    State(state): State<StubState>,
    Path((resource, id)): Path<(String, String)>,
) -> Response {
    tokio::time::sleep(state.delay).await;
    let Ok(name) = resource.parse::<ResourceName>() else {
        return unknown(&resource);
    };
    reply(state.backend.read(name, &EntityId::new(id)).await)
}

async fn update(
    State(state): State<StubState>,
    Path((resource, id)): Path<(String, String)>,
    Json(payload): Json<Entity>,
) -> Response {
    tokio::time::sleep(state.delay).await;
    let Ok(name) = resource.parse::<ResourceName>() else {
        return unknown(&resource);
    };
    reply(state.backend.update(name, &EntityId::new(id), &payload).await)
}

async fn delete(
    State(state): State<StubState>,
    Path((resource, id)): Path<(String, String)>,
) -> Response {
    tokio::time::sleep(state.delay).await;
    let Ok(name) = resource.parse::<ResourceName>() else {
        return unknown(&resource);
    };
    reply(state.backend.delete(name, &EntityId::new(id)).await)
}
