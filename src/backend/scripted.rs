//! # Scripted API & Fault Injection
//!
//! [`ScriptedApi`] wraps any [`ResourceApi`] and lets a test replace selected
//! calls with canned responses or transport errors, while every other call
//! passes through to the wrapped backend. Every call is recorded, so tests can
//! also assert *what* was sent (e.g. that teardown issued its delete even
//! after a failed read-back).
//!
//! | Use case | How |
//! |----------|-----|
//! | Backend ignores updates | `expect(Verb::Update, r).return_response(ApiResponse::with_data(200, ..))` |
//! | Create answers 409 instead of 500 | `expect(Verb::Create, r).return_response(ApiResponse::new(409, None))` |
//! | Connection drops | `expect(Verb::Read, r).return_err(ClientError::Transport(..))` |
//!
//! ```rust,ignore
//! let scripted = ScriptedApi::new(InMemoryBackend::start());
//! scripted
//!     .expect(Verb::Delete, ResourceName::Albums)
//!     .with_id(EntityId::from(10))
//!     .once()
//!     .return_response(ApiResponse::new(204, None));
//! ```

use crate::clients::{ApiResponse, ClientError, ResourceApi};
use crate::model::{Entity, EntityId, ResourceName};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// The verb of a recorded or scripted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    List,
    Create,
    Read,
    Update,
    Delete,
}

/// A call as it reached the scripted API.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub verb: Verb,
    pub resource: ResourceName,
    pub id: Option<EntityId>,
    pub payload: Option<Entity>,
}

struct Expectation {
    verb: Verb,
    resource: ResourceName,
    id: Option<EntityId>,
    /// `None` means the expectation never runs out.
    remaining: Option<usize>,
    result: Result<ApiResponse, ClientError>,
}

/// A [`ResourceApi`] that can override selected calls of an inner backend.
pub struct ScriptedApi<A> {
    inner: A,
    expectations: Mutex<Vec<Expectation>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl<A: ResourceApi> ScriptedApi<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            expectations: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Starts scripting calls of `verb` against `resource`.
    pub fn expect(&self, verb: Verb, resource: ResourceName) -> ExpectationBuilder<'_, A> {
        ExpectationBuilder {
            api: self,
            verb,
            resource,
            id: None,
            remaining: None,
        }
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Calls of one verb against one resource.
    pub fn calls_to(&self, verb: Verb, resource: ResourceName) -> Vec<RecordedCall> {
        lock(&self.calls)
            .iter()
            .filter(|call| call.verb == verb && call.resource == resource)
            .cloned()
            .collect()
    }

    fn record(&self, call: RecordedCall) -> Option<Result<ApiResponse, ClientError>> {
        let scripted = {
            let mut expectations = lock(&self.expectations);
            expectations
                .iter_mut()
                .find(|exp| {
                    exp.verb == call.verb
                        && exp.resource == call.resource
                        && (exp.id.is_none() || exp.id == call.id)
                        && exp.remaining != Some(0)
                })
                .map(|exp| {
                    if let Some(remaining) = exp.remaining.as_mut() {
                        *remaining -= 1;
                    }
                    exp.result.clone()
                })
        };
        if scripted.is_some() {
            debug!(verb = ?call.verb, resource = %call.resource, "Scripted response");
        }
        lock(&self.calls).push(call);
        scripted
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fluent builder returned by [`ScriptedApi::expect`].
pub struct ExpectationBuilder<'a, A> {
    api: &'a ScriptedApi<A>,
    verb: Verb,
    resource: ResourceName,
    id: Option<EntityId>,
    remaining: Option<usize>,
}

impl<A> ExpectationBuilder<'_, A> {
    /// Only match calls addressing this id.
    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Match at most `n` calls, then fall through to the inner backend.
    pub fn times(mut self, n: usize) -> Self {
        self.remaining = Some(n);
        self
    }

    pub fn once(self) -> Self {
        self.times(1)
    }

    pub fn return_response(self, response: ApiResponse) {
        self.push(Ok(response));
    }

    pub fn return_err(self, error: ClientError) {
        self.push(Err(error));
    }

    fn push(self, result: Result<ApiResponse, ClientError>) {
        lock(&self.api.expectations).push(Expectation {
            verb: self.verb,
            resource: self.resource,
            id: self.id,
            remaining: self.remaining,
            result,
        });
    }
}

#[async_trait]
impl<A: ResourceApi> ResourceApi for ScriptedApi<A> {
    async fn list(&self, resource: ResourceName) -> Result<ApiResponse, ClientError> {
        let call = RecordedCall {
            verb: Verb::List,
            resource,
            id: None,
            payload: None,
        };
        match self.record(call) {
            Some(result) => result,
            None => self.inner.list(resource).await,
        }
    }

    async fn create(
        &self,
        resource: ResourceName,
        payload: &Entity,
    ) -> Result<ApiResponse, ClientError> {
        let call = RecordedCall {
            verb: Verb::Create,
            resource,
            id: EntityId::of(payload),
            payload: Some(payload.clone()),
        };
        match self.record(call) {
            Some(result) => result,
            None => self.inner.create(resource, payload).await,
        }
    }

    async fn read(
        &self,
        resource: ResourceName,
        id: &EntityId,
    ) -> Result<ApiResponse, ClientError> {
        let call = RecordedCall {
            verb: Verb::Read,
            resource,
            id: Some(id.clone()),
            payload: None,
        };
        match self.record(call) {
            Some(result) => result,
            None => self.inner.read(resource, id).await,
        }
    }

    async fn update(
        &self,
        resource: ResourceName,
        id: &EntityId,
        payload: &Entity,
    ) -> Result<ApiResponse, ClientError> {
        let call = RecordedCall {
            verb: Verb::Update,
            resource,
            id: Some(id.clone()),
            payload: Some(payload.clone()),
        };
        match self.record(call) {
            Some(result) => result,
            None => self.inner.update(resource, id, payload).await,
        }
    }

    async fn delete(
        &self,
        resource: ResourceName,
        id: &EntityId,
    ) -> Result<ApiResponse, ClientError> {
        let call = RecordedCall {
            verb: Verb::Delete,
            resource,
            id: Some(id.clone()),
            payload: None,
        };
        match self.record(call) {
            Some(result) => result,
            None => self.inner.delete(resource, id).await,
        }
    }
}
