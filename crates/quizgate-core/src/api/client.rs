//! HTTP client for the quiz API.
//!
//! This module provides the `HttpClient` struct, which joins request paths
//! onto the configured base address, attaches the stored bearer token,
//! enforces the request timeout and turns every response into a typed
//! result. A 401 or 403 from the server clears the stored session and
//! publishes [`SessionEvent::AuthChanged`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::header;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::auth::CredentialStore;
use crate::config::Config;
use crate::events::{self, EventBus, SessionEvent};

use super::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use super::url::{join_url, query_string, with_query};
use super::RequestError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const JSON_CONTENT_TYPE: &str = "application/json";

/// One outbound call, built by the caller and consumed by [`HttpClient::execute`].
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// API client for the quiz backend.
/// Clone is cheap - the transport, store and event bus are shared.
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    timeout: Duration,
    transport: Arc<dyn Transport>,
    store: CredentialStore,
    events: Option<EventBus>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>, store: CredentialStore) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            transport,
            store,
            events: None,
        }
    }

    /// Client configured from `config`, with base address and timeout applied.
    pub fn from_config(config: &Config, transport: Arc<dyn Transport>, store: CredentialStore) -> Self {
        Self::new(config.base_url.clone(), transport, store).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Publish session invalidations on `bus`
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub(crate) fn events(&self) -> Option<&EventBus> {
        self.events.as_ref()
    }

    /// Execute a request and classify the response.
    ///
    /// Returns `Ok(None)` for 204 and for success responses without a body.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<Option<Value>, RequestError> {
        let request = self.build_request(&descriptor, true)?;
        let response = self.dispatch(request).await?;
        self.classify(&descriptor, response)
    }

    /// Send a request without credentials and return the raw response.
    ///
    /// Used for the login exchange, where a 401 means bad credentials rather
    /// than an expired session.
    pub(crate) async fn exchange(&self, descriptor: &RequestDescriptor) -> Result<HttpResponse, RequestError> {
        let request = self.build_request(descriptor, false)?;
        self.dispatch(request).await
    }

    // ===== Convenience methods =====

    /// GET with query parameters. Entries whose value is `None` are skipped.
    pub async fn get<K, V>(&self, path: &str, params: &[(K, Option<V>)]) -> Result<Option<Value>, RequestError>
    where
        K: AsRef<str>,
        V: ToString,
    {
        let path = with_query(path, &query_string(params));
        self.execute(RequestDescriptor::new(Method::GET, path)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Option<Value>, RequestError> {
        let body = to_body(body)?;
        self.execute(RequestDescriptor::new(Method::POST, path).json(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Option<Value>, RequestError> {
        let body = to_body(body)?;
        self.execute(RequestDescriptor::new(Method::PUT, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Option<Value>, RequestError> {
        self.execute(RequestDescriptor::new(Method::DELETE, path)).await
    }

    // ===== Typed variants =====

    pub async fn get_json<T, K, V>(&self, path: &str, params: &[(K, Option<V>)]) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
        V: ToString,
    {
        from_body(self.get(path, params).await?)
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        from_body(self.post(path, body).await?)
    }

    pub async fn put_json<T, B>(&self, path: &str, body: &B) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        from_body(self.put(path, body).await?)
    }

    // ===== Internals =====

    fn build_request(&self, descriptor: &RequestDescriptor, with_auth: bool) -> Result<HttpRequest, RequestError> {
        let mut headers = vec![(header::CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string())];

        for (name, value) in &descriptor.headers {
            if name.eq_ignore_ascii_case(header::AUTHORIZATION.as_str()) {
                debug!("Ignoring caller-supplied Authorization header");
                continue;
            }
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        if with_auth {
            if let Some(token) = self.store.token() {
                headers.push((header::AUTHORIZATION.to_string(), format!("Bearer {}", token)));
            }
        }

        let body = descriptor
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RequestError::Malformed(format!("Failed to serialize request body: {}", e)))?;

        Ok(HttpRequest {
            method: descriptor.method.clone(),
            url: join_url(&self.base_url, &descriptor.path),
            headers,
            body,
        })
    }

    /// Send through the transport under the timeout. When the timeout fires
    /// the transport future is dropped, so a late response is never seen.
    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, RequestError> {
        let method = request.method.clone();
        let url = request.url.clone();
        debug!(%method, url = %url, "Sending request");

        match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
            Err(_) => {
                warn!(%method, url = %url, timeout_secs = self.timeout.as_secs_f64(), "Request timed out");
                Err(RequestError::Timeout)
            }
            Ok(Err(TransportError::Timeout)) => {
                warn!(%method, url = %url, "Transport reported timeout");
                Err(RequestError::Timeout)
            }
            Ok(Err(TransportError::Connection(message))) => {
                warn!(%method, url = %url, error = %message, "Request failed");
                Err(RequestError::TransportFailure(message))
            }
            Ok(Ok(response)) => {
                debug!(%method, url = %url, status = response.status, "Response received");
                Ok(response)
            }
        }
    }

    fn classify(&self, descriptor: &RequestDescriptor, response: HttpResponse) -> Result<Option<Value>, RequestError> {
        match response.status {
            401 | 403 => {
                warn!(path = %descriptor.path, status = response.status, "Authentication rejected, clearing session");
                self.invalidate_session();
                Err(RequestError::AuthExpired)
            }
            204 => Ok(None),
            status if !response.is_success() => {
                warn!(
                    path = %descriptor.path,
                    status,
                    body = %RequestError::truncate_body(&response.body),
                    "API error"
                );
                Err(RequestError::from_status(status, &response.body))
            }
            _ => {
                if response.body.trim().is_empty() {
                    return Ok(None);
                }
                serde_json::from_str(&response.body).map(Some).map_err(|e| {
                    RequestError::Malformed(format!("Failed to parse JSON response from {}: {}", descriptor.path, e))
                })
            }
        }
    }

    fn invalidate_session(&self) {
        // A failed clear leaves the stale session readable until the next save or clear
        if let Err(e) = self.store.clear() {
            error!(error = %e, "Failed to clear stored session");
        }
        events::publish(self.events.as_ref(), SessionEvent::AuthChanged);
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, RequestError> {
    serde_json::to_value(body).map_err(|e| RequestError::Malformed(format!("Failed to serialize request body: {}", e)))
}

fn from_body<T: DeserializeOwned>(body: Option<Value>) -> Result<T, RequestError> {
    let body = body.ok_or_else(|| RequestError::Malformed("Expected a response body".to_string()))?;
    serde_json::from_value(body).map_err(|e| RequestError::Malformed(e.to_string()))
}
