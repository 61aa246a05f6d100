//! API client for communicating with the SAMI backend.
//!
//! Every request goes through one `ApiClient`, so token attachment and
//! 401 handling happen exactly once per request, the same way for every
//! endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::auth::{SessionEvent, SessionEvents, TokenStorage};
use crate::models::User;

use super::error::{ApiError, ApiResult};
use super::params::QueryParams;

// ============================================================================
// Constants
// ============================================================================

/// Backend used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// HTTP request timeout in seconds.
/// Voice recording holds the request open for the recording duration, so
/// this stays well above the longest expected recording.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Identity loaded for the current token, shared by every clone
pub(crate) type IdentitySlot = Arc<RwLock<Option<User>>>;

/// API client for the SAMI backend.
/// Clone is cheap - reqwest::Client, the storage, the identity slot and the
/// event channel are all shared handles.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    storage: Arc<dyn TokenStorage>,
    identity: IdentitySlot,
    events: SessionEvents,
}

impl ApiClient {
    /// Create a client with its own session event channel
    pub fn new(base_url: impl Into<String>, storage: Arc<dyn TokenStorage>) -> ApiResult<Self> {
        Self::with_events(base_url, storage, SessionEvents::new())
    }

    /// Create a client that reports session events on an existing channel
    pub fn with_events(
        base_url: impl Into<String>,
        storage: Arc<dyn TokenStorage>,
        events: SessionEvents,
    ) -> ApiResult<Self> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(default_headers)
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "API client configured");

        Ok(Self {
            client,
            base_url,
            storage,
            identity: Arc::new(RwLock::new(None)),
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn storage(&self) -> &Arc<dyn TokenStorage> {
        &self.storage
    }

    pub fn session_events(&self) -> &SessionEvents {
        &self.events
    }

    pub(crate) fn identity(&self) -> &IdentitySlot {
        &self.identity
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, url = %url, "API request");
        self.client.request(method, url)
    }

    // ===== Interceptors =====

    /// Attach the stored token, if there is one.
    ///
    /// A storage failure is logged and the request goes out anonymously;
    /// the backend then decides whether that is acceptable.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.storage.load() {
            Ok(Some(token)) => request.bearer_auth(token),
            Ok(None) => request,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token, sending request without it");
                request
            }
        }
    }

    /// Map a response to success or an `ApiError`.
    ///
    /// A 401 clears the stored token and the loaded identity, then emits
    /// `SessionEvent::Expired`, before the error is handed back.
    async fn check_response(&self, response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized(response.url().path()).await;
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "API request failed");
        Err(ApiError::from_status(status, &body))
    }

    async fn handle_unauthorized(&self, path: &str) {
        warn!(path = path, "Backend rejected credentials, clearing session");
        if let Err(e) = self.storage.delete() {
            warn!(error = %e, "Failed to delete stored token");
        }
        *self.identity.write().await = None;
        self.events.emit(SessionEvent::Expired);
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = self.authorize(request).send().await?;
        self.check_response(response).await
    }

    /// Parse the body as JSON. An empty body parses as `null`.
    async fn parse<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let bytes = response.bytes().await?;
        let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response: {}", e)))
    }

    // ===== Verbs =====

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&QueryParams>,
    ) -> ApiResult<T> {
        let mut request = self.request(Method::GET, path);
        if let Some(params) = params.filter(|p| !p.is_empty()) {
            request = request.query(&params.to_pairs());
        }
        let response = self.send(request).await?;
        Self::parse(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let mut request = self.request(Method::POST, path);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.send(request).await?;
        Self::parse(response).await
    }

    /// POST with no body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.post::<T, ()>(path, None).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let request = self.request(Method::PUT, path).json(body);
        let response = self.send(request).await?;
        Self::parse(response).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self.request(Method::DELETE, path);
        let response = self.send(request).await?;
        Self::parse(response).await
    }

    /// POST with no body and a tighter deadline than the client default.
    /// For best-effort calls that must not hold up local state changes.
    pub(crate) async fn post_empty_within<T: DeserializeOwned>(
        &self,
        path: &str,
        timeout: Duration,
    ) -> ApiResult<T> {
        let request = self.request(Method::POST, path).timeout(timeout);
        let response = self.send(request).await?;
        Self::parse(response).await
    }

    /// Form-encoded POST that never carries the stored token.
    /// Used for credential exchange, where a stale token must not leak in.
    pub(crate) async fn post_form_anonymous<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> ApiResult<T> {
        let request = self.request(Method::POST, path).form(form);
        let response = request.send().await?;
        let response = self.check_response(response).await?;
        Self::parse(response).await
    }
}
