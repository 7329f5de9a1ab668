//! API client for the remote task service.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! JSON requests. Every protected call carries the current access token
//! as a bearer header; a 401 triggers one transparent refresh-and-retry
//! before the failure is surfaced.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::{SessionStore, TokenPair};
use crate::models::{Task, TaskPatch, User};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// The task API answers in well under a second; 10s fails fast on dead links.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Token pair as returned by `/token/` and `/token/refresh/`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: String,
    refresh: String,
}

/// API client for the task service.
/// Clone is cheap - the HTTP client, session store, and refresh gate are
/// all shared behind Arcs, so clones see the same tokens.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<Mutex<SessionStore>>,
    /// Serializes refresh attempts. A request that hits a 401 while a
    /// refresh is already in flight waits here, then reuses the token
    /// the winner stored instead of issuing its own refresh call.
    refresh_gate: Arc<tokio::sync::Mutex<()>>,
}

impl ApiClient {
    /// Create a new API client against the given base URL.
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<Mutex<SessionStore>>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            refresh_gate: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn lock_session(&self) -> MutexGuard<'_, SessionStore> {
        // A poisoned lock only means another thread panicked mid-access;
        // the token data itself is always in a consistent state.
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the current access token.
    pub fn access_token(&self) -> Option<String> {
        self.lock_session().access_token().map(str::to_string)
    }

    /// True if an access token is currently stored.
    pub fn has_access_token(&self) -> bool {
        self.lock_session().access_token().is_some()
    }

    // ========================================================================
    // Request pipeline
    // ========================================================================

    /// Send one attempt of a request. The bearer token is passed in
    /// explicitly so a retry can carry the refreshed token without
    /// re-reading shared state mid-flight.
    async fn send<B: Serialize>(
        &self,
        method: &Method,
        url: &str,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.http.request(method.clone(), url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Check if a response is successful, draining the body into an
    /// error value if not.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Request failed");
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("{}: {}", e, ApiError::truncate_body(&text)))
        })
    }

    /// Issue an authenticated request, recovering from a single 401 via
    /// the refresh protocol. The first attempt and the retry are built
    /// independently; only this function decides whether a retry
    /// happens, so a logical request can never refresh twice.
    async fn dispatch<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.url(path);
        let token = self.access_token();

        let response = self.send(&method, &url, body, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check(response).await;
        }

        debug!(%url, "Access token rejected, attempting refresh");
        let new_access = self.refresh_access(token.as_deref()).await?;

        // Both tokens are already stored by the time we get here, so a
        // concurrent request can never observe a half-updated pair.
        let retry = self.send(&method, &url, body, Some(&new_access)).await?;
        Self::check(retry).await
    }

    /// Run the refresh protocol and return a usable access token.
    ///
    /// `observed_access` is the token the failed attempt carried. If the
    /// store holds a different token once the gate is acquired, another
    /// request already refreshed and that token is returned as-is.
    async fn refresh_access(&self, observed_access: Option<&str>) -> Result<String, ApiError> {
        let _guard = self.refresh_gate.lock().await;

        let (current_access, refresh_token) = {
            let session = self.lock_session();
            (
                session.access_token().map(str::to_string),
                session.refresh_token().map(str::to_string),
            )
        };

        if let Some(current) = current_access {
            if observed_access != Some(current.as_str()) {
                debug!("Token already refreshed by a concurrent request");
                return Ok(current);
            }
        }

        let refresh_token = refresh_token
            .ok_or_else(|| ApiError::Auth("no refresh token stored".to_string()))?;

        let response = self
            .http
            .post(self.url("/token/refresh/"))
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Token refresh rejected");
            return Err(ApiError::Auth(format!(
                "refresh rejected with status {}: {}",
                status,
                ApiError::truncate_body(&body)
            )));
        }

        let tokens: TokenResponse = Self::read_json(response).await?;
        let pair = TokenPair {
            access: tokens.access.clone(),
            refresh: tokens.refresh,
        };
        self.lock_session().set_pair(pair);
        debug!("Access token refreshed");

        Ok(tokens.access)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.dispatch::<()>(Method::GET, path, None).await?;
        Self::read_json(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.dispatch(Method::POST, path, Some(body)).await?;
        Self::read_json(response).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.dispatch(Method::PUT, path, Some(body)).await?;
        Self::read_json(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.dispatch::<()>(Method::DELETE, path, None).await?;
        Ok(())
    }

    // ========================================================================
    // Auth endpoints (no bearer header)
    // ========================================================================

    /// Exchange credentials for a token pair and store it.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        let response = self
            .http
            .post(self.url("/token/"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;

        let response = Self::check(response).await?;
        let tokens: TokenResponse = Self::read_json(response).await?;

        let pair = TokenPair {
            access: tokens.access,
            refresh: tokens.refresh,
        };
        self.lock_session().set_pair(pair.clone());

        Ok(pair)
    }

    /// Create a new account. The response body is implementation-defined
    /// and discarded beyond success/failure.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("/register/"))
            .json(&serde_json::json!({
                "username": username,
                "password": password,
                "email": email,
            }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    // ========================================================================
    // Protected endpoints
    // ========================================================================

    /// Fetch the signed-in user's profile
    pub async fn fetch_current_user(&self) -> Result<User, ApiError> {
        self.get("/user/").await
    }

    /// Fetch all tasks visible to the signed-in user
    pub async fn fetch_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.get("/tasks/").await
    }

    /// Create a task from a partial payload
    pub async fn create_task(&self, task: &TaskPatch) -> Result<Task, ApiError> {
        self.post("/tasks/", task).await
    }

    /// Update a task; absent patch fields are left untouched server-side
    pub async fn update_task(&self, id: i64, task: &TaskPatch) -> Result<Task, ApiError> {
        self.put(&format!("/tasks/{}/", id), task).await
    }

    /// Delete a task
    pub async fn delete_task(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/tasks/{}/", id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Client over a fresh temp-backed session store. The TempDir must
    /// outlive the client or the store writes into a removed directory.
    fn client(base: &str) -> (ApiClient, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let session = Arc::new(Mutex::new(SessionStore::new(dir.path().to_path_buf())));
        (ApiClient::new(base, session).unwrap(), dir)
    }

    fn client_with_tokens(base: &str, access: &str, refresh: &str) -> (ApiClient, TempDir) {
        let (api, dir) = client(base);
        api.lock_session().set_pair(TokenPair {
            access: access.to_string(),
            refresh: refresh.to_string(),
        });
        (api, dir)
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let (api, _dir) = client("http://localhost:8000/");
        assert_eq!(api.url("/tasks/"), "http://localhost:8000/tasks/");

        let (api, _dir) = client("http://localhost:8000");
        assert_eq!(api.url("/tasks/1/"), "http://localhost:8000/tasks/1/");
    }

    #[test]
    fn test_clones_share_token_state() {
        let (api, _dir) = client("http://localhost:8000");
        let clone = api.clone();

        api.lock_session().set_pair(TokenPair {
            access: "A1".to_string(),
            refresh: "R1".to_string(),
        });
        assert_eq!(clone.access_token().as_deref(), Some("A1"));
    }

    #[tokio::test]
    async fn test_request_carries_bearer_token() {
        let server = MockServer::start().await;
        let (api, _dir) = client_with_tokens(&server.uri(), "A1", "R1");

        Mock::given(method("GET"))
            .and(path("/tasks/"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let tasks = api.fetch_tasks().await.unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_and_retries_once() {
        let server = MockServer::start().await;
        let (api, _dir) = client_with_tokens(&server.uri(), "A1", "R1");

        // The stale token is rejected exactly once
        Mock::given(method("GET"))
            .and(path("/user/"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        // The refresh call carries the stored refresh token, no bearer
        Mock::given(method("POST"))
            .and(path("/token/refresh/"))
            .and(body_json(json!({"refresh": "R1"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access": "A2", "refresh": "R2"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        // The retry carries the refreshed token
        Mock::given(method("GET"))
            .and(path("/user/"))
            .and(header("authorization", "Bearer A2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": 1, "username": "alice"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let user = api.fetch_current_user().await.unwrap();
        assert_eq!(user.username, "alice");

        // Both tokens were replaced wholesale
        let session = api.lock_session();
        assert_eq!(session.access_token(), Some("A2"));
        assert_eq!(session.refresh_token(), Some("R2"));
    }

    #[tokio::test]
    async fn test_failed_refresh_surfaces_auth_error_without_second_attempt() {
        let server = MockServer::start().await;
        let (api, _dir) = client_with_tokens(&server.uri(), "A1", "R1");

        Mock::given(method("GET"))
            .and(path("/tasks/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/token/refresh/"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token blacklisted"))
            .expect(1)
            .mount(&server)
            .await;

        let err = api.fetch_tasks().await.unwrap_err();
        assert!(err.is_auth_failure(), "expected auth error, got {err:?}");

        // The pipeline itself leaves stored credentials untouched;
        // clearing is the caller's decision.
        assert_eq!(api.access_token().as_deref(), Some("A1"));
    }

    #[tokio::test]
    async fn test_retry_rejected_again_surfaces_without_more_refreshes() {
        let server = MockServer::start().await;
        let (api, _dir) = client_with_tokens(&server.uri(), "A1", "R1");

        Mock::given(method("GET"))
            .and(path("/tasks/"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access": "A2", "refresh": "R2"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/tasks/"))
            .and(header("authorization", "Bearer A2"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let err = api.fetch_tasks().await.unwrap_err();
        assert!(err.is_unauthorized(), "expected 401 passthrough, got {err:?}");
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_refresh() {
        let server = MockServer::start().await;
        let (api, _dir) = client_with_tokens(&server.uri(), "STALE", "R1");

        Mock::given(method("GET"))
            .and(path("/tasks/"))
            .and(header("authorization", "Bearer STALE"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access": "FRESH", "refresh": "R2"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/tasks/"))
            .and(header("authorization", "Bearer FRESH"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let clone = api.clone();
        let (a, b) = tokio::join!(api.fetch_tasks(), clone.fetch_tasks());
        assert!(a.is_ok() && b.is_ok(), "a: {a:?}, b: {b:?}");
        assert_eq!(api.access_token().as_deref(), Some("FRESH"));
    }

    #[tokio::test]
    async fn test_login_stores_token_pair() {
        let server = MockServer::start().await;
        let (api, _dir) = client(&server.uri());

        Mock::given(method("POST"))
            .and(path("/token/"))
            .and(body_json(json!({"username": "alice", "password": "pw"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access": "A1", "refresh": "R1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let pair = api.login("alice", "pw").await.unwrap();
        assert_eq!(pair.access, "A1");

        let session = api.lock_session();
        assert_eq!(session.access_token(), Some("A1"));
        assert_eq!(session.refresh_token(), Some("R1"));
    }

    #[tokio::test]
    async fn test_rejected_login_stores_nothing() {
        let server = MockServer::start().await;
        let (api, _dir) = client(&server.uri());

        Mock::given(method("POST"))
            .and(path("/token/"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad credentials"))
            .expect(1)
            .mount(&server)
            .await;

        let err = api.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, ApiError::Server { .. }));
        assert!(api.access_token().is_none());
    }

    #[tokio::test]
    async fn test_register_posts_payload() {
        let server = MockServer::start().await;
        let (api, _dir) = client(&server.uri());

        Mock::given(method("POST"))
            .and(path("/register/"))
            .and(body_json(json!({
                "username": "alice",
                "password": "pw",
                "email": "a@example.com",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        api.register("alice", "pw", "a@example.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_tolerates_empty_body() {
        let server = MockServer::start().await;
        let (api, _dir) = client_with_tokens(&server.uri(), "A1", "R1");

        Mock::given(method("DELETE"))
            .and(path("/tasks/7/"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        api.delete_task(7).await.unwrap();
    }

    #[tokio::test]
    async fn test_profile_fetch_is_idempotent() {
        let server = MockServer::start().await;
        let (api, _dir) = client_with_tokens(&server.uri(), "A1", "R1");

        Mock::given(method("GET"))
            .and(path("/user/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": 1, "username": "alice"})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let first = api.fetch_current_user().await.unwrap();
        let second = api.fetch_current_user().await.unwrap();
        assert_eq!(first, second);
    }
}
