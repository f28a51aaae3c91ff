//! REST client for the Workbench API and the Leonardo runtime service.
//!
//! # Architecture
//!
//! - [`WorkbenchClient`] - typed endpoint methods over a hardened `reqwest` client
//! - [`retry`] - backoff policy applied to idempotent reads and status syncs
//! - [`ProfileStore`] - shared, subscribable snapshot of the caller's profile
//! - [`actions`] - multi-call flows (sync, self-bypass, renewal confirmations)
//!
//! # Error Handling
//!
//! Every endpoint returns [`ApiError`]. Callers that need to branch on the HTTP
//! outcome use [`ApiError::is_not_found`] and [`ApiError::is_server_error`] instead of
//! matching on raw status codes.

pub mod actions;
mod profile_store;
pub mod retry;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;
use workbench_access::SyncEndpoint;
use workbench_types::{
    AccessModule, AccessToken, Profile, Runtime, ServerConfig, WorkspaceNamespace,
};

pub use profile_store::ProfileStore;
pub use retry::RetryConfig;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_MAX_IDLE_PER_HOST: usize = 16;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("request failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("URL {0} cannot be used as an API base")]
    InvalidBaseUrl(Url),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|status| status.is_server_error())
    }
}

/// Connection settings shared by every request.
///
/// Redirects are refused so a bearer token never follows a `Location` header to
/// another host.
fn base_client_builder(https_only: bool) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .https_only(https_only)
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .user_agent(concat!("workbench/", env!("CARGO_PKG_VERSION")))
}

pub async fn read_capped_error_body(response: Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

async fn into_result(outcome: retry::RetryOutcome) -> Result<Response, ApiError> {
    match outcome {
        retry::RetryOutcome::Success(response) => Ok(response),
        retry::RetryOutcome::HttpError(response) => {
            let status = response.status();
            let body = read_capped_error_body(response).await;
            Err(ApiError::Status { status, body })
        }
        retry::RetryOutcome::Transport { attempts, source } => {
            Err(ApiError::Transport { attempts, source })
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|source| ApiError::Transport {
            attempts: 1,
            source,
        })?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Whether a call may be transparently repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Retried,
    Once,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SelfBypassRequest {
    module_name: AccessModule,
    is_bypassed: bool,
}

/// Typed access to the Workbench API (`api_base`) and Leonardo (`leo_base`).
///
/// Cloning is cheap; clones share the connection pool.
///
/// ```rust
/// use url::Url;
/// use workbench_client::{RetryConfig, WorkbenchClient};
/// use workbench_types::AccessToken;
///
/// let client = WorkbenchClient::new(
///     Url::parse("https://api.example.org").unwrap(),
///     Url::parse("https://leo.example.org").unwrap(),
/// )
/// .unwrap()
/// .with_token(AccessToken::new("secret"))
/// .with_retry(RetryConfig::none());
/// # let _ = client;
/// ```
#[derive(Debug, Clone)]
pub struct WorkbenchClient {
    http: reqwest::Client,
    api_base: Url,
    leo_base: Url,
    token: Option<AccessToken>,
    retry: RetryConfig,
}

impl WorkbenchClient {
    /// HTTPS is enforced unless one of the bases is plain HTTP (local servers, tests).
    pub fn new(api_base: Url, leo_base: Url) -> Result<Self, ApiError> {
        for base in [&api_base, &leo_base] {
            if base.cannot_be_a_base() {
                return Err(ApiError::InvalidBaseUrl(base.clone()));
            }
        }
        let https_only = api_base.scheme() == "https" && leo_base.scheme() == "https";
        let http = base_client_builder(https_only)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            http,
            api_base,
            leo_base,
            token: None,
            retry: RetryConfig::default(),
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<AccessToken>) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    fn url(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(base.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        Self::url(&self.api_base, segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    async fn send<F>(&self, delivery: Delivery, build: F) -> Result<Response, ApiError>
    where
        F: Fn() -> RequestBuilder,
    {
        let outcome = match delivery {
            Delivery::Retried => retry::send_with_retry(build, &self.retry).await,
            Delivery::Once => retry::send_with_retry(build, &RetryConfig::none()).await,
        };
        into_result(outcome).await
    }

    fn runtime_url(&self, namespace: &WorkspaceNamespace) -> Result<Url, ApiError> {
        self.api_url(&["v1", "workspaces", namespace.as_str(), "runtime"])
    }

    /// The workspace's runtime, or `None` when the API reports 404.
    ///
    /// Sent once: the initializer counts server errors itself.
    pub async fn get_runtime(
        &self,
        namespace: &WorkspaceNamespace,
    ) -> Result<Option<Runtime>, ApiError> {
        let url = self.runtime_url(namespace)?;
        match self
            .send(Delivery::Once, || self.request(Method::GET, url.clone()))
            .await
        {
            Ok(response) => decode(response).await.map(Some),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn create_runtime(
        &self,
        namespace: &WorkspaceNamespace,
        runtime: &Runtime,
    ) -> Result<(), ApiError> {
        let url = self.runtime_url(namespace)?;
        self.send(Delivery::Once, || {
            self.request(Method::POST, url.clone()).json(runtime)
        })
        .await?;
        Ok(())
    }

    pub async fn delete_runtime(&self, namespace: &WorkspaceNamespace) -> Result<(), ApiError> {
        let url = self.runtime_url(namespace)?;
        self.send(Delivery::Once, || self.request(Method::DELETE, url.clone()))
            .await?;
        Ok(())
    }

    /// Resume a stopped runtime through Leonardo.
    pub async fn start_runtime(
        &self,
        google_project: &str,
        runtime_name: &str,
    ) -> Result<(), ApiError> {
        let url = Self::url(
            &self.leo_base,
            &[
                "api",
                "google",
                "v1",
                "runtimes",
                google_project,
                runtime_name,
                "start",
            ],
        )?;
        self.send(Delivery::Once, || self.request(Method::POST, url.clone()))
            .await?;
        Ok(())
    }

    pub async fn get_profile(&self) -> Result<Profile, ApiError> {
        let url = self.api_url(&["v1", "profile"])?;
        let response = self
            .send(Delivery::Retried, || self.request(Method::GET, url.clone()))
            .await?;
        decode(response).await
    }

    pub async fn get_config(&self) -> Result<ServerConfig, ApiError> {
        let url = self.api_url(&["v1", "config"])?;
        let response = self
            .send(Delivery::Retried, || self.request(Method::GET, url.clone()))
            .await?;
        decode(response).await
    }

    /// Ask the API to pull a module's status from its external system of record.
    pub async fn sync(&self, endpoint: SyncEndpoint) -> Result<(), ApiError> {
        let action = match endpoint {
            SyncEndpoint::TwoFactorAuth => "sync-two-factor-auth-status",
            SyncEndpoint::EraCommons => "sync-era-commons-status",
            SyncEndpoint::ComplianceTraining => "sync-compliance-training-status",
        };
        let url = self.api_url(&["v1", "profile", action])?;
        tracing::debug!(?endpoint, "Syncing external module status");
        self.send(Delivery::Retried, || self.request(Method::POST, url.clone()))
            .await?;
        Ok(())
    }

    pub async fn confirm_publications(&self) -> Result<(), ApiError> {
        self.profile_post("confirm-publications").await
    }

    pub async fn confirm_profile(&self) -> Result<(), ApiError> {
        self.profile_post("confirm-profile").await
    }

    async fn profile_post(&self, action: &str) -> Result<(), ApiError> {
        let url = self.api_url(&["v1", "profile", action])?;
        self.send(Delivery::Once, || self.request(Method::POST, url.clone()))
            .await?;
        Ok(())
    }

    /// Only honored by servers with `unsafeAllowSelfBypass` set.
    pub async fn unsafe_self_bypass(
        &self,
        module: AccessModule,
        is_bypassed: bool,
    ) -> Result<(), ApiError> {
        let url = self.api_url(&["v1", "profile", "unsafe-self-bypass-access-requirement"])?;
        let body = SelfBypassRequest {
            module_name: module,
            is_bypassed,
        };
        self.send(Delivery::Once, || {
            self.request(Method::POST, url.clone()).json(&body)
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use workbench_types::RuntimeStatus;

    fn client(server: &MockServer) -> WorkbenchClient {
        let base = Url::parse(&server.uri()).unwrap();
        WorkbenchClient::new(base.clone(), base)
            .unwrap()
            .with_retry(RetryConfig {
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
                ..RetryConfig::default()
            })
    }

    fn ns() -> WorkspaceNamespace {
        WorkspaceNamespace::new("aou-rw-123").unwrap()
    }

    #[test]
    fn error_classification() {
        let not_found = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_server_error());

        let unavailable = ApiError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: String::new(),
        };
        assert!(unavailable.is_server_error());
        assert_eq!(unavailable.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[test]
    fn url_segments_extend_base_path() {
        let base = Url::parse("https://example.org/api/").unwrap();
        let url = WorkbenchClient::url(&base, &["v1", "workspaces", "a b", "runtime"]).unwrap();
        assert_eq!(url.as_str(), "https://example.org/api/v1/workspaces/a%20b/runtime");
    }

    #[tokio::test]
    async fn get_runtime_maps_404_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/workspaces/aou-rw-123/runtime"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(client(&server).get_runtime(&ns()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_runtime_decodes_body_and_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/workspaces/aou-rw-123/runtime"))
            .and(header("authorization", "Bearer t0ken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "runtimeName": "r1",
                "googleProject": "p1",
                "status": "Running",
            })))
            .mount(&server)
            .await;

        let runtime = client(&server)
            .with_token(AccessToken::new("t0ken"))
            .get_runtime(&ns())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(runtime.status, Some(RuntimeStatus::Running));
        assert_eq!(runtime.display_id(), "p1/r1");
    }

    #[tokio::test]
    async fn runtime_calls_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/workspaces/aou-rw-123/runtime"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).get_runtime(&ns()).await.unwrap_err();
        assert!(err.is_server_error());
        assert!(err.to_string().contains("busy"));
    }

    #[tokio::test]
    async fn profile_reads_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/profile"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "username": "someone@example.org",
            })))
            .mount(&server)
            .await;

        let profile = client(&server).get_profile().await.unwrap();
        assert_eq!(profile.username, "someone@example.org");
    }

    #[tokio::test]
    async fn start_runtime_targets_leonardo() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/google/v1/runtimes/p1/r1/start"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).start_runtime("p1", "r1").await.unwrap();
    }

    #[tokio::test]
    async fn self_bypass_sends_module_and_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/profile/unsafe-self-bypass-access-requirement"))
            .and(body_json(json!({
                "moduleName": "ERA_COMMONS",
                "isBypassed": true,
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .unsafe_self_bypass(AccessModule::EraCommons, true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sync_posts_to_module_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/profile/sync-compliance-training-status"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .sync(SyncEndpoint::ComplianceTraining)
            .await
            .unwrap();
    }
}
