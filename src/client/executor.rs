//! Authenticated request executor

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::refresh::RefreshCoordinator;
use crate::session::SessionIndicator;
use crate::token::{AccessToken, TokenStore};
use chrono::Utc;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: HashMap<String, String>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Authenticated HTTP client for the storefront/admin API.
///
/// Owns the token store and refresh coordinator for one client session. The
/// underlying HTTP client keeps a cookie store, so the long-lived session
/// cookie set at login rides along on every call, including the refresh call
/// it authorizes.
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
    store: TokenStore,
    coordinator: Arc<RefreshCoordinator>,
    session: Arc<dyn SessionIndicator>,
}

impl ApiClient {
    /// Create a client from a validated configuration.
    ///
    /// The session indicator is injected by the host application; its writes
    /// belong to the login/logout flow.
    pub fn new(config: ClientConfig, session: Arc<dyn SessionIndicator>) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .build()
            .map_err(Error::Http)?;

        let store = TokenStore::new();
        let coordinator = Arc::new(RefreshCoordinator::new(
            &config,
            client.clone(),
            store.clone(),
        ));

        Ok(Self {
            client,
            config,
            store,
            coordinator,
            session,
        })
    }

    /// The token store for this client session.
    ///
    /// The login flow pushes freshly issued tokens here; logout clears it.
    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.execute(Method::GET, path, RequestConfig::default())
            .await
    }

    /// Make a GET request with config
    pub async fn get_with_config(&self, path: &str, config: RequestConfig) -> Result<Response> {
        self.execute(Method::GET, path, config).await
    }

    /// Make a POST request
    pub async fn post(&self, path: &str, body: Value) -> Result<Response> {
        self.execute(Method::POST, path, RequestConfig::default().json(body))
            .await
    }

    /// Make a PUT request
    pub async fn put(&self, path: &str, body: Value) -> Result<Response> {
        self.execute(Method::PUT, path, RequestConfig::default().json(body))
            .await
    }

    /// Make a PATCH request
    pub async fn patch(&self, path: &str, body: Value) -> Result<Response> {
        self.execute(Method::PATCH, path, RequestConfig::default().json(body))
            .await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.execute(Method::DELETE, path, RequestConfig::default())
            .await
    }

    /// Execute an authenticated request.
    ///
    /// Attaches a usable bearer token (renewing it through the coordinator
    /// at most once per call) and performs the wrapped HTTP call. The
    /// response comes back unmodified: status interpretation, including a
    /// 401 on a token the server has revoked since issuing it, belongs to
    /// the caller. There is no retry of the wrapped request.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let token = self.usable_token().await?;

        let url = self.build_url(path);
        let timeout = config.timeout.unwrap_or(self.config.timeout());

        let mut req = self.client.request(method.clone(), &url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !config.query.is_empty() {
            req = req.query(&config.query);
        }

        if let Some(ref body) = config.body {
            req = req.json(body);
        }

        req = req.timeout(timeout);
        req = req.bearer_auth(token.raw());

        let response = req.send().await.map_err(Error::Http)?;
        debug!("{} {} -> {}", method, url, response.status());
        Ok(response)
    }

    /// Execute a request and parse the JSON response body.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let response = self.execute(method, path, config).await?;
        let json: T = response.json().await.map_err(Error::Http)?;
        Ok(json)
    }

    /// Make a GET request and parse the JSON response body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute_json(Method::GET, path, RequestConfig::default())
            .await
    }

    /// Produce a token worth attaching, or classify the failure.
    async fn usable_token(&self) -> Result<AccessToken> {
        if let Some(token) = self.store.current().await {
            if !token.is_expiring_soon(Utc::now(), self.config.skew()) {
                return Ok(token);
            }
        }

        // Without a prior session a refresh cannot succeed; fail before any
        // network traffic at all.
        if !self.session.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }

        self.coordinator
            .request_refresh()
            .await
            .map_err(|e| Error::token_refresh(e.to_string()))
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("authenticated", &self.session.is_authenticated())
            .finish_non_exhaustive()
    }
}
