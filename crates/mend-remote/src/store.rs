//! Remote workflow store
//!
//! [`WorkflowStore`] is the seam between the patch cycle and the network;
//! [`HttpWorkflowStore`] implements it over `GET/PUT {base}/{id}`.

use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, ACCEPT};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Header used when none is configured
pub const DEFAULT_AUTH_HEADER: &str = "X-N8N-API-KEY";

/// Default request deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where workflow documents live
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Fetch the document stored under `id`
    async fn fetch(&self, id: &str) -> RemoteResult<Value>;

    /// Replace the document stored under `id`
    async fn store(&self, id: &str, payload: &Value) -> RemoteResult<()>;
}

/// Connection settings for [`HttpWorkflowStore`]
#[derive(Clone)]
pub struct RemoteConfig {
    /// Collection URL; documents live at `{base_url}/{id}`
    pub base_url: String,
    /// Header carrying the token
    pub auth_header: String,
    /// API token
    pub token: String,
    /// Per-request deadline
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Settings with the default header and timeout
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the auth header
    #[must_use]
    pub fn with_auth_header(mut self, header: impl Into<String>) -> Self {
        self.auth_header = header.into();
        self
    }

    /// Override the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Header name and value; `Authorization` gets a `Bearer` prefix
    ///
    /// # Errors
    /// `RemoteError::Config` for an invalid header name or token.
    pub fn auth_pair(&self) -> RemoteResult<(HeaderName, HeaderValue)> {
        let name = HeaderName::from_bytes(self.auth_header.as_bytes())
            .map_err(|e| RemoteError::Config(format!("auth header '{}': {e}", self.auth_header)))?;
        let raw = if name == reqwest::header::AUTHORIZATION {
            format!("Bearer {}", self.token)
        } else {
            self.token.clone()
        };
        let mut value = HeaderValue::from_str(&raw)
            .map_err(|_| RemoteError::Config("token is not a valid header value".to_string()))?;
        value.set_sensitive(true);
        Ok((name, value))
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("auth_header", &self.auth_header)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`WorkflowStore`] over the automation HTTP API
#[derive(Debug, Clone)]
pub struct HttpWorkflowStore {
    base_url: String,
    auth: (HeaderName, HeaderValue),
    timeout: Duration,
    http_client: reqwest::Client,
}

impl HttpWorkflowStore {
    /// Build the client
    ///
    /// # Errors
    /// `RemoteError::Config` for bad headers or client setup failure.
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let auth = config.auth_pair()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("mend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Config(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth,
            timeout: config.timeout,
            http_client,
        })
    }

    /// URL of document `id`
    #[must_use]
    pub fn document_url(&self, id: &str) -> String {
        format!("{}/{id}", self.base_url)
    }

    async fn failure(op: &'static str, id: &str, response: reqwest::Response) -> RemoteError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        RemoteError::Status {
            op,
            id: id.to_string(),
            status,
            body,
        }
    }
}

#[async_trait]
impl WorkflowStore for HttpWorkflowStore {
    async fn fetch(&self, id: &str) -> RemoteResult<Value> {
        let url = self.document_url(id);
        tracing::debug!(url = %url, "GET workflow");
        let response = self
            .http_client
            .get(&url)
            .header(self.auth.0.clone(), self.auth.1.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RemoteError::from_transport("GET", id, self.timeout, &e))?;

        if !response.status().is_success() {
            return Err(Self::failure("GET", id, response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::from_transport("GET", id, self.timeout, &e))?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode {
            id: id.to_string(),
            message: e.to_string(),
        })
    }

    async fn store(&self, id: &str, payload: &Value) -> RemoteResult<()> {
        let url = self.document_url(id);
        tracing::debug!(url = %url, "PUT workflow");
        let response = self
            .http_client
            .put(&url)
            .header(self.auth.0.clone(), self.auth.1.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| RemoteError::from_transport("PUT", id, self.timeout, &e))?;

        if !response.status().is_success() {
            return Err(Self::failure("PUT", id, response).await);
        }
        Ok(())
    }
}
