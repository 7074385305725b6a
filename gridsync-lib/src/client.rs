//! Main GridClient

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::error::ApiError;
use crate::model::RowId;
use crate::rate_limit::ConcurrencyLimiter;

/// HTTP client for one REST collection.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across tasks safely. It implements [`Backend`](crate::api::Backend).
///
/// # Example
///
/// ```ignore
/// use gridsync_lib::GridClient;
///
/// let client = GridClient::builder()
///     .url("http://localhost:8080")
///     .resource("users")
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct GridClient {
    pub(crate) inner: Arc<GridClientInner>,
}

pub(crate) struct GridClientInner {
    pub(crate) collection_url: String,
    pub(crate) http_client: Client,
    pub(crate) timeout: Option<Duration>,
    pub(crate) concurrency_limiter: ConcurrencyLimiter,
}

impl GridClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> GridClientBuilder<Missing, Missing> {
        GridClientBuilder::new()
    }

    /// Returns the collection URL, e.g. `http://localhost:8080/users`.
    pub fn collection_url(&self) -> &str {
        &self.inner.collection_url
    }

    /// Returns the URL of one row.
    pub fn row_url(&self, id: &RowId) -> String {
        format!(
            "{}/{}",
            self.inner.collection_url,
            urlencoding::encode(id.as_str())
        )
    }

    /// Returns the per-request timeout, if set.
    pub fn timeout(&self) -> Option<Duration> {
        self.inner.timeout
    }

    /// Stops sending requests. Calls waiting for a slot and every later call
    /// fail with [`ApiError::Shutdown`]; calls already on the wire finish.
    /// Affects every clone of this client.
    pub fn shutdown(&self) {
        log::debug!("Shutting down client for {}", self.inner.collection_url);
        self.inner.concurrency_limiter.close();
    }
}

impl std::fmt::Debug for GridClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridClient")
            .field("collection_url", &self.inner.collection_url)
            .field("timeout", &self.inner.timeout)
            .field("max_concurrency", &self.inner.concurrency_limiter.limit())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`GridClient`].
///
/// Uses the typestate pattern to ensure required fields are set at compile time.
///
/// # Required Fields
///
/// - `url` - The backend base URL
/// - `resource` - The collection path under the base URL (e.g. `users`)
pub struct GridClientBuilder<U, R> {
    url: U,
    resource: R,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    max_concurrency: usize,
    http_client: Option<Client>,
}

impl GridClientBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            resource: Missing,
            timeout: None,
            connect_timeout: None,
            max_concurrency: ConcurrencyLimiter::DEFAULT_LIMIT,
            http_client: None,
        }
    }
}

impl Default for GridClientBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> GridClientBuilder<Missing, R> {
    /// Sets the backend base URL.
    pub fn url(self, url: impl Into<String>) -> GridClientBuilder<Set<String>, R> {
        GridClientBuilder {
            url: Set(url.into()),
            resource: self.resource,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            max_concurrency: self.max_concurrency,
            http_client: self.http_client,
        }
    }
}

impl<U> GridClientBuilder<U, Missing> {
    /// Sets the collection path.
    pub fn resource(self, resource: impl Into<String>) -> GridClientBuilder<U, Set<String>> {
        GridClientBuilder {
            url: self.url,
            resource: Set(resource.into()),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            max_concurrency: self.max_concurrency,
            http_client: self.http_client,
        }
    }
}

impl<U, R> GridClientBuilder<U, R> {
    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Caps the number of requests in flight at once.
    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl GridClientBuilder<Set<String>, Set<String>> {
    /// Builds the [`GridClient`].
    ///
    /// Fails if the base URL does not parse or the HTTP client cannot be built.
    pub fn build(self) -> Result<GridClient, ApiError> {
        let base = self.url.0;
        let parsed = Url::parse(&base).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base));
        }

        let resource = self.resource.0;
        let resource = resource.trim_matches('/');
        if resource.is_empty() {
            return Err(ApiError::InvalidUrl(format!("{}: empty resource", base)));
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(GridClient {
            inner: Arc::new(GridClientInner {
                collection_url: format!("{}/{}", base.trim_end_matches('/'), resource),
                http_client,
                timeout: self.timeout,
                concurrency_limiter: ConcurrencyLimiter::new(self.max_concurrency),
            }),
        })
    }
}
