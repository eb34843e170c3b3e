//! Transport core
//!
//! Single hardened HTTP call path used by every gateway: each request races
//! a deadline, failures are classified, and `with_retry` re-runs retryable
//! ones with linear backoff. Dropping the timed-out future tears the timer
//! down with it, so no timer outlives its request.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ClientError, ClientResult};

/// Retry policy: `max_retries` re-attempts after the first failure, waiting
/// `retry_delay * attempt_number` between attempts (1s, then 2s by default).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_millis(1_000),
        }
    }
}

/// Run `op`, retrying retryable failures until the budget is exhausted.
///
/// Non-retryable errors propagate on first occurrence; exhausting the budget
/// re-raises the last error.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> ClientResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.retry_delay * attempt;
                tracing::warn!(attempt, ?delay, error = %e, "retrying after transport failure");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// HTTP transport bound to one base URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport against `base_url` with a per-request deadline.
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        Self::with_default_headers(base_url, timeout, HeaderMap::new())
    }

    /// Create a transport that attaches `headers` to every request
    /// (API keys for the hosted backend).
    pub fn with_default_headers(
        base_url: &str,
        timeout: Duration,
        headers: HeaderMap,
    ) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request for callers that need full control over headers or
    /// the body (storage uploads, hosted row-API dialect).
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send a prepared request under the deadline and decode the JSON body.
    pub async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    /// Send a prepared request under the deadline, discarding the body.
    pub async fn send_empty(&self, request: RequestBuilder) -> ClientResult<()> {
        let response = self.execute(request).await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    /// Make a POST request with a JSON body and optional extra headers
    /// (idempotency keys travel here).
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        headers: Option<HeaderMap>,
    ) -> ClientResult<T> {
        let mut request = self.request(Method::POST, path).json(body);
        if let Some(headers) = headers {
            request = request.headers(headers);
        }
        self.send(request).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send_empty(self.request(Method::DELETE, path)).await
    }

    /// Issue the request, aborting when the deadline passes.
    async fn execute(&self, request: RequestBuilder) -> ClientResult<reqwest::Response> {
        match tokio::time::timeout(self.timeout, request.send()).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ClientError::Timeout(self.timeout)),
        }
    }

    /// Fail non-2xx responses with the body text as the message.
    async fn check(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let response = Self::check(response).await?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(ClientError::from)?;
        if bytes.is_empty() && status == StatusCode::NO_CONTENT {
            return Err(ClientError::InvalidResponse(
                "empty body where JSON was expected".into(),
            ));
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            ClientError::InvalidResponse(format!("failed to decode response body: {e}"))
        })
    }
}
