//! Client configuration
//!
//! The backend mode and tuning knobs are decided once, at construction.
//! `from_env` covers the documented environment surface, but the resulting
//! value is always threaded explicitly into [`crate::VitrineClient::new`] so
//! tests can inject either backend deterministically.

use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Which backend the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendMode {
    /// Direct REST API over the relational store
    #[default]
    Rest,
    /// Hosted backend-as-a-service (row API, storage, auth, push channel)
    Hosted,
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Active backend mode
    pub mode: BackendMode,

    /// Base URL of the direct REST API (e.g., "http://localhost:8080")
    pub api_url: String,

    /// Base URL of the hosted backend (Hosted mode)
    pub hosted_url: Option<String>,

    /// API key for the hosted backend (Hosted mode)
    pub hosted_key: Option<String>,

    /// Push channel address for hosted realtime (e.g., "push.example.com:7070")
    pub push_addr: Option<String>,

    /// Per-request deadline
    pub timeout: Duration,

    /// Retry attempts after the first failure
    pub max_retries: u32,

    /// Base backoff delay; attempt N waits `retry_delay * N`
    pub retry_delay: Duration,

    /// Polling cadence of the realtime fallback (Rest mode)
    pub poll_interval: Duration,
}

impl ClientConfig {
    /// Configuration for the direct REST backend
    pub fn rest(api_url: impl Into<String>) -> Self {
        Self {
            mode: BackendMode::Rest,
            api_url: api_url.into(),
            hosted_url: None,
            hosted_key: None,
            push_addr: None,
            timeout: Duration::from_millis(15_000),
            max_retries: 2,
            retry_delay: Duration::from_millis(1_000),
            poll_interval: Duration::from_secs(5),
        }
    }

    /// Configuration for the hosted backend
    pub fn hosted(url: impl Into<String>, key: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            mode: BackendMode::Hosted,
            api_url: url.clone(),
            hosted_url: Some(url),
            hosted_key: Some(key.into()),
            push_addr: None,
            timeout: Duration::from_millis(15_000),
            max_retries: 2,
            retry_delay: Duration::from_millis(1_000),
            poll_interval: Duration::from_secs(5),
        }
    }

    /// Set the push channel address (Hosted mode realtime)
    pub fn with_push_addr(mut self, addr: impl Into<String>) -> Self {
        self.push_addr = Some(addr.into());
        self
    }

    /// Set the per-request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base backoff delay
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the realtime polling cadence (Rest mode)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Read the configuration from the environment, once.
    ///
    /// Variables: `VITRINE_BACKEND` ("rest" | "hosted"), `VITRINE_API_URL`,
    /// `VITRINE_HOSTED_URL`, `VITRINE_HOSTED_KEY`, `VITRINE_PUSH_ADDR`,
    /// `VITRINE_TIMEOUT_MS`, `VITRINE_MAX_RETRIES`.
    pub fn from_env() -> ClientResult<Self> {
        let mode = match std::env::var("VITRINE_BACKEND").as_deref() {
            Ok("hosted") => BackendMode::Hosted,
            Ok("rest") | Err(_) => BackendMode::Rest,
            Ok(other) => {
                return Err(ClientError::Config(format!(
                    "unknown VITRINE_BACKEND value: {other}"
                )));
            }
        };

        let mut config = match mode {
            BackendMode::Rest => {
                let api_url = std::env::var("VITRINE_API_URL")
                    .map_err(|_| ClientError::Config("VITRINE_API_URL is required".into()))?;
                Self::rest(api_url)
            }
            BackendMode::Hosted => {
                let url = std::env::var("VITRINE_HOSTED_URL")
                    .map_err(|_| ClientError::Config("VITRINE_HOSTED_URL is required".into()))?;
                let key = std::env::var("VITRINE_HOSTED_KEY")
                    .map_err(|_| ClientError::Config("VITRINE_HOSTED_KEY is required".into()))?;
                Self::hosted(url, key)
            }
        };

        if let Ok(addr) = std::env::var("VITRINE_PUSH_ADDR") {
            config.push_addr = Some(addr);
        }
        if let Ok(ms) = std::env::var("VITRINE_TIMEOUT_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| ClientError::Config("VITRINE_TIMEOUT_MS must be an integer".into()))?;
            config.timeout = Duration::from_millis(ms);
        }
        if let Ok(n) = std::env::var("VITRINE_MAX_RETRIES") {
            let n: u32 = n.parse().map_err(|_| {
                ClientError::Config("VITRINE_MAX_RETRIES must be an integer".into())
            })?;
            config.max_retries = n;
        }

        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::rest("http://localhost:8080")
    }
}
