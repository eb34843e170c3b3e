//! Client error types and write-outcome wrappers

use std::time::Duration;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response arrived within the request deadline
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Network-level failure (unreachable host, connection reset, ...)
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response; the body text is surfaced verbatim as the message
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response arrived but could not be interpreted
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Realtime subscription error
    #[error("subscription error: {0}")]
    Subscription(String),
}

impl ClientError {
    /// Transport failures are worth another attempt; application errors
    /// (a response with a body) are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Timeout(_) | ClientError::Network(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest's own deadline fired before ours
            ClientError::Timeout(Duration::ZERO)
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

/// Result type for read operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Error slot carried by write outcomes
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
}

impl From<ClientError> for ErrorDetail {
    fn from(err: ClientError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Outcome of a mutation that yields no row.
///
/// Mutations never return `Err`; callers check `error` instead. Read
/// methods keep the plain `ClientResult` shape and may fail hard. UI code
/// matches on this asymmetry, so both halves are part of the contract.
#[derive(Debug, Default)]
pub struct WriteOutcome {
    pub error: Option<ErrorDetail>,
}

impl WriteOutcome {
    pub fn ok() -> Self {
        Self { error: None }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub(crate) fn from_result(result: ClientResult<()>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self {
                error: Some(e.into()),
            },
        }
    }
}

/// Outcome of an insert that needs the created row back
#[derive(Debug)]
pub struct Created<T> {
    pub data: Option<T>,
    pub error: Option<ErrorDetail>,
}

impl<T> Created<T> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub(crate) fn from_result(result: ClientResult<T>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(e) => Self {
                data: None,
                error: Some(e.into()),
            },
        }
    }
}

/// Outcome of a storage upload: public URL plus error slot
#[derive(Debug)]
pub struct Upload {
    pub url: Option<String>,
    pub error: Option<ErrorDetail>,
}

impl Upload {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub(crate) fn from_result(result: ClientResult<String>) -> Self {
        match result {
            Ok(url) => Self {
                url: Some(url),
                error: None,
            },
            Err(e) => Self {
                url: None,
                error: Some(e.into()),
            },
        }
    }
}
