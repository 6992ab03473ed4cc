//! Transport: executes one HTTP request and hands back the raw response.
//!
//! No retries and no backoff happen here. A failure to obtain a response is a
//! [`ClientError::RequestFailure`], the one error class callers may retry.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use reqwest::blocking::{Client, Request};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Status and unread body of a response.
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Box<dyn Read + Send>,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            body: Box::new(body),
        }
    }

    /// Response with an in-memory body.
    pub fn from_bytes(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, std::io::Cursor::new(body.into()))
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Something that can execute a fully formed request.
pub trait Transport: Send + Sync {
    fn execute(&self, request: Request) -> ClientResult<RawResponse>;
}

/// Blocking reqwest transport. Owns the connection pool, shared by every call
/// made through the same client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let mut default_headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&config.user_agent).map_err(|e| {
            ClientError::Config {
                message: format!("invalid user agent: {e}"),
            }
        })?;
        default_headers.insert(USER_AGENT, user_agent);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ClientError::Config {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: Request) -> ClientResult<RawResponse> {
        let response = self.client.execute(request)?;
        Ok(RawResponse::new(response.status(), response))
    }
}
