//! Client configuration and the explorer endpoint descriptor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// API version path every request is rooted at.
pub const API_ROOT: &str = "/api/v1";

const USER_AGENT_VALUE: &str = concat!("gridfarm-client/", env!("CARGO_PKG_VERSION"));

/// Well-known explorer deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl Network {
    /// Explorer base URL for this network.
    pub fn url(self) -> &'static str {
        match self {
            Self::Mainnet => "https://explorer.grid.tf",
            Self::Testnet => "https://explorer.testnet.grid.tf",
            Self::Devnet => "https://explorer.devnet.grid.tf",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Devnet => "devnet",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            "devnet" | "dev" => Ok(Self::Devnet),
            other => Err(ClientError::Config {
                message: format!("unknown network: {other}"),
            }),
        }
    }
}

/// Explorer client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Explorer base URL. The API root is appended when missing.
    #[serde(default = "default_explorer_url")]
    pub url: String,

    /// Transport deadline for one request, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_explorer_url() -> String {
    Network::Mainnet.url().to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    USER_AGENT_VALUE.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_explorer_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `GRIDFARM_EXPLORER_URL` | Explorer base URL |
    /// | `GRIDFARM_TIMEOUT` | Request timeout in seconds |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("GRIDFARM_EXPLORER_URL").unwrap_or_else(|_| default_explorer_url()),
            timeout_secs: std::env::var("GRIDFARM_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            user_agent: default_user_agent(),
        }
    }

    /// Config pointing at one of the well-known explorers.
    pub fn for_network(network: Network) -> Self {
        Self::default().with_url(network.url())
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Resolve the endpoint descriptor for this config.
    pub fn endpoint(&self) -> ClientResult<Endpoint> {
        Endpoint::parse(&self.url)
    }
}

/// Immutable base URL rooted at the API version path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    /// Parse a base URL, forcing the path to the API root unless it already
    /// ends with it.
    pub fn parse(raw: &str) -> ClientResult<Self> {
        let mut base = Url::parse(raw).map_err(|e| ClientError::Config {
            message: format!("invalid url {raw:?}: {e}"),
        })?;

        if base.cannot_be_a_base() {
            return Err(ClientError::Config {
                message: format!("invalid url {raw:?}: cannot be a base"),
            });
        }

        if !base.path().trim_end_matches('/').ends_with(API_ROOT) {
            base.set_path(API_ROOT);
        }
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self { base })
    }

    /// Absolute URL for the given path segments below the API root.
    ///
    /// Segments are percent-encoded individually, so identifiers can never
    /// escape their position in the path.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// The API root URL.
    pub fn base(&self) -> &Url {
        &self.base
    }
}
