//! Error types for the explorer client.

/// Explorer client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("request failure: {message}")]
    RequestFailure { message: String },

    /// The server rejected the request and explained why.
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The server rejected the request but its error body could not be read.
    #[error("failed to load error while processing invalid return code {status}: {reason}")]
    UnreadableErrorBody { status: u16, reason: String },

    /// Success status, but the payload does not have the expected shape.
    #[error("bad response shape (status {status}): {reason}")]
    BadResponseShape { status: u16, reason: String },

    /// The identity key could not be used to sign.
    #[error("signing failure: {reason}")]
    SigningFailure { reason: String },

    /// A composed lookup legitimately returned no results.
    #[error("{what} not found")]
    NotFound { what: String },

    /// A user with the same name or email is registered under another key.
    #[error("user {name} already exists and its public key doesn't match the one on the explorer")]
    IdentityConflict { name: String },

    /// A payload argument has no canonical rendering.
    #[error("unsupported argument at position {index}: {kind}")]
    UnsupportedArgument { index: usize, kind: String },

    /// The request could not be built.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ClientError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Not found / config issues
            Self::NotFound { .. } => 1,
            Self::Config { .. } => 1,
            Self::InvalidRequest { .. } => 1,
            Self::UnsupportedArgument { .. } => 1,

            // Server said no
            Self::Api { .. } => 2,
            Self::IdentityConflict { .. } => 2,

            // Key material
            Self::SigningFailure { .. } => 4,

            // Network/transient
            Self::RequestFailure { .. } => 5,

            // Protocol mismatch
            Self::UnreadableErrorBody { .. } => 6,
            Self::BadResponseShape { .. } => 6,
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RequestFailure { .. })
    }

    /// HTTP status attached to the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. }
            | Self::UnreadableErrorBody { status, .. }
            | Self::BadResponseShape { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub(crate) fn signing(reason: impl Into<String>) -> Self {
        Self::SigningFailure {
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailure {
            message: err.to_string(),
        }
    }
}

/// Result type for explorer client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_request_failures_are_retryable() {
        let transport = ClientError::RequestFailure {
            message: "connection refused".into(),
        };
        let api = ClientError::Api {
            status: 400,
            message: "name is required".into(),
        };
        let shape = ClientError::BadResponseShape {
            status: 200,
            reason: "expected array".into(),
        };

        assert!(transport.is_retryable());
        assert!(!api.is_retryable());
        assert!(!shape.is_retryable());
        assert!(!ClientError::signing("bad key").is_retryable());
    }

    #[test]
    fn status_is_preserved_for_server_answers() {
        let api = ClientError::Api {
            status: 401,
            message: "unauthorized".into(),
        };
        let unreadable = ClientError::UnreadableErrorBody {
            status: 502,
            reason: "expected value at line 1 column 1".into(),
        };

        assert_eq!(api.status(), Some(401));
        assert_eq!(unreadable.status(), Some(502));
        assert_eq!(ClientError::not_found("user").status(), None);
    }

    #[test]
    fn api_error_displays_server_message() {
        let api = ClientError::Api {
            status: 409,
            message: "user with same name or email exists".into(),
        };
        assert_eq!(
            api.to_string(),
            "api error (status 409): user with same name or email exists"
        );
        assert_eq!(api.exit_code(), 2);
    }
}
