//! Error types for llmprobe.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors fall into four kinds:
//! - **Config**: bad provider definitions, unknown endpoints, invalid URLs —
//!   fatal to the call, surfaced immediately, never retried.
//! - **Timeout**: the request exceeded its deadline.
//! - **NetworkOrCors**: low-level transport failure (connection refused, DNS,
//!   TLS, or a CORS rejection when running behind a browser-origin relay).
//! - **Unknown**: anything uncategorized.
//!
//! A non-2xx HTTP status from the upstream API is deliberately NOT an error:
//! it flows through the normal return path as a `RawResult` so the fallback
//! policy can inspect it.

use thiserror::Error;

// =============================================================================
// Error Kinds
// =============================================================================

/// High-level error kinds for classification and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Configuration problem (endpoint not declared, invalid URL, bad file).
    Config,
    /// Request exceeded its deadline.
    Timeout,
    /// Transport-level failure (network down, connection refused, CORS).
    NetworkOrCors,
    /// Anything uncategorized.
    Unknown,
}

impl ErrorKind {
    /// Stable uppercase tag used in summaries and JSON records.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Config => "CONFIG",
            Self::Timeout => "TIMEOUT",
            Self::NetworkOrCors => "NETWORK_OR_CORS",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Configuration error (bad provider definition, unknown endpoint)
    ConfigError = 2,
    /// Timeout
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Main error type for llmprobe operations.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Requested endpoint is not declared on the provider definition.
    #[error("provider '{provider}' does not declare endpoint '{endpoint}'")]
    EndpointNotDeclared { provider: String, endpoint: String },

    /// Unknown provider id.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Provider definition failed the minimal required-field checks.
    #[error("invalid provider definition '{provider}': {message}")]
    InvalidDefinition { provider: String, message: String },

    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// URL could not be parsed.
    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Request exceeded its deadline.
    #[error("request timeout after {0}ms")]
    Timeout(u64),

    /// Transport-level failure.
    #[error("network error (connection failed or blocked by CORS): {0}")]
    Network(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProbeError {
    /// Returns the error kind for classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EndpointNotDeclared { .. }
            | Self::UnknownProvider(_)
            | Self::InvalidDefinition { .. }
            | Self::Config(_)
            | Self::InvalidUrl { .. } => ErrorKind::Config,

            Self::Timeout(_) => ErrorKind::Timeout,

            Self::Network(_) => ErrorKind::NetworkOrCors,

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorKind::Unknown,
        }
    }

    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self.kind() {
            ErrorKind::Config => ExitCode::ConfigError,
            ErrorKind::Timeout => ExitCode::Timeout,
            ErrorKind::NetworkOrCors | ErrorKind::Unknown => ExitCode::GeneralError,
        }
    }
}

/// Result type alias for llmprobe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_have_config_kind() {
        let err = ProbeError::EndpointNotDeclared {
            provider: "openai".to_string(),
            endpoint: "test_call".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.exit_code(), ExitCode::ConfigError);

        let err = ProbeError::UnknownProvider("nope".to_string());
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = ProbeError::InvalidUrl {
            url: "not a url".to_string(),
            message: "relative URL without a base".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn timeout_maps_to_timeout_exit_code() {
        let err = ProbeError::Timeout(15_000);
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.exit_code(), ExitCode::Timeout);
    }

    #[test]
    fn network_errors_are_network_or_cors() {
        let err = ProbeError::Network("connection refused".to_string());
        assert_eq!(err.kind(), ErrorKind::NetworkOrCors);
        assert_eq!(err.exit_code(), ExitCode::GeneralError);
    }

    #[test]
    fn uncategorized_errors_are_unknown() {
        let err = ProbeError::Other(anyhow::anyhow!("surprise"));
        assert_eq!(err.kind(), ErrorKind::Unknown);

        let err = ProbeError::Json(serde_json::from_str::<()>("nope").unwrap_err());
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn kind_tags_are_stable() {
        assert_eq!(ErrorKind::Config.tag(), "CONFIG");
        assert_eq!(ErrorKind::Timeout.tag(), "TIMEOUT");
        assert_eq!(ErrorKind::NetworkOrCors.tag(), "NETWORK_OR_CORS");
        assert_eq!(ErrorKind::Unknown.tag(), "UNKNOWN");
    }

    #[test]
    fn endpoint_not_declared_message_names_both_sides() {
        let err = ProbeError::EndpointNotDeclared {
            provider: "gemini".to_string(),
            endpoint: "list_models".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("gemini"));
        assert!(msg.contains("list_models"));
    }
}
