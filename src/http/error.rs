//! Failure taxonomy for dispatched requests.

use std::error::Error as _;

use thiserror::Error;

/// Every way a dispatched request can fail.
///
/// The `Display` text is the message a tool hands back to its host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No API token configured; no request was sent.
    #[error("credential not configured")]
    CredentialNotConfigured,

    /// HTTP 429 persisted through every retry.
    #[error("rate limit exceeded after maximum retries")]
    RateLimitExhausted { attempts: u32 },

    /// Any other non-2xx status.
    #[error("HTTP error: {status} - {body}")]
    Http { status: u16, body: String },

    /// Connection, DNS, timeout, or body read failure.
    #[error("Request error: {0}")]
    Transport(String),

    /// 2xx status with a body that is not JSON.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Field-free discriminant of [`DispatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Configuration,
    RateLimitExhausted,
    Http,
    Transport,
    MalformedResponse,
}

impl DispatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DispatchError::CredentialNotConfigured => FailureKind::Configuration,
            DispatchError::RateLimitExhausted { .. } => FailureKind::RateLimitExhausted,
            DispatchError::Http { .. } => FailureKind::Http,
            DispatchError::Transport(_) => FailureKind::Transport,
            DispatchError::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }

    /// HTTP status, when the server answered with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::Http { status, .. } => Some(*status),
            DispatchError::RateLimitExhausted { .. } => Some(429),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(error: reqwest::Error) -> Self {
        // Include the source chain; reqwest's top-level message alone is
        // usually just "error sending request".
        let mut description = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            description.push_str(": ");
            description.push_str(&cause.to_string());
            source = cause.source();
        }
        DispatchError::Transport(description)
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(error: serde_json::Error) -> Self {
        DispatchError::MalformedResponse(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            DispatchError::CredentialNotConfigured.to_string(),
            "credential not configured"
        );
        assert_eq!(
            DispatchError::RateLimitExhausted { attempts: 4 }.to_string(),
            "rate limit exceeded after maximum retries"
        );
        assert_eq!(
            DispatchError::Http {
                status: 404,
                body: r#"{"status":false}"#.to_string()
            }
            .to_string(),
            r#"HTTP error: 404 - {"status":false}"#
        );
        assert!(
            DispatchError::Transport("connection refused".to_string())
                .to_string()
                .contains("connection refused")
        );
    }

    #[test]
    fn test_kind_and_status() {
        let err = DispatchError::Http {
            status: 500,
            body: String::new(),
        };
        assert_eq!(err.kind(), FailureKind::Http);
        assert_eq!(err.status(), Some(500));

        let err = DispatchError::RateLimitExhausted { attempts: 4 };
        assert_eq!(err.kind(), FailureKind::RateLimitExhausted);
        assert_eq!(err.status(), Some(429));

        assert_eq!(
            DispatchError::CredentialNotConfigured.kind(),
            FailureKind::Configuration
        );
        assert_eq!(DispatchError::CredentialNotConfigured.status(), None);
    }

    #[test]
    fn test_from_serde_json_error_is_malformed() {
        let parse_error = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = DispatchError::from(parse_error);
        assert_eq!(err.kind(), FailureKind::MalformedResponse);
    }
}
