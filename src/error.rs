//! Typed error hierarchy for the wecom-api crate.
//!
//! Every public operation returns [`Result`], whose error side is
//! [`WecomError`]. Variants map to real failure boundaries:
//!
//! - `Auth` covers the token endpoints of each credential domain.
//! - `Api` covers a non-zero `errcode` in an otherwise well-formed response.
//!   This is by far the most common failure and carries the remote code so
//!   callers can branch on it.
//! - `Http` covers a non-2xx status from the gateway, with the body kept.
//! - `Network` wraps `reqwest::Error` for DNS, TCP, TLS and timeout failures.
//! - `Parse` wraps `serde_json::Error` when a body doesn't match the
//!   expected shape.
//! - `Timeout` and `Job` cover the job polling loop.
//! - `Config` covers missing or malformed client configuration.
//!
//! A stale token is not an error variant of its own: the client retries it
//! once internally and a second stale response is reported as `Api`.

use reqwest::StatusCode;

use crate::auth::{CredentialDomain, RetryPolicy};

/// Unified error type for all wecom-api operations.
#[derive(Debug, thiserror::Error)]
pub enum WecomError {
    /// Acquiring or refreshing a token failed. No endpoint call was made.
    #[error("{domain} token request failed: {message}")]
    Auth {
        /// Credential domain whose token endpoint failed.
        domain: CredentialDomain,
        /// Human-readable description, including the remote `errcode` and
        /// `errmsg` when the token endpoint returned one.
        message: String,
        /// The underlying transport or parse error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote side answered with a non-zero `errcode`.
    #[error("API error {code}: {message}")]
    Api {
        /// The `errcode` from the response envelope.
        code: i64,
        /// The `errmsg` from the response envelope.
        message: String,
    },

    /// The gateway returned a non-success HTTP status.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// HTTP status code of the response.
        status: StatusCode,
        /// Raw response body, or an empty string if it couldn't be read.
        body: String,
    },

    /// A background job did not reach a terminal state in time.
    #[error("polling timed out after {elapsed:?} for job {job_id}")]
    Timeout {
        /// Total elapsed time when the timeout was detected.
        elapsed: std::time::Duration,
        /// Identifier of the job being polled.
        job_id: String,
    },

    /// A background job finished but its result is missing the expected
    /// payload.
    #[error("job {job_id} finished without a usable result: {message}")]
    Job {
        job_id: String,
        message: String,
    },

    /// The client configuration is missing a section or a value.
    #[error("configuration error: {message}")]
    Config {
        /// What is missing or malformed.
        message: String,
    },

    /// JSON (de)serialization failed.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// A transport-level failure occurred before a response was received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl WecomError {
    /// Returns the remote `errcode` for `Api` errors.
    pub fn code(&self) -> Option<i64> {
        match self {
            WecomError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True for an `Api` error whose code `policy` treats as a rejected
    /// token, i.e. the one retry already ran and the fresh token was
    /// rejected too.
    pub fn is_token_invalid(&self, policy: &RetryPolicy) -> bool {
        self.code()
            .is_some_and(|code| policy.stale_codes().contains(&code))
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        WecomError::Config {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, WecomError>;
