//! Error types for the warranty API client.
//!
//! # Design
//! Every failure path (network, business failure inside a 2xx envelope,
//! unrecognized envelope) collapses into one `NormalizedError` so callers
//! write a single error-handling branch. `kind` and `code` let them branch
//! further when they need to, e.g. on license-expiry codes.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Localized text used when a failure carries no human-readable message.
pub const FALLBACK_MESSAGE: &str = "Đã có lỗi xảy ra";

/// Message attached to bodies that match no known envelope shape.
pub const MALFORMED_MESSAGE: &str = "response does not match any known envelope shape";

/// Where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure, non-JSON response, or non-2xx without a fail envelope.
    Transport,

    /// The backend answered with a well-formed failure envelope.
    BusinessFail,

    /// 2xx body that matches none of the known envelope shapes, or whose
    /// payload does not fit the type the caller asked for.
    MalformedEnvelope,

    /// The request could not be built (body or query failed to serialize).
    InvalidRequest,
}

/// The single error shape returned by every gateway operation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct NormalizedError {
    pub kind: ErrorKind,
    pub code: Option<String>,
    pub messages: Option<BTreeMap<String, String>>,
    pub message: String,
    pub status: Option<u16>,
    pub raw: Value,
}

impl NormalizedError {
    pub fn transport(message: impl Into<String>, status: Option<u16>, raw: Value) -> Self {
        Self {
            kind: ErrorKind::Transport,
            code: None,
            messages: None,
            message: non_empty_or_fallback(message.into()),
            status,
            raw,
        }
    }

    pub fn business(
        code: Option<String>,
        messages: Option<BTreeMap<String, String>>,
        message: String,
        raw: Value,
    ) -> Self {
        Self {
            kind: ErrorKind::BusinessFail,
            code,
            messages,
            message,
            status: None,
            raw,
        }
    }

    pub fn malformed(message: impl Into<String>, raw: Value) -> Self {
        Self {
            kind: ErrorKind::MalformedEnvelope,
            code: None,
            messages: None,
            message: message.into(),
            status: None,
            raw,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidRequest,
            code: None,
            messages: None,
            message: message.into(),
            status: None,
            raw: Value::Null,
        }
    }

    pub(crate) fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_business_fail(&self) -> bool {
        self.kind == ErrorKind::BusinessFail
    }

    /// True when the backend assigned exactly this error code.
    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

fn non_empty_or_fallback(message: String) -> String {
    if message.trim().is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        message
    }
}

/// A failure reported by a `Transport` before any response body was read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failed: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<TransportError> for NormalizedError {
    fn from(err: TransportError) -> Self {
        let raw = Value::String(err.message.clone());
        NormalizedError::transport(err.message, None, raw)
    }
}

/// Invalid client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_is_the_resolved_message() {
        let err = NormalizedError::business(
            Some("SS004".to_string()),
            None,
            "Sai mật khẩu".to_string(),
            json!({}),
        );
        assert_eq!(err.to_string(), "Sai mật khẩu");
        assert!(err.is_business_fail());
        assert!(err.has_code("SS004"));
        assert!(!err.has_code("SS005"));
    }

    #[test]
    fn transport_error_without_text_uses_fallback() {
        let err = NormalizedError::transport("  ", Some(502), Value::Null);
        assert_eq!(err.message, FALLBACK_MESSAGE);
        assert_eq!(err.kind, ErrorKind::Transport);
        assert_eq!(err.code, None);
        assert_eq!(err.status, Some(502));
    }

    #[test]
    fn transport_failure_converts_with_null_code() {
        let err: NormalizedError = TransportError::new("connection refused").into();
        assert_eq!(err.kind, ErrorKind::Transport);
        assert_eq!(err.message, "connection refused");
        assert!(err.code.is_none());
        assert_eq!(err.raw, json!("connection refused"));
    }
}
