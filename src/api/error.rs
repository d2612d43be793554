//! Error descriptor returned by every failed API call.
//!
//! Each failure is classified exactly once by [`super::policy::classify`] and
//! then handed back to the caller, even when the client already reacted to it
//! (toast, forced logout).

use serde_json::Value;
use thiserror::Error;

/// Classification bucket for a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response was received (connect failure, DNS, timeout).
    Network,
    /// Validation or authorization failure the user should see.
    ClientError,
    /// The server invalidated the session.
    SessionExpired,
    /// Anything else, left to the caller to surface.
    ServerError,
}

impl ErrorKind {
    /// Short machine-friendly label, used in logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::ClientError => "client-error",
            ErrorKind::SessionExpired => "session-expired",
            ErrorKind::ServerError => "server-error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A classified request failure.
#[derive(Debug, Clone, Error)]
#[error("{kind} ({}): {message}", status_text(.status))]
pub struct ApiError {
    /// Classification driving notification and propagation.
    pub kind: ErrorKind,
    /// Server-supplied message, body text, or transport error text.
    pub message: String,
    /// HTTP status of the offending response; `None` when nothing came back.
    pub status: Option<u16>,
    /// Decoded JSON error body, when the server sent one.
    pub body: Option<Value>,
}

fn status_text(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no response".to_string(),
    }
}

impl ApiError {
    /// Failure with no response at all.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Network,
            message: message.into(),
            status: None,
            body: None,
        }
    }

    /// A success response whose payload could not be decoded into the expected shape.
    ///
    /// `status` is `None` when the decode happens after the transport status
    /// has already been consumed.
    pub fn decode(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ServerError,
            message: message.into(),
            status,
            body: None,
        }
    }

    pub fn is_network(&self) -> bool {
        self.kind == ErrorKind::Network
    }

    pub fn is_session_expired(&self) -> bool {
        self.kind == ErrorKind::SessionExpired
    }
}
