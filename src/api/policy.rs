//! Failure classification and network-error debounce.
//!
//! `classify` is pure: it maps a failed exchange to an [`ApiError`] plus the
//! side effect the client must perform. The client owns the side effects.

use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use super::error::{ApiError, ErrorKind};
use crate::config::ClientConfig;

/// Toast text for connectivity failures.
pub const NETWORK_ERROR_MESSAGE: &str = "No internet connection";

/// A request that did not produce a 2xx response.
#[derive(Debug, Clone)]
pub enum Failure {
    /// Nothing came back: connect error, DNS failure, timeout.
    NoResponse { reason: String },
    /// The server answered with a non-success status.
    Status { status: u16, body: Vec<u8> },
}

/// Side effect owed for a classified failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Show the offline toast, subject to the suppression gate.
    NotifyOffline,
    /// Clear session storage and navigate to the root.
    ForceLogout,
    /// Show the server-supplied message.
    NotifyMessage(String),
    /// Leave it to the caller.
    Nothing,
}

/// Status codes the classifier distinguishes.
#[derive(Debug, Clone)]
pub struct Rules {
    pub session_expired_status: u16,
    pub client_error_statuses: Vec<u16>,
}

impl From<&ClientConfig> for Rules {
    fn from(config: &ClientConfig) -> Self {
        Self {
            session_expired_status: config.session_expired_status,
            client_error_statuses: config.client_error_statuses.clone(),
        }
    }
}

/// Classify a failure. Rules are checked in order: no response, session
/// expiry, client error, then everything else.
pub fn classify(rules: &Rules, failure: Failure) -> (ApiError, Action) {
    match failure {
        Failure::NoResponse { reason } => (ApiError::network(reason), Action::NotifyOffline),
        Failure::Status { status, body } => {
            let json: Option<Value> = serde_json::from_slice(&body).ok();
            let message = error_message(status, json.as_ref(), &body);

            let (kind, action) = if status == rules.session_expired_status {
                (ErrorKind::SessionExpired, Action::ForceLogout)
            } else if rules.client_error_statuses.contains(&status) {
                (ErrorKind::ClientError, Action::NotifyMessage(message.clone()))
            } else {
                (ErrorKind::ServerError, Action::Nothing)
            };

            (
                ApiError {
                    kind,
                    message,
                    status: Some(status),
                    body: json,
                },
                action,
            )
        }
    }
}

/// Best human-readable message for an error body.
///
/// Prefers the `message` field (joining it when the server sends a list of
/// validation messages), then the raw body text, then the status reason.
pub fn error_message(status: u16, json: Option<&Value>, raw: &[u8]) -> String {
    if let Some(message) = json.and_then(|v| v.get("message")) {
        match message {
            Value::String(s) => return s.clone(),
            Value::Array(items) => {
                let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                if !parts.is_empty() {
                    return parts.join(", ");
                }
            }
            _ => {}
        }
    }

    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if !text.is_empty() && json.map_or(true, |v| !v.is_object()) {
        return text.to_string();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {}", status))
}

/// Per-client suppression flag for the offline toast.
///
/// Closed when a toast has just been shown; reopens once the cooldown has
/// elapsed. Check-and-close happens under one lock, so concurrent failures
/// landing in the same window yield exactly one toast.
#[derive(Debug)]
pub struct NetworkErrorGate {
    cooldown: Duration,
    closed_until: Mutex<Option<Instant>>,
}

impl NetworkErrorGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            closed_until: Mutex::new(None),
        }
    }

    /// Returns `true` if the caller should emit the toast now. The gate is
    /// then closed for one cooldown window.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut guard = match self.closed_until.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match *guard {
            Some(until) if now < until => false,
            _ => {
                *guard = Some(now + self.cooldown);
                true
            }
        }
    }

    /// Whether a toast would currently be suppressed.
    pub fn is_suppressing(&self) -> bool {
        let guard = match self.closed_until.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        matches!(*guard, Some(until) if Instant::now() < until)
    }
}
