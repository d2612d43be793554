//! HTTP client with credential injection and a uniform failure policy.
//!
//! Every call goes build -> send -> classify. Success returns the decoded
//! body only; failure returns a classified [`ApiError`] after the client has
//! applied the matching side effect (offline toast, message toast, or forced
//! logout).

use std::sync::Arc;

use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;

use super::error::ApiError;
use super::policy::{classify, Action, Failure, NetworkErrorGate, Rules, NETWORK_ERROR_MESSAGE};
use super::request::{RequestDescriptor, RequestTemplate};
use crate::config::{ClientConfig, ConfigError};
use crate::navigate::Navigator;
use crate::notify::{Notifier, Toast};
use crate::session::{Session, StoreError};

/// Single point of egress to the signage backend.
///
/// Share it behind an `Arc`; all methods take `&self` and any number of
/// requests may be in flight at once.
pub struct ApiClient {
    http: Client,
    template: RequestTemplate,
    rules: Rules,
    gate: NetworkErrorGate,
    session: Arc<Session>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Create a client. Fails only on malformed configuration.
    pub fn new(
        config: &ClientConfig,
        session: Arc<Session>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ConfigError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            template: RequestTemplate::from_config(config)?,
            rules: Rules::from(config),
            gate: NetworkErrorGate::new(config.network_error_cooldown),
            session,
            notifier,
            navigator,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Store a freshly issued credential and re-arm the expiry redirect.
    pub async fn start_session(&self, token: &str, user: Option<&Value>) -> Result<(), StoreError> {
        let session = self.session.clone();
        let token = token.to_string();
        let user = user.cloned();
        tokio::task::spawn_blocking(move || session.login(&token, user.as_ref()))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;
        self.navigator.rearm();
        Ok(())
    }

    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(RequestDescriptor::new(Method::GET, path)).await
    }

    pub async fn post<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<Value, ApiError> {
        self.request(RequestDescriptor::new(Method::POST, path).with_payload(payload)?)
            .await
    }

    pub async fn put<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<Value, ApiError> {
        self.request(RequestDescriptor::new(Method::PUT, path).with_payload(payload)?)
            .await
    }

    pub async fn patch<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<Value, ApiError> {
        self.request(RequestDescriptor::new(Method::PATCH, path).with_payload(payload)?)
            .await
    }

    /// DELETE with an optional body; pass `&()` for none.
    pub async fn delete<P: Serialize + ?Sized>(&self, path: &str, payload: &P) -> Result<Value, ApiError> {
        self.request(RequestDescriptor::new(Method::DELETE, path).with_payload(payload)?)
            .await
    }

    /// Send an arbitrary descriptor through the same pipeline as the verbs.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<Value, ApiError> {
        // Read the credential fresh so a mid-session refresh is picked up.
        // Stores may hit the disk or the keychain, so keep that off the runtime.
        let session = self.session.clone();
        let credential = match tokio::task::spawn_blocking(move || session.credential()).await {
            Ok(credential) => credential,
            Err(e) => {
                log::warn!("Credential read task failed, sending anonymously: {}", e);
                None
            }
        };
        let prepared = self.template.build(&descriptor, credential.as_deref())?;

        log::debug!(
            "{} {} (credential: {})",
            prepared.method,
            prepared.url,
            if credential.is_some() { "yes" } else { "no" }
        );

        let mut builder = self
            .http
            .request(prepared.method, &prepared.url)
            .headers(prepared.headers);
        if let Some(body) = prepared.body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                return Err(self
                    .fail(Failure::NoResponse {
                        reason: e.to_string(),
                    })
                    .await)
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(bytes) => bytes,
            // Connection dropped mid-body: nothing usable came back.
            Err(e) => {
                return Err(self
                    .fail(Failure::NoResponse {
                        reason: e.to_string(),
                    })
                    .await)
            }
        };

        if status.is_success() {
            return decode_body(status.as_u16(), &body);
        }

        Err(self
            .fail(Failure::Status {
                status: status.as_u16(),
                body: body.to_vec(),
            })
            .await)
    }

    /// Classify a failure and perform its side effect.
    async fn fail(&self, failure: Failure) -> ApiError {
        let (error, action) = classify(&self.rules, failure);

        match action {
            Action::NotifyOffline => {
                if self.gate.try_acquire() {
                    log::warn!("Network failure: {}", error.message);
                    self.notifier.notify(&Toast::error(NETWORK_ERROR_MESSAGE));
                } else {
                    log::debug!("Network failure (toast suppressed): {}", error.message);
                }
            }
            Action::ForceLogout => {
                log::info!("Server reported session expiry, logging out");
                let session = self.session.clone();
                match tokio::task::spawn_blocking(move || session.expire()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => log::error!("Failed to clear session storage: {}", e),
                    Err(e) => log::error!("Session clear task failed: {}", e),
                }
                self.navigator.redirect_to_root();
            }
            Action::NotifyMessage(message) => {
                log::info!("Request rejected ({:?}): {}", error.status, message);
                self.notifier.notify(&Toast::error(message));
            }
            Action::Nothing => {
                log::warn!("Request failed: {}", error);
            }
        }

        error
    }
}

/// Decode a success body. Empty bodies become `null`.
fn decode_body(status: u16, body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::decode(Some(status), format!("Invalid JSON in response body: {}", e)))
}
