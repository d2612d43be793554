//! Request building.
//!
//! Pure with respect to its inputs: the same descriptor, headers and
//! credential always produce the same prepared request. The client calls
//! this before every send instead of mutating a shared request config.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::error::{ApiError, ErrorKind};
use crate::config::{ClientConfig, ConfigError, CredentialPlacement};

/// One outgoing call. Built per request and dropped afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    /// JSON payload. `None` sends no body.
    pub payload: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            payload: None,
        }
    }

    /// Attach a payload. Anything that serializes to JSON `null` (such as
    /// `&()`) leaves the request without a body.
    pub fn with_payload<P: Serialize + ?Sized>(mut self, payload: &P) -> Result<Self, ApiError> {
        let value = serde_json::to_value(payload).map_err(|e| ApiError {
            kind: ErrorKind::ClientError,
            message: format!("Failed to serialize request payload: {}", e),
            status: None,
            body: None,
        })?;
        self.payload = if value.is_null() { None } else { Some(value) };
        Ok(self)
    }
}

/// Fully resolved request, ready to hand to the transport.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Header material resolved once from [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    base_address: String,
    default_headers: HeaderMap,
    credential_header: HeaderName,
    bearer: bool,
}

impl RequestTemplate {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            default_headers.insert(header_name, header_value);
        }

        let (credential_header, bearer) = match &config.credential_placement {
            CredentialPlacement::Bearer => (AUTHORIZATION, true),
            CredentialPlacement::Header(name) => {
                let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                    ConfigError::InvalidHeader {
                        name: name.clone(),
                        reason: e.to_string(),
                    }
                })?;
                (header_name, false)
            }
        };

        Ok(Self {
            base_address: config.base_address.clone(),
            default_headers,
            credential_header,
            bearer,
        })
    }

    /// Resolve a descriptor against the template and the current credential.
    pub fn build(
        &self,
        descriptor: &RequestDescriptor,
        credential: Option<&str>,
    ) -> Result<PreparedRequest, ApiError> {
        let mut headers = self.default_headers.clone();

        if let Some(token) = credential {
            let raw = if self.bearer {
                format!("Bearer {}", token)
            } else {
                token.to_string()
            };
            let mut value = HeaderValue::from_str(&raw).map_err(|_| ApiError {
                kind: ErrorKind::ClientError,
                message: "Stored credential is not a valid header value".to_string(),
                status: None,
                body: None,
            })?;
            value.set_sensitive(true);
            headers.insert(self.credential_header.clone(), value);
        }

        let body = match &descriptor.payload {
            Some(value) => Some(serde_json::to_vec(value).map_err(|e| ApiError {
                kind: ErrorKind::ClientError,
                message: format!("Failed to encode request payload: {}", e),
                status: None,
                body: None,
            })?),
            None => None,
        };

        Ok(PreparedRequest {
            method: descriptor.method.clone(),
            url: join_url(&self.base_address, &descriptor.path),
            headers,
            body,
        })
    }
}

/// Join a relative path onto the base address with exactly one `/`.
///
/// Absolute `http(s)://` paths bypass the base address.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
