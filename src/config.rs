//! Client configuration.
//!
//! Defaults match the signage backend's conventions. `from_env` layers
//! environment variables (usually loaded from `.env` by `main`) over the
//! defaults; CLI flags are applied on top by the binary.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

/// Base URL used when neither `SIGNAGE_API_URL` nor `DEVELOP_BASE_URL` is set.
pub const DEFAULT_BASE_ADDRESS: &str = "http://localhost:3000/";

/// Status code the backend uses to signal an invalidated session.
pub const DEFAULT_SESSION_EXPIRED_STATUS: u16 = 440;

/// Minimum spacing between two "No internet connection" toasts.
pub const DEFAULT_NETWORK_ERROR_COOLDOWN: Duration = Duration::from_millis(5000);

/// Header the backend reads the raw credential from.
pub const DEFAULT_CREDENTIAL_HEADER: &str = "access-token";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Failed to build HTTP transport: {0}")]
    Transport(String),
}

/// Where the credential goes on an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialPlacement {
    /// Raw token in the named header (e.g. `access-token: <token>`).
    Header(String),
    /// `Authorization: Bearer <token>`.
    Bearer,
}

impl CredentialPlacement {
    /// Parse the `SIGNAGE_AUTH_SCHEME` form: `bearer` or a header name.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("bearer") {
            CredentialPlacement::Bearer
        } else {
            CredentialPlacement::Header(trimmed.to_ascii_lowercase())
        }
    }
}

impl Default for CredentialPlacement {
    fn default() -> Self {
        CredentialPlacement::Header(DEFAULT_CREDENTIAL_HEADER.to_string())
    }
}

/// Configuration for [`crate::api::ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root URL every relative path is joined onto.
    pub base_address: String,
    /// Headers sent with every request.
    pub default_headers: BTreeMap<String, String>,
    /// How the credential is attached.
    pub credential_placement: CredentialPlacement,
    /// Status that forces a logout.
    pub session_expired_status: u16,
    /// Statuses whose server message is shown to the user.
    pub client_error_statuses: Vec<u16>,
    /// Suppression window for repeated network-error toasts.
    pub network_error_cooldown: Duration,
    /// Whole-request timeout. Expiry is reported as a network failure.
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert("accept".to_string(), "application/json".to_string());
        default_headers.insert("content-type".to_string(), "application/json".to_string());

        Self {
            base_address: DEFAULT_BASE_ADDRESS.to_string(),
            default_headers,
            credential_placement: CredentialPlacement::default(),
            session_expired_status: DEFAULT_SESSION_EXPIRED_STATUS,
            client_error_statuses: vec![400, 401],
            network_error_cooldown: DEFAULT_NETWORK_ERROR_COOLDOWN,
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Defaults pointed at the given base address.
    pub fn new(base_address: &str) -> Self {
        Self {
            base_address: base_address.to_string(),
            ..Default::default()
        }
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    ///
    /// Base URL precedence: `SIGNAGE_API_URL` > `DEVELOP_BASE_URL` > default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("SIGNAGE_API_URL").or_else(|| lookup("DEVELOP_BASE_URL")) {
            if !url.trim().is_empty() {
                config.base_address = url.trim().to_string();
            }
        }

        if let Some(value) = lookup("SIGNAGE_SESSION_EXPIRED_STATUS") {
            config.session_expired_status =
                parse_number("SIGNAGE_SESSION_EXPIRED_STATUS", &value)?;
        }

        if let Some(value) = lookup("SIGNAGE_NETWORK_COOLDOWN_MS") {
            let ms: u64 = parse_number("SIGNAGE_NETWORK_COOLDOWN_MS", &value)?;
            config.network_error_cooldown = Duration::from_millis(ms);
        }

        if let Some(value) = lookup("SIGNAGE_TIMEOUT_SECS") {
            let secs: u64 = parse_number("SIGNAGE_TIMEOUT_SECS", &value)?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(value) = lookup("SIGNAGE_AUTH_SCHEME") {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "SIGNAGE_AUTH_SCHEME",
                    value,
                });
            }
            config.credential_placement = CredentialPlacement::parse(&value);
        }

        Ok(config)
    }

    /// Add or replace a default header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.network_error_cooldown = cooldown;
        self
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}
