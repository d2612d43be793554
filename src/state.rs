//! Application state for the console CLI.
//!
//! Wires the session store, notification sink and navigator into one shared
//! `ApiClient`.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::{ClientConfig, ConfigError};
use crate::navigate::ConsoleNavigator;
use crate::notify::ConsoleNotifier;
use crate::session::{Session, SessionStore};

/// Shared state handed to every command.
pub struct AppState {
    /// HTTP client for backend communication.
    pub api: Arc<ApiClient>,

    /// Session handle (same instance the client reads credentials from).
    pub session: Arc<Session>,
}

impl AppState {
    /// Build state over the given configuration and credential store.
    pub fn new(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ConfigError> {
        let session = Arc::new(Session::new(store));
        let api = ApiClient::new(
            config,
            session.clone(),
            Arc::new(ConsoleNotifier),
            Arc::new(ConsoleNavigator::new()),
        )?;

        Ok(Self {
            api: Arc::new(api),
            session,
        })
    }
}
