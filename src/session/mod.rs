//! Session state: credential storage plus the Anonymous/Authenticated machine.
//!
//! `Anonymous -> Authenticated` happens only through [`Session::login`] (or a
//! credential already present at startup). `Authenticated -> Anonymous`
//! happens on [`Session::logout`] or [`Session::expire`]. The API client never
//! mints credentials; it only reads them and, on expiry, wipes them.

pub mod file;
pub mod keychain;
pub mod store;

pub use file::FileStore;
pub use keychain::KeychainStore;
pub use store::{MemoryStore, SessionStore, StoreError};

use std::sync::{Arc, RwLock};

use serde_json::Value;

/// Storage key for the credential.
pub const TOKEN_KEY: &str = "agility_token";

/// Storage key for the JSON-encoded user profile captured at login.
pub const USER_KEY: &str = "agility_user";

/// Logical session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
}

impl SessionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Anonymous => "Anonymous",
            SessionStatus::Authenticated => "Authenticated",
        }
    }
}

/// Shared handle over the session store and the current status.
pub struct Session {
    store: Arc<dyn SessionStore>,
    status: RwLock<SessionStatus>,
}

impl Session {
    /// Wrap a store. Starts `Authenticated` if a credential is already stored.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let status = match store.get(TOKEN_KEY) {
            Ok(Some(_)) => SessionStatus::Authenticated,
            Ok(None) => SessionStatus::Anonymous,
            Err(e) => {
                log::warn!("Failed to read stored credential: {}", e);
                SessionStatus::Anonymous
            }
        };
        Self {
            store,
            status: RwLock::new(status),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
            .read()
            .map(|s| *s)
            .unwrap_or(SessionStatus::Anonymous)
    }

    fn set_status(&self, status: SessionStatus) -> SessionStatus {
        match self.status.write() {
            Ok(mut guard) => std::mem::replace(&mut *guard, status),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), status),
        }
    }

    /// Current credential, read fresh from the store.
    ///
    /// A store failure is logged and treated as "no credential" so the
    /// request still goes out anonymously.
    pub fn credential(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                log::warn!("Failed to read credential, sending anonymously: {}", e);
                None
            }
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.credential().is_some()
    }

    /// Stored user profile. Absent when missing, `"undefined"` or not JSON.
    pub fn current_user(&self) -> Option<Value> {
        let raw = self.store.get(USER_KEY).ok().flatten()?;
        if raw == "undefined" {
            return None;
        }
        serde_json::from_str(&raw).ok()
    }

    /// Persist a freshly acquired credential (and optional profile).
    ///
    /// Whatever the previous session left behind is wiped first, so a login
    /// without a profile never inherits the last user's.
    pub fn login(&self, token: &str, user: Option<&Value>) -> Result<(), StoreError> {
        self.store.clear()?;
        self.store.set(TOKEN_KEY, token)?;
        if let Some(user) = user {
            self.store.set(USER_KEY, &user.to_string())?;
        }
        self.set_status(SessionStatus::Authenticated);
        log::info!("Session authenticated");
        Ok(())
    }

    /// Explicit logout: wipe the store.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.clear()?;
        self.set_status(SessionStatus::Anonymous);
        log::info!("Session cleared (logout)");
        Ok(())
    }

    /// Server-signalled expiry: wipe the store.
    ///
    /// Returns the status held before the call, so callers can tell the first
    /// expiry of a burst from the repeats.
    pub fn expire(&self) -> Result<SessionStatus, StoreError> {
        let result = self.store.clear();
        let previous = self.set_status(SessionStatus::Anonymous);
        result?;
        if previous == SessionStatus::Authenticated {
            log::info!("Session expired, local session state cleared");
        }
        Ok(previous)
    }
}
