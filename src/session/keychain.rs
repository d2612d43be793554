//! OS keychain session store.
//!
//! Uses the `keyring` crate so the credential never touches disk in plain
//! text. Each session key is a separate keychain entry under one service name.

use keyring::Entry;

use super::store::{SessionStore, StoreError};
use super::{TOKEN_KEY, USER_KEY};

/// Keychain service name for this application.
pub const SERVICE_NAME: &str = "com.signage.console";

/// Every key this crate writes; `clear` removes exactly these.
const SESSION_KEYS: [&str; 2] = [TOKEN_KEY, USER_KEY];

impl From<keyring::Error> for StoreError {
    fn from(err: keyring::Error) -> Self {
        StoreError::Keychain(err.to_string())
    }
}

pub struct KeychainStore {
    service: String,
}

impl KeychainStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for KeychainStore {
    /// Returns `None` if no entry exists (never logged in, or logged out).
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::from(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        for key in SESSION_KEYS {
            match self.entry(key)?.delete_credential() {
                Ok(()) => {}
                Err(keyring::Error::NoEntry) => {} // already deleted
                Err(e) => return Err(StoreError::from(e)),
            }
        }
        Ok(())
    }
}
