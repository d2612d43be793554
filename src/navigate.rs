//! Navigation capability used for forced logout.

use std::sync::atomic::{AtomicBool, Ordering};

/// Path of the application root (the login screen).
pub const ROOT_PATH: &str = "/";

/// Redirects the current view.
pub trait Navigator: Send + Sync {
    /// Send the user back to the application root.
    ///
    /// May be called once per offending response; implementations must
    /// treat repeats as no-ops while a redirect is already under way.
    fn redirect_to_root(&self);

    /// A new session has started; the next expiry may redirect again.
    fn rearm(&self) {}
}

/// Terminal navigator: tells the user to log in again.
///
/// Only the first redirect of a burst prints. The client re-arms it when a
/// new session is stored.
#[derive(Debug, Default)]
pub struct ConsoleNavigator {
    redirected: AtomicBool,
}

impl ConsoleNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_redirected(&self) -> bool {
        self.redirected.load(Ordering::SeqCst)
    }
}

impl Navigator for ConsoleNavigator {
    fn redirect_to_root(&self) {
        if self.redirected.swap(true, Ordering::SeqCst) {
            log::debug!("Redirect to {} already in progress", ROOT_PATH);
            return;
        }
        log::info!("Navigating to {}", ROOT_PATH);
        eprintln!("Session expired. Please log in again (signage-console login).");
    }

    fn rearm(&self) {
        self.redirected.store(false, Ordering::SeqCst);
    }
}
