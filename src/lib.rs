//! Authenticated API access for the signage administration console.
//!
//! [`api::ApiClient`] is the single point of egress to the backend: it
//! injects the stored credential, unwraps success bodies, and applies one
//! failure policy (offline toast debounce, validation toasts, forced logout
//! on session expiry) for every caller.

pub mod api;
pub mod commands;
pub mod config;
pub mod navigate;
pub mod notify;
pub mod session;
pub mod state;

pub use api::{ApiClient, ApiError, ErrorKind};
pub use config::ClientConfig;
