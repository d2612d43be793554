//! API access layer for the signage backend.
//!
//! Provides the authenticated HTTP client, failure classification, and the
//! typed account endpoints built on top of it.

pub mod account;
pub mod client;
pub mod error;
pub mod policy;
pub mod request;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::ApiClient;
pub use error::{ApiError, ErrorKind};
pub use request::RequestDescriptor;
