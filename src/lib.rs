#![deny(missing_docs)]

//! Client library for a remote document-intelligence service.

/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// HTTP client for the remote service.
pub mod remote;
/// Stored copies of service responses.
pub mod store;
/// Authenticate → upload → extract → inspect orchestration.
pub mod workflow;
