//! Concrete collaborators and process configuration.
//!
//! - `http`: reqwest client for the portal API (catalog + cart).
//! - `memory`: in-memory catalog and cart gateway for tests and local runs.
//! - `config`: environment-driven configuration.

pub mod config;
pub mod http;
pub mod memory;

pub use config::{ConfigError, PortalConfig};
pub use http::HttpPortalClient;
pub use memory::{InMemoryCatalog, RecordedAttempt, RecordingCartGateway};
