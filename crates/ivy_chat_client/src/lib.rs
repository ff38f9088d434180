//! Shared Ivy chat client library (config, QA request/response types, HTTP client).
//! Used by the web server and the `ivy-ask` CLI.

pub mod client;
pub mod config;
pub mod messages;

pub use client::{ClientError, QaClient, QaSettings};
pub use config::{default_config_path, Config, ConfigError, IdentitySection, QaSection, ServerSection};
