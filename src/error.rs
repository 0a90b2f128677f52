//! Error types for the SMS relay.
//!
//! Forwarding failures are not errors here: they are reported as
//! [`ForwardOutcome`](crate::pipeline::types::ForwardOutcome) values and never
//! leave the dispatch boundary.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("No Tokio runtime available: {0}")]
    NoRuntime(String),
}

/// Credential store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read store file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file {path} is not a JSON object: {reason}")]
    Malformed { path: String, reason: String },
}

/// Message source errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Source {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}
