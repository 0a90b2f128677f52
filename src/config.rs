//! Configuration types.
//!
//! Every value has a default; `from_env()` overrides individual fields from
//! `SMS_RELAY_*` environment variables. Unparseable values fall back to the
//! default rather than aborting startup.

use std::path::PathBuf;
use std::time::Duration;

/// Webhook the forwarder posts to when nothing else is configured.
pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:3000/api/sms/sms-webhook";

/// Key under which the linking step stores the bearer token.
pub const DEFAULT_STORAGE_KEY: &str = "authToken";

/// Forwarder configuration.
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Webhook URL receiving `{"smsText", "sender"}` payloads.
    pub endpoint_url: String,
    /// Credential store key holding the bearer token.
    pub storage_key: String,
    /// Whole-request timeout for one forwarding attempt.
    pub request_timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Dispatch controller configuration.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Upper bound on forwarding attempts running at once.
    pub max_concurrent_forwards: usize,
    /// Capacity of the outcome report broadcast channel.
    pub report_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_forwards: 8,
            report_capacity: 256,
        }
    }
}

/// Process-level configuration for the relay binary.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub forwarder: ForwarderConfig,
    pub dispatch: DispatchConfig,
    /// JSON key-value file the credential is read from.
    pub store_path: PathBuf,
    /// Port for the HTTP ingest source (disabled when `None`).
    pub ingest_port: Option<u16>,
    /// Whether to read `SENDER|body` lines from stdin.
    pub stdin_enabled: bool,
    /// Directory for rolling log files (stderr only when `None`).
    pub log_dir: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            forwarder: ForwarderConfig::default(),
            dispatch: DispatchConfig::default(),
            store_path: PathBuf::from("./data/storage.json"),
            ingest_port: None,
            stdin_enabled: true,
            log_dir: None,
        }
    }
}

impl RelayConfig {
    /// Build configuration from `SMS_RELAY_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("SMS_RELAY_ENDPOINT_URL").filter(|s| !s.trim().is_empty()) {
            config.forwarder.endpoint_url = url.trim().to_string();
        }
        if let Some(key) = lookup("SMS_RELAY_STORAGE_KEY").filter(|s| !s.trim().is_empty()) {
            config.forwarder.storage_key = key.trim().to_string();
        }
        if let Some(secs) = lookup("SMS_RELAY_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|s| *s > 0)
        {
            config.forwarder.request_timeout = Duration::from_secs(secs);
        }
        if let Some(max) = lookup("SMS_RELAY_MAX_CONCURRENT")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|m| *m > 0)
        {
            config.dispatch.max_concurrent_forwards = max;
        }
        if let Some(path) = lookup("SMS_RELAY_STORE_PATH").filter(|s| !s.trim().is_empty()) {
            config.store_path = PathBuf::from(path.trim());
        }
        config.ingest_port = lookup("SMS_RELAY_INGEST_PORT").and_then(|s| s.trim().parse().ok());
        if let Some(flag) = lookup("SMS_RELAY_STDIN") {
            config.stdin_enabled = !matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
        config.log_dir = lookup("SMS_RELAY_LOG_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(|s| PathBuf::from(s.trim()));

        config
    }
}
