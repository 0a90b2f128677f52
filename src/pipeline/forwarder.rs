//! Webhook forwarder — one authenticated POST per classified message.
//!
//! Steps per attempt: look up the bearer token, build the `{"smsText",
//! "sender"}` payload, POST it, map the status code. There is no retry;
//! every attempt ends in exactly one [`ForwardOutcome`].

use std::sync::Arc;

use reqwest::{Client, StatusCode, Url};
use secrecy::ExposeSecret;
use tracing::{debug, error, info, warn};

use crate::config::ForwarderConfig;
use crate::error::ConfigError;
use crate::pipeline::types::{ForwardOutcome, ForwardRequest, HttpFailure, TransportErrorKind};
use crate::store::{CredentialStore, normalize_token};

/// Posts forward requests to the configured webhook.
pub struct Forwarder {
    client: Client,
    endpoint: Url,
    storage_key: String,
    store: Arc<dyn CredentialStore>,
}

impl Forwarder {
    /// Create a forwarder reading its credential from `store`.
    pub fn new(
        config: &ForwarderConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ConfigError> {
        let endpoint =
            Url::parse(&config.endpoint_url).map_err(|e| ConfigError::InvalidValue {
                key: "endpoint_url".into(),
                message: format!("{}: {e}", config.endpoint_url),
            })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                key: "endpoint_url".into(),
                message: format!("unsupported scheme {}", endpoint.scheme()),
            });
        }

        // No idle pool: the connection is closed once the response is dropped.
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            storage_key: config.storage_key.clone(),
            store,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run one forwarding attempt.
    pub async fn forward(&self, request: &ForwardRequest) -> ForwardOutcome {
        let token = self
            .store
            .get_token(&self.storage_key)
            .as_deref()
            .and_then(normalize_token);
        let Some(token) = token else {
            error!(
                key = %self.storage_key,
                "No auth token found. Device must be linked first"
            );
            return ForwardOutcome::AuthMissing;
        };

        debug!(endpoint = %self.endpoint, sender = %request.sender, "Forwarding SMS");

        let response = match self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(token.expose_secret())
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let kind = transport_error_kind(&e);
                warn!(error = %e, kind = ?kind, "Forward request failed before a response");
                return ForwardOutcome::HttpFailure(HttpFailure::Transport {
                    kind,
                    reason: e.to_string(),
                });
            }
        };

        let status = response.status();
        // Body is ignored. With no idle pool, dropping closes the connection.
        drop(response);

        if status == StatusCode::OK || status == StatusCode::CREATED {
            info!(status = status.as_u16(), "SMS forwarded successfully");
            ForwardOutcome::Success {
                status: status.as_u16(),
            }
        } else {
            warn!(status = status.as_u16(), "Failed to forward SMS");
            ForwardOutcome::HttpFailure(HttpFailure::Status {
                code: status.as_u16(),
            })
        }
    }
}

/// Classify a reqwest error into a transport failure kind.
fn transport_error_kind(e: &reqwest::Error) -> TransportErrorKind {
    if e.is_timeout() {
        TransportErrorKind::Timeout
    } else if e.is_connect() {
        TransportErrorKind::Connect
    } else if e.is_body() || e.is_decode() {
        TransportErrorKind::Body
    } else if e.is_request() {
        TransportErrorKind::Request
    } else {
        TransportErrorKind::Other
    }
}
