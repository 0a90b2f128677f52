//! Shared types for the classify-and-forward pipeline.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Incoming message ────────────────────────────────────────────────

/// A text message as captured by a message source.
///
/// Immutable once built; the dispatcher consumes it exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Locally generated id, used to correlate diagnostics.
    pub id: Uuid,
    /// Originating address (short code, phone number, alphanumeric sender id).
    pub sender: String,
    /// Message text.
    pub body: String,
    /// When the source captured the message. Never sent upstream.
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    /// Capture a message stamped with the current time.
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: sender.into(),
            body: body.into(),
            received_at: Utc::now(),
        }
    }

    /// Use a transport-supplied epoch timestamp in milliseconds.
    ///
    /// Out-of-range values keep the capture time.
    pub fn with_timestamp_millis(mut self, millis: i64) -> Self {
        if let Some(ts) = DateTime::from_timestamp_millis(millis) {
            self.received_at = ts;
        }
        self
    }
}

// ── Classification ──────────────────────────────────────────────────

/// One of the independent evidence groups the classifier looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    /// credited, debited, withdrawn, ...
    TransactionVerb,
    /// INR, Rs., ₹, USD, $
    CurrencyMarker,
    /// A/c, account, card, bank, wallet
    AccountContext,
}

impl SignalCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TransactionVerb => "transaction_verb",
            Self::CurrencyMarker => "currency_marker",
            Self::AccountContext => "account_context",
        }
    }
}

/// Result of classifying one message body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassificationResult {
    pub is_financial: bool,
    /// Categories with at least one match, in evaluation order.
    pub matched: Vec<SignalCategory>,
}

impl ClassificationResult {
    pub fn match_count(&self) -> usize {
        self.matched.len()
    }
}

// ── Forward request ─────────────────────────────────────────────────

/// Wire payload posted to the webhook.
///
/// Serializes to exactly `{"smsText": ..., "sender": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardRequest {
    #[serde(rename = "smsText")]
    pub sms_text: String,
    pub sender: String,
}

impl ForwardRequest {
    /// Derive the payload from a captured message. The timestamp is dropped.
    pub fn from_message(message: &IncomingMessage) -> Self {
        Self {
            sms_text: message.body.clone(),
            sender: message.sender.clone(),
        }
    }
}

// ── Forward outcome ─────────────────────────────────────────────────

/// How a transport-level failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Other,
}

/// Why a forwarding attempt did not succeed at the HTTP level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HttpFailure {
    /// The endpoint answered with a status other than 200/201.
    Status { code: u16 },
    /// No usable response was obtained.
    Transport {
        kind: TransportErrorKind,
        reason: String,
    },
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { code } => write!(f, "HTTP status {code}"),
            Self::Transport { kind, reason } => write!(f, "{kind:?} error: {reason}"),
        }
    }
}

/// Terminal result of one forwarding attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ForwardOutcome {
    /// Endpoint accepted the payload (200 or 201).
    Success { status: u16 },
    /// No credential stored; the device has not been linked yet.
    AuthMissing,
    /// Non-success status or transport error. Not retried.
    HttpFailure(HttpFailure),
}

impl ForwardOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::AuthMissing => "auth_missing",
            Self::HttpFailure(_) => "http_failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

// ── Diagnostics ─────────────────────────────────────────────────────

/// How a forwarding task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStatus {
    /// The attempt ran to completion with this outcome.
    Completed(ForwardOutcome),
    /// The attempt panicked; the panic was contained.
    Aborted { reason: String },
}

/// Completion record broadcast by the dispatcher for every submitted message.
#[derive(Debug, Clone)]
pub struct ForwardReport {
    pub dispatch_id: Uuid,
    pub sender: String,
    pub received_at: DateTime<Utc>,
    pub status: ReportStatus,
    pub elapsed: Duration,
}

impl ForwardReport {
    /// The outcome, if the attempt completed.
    pub fn outcome(&self) -> Option<&ForwardOutcome> {
        match &self.status {
            ReportStatus::Completed(outcome) => Some(outcome),
            ReportStatus::Aborted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_request_has_exactly_two_keys() {
        let msg = IncomingMessage::new("BANK-XYZ", "Rs.500 debited from A/c");
        let request = ForwardRequest::from_message(&msg);
        let json = serde_json::to_value(&request).unwrap();

        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["smsText"], "Rs.500 debited from A/c");
        assert_eq!(obj["sender"], "BANK-XYZ");
    }

    #[test]
    fn forward_request_rejects_extra_keys() {
        let json = r#"{"smsText": "x", "sender": "y", "timestamp": 1}"#;
        assert!(serde_json::from_str::<ForwardRequest>(json).is_err());
    }

    #[test]
    fn timestamp_millis_is_applied() {
        let msg = IncomingMessage::new("AX-HDFC", "hi").with_timestamp_millis(1_700_000_000_123);
        assert_eq!(msg.received_at.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn out_of_range_timestamp_keeps_capture_time() {
        let msg = IncomingMessage::new("AX-HDFC", "hi");
        let captured = msg.received_at;
        let msg = msg.with_timestamp_millis(i64::MAX);
        assert_eq!(msg.received_at, captured);
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(ForwardOutcome::Success { status: 201 }.label(), "success");
        assert_eq!(ForwardOutcome::AuthMissing.label(), "auth_missing");
        let failure = ForwardOutcome::HttpFailure(HttpFailure::Status { code: 500 });
        assert_eq!(failure.label(), "http_failure");
        assert!(!failure.is_success());
    }

    #[test]
    fn http_failure_display() {
        assert_eq!(HttpFailure::Status { code: 404 }.to_string(), "HTTP status 404");
        let transport = HttpFailure::Transport {
            kind: TransportErrorKind::Timeout,
            reason: "deadline elapsed".into(),
        };
        assert_eq!(transport.to_string(), "Timeout error: deadline elapsed");
    }
}
