//! Provider descriptors, attempt log entries, and the final result model

use super::symbols::ValidatedSymbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Static description of one provider in the cascade
///
/// Built once at startup from configuration. Availability is an explicit
/// field; the cascade never infers it from the presence or absence of
/// other settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Provider identifier recorded in the attempt log
    pub id: String,
    /// Relative cost tier; the cascade attempts ascending tiers
    pub cost_tier: u8,
    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum accepted interpretation length in characters
    pub max_output_chars: usize,
    /// Number of additional attempts after a transport failure
    pub retry_budget: u32,
    /// Whether the cascade may attempt this provider at all
    pub available: bool,
}

impl ProviderDescriptor {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Outcome of a single provider attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Provider returned structurally valid output
    Success,
    /// Provider responded but the output failed shape/field checks
    StructuralFailure { reason: String },
    /// The call could not complete (network error or timeout)
    TransportFailure { reason: String },
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success)
    }

    /// Failure reason, empty for successes
    pub fn reason(&self) -> &str {
        match self {
            AttemptOutcome::Success => "",
            AttemptOutcome::StructuralFailure { reason } => reason,
            AttemptOutcome::TransportFailure { reason } => reason,
        }
    }
}

/// Append-only log entry for one provider attempt
///
/// Entries are written once and never rewritten; nothing reads the log
/// until the request completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAttempt {
    pub provider_id: String,
    pub outcome: AttemptOutcome,
    pub latency_ms: u64,
    /// Truncated raw output, kept for diagnosing structural failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_ref: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

/// Final interpretation returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub request_id: Uuid,
    /// Interpretation text shown to the user
    pub interpretation: String,
    /// Calibrated confidence, clamped by quality assurance
    pub confidence: f32,
    /// Sources cited by the provider
    pub sources: Vec<String>,
    /// Provider that produced the interpretation, or "rule-based"
    pub model_used: String,
    /// Set when confidence fell below the configured review threshold
    pub requires_human_review: bool,
    /// Validated symbols the interpretation is grounded on
    pub symbols: Vec<ValidatedSymbol>,
    /// Full attempt log for this request
    pub attempts: Vec<ProviderAttempt>,
    /// Quality assurance annotations (e.g. hallucination warnings)
    #[serde(default)]
    pub warnings: Vec<String>,
}
