//! Inbound analysis request model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Auxiliary context supplied by an upstream computation engine
/// (lunar phase, transit summary, prior similar cases).
///
/// Opaque to the pipeline: `label` is embedded verbatim in provider
/// prompts and fallback checks, `detail` is passed through untouched
/// and never inspected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextHint {
    /// Short human-readable summary (e.g. "Waxing Gibbous")
    pub label: String,
    /// Structured payload forwarded to providers as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl ContextHint {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: None,
        }
    }
}

/// One inbound interpretation request
///
/// Immutable once created; owned by the orchestrator for the lifetime of
/// a single `process` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Unique request identifier
    pub request_id: Uuid,
    /// Raw narrative text (a dream, or a computed chart/transit summary)
    pub text: String,
    /// Caller identity used for admission control
    pub client_id: String,
    /// Locale for trigger patterns and fallback templates (e.g. "en")
    pub locale: String,
    /// Optional auxiliary context from the computation layer
    pub context_hint: Option<ContextHint>,
    /// Submission timestamp; admission control evaluates the sliding
    /// window against this instant
    pub submitted_at: DateTime<Utc>,
}

impl AnalysisRequest {
    pub fn new(
        text: impl Into<String>,
        client_id: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            text: text.into(),
            client_id: client_id.into(),
            locale: locale.into(),
            context_hint: None,
            submitted_at: Utc::now(),
        }
    }

    pub fn with_context_hint(mut self, hint: ContextHint) -> Self {
        self.context_hint = Some(hint);
        self
    }
}
