//! Core trait and wire types for interpretation providers
//!
//! The cascade iterates an ordered list of a single polymorphic provider
//! interface; vendor-specific behavior lives entirely inside provider
//! implementations, never in the cascade.

use crate::models::{AnalysisRequest, ContextHint, ValidatedSymbol};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Assembled input for one provider call
///
/// The context hint is embedded as supplied by the computation layer;
/// the pipeline never inspects its internal structure.
#[derive(Debug, Clone, Serialize)]
pub struct InterpretationPrompt {
    pub narrative: String,
    pub locale: String,
    pub symbols: Vec<ValidatedSymbol>,
    pub context_hint: Option<ContextHint>,
}

impl InterpretationPrompt {
    /// Assemble the prompt for a request and its validated symbol set
    pub fn assemble(request: &AnalysisRequest, symbols: &[ValidatedSymbol]) -> Self {
        Self {
            narrative: request.text.clone(),
            locale: request.locale.clone(),
            symbols: symbols.to_vec(),
            context_hint: request.context_hint.clone(),
        }
    }
}

/// Raw structured output returned by a provider, before structural
/// validation and quality assurance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOutput {
    pub interpretation: String,
    /// Provider-reported confidence (0.0-1.0); recalibrated downstream
    pub confidence: f32,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Provider call errors (transport tier)
///
/// All variants are retryable from the cascade's perspective; structural
/// problems with an otherwise delivered response are judged by the
/// cascade itself, not here.
#[derive(Debug, Error)]
pub enum ProviderCallError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// An external, independently failing text-generation service
///
/// Implementations must be safe to call concurrently; the cascade issues
/// calls sequentially per request but many requests run at once.
#[async_trait::async_trait]
pub trait InterpretationProvider: Send + Sync {
    /// Provider identifier; matches the descriptor id in the attempt log
    fn id(&self) -> &str;

    /// Produce an interpretation for the assembled prompt
    ///
    /// # Errors
    /// Returns `ProviderCallError` when the call cannot complete or the
    /// response cannot be decoded.
    async fn interpret(
        &self,
        prompt: &InterpretationPrompt,
    ) -> Result<ProviderOutput, ProviderCallError>;
}
