//! Interpretation pipeline orchestrator
//!
//! **[IE-WF-010]** Sequences the pipeline for one request:
//! admission -> candidate extraction -> contextual validation ->
//! provider cascade (or rule-based fallback) -> quality assurance.
//!
//! Every path terminates in a result or a rate-limit denial. Unexpected
//! internal faults are caught at this boundary and converted into the
//! fallback path; `process` never raises to its caller.

use crate::config::EngineConfig;
use crate::models::{AnalysisRequest, AnalysisResult, SymbolDictionary};
use crate::services::{
    Admission, CascadeOutcome, ContextualValidator, FallbackInterpreter, ProviderCascade,
    ProviderRegistration, QualityAssessor, RateLimiter, SymbolCandidateMatcher,
};
use crate::types::InterpretationPrompt;
use arcana_common::events::{ArcanaEvent, EventBus};
use arcana_common::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Worst-case backoff spent inside one provider's retry loop, used for
/// the deadline ceiling estimate
const BACKOFF_ALLOWANCE_MS: u64 = 2_000;

/// Outcome of processing one request
#[derive(Debug)]
pub enum ProcessOutcome {
    /// A validated, confidence-scored interpretation
    Completed(AnalysisResult),
    /// Denied by admission control; retry at `reset_at`
    RateLimited { reset_at: DateTime<Utc> },
}

impl ProcessOutcome {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProcessOutcome::RateLimited { .. })
    }
}

/// Pipeline orchestrator service
pub struct InterpretationOrchestrator {
    rate_limiter: RateLimiter,
    matcher: SymbolCandidateMatcher,
    validator: ContextualValidator,
    cascade: Arc<ProviderCascade>,
    fallback: FallbackInterpreter,
    quality: QualityAssessor,
    dictionary: Arc<SymbolDictionary>,
    event_bus: EventBus,
    overall_deadline: Duration,
}

impl InterpretationOrchestrator {
    /// Assemble the pipeline from configuration and injected providers
    pub fn new(
        config: &EngineConfig,
        dictionary: Arc<SymbolDictionary>,
        providers: Vec<ProviderRegistration>,
        event_bus: EventBus,
    ) -> Result<Self> {
        let overall_deadline = deadline_ceiling(config.overall_deadline(), &providers);

        Ok(Self {
            rate_limiter: RateLimiter::new(
                config.rate_limit_per_client,
                config.rate_limit_window_seconds,
                config.rate_limit_global,
            ),
            matcher: SymbolCandidateMatcher::new(),
            validator: ContextualValidator::new(),
            cascade: Arc::new(ProviderCascade::new(providers)),
            fallback: FallbackInterpreter::new(),
            quality: QualityAssessor::new(config.confidence_review_threshold)?,
            dictionary,
            event_bus,
            overall_deadline,
        })
    }

    /// Assemble the pipeline from configuration alone, building HTTP
    /// providers for every configured descriptor
    pub fn from_config(
        config: &EngineConfig,
        dictionary: Arc<SymbolDictionary>,
        event_bus: EventBus,
    ) -> Result<Self> {
        let providers = crate::providers::build_registrations(config)?;
        Self::new(config, dictionary, providers, event_bus)
    }

    /// Process one request end to end
    ///
    /// Admission is evaluated against `request.submitted_at`; a denial
    /// returns immediately with no further side effects.
    pub async fn process(&self, request: AnalysisRequest) -> ProcessOutcome {
        let started = Instant::now();

        match self
            .rate_limiter
            .admit(&request.client_id, request.submitted_at)
            .await
        {
            Admission::Denied { reset_at } => {
                self.event_bus.emit_lossy(ArcanaEvent::AnalysisRateLimited {
                    client_id: request.client_id.clone(),
                    reset_at,
                    timestamp: Utc::now(),
                });
                return ProcessOutcome::RateLimited { reset_at };
            }
            Admission::Allowed { remaining } => {
                tracing::debug!(
                    request_id = %request.request_id,
                    client_id = %request.client_id,
                    remaining,
                    "Request admitted"
                );
            }
        }

        self.event_bus.emit_lossy(ArcanaEvent::AnalysisStarted {
            request_id: request.request_id,
            client_id: request.client_id.clone(),
            locale: request.locale.clone(),
            timestamp: Utc::now(),
        });

        let result = self.run_pipeline(&request).await;

        self.event_bus.emit_lossy(ArcanaEvent::AnalysisCompleted {
            request_id: request.request_id,
            model_used: result.model_used.clone(),
            confidence: result.confidence,
            requires_human_review: result.requires_human_review,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });

        ProcessOutcome::Completed(result)
    }

    async fn run_pipeline(&self, request: &AnalysisRequest) -> AnalysisResult {
        let candidates =
            self.matcher
                .match_candidates(&request.text, &self.dictionary, &request.locale);
        let validated = self
            .validator
            .validate(candidates, &request.text, &self.dictionary);

        let prompt = InterpretationPrompt::assemble(request, &validated);
        let cancel = CancellationToken::new();

        // The cascade runs in its own task so that a fault inside a
        // provider implementation surfaces here as a join error instead
        // of unwinding through the orchestrator.
        let cascade = Arc::clone(&self.cascade);
        let task_cancel = cancel.child_token();
        let deadline = self.overall_deadline;
        let outcome = match tokio::spawn(async move {
            cascade.interpret(&prompt, deadline, &task_cancel).await
        })
        .await
        {
            Ok(outcome) => outcome,
            Err(join_error) => {
                tracing::error!(
                    request_id = %request.request_id,
                    error = %join_error,
                    "Cascade task failed unexpectedly, engaging fallback"
                );
                CascadeOutcome::AllFailed {
                    attempts: Vec::new(),
                }
            }
        };

        let result = match outcome {
            CascadeOutcome::Success {
                provider_id,
                output,
                attempts,
            } => {
                self.emit_failed_attempts(request, &attempts);
                AnalysisResult {
                    request_id: request.request_id,
                    interpretation: output.interpretation,
                    confidence: output.confidence,
                    sources: output.sources,
                    model_used: provider_id,
                    requires_human_review: false,
                    symbols: validated,
                    attempts,
                    warnings: Vec::new(),
                }
            }
            CascadeOutcome::AllFailed { attempts } => {
                self.emit_failed_attempts(request, &attempts);
                self.event_bus.emit_lossy(ArcanaEvent::FallbackEngaged {
                    request_id: request.request_id,
                    timestamp: Utc::now(),
                });
                let mut result = self.fallback.interpret(request, &validated);
                result.attempts = attempts;
                result
            }
        };

        self.quality.assess(result, request.context_hint.as_ref())
    }

    fn emit_failed_attempts(
        &self,
        request: &AnalysisRequest,
        attempts: &[crate::models::ProviderAttempt],
    ) {
        for attempt in attempts.iter().filter(|a| !a.outcome.is_success()) {
            self.event_bus
                .emit_lossy(ArcanaEvent::ProviderAttemptFailed {
                    request_id: request.request_id,
                    provider_id: attempt.provider_id.clone(),
                    reason: attempt.outcome.reason().to_string(),
                    timestamp: Utc::now(),
                });
        }
    }

    /// Run the idle-eviction sweep on the admission table
    pub async fn sweep_rate_limiter(&self, now: DateTime<Utc>) -> usize {
        self.rate_limiter.sweep_idle(now).await
    }

    /// Effective overall deadline applied to each request's cascade
    pub fn overall_deadline(&self) -> Duration {
        self.overall_deadline
    }
}

/// Bound the request deadline by what the configured providers could
/// ever usefully spend: per-provider timeout times attempts, plus the
/// retry backoff allowance, summed over available providers
fn deadline_ceiling(configured: Duration, providers: &[ProviderRegistration]) -> Duration {
    let worst_case_ms: u64 = providers
        .iter()
        .filter(|r| r.descriptor.available)
        .map(|r| {
            let attempts = u64::from(r.descriptor.retry_budget) + 1;
            r.descriptor.timeout_ms * attempts
                + u64::from(r.descriptor.retry_budget) * BACKOFF_ALLOWANCE_MS
        })
        .sum();

    configured.min(Duration::from_millis(worst_case_ms))
}
