//! Cascading multi-provider interpretation
//!
//! **[IE-CASC-010]** Attempts an ordered list of interpretation providers,
//! cheapest cost tier first, and short-circuits on the first structurally
//! valid success. Transport failures and timeouts are retried per
//! provider with exponential backoff; structural failures advance to the
//! next provider immediately. Calls are issued sequentially, never in
//! parallel: speculative calls would multiply cost without changing the
//! single-success-stops-cascade semantics.
//!
//! State progression per request:
//! NOT_STARTED -> ATTEMPTING(i) -> {SUCCEEDED, ATTEMPTING(i+1)} -> ALL_FAILED

use crate::models::{AttemptOutcome, ProviderAttempt, ProviderDescriptor};
use crate::types::{InterpretationPrompt, InterpretationProvider, ProviderOutput};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const BACKOFF_BASE_MS: u64 = 100;
const BACKOFF_CAP_MS: u64 = 2_000;
/// Raw output is truncated to this length in the attempt log
const OUTPUT_REF_MAX_CHARS: usize = 160;

/// Cascade progress for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CascadeState {
    NotStarted,
    Attempting(usize),
    Succeeded(usize),
    AllFailed,
}

fn transition(state: &mut CascadeState, next: CascadeState) {
    tracing::trace!(from = ?state, to = ?next, "Cascade state transition");
    *state = next;
}

/// One provider registered with the cascade: static descriptor plus the
/// client that executes calls
pub struct ProviderRegistration {
    pub descriptor: ProviderDescriptor,
    pub provider: Arc<dyn InterpretationProvider>,
}

/// Result of running the cascade for one request
pub enum CascadeOutcome {
    /// A provider produced structurally valid output
    Success {
        provider_id: String,
        output: ProviderOutput,
        attempts: Vec<ProviderAttempt>,
    },
    /// Every provider failed, or the overall deadline elapsed
    AllFailed { attempts: Vec<ProviderAttempt> },
}

/// Cascading provider chain
pub struct ProviderCascade {
    providers: Vec<ProviderRegistration>,
}

impl ProviderCascade {
    /// Build a cascade; order is fixed here, ascending cost tier
    pub fn new(mut providers: Vec<ProviderRegistration>) -> Self {
        providers.sort_by_key(|r| r.descriptor.cost_tier);
        Self { providers }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.providers.iter().map(|r| &r.descriptor)
    }

    /// Attempt providers in order until one structurally valid success
    ///
    /// `deadline` bounds the whole cascade; a breach mid-cascade abandons
    /// the remaining providers and yields `AllFailed`, which the caller
    /// treats as the fallback path, not as an error. The cancellation
    /// token allows the owner to abandon the cascade early under the same
    /// semantics.
    pub async fn interpret(
        &self,
        prompt: &InterpretationPrompt,
        deadline: Duration,
        cancel: &CancellationToken,
    ) -> CascadeOutcome {
        let started = Instant::now();
        let mut attempts: Vec<ProviderAttempt> = Vec::new();
        let mut state = CascadeState::NotStarted;

        for (index, registration) in self.providers.iter().enumerate() {
            let descriptor = &registration.descriptor;

            if !descriptor.available {
                tracing::debug!(provider = %descriptor.id, "Provider unavailable, skipping");
                continue;
            }

            transition(&mut state, CascadeState::Attempting(index));

            let mut retries_left = descriptor.retry_budget;
            let mut backoff_ms = BACKOFF_BASE_MS;

            'attempts: loop {
                let remaining = deadline.saturating_sub(started.elapsed());
                if cancel.is_cancelled() || remaining.is_zero() {
                    tracing::warn!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        attempts = attempts.len(),
                        "Cascade deadline exceeded, abandoning remaining providers"
                    );
                    transition(&mut state, CascadeState::AllFailed);
                    return CascadeOutcome::AllFailed { attempts };
                }

                let per_call = descriptor.timeout().min(remaining);
                let attempt_started = Instant::now();

                let call_result = tokio::select! {
                    _ = cancel.cancelled() => {
                        transition(&mut state, CascadeState::AllFailed);
                        return CascadeOutcome::AllFailed { attempts };
                    }
                    result = tokio::time::timeout(
                        per_call,
                        registration.provider.interpret(prompt),
                    ) => result,
                };

                let latency_ms = attempt_started.elapsed().as_millis() as u64;

                let transport_reason = match call_result {
                    Ok(Ok(output)) => {
                        match validate_structure(&output, descriptor) {
                            Ok(()) => {
                                attempts.push(ProviderAttempt {
                                    provider_id: descriptor.id.clone(),
                                    outcome: AttemptOutcome::Success,
                                    latency_ms,
                                    output_ref: Some(truncate(&output.interpretation)),
                                    attempted_at: Utc::now(),
                                });
                                transition(&mut state, CascadeState::Succeeded(index));
                                tracing::info!(
                                    provider = %descriptor.id,
                                    latency_ms,
                                    "Provider attempt succeeded"
                                );
                                return CascadeOutcome::Success {
                                    provider_id: descriptor.id.clone(),
                                    output,
                                    attempts,
                                };
                            }
                            Err(reason) => {
                                // The provider answered; the same input
                                // would yield the same shape, so advance
                                // without spending retries.
                                tracing::warn!(
                                    provider = %descriptor.id,
                                    reason = %reason,
                                    "Provider output failed structural validation"
                                );
                                attempts.push(ProviderAttempt {
                                    provider_id: descriptor.id.clone(),
                                    outcome: AttemptOutcome::StructuralFailure { reason },
                                    latency_ms,
                                    output_ref: Some(truncate(&output.interpretation)),
                                    attempted_at: Utc::now(),
                                });
                                break 'attempts;
                            }
                        }
                    }
                    Ok(Err(err)) => err.to_string(),
                    Err(_) => format!("timeout after {} ms", per_call.as_millis()),
                };

                // Transport tier failure: log, record, retry with backoff
                // while budget and deadline allow
                attempts.push(ProviderAttempt {
                    provider_id: descriptor.id.clone(),
                    outcome: AttemptOutcome::TransportFailure {
                        reason: transport_reason.clone(),
                    },
                    latency_ms,
                    output_ref: None,
                    attempted_at: Utc::now(),
                });

                if retries_left == 0 {
                    tracing::warn!(
                        provider = %descriptor.id,
                        reason = %transport_reason,
                        "Provider retry budget exhausted, advancing"
                    );
                    break 'attempts;
                }
                retries_left -= 1;

                tracing::debug!(
                    provider = %descriptor.id,
                    reason = %transport_reason,
                    retries_left,
                    backoff_ms,
                    "Provider transport failure, will retry after backoff"
                );

                let pause = Duration::from_millis(backoff_ms)
                    .min(deadline.saturating_sub(started.elapsed()));
                tokio::time::sleep(pause).await;
                backoff_ms = (backoff_ms * 2).min(BACKOFF_CAP_MS);
            }
        }

        transition(&mut state, CascadeState::AllFailed);
        tracing::warn!(attempts = attempts.len(), "All providers exhausted");
        CascadeOutcome::AllFailed { attempts }
    }
}

/// Structural validation of provider output
///
/// Checks shape and plausibility only; semantic quality is the quality
/// assurance stage's concern.
fn validate_structure(output: &ProviderOutput, descriptor: &ProviderDescriptor) -> Result<(), String> {
    if output.interpretation.trim().is_empty() {
        return Err("empty interpretation text".to_string());
    }
    if !(0.0..=1.0).contains(&output.confidence) {
        return Err(format!("confidence {} out of bounds", output.confidence));
    }
    let chars = output.interpretation.chars().count();
    if chars > descriptor.max_output_chars {
        return Err(format!(
            "interpretation length {} exceeds limit {}",
            chars, descriptor.max_output_chars
        ));
    }
    Ok(())
}

fn truncate(text: &str) -> String {
    text.chars().take(OUTPUT_REF_MAX_CHARS).collect()
}
