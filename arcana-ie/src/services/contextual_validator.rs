//! Contextual symbol validation
//!
//! **[IE-CTX-010]** Restores precision over the matcher's deliberately
//! noisy candidates. For each candidate the rules of its dictionary
//! entry are evaluated against a window of text around the match span:
//! exclusion rules first and terminal, then reinforcement rules, each
//! adding its fixed confidence delta. Candidates without applicable
//! rules pass through with their base significance unchanged.
//!
//! The stage is pure and order-independent across candidates; evaluating
//! one candidate never depends on another's outcome.

use crate::models::{
    CandidateSymbol, CompiledRule, MatchSpan, SymbolDictionary, ValidatedSymbol,
    ValidationDecision, ValidationOutcome,
};
use std::cmp::Ordering;
use std::collections::HashMap;

const DEFAULT_CONTEXT_WINDOW_BYTES: usize = 80;

/// Contextual validator
pub struct ContextualValidator {
    /// Radius in bytes of the context window around a match span,
    /// clamped to character boundaries
    context_window_bytes: usize,
}

impl ContextualValidator {
    pub fn new() -> Self {
        Self {
            context_window_bytes: DEFAULT_CONTEXT_WINDOW_BYTES,
        }
    }

    pub fn with_context_window(context_window_bytes: usize) -> Self {
        Self {
            context_window_bytes,
        }
    }

    /// Validate candidates, returning the deduplicated, confidence-sorted
    /// symbol set
    pub fn validate(
        &self,
        candidates: Vec<CandidateSymbol>,
        text: &str,
        dictionary: &SymbolDictionary,
    ) -> Vec<ValidatedSymbol> {
        self.validate_with_decisions(candidates, text, dictionary).0
    }

    /// Validate candidates, also returning the per-candidate decision
    /// trail for observability
    pub fn validate_with_decisions(
        &self,
        candidates: Vec<CandidateSymbol>,
        text: &str,
        dictionary: &SymbolDictionary,
    ) -> (Vec<ValidatedSymbol>, Vec<ValidationDecision>) {
        let mut decisions = Vec::with_capacity(candidates.len());
        let mut survivors: Vec<ValidatedSymbol> = Vec::new();

        for candidate in candidates {
            let context = context_window(text, candidate.span, self.context_window_bytes);
            let rules = dictionary
                .get(&candidate.symbol_id)
                .map(|symbol| symbol.rules.as_slice())
                .unwrap_or(&[]);

            let decision = evaluate_rules(&candidate, rules, context);

            if decision.outcome == ValidationOutcome::Exclude {
                tracing::debug!(
                    symbol = %candidate.symbol_id,
                    rule = decision.rule.as_deref().unwrap_or(""),
                    "Candidate excluded by context"
                );
                decisions.push(decision);
                continue;
            }

            let confidence =
                (candidate.base_significance + decision.confidence_delta).clamp(0.0, 1.0);
            survivors.push(ValidatedSymbol {
                symbol_id: candidate.symbol_id,
                archetype: candidate.archetype,
                span: candidate.span,
                matched_text: candidate.matched_text,
                confidence,
            });
            decisions.push(decision);
        }

        let validated = dedupe_and_sort(survivors);
        tracing::debug!(validated = validated.len(), "Contextual validation complete");
        (validated, decisions)
    }
}

impl Default for ContextualValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate one candidate's rule set against its context window
///
/// Exclusions are evaluated before reinforcements and are terminal: one
/// matching exclusion drops the candidate regardless of any
/// reinforcement match.
fn evaluate_rules(
    candidate: &CandidateSymbol,
    rules: &[CompiledRule],
    context: &str,
) -> ValidationDecision {
    for rule in rules {
        if let CompiledRule::Exclude { pattern } = rule {
            if pattern.is_match(context) {
                return ValidationDecision {
                    symbol_id: candidate.symbol_id.clone(),
                    outcome: ValidationOutcome::Exclude,
                    rule: Some(pattern.as_str().to_string()),
                    confidence_delta: 0.0,
                };
            }
        }
    }

    let mut delta_total = 0.0_f32;
    let mut fired: Option<String> = None;
    for rule in rules {
        if let CompiledRule::Reinforce { pattern, delta } = rule {
            if pattern.is_match(context) {
                delta_total += delta;
                if fired.is_none() {
                    fired = Some(pattern.as_str().to_string());
                }
            }
        }
    }

    if delta_total > 0.0 {
        ValidationDecision {
            symbol_id: candidate.symbol_id.clone(),
            outcome: ValidationOutcome::Reinforce,
            rule: fired,
            confidence_delta: delta_total,
        }
    } else {
        ValidationDecision {
            symbol_id: candidate.symbol_id.clone(),
            outcome: ValidationOutcome::Include,
            rule: None,
            confidence_delta: 0.0,
        }
    }
}

/// Deduplicate by symbol identifier keeping the highest-confidence
/// occurrence, then sort by descending confidence with a symbol-id
/// tiebreak for deterministic output
fn dedupe_and_sort(symbols: Vec<ValidatedSymbol>) -> Vec<ValidatedSymbol> {
    let mut best: HashMap<String, ValidatedSymbol> = HashMap::new();
    for symbol in symbols {
        match best.get(&symbol.symbol_id) {
            Some(existing) if existing.confidence >= symbol.confidence => {}
            _ => {
                best.insert(symbol.symbol_id.clone(), symbol);
            }
        }
    }

    let mut out: Vec<ValidatedSymbol> = best.into_values().collect();
    out.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol_id.cmp(&b.symbol_id))
    });
    out
}

/// Slice of `text` around `span`, clamped to char boundaries
fn context_window(text: &str, span: MatchSpan, radius: usize) -> &str {
    let mut start = span.start.saturating_sub(radius);
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }

    let mut end = span.end.saturating_add(radius).min(text.len());
    while end < text.len() && !text.is_char_boundary(end) {
        end += 1;
    }

    &text[start..end]
}
