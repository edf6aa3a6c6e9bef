//! Quality assurance: confidence recalibration and hallucination screening
//!
//! **[IE-QA-010]** Recalibrates the winning result's confidence with
//! multiplicative factors applied in a fixed sequence, scans the
//! interpretation for overconfident phrasing, and flags low-confidence
//! results for human review. Never rejects a result outright; structural
//! validity was already established by the cascade.

use crate::models::{AnalysisResult, ContextHint};
use arcana_common::{Error, Result};
use regex::Regex;

/// The pipeline never reports confidence below this floor; a lower value
/// would make the result meaningless to display
pub const CONFIDENCE_FLOOR: f32 = 0.30;

/// The pipeline never claims near-certainty
pub const CONFIDENCE_CEILING: f32 = 0.98;

const SHORT_INTERPRETATION_CHARS: usize = 120;
const SHORT_TEXT_FACTOR: f32 = 0.85;
const NO_SYMBOLS_FACTOR: f32 = 0.80;
const UNCERTAINTY_FACTOR: f32 = 0.90;
const MULTI_SOURCE_FACTOR: f32 = 1.10;
const CONTEXT_REFLECTED_FACTOR: f32 = 1.08;
const HALLUCINATION_PENALTY: f32 = 0.15;

/// Hedging language that signals the provider was guessing
const UNCERTAINTY_PATTERNS: &[&str] = &[
    r"(?i)\b(might|maybe|possibly|perhaps)\b",
    r"(?i)\bhard to say\b",
    r"(?i)\bunclear\b",
    r"(?i)\bcould be\b",
];

/// Overconfident or unverifiable phrasing; a small denylist, not a
/// semantic fact checker
const HALLUCINATION_PATTERNS: &[&str] = &[
    r"(?i)\bguaranteed\b",
    r"(?i)\bdefinitely will\b",
    r"(?i)\b100% (certain|sure)\b",
    r"(?i)\bwithout (any )?doubt\b",
    r"(?i)\bit is certain\b",
    r"(?i)\bscience (proves|confirms)\b",
    r"(?i)\bwill certainly\b",
];

/// Quality assessor
pub struct QualityAssessor {
    review_threshold: f32,
    uncertainty_patterns: Vec<Regex>,
    hallucination_patterns: Vec<Regex>,
}

impl QualityAssessor {
    /// Create an assessor with the configured review threshold
    ///
    /// # Errors
    /// Returns an error if the built-in pattern tables fail to compile,
    /// which indicates a programming mistake rather than bad input.
    pub fn new(review_threshold: f32) -> Result<Self> {
        Ok(Self {
            review_threshold,
            uncertainty_patterns: compile_patterns(UNCERTAINTY_PATTERNS)?,
            hallucination_patterns: compile_patterns(HALLUCINATION_PATTERNS)?,
        })
    }

    /// Recalibrate a structurally valid result
    ///
    /// Factors are multiplicative and applied in sequence; the
    /// hallucination penalty is flat and applied after them. The final
    /// confidence is clamped to `[CONFIDENCE_FLOOR, CONFIDENCE_CEILING]`
    /// and the review flag set accordingly. The result is returned in
    /// every case.
    pub fn assess(
        &self,
        mut result: AnalysisResult,
        context_hint: Option<&ContextHint>,
    ) -> AnalysisResult {
        let initial = result.confidence;
        let mut confidence = result.confidence;
        let mut factors: Vec<&'static str> = Vec::new();

        if result.interpretation.chars().count() < SHORT_INTERPRETATION_CHARS {
            confidence *= SHORT_TEXT_FACTOR;
            factors.push("short_interpretation");
        }

        if result.symbols.is_empty() {
            confidence *= NO_SYMBOLS_FACTOR;
            factors.push("no_symbols");
        }

        if self
            .uncertainty_patterns
            .iter()
            .any(|p| p.is_match(&result.interpretation))
        {
            confidence *= UNCERTAINTY_FACTOR;
            factors.push("uncertainty_language");
        }

        if result.sources.len() >= 2 {
            confidence *= MULTI_SOURCE_FACTOR;
            factors.push("multiple_sources");
        }

        if let Some(hint) = context_hint {
            if reflects_hint(&result.interpretation, &hint.label) {
                confidence *= CONTEXT_REFLECTED_FACTOR;
                factors.push("context_reflected");
            }
        }

        if let Some(matched) = self.first_hallucination(&result.interpretation) {
            confidence -= HALLUCINATION_PENALTY;
            factors.push("hallucination_indicator");
            result.warnings.push(format!(
                "Overconfident phrasing detected: \"{}\"",
                matched
            ));
        }

        result.confidence = confidence.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING);
        result.requires_human_review = result.confidence < self.review_threshold;

        tracing::debug!(
            initial,
            recalibrated = result.confidence,
            factors = ?factors,
            requires_human_review = result.requires_human_review,
            "Quality recalibration complete"
        );

        result
    }

    fn first_hallucination(&self, text: &str) -> Option<String> {
        self.hallucination_patterns
            .iter()
            .find_map(|p| p.find(text))
            .map(|m| m.as_str().to_string())
    }
}

fn compile_patterns(sources: &[&str]) -> Result<Vec<Regex>> {
    sources
        .iter()
        .map(|source| {
            Regex::new(source)
                .map_err(|e| Error::Internal(format!("Invalid QA pattern '{}': {}", source, e)))
        })
        .collect()
}

/// Case-insensitive containment check for the auxiliary context label
fn reflects_hint(interpretation: &str, label: &str) -> bool {
    if label.trim().is_empty() {
        return false;
    }
    interpretation.to_lowercase().contains(&label.to_lowercase())
}
