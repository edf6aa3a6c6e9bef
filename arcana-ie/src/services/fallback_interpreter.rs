//! Deterministic rule-based fallback interpreter
//!
//! **[IE-FB-010]** Invoked only when every cascade attempt failed. Free
//! of providers and network dependencies: derives a coarse mood from
//! keyword polarity counts, selects the highest-confidence validated
//! symbol, and composes a templated interpretation. Always returns a
//! result; this is the pipeline's liveness guarantee.

use crate::models::{AnalysisRequest, AnalysisResult, ValidatedSymbol};

/// Model identifier recorded when the fallback produced the result
pub const RULE_BASED_MODEL_ID: &str = "rule-based";

/// Fixed confidence for fallback results
///
/// Deliberately below the range where quality assurance trusts a result
/// without review, so fallback output is always flagged.
pub const RULE_BASED_CONFIDENCE: f32 = 0.40;

/// Marker used when no validated symbol survived
pub const UNIDENTIFIED_SYMBOL: &str = "unidentified";

/// Coarse narrative mood from keyword polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Uplifting,
    Troubled,
    Neutral,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Uplifting => "uplifting",
            Mood::Troubled => "troubled",
            Mood::Neutral => "neutral",
        }
    }
}

const POSITIVE_EN: &[&str] = &[
    "happy", "joy", "light", "calm", "peace", "love", "warm", "safe", "bright", "laugh", "free",
];
const NEGATIVE_EN: &[&str] = &[
    "fear", "afraid", "chase", "chased", "dark", "fall", "falling", "lost", "death", "cry",
    "angry", "trapped", "alone", "anxious", "scream",
];

/// Rule-based fallback interpreter
#[derive(Debug, Default)]
pub struct FallbackInterpreter;

impl FallbackInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Compose a deterministic interpretation. Never fails.
    pub fn interpret(
        &self,
        request: &AnalysisRequest,
        symbols: &[ValidatedSymbol],
    ) -> AnalysisResult {
        let mood = classify_mood(&request.text, &request.locale);

        // Validated symbols arrive sorted by descending confidence; the
        // first entry is the strongest signal.
        let top_symbol = symbols.first();
        let symbol_name = top_symbol
            .map(|s| s.symbol_id.as_str())
            .unwrap_or(UNIDENTIFIED_SYMBOL);

        let interpretation = render_template(&request.locale, mood, top_symbol.is_some())
            .replace("{symbol}", symbol_name);

        tracing::debug!(
            request_id = %request.request_id,
            mood = mood.as_str(),
            symbol = symbol_name,
            "Rule-based fallback interpretation composed"
        );

        AnalysisResult {
            request_id: request.request_id,
            interpretation,
            confidence: RULE_BASED_CONFIDENCE,
            sources: Vec::new(),
            model_used: RULE_BASED_MODEL_ID.to_string(),
            requires_human_review: false,
            symbols: symbols.to_vec(),
            attempts: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Count positive against negative polarity keywords
fn classify_mood(text: &str, locale: &str) -> Mood {
    let (positive, negative) = polarity_keywords(locale);
    let lowered = text.to_lowercase();

    let mut positive_hits = 0usize;
    let mut negative_hits = 0usize;
    for token in lowered.split(|c: char| !c.is_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        if positive.contains(&token) {
            positive_hits += 1;
        }
        if negative.contains(&token) {
            negative_hits += 1;
        }
    }

    if positive_hits > negative_hits {
        Mood::Uplifting
    } else if negative_hits > positive_hits {
        Mood::Troubled
    } else {
        Mood::Neutral
    }
}

fn polarity_keywords(_locale: &str) -> (&'static [&'static str], &'static [&'static str]) {
    // Only English lists ship today; other locales fall back to them the
    // same way trigger matching falls back to FALLBACK_LOCALE.
    (POSITIVE_EN, NEGATIVE_EN)
}

fn render_template(_locale: &str, mood: Mood, has_symbol: bool) -> &'static str {
    match (mood, has_symbol) {
        (Mood::Uplifting, true) => {
            "The symbol of {symbol} stands out in this narrative. Together with its \
             uplifting tone, it suggests a period of renewal and forward motion; small \
             encouragements in waking life deserve attention now."
        }
        (Mood::Troubled, true) => {
            "The symbol of {symbol} dominates this narrative. Read against its troubled \
             undertone, it points to an unresolved tension that is asking to be named \
             before it can settle."
        }
        (Mood::Neutral, true) => {
            "The symbol of {symbol} is the clearest thread in this narrative. Its meaning \
             here is understated, inviting quiet reflection rather than decisive action."
        }
        (Mood::Uplifting, false) => {
            "No single symbol could be identified, yet the narrative carries an uplifting \
             tone. Treat it as a general sign of ease; the details matter less than the \
             feeling it leaves behind."
        }
        (Mood::Troubled, false) => {
            "No single symbol could be identified, but the narrative's troubled tone is \
             itself the message. Consider what in waking life has been left unaddressed."
        }
        (Mood::Neutral, false) => {
            "No single symbol could be identified in this narrative. Such dreams often \
             reflect a mind sorting through the ordinary; note any detail that lingers."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchSpan;

    fn symbol(id: &str, confidence: f32) -> ValidatedSymbol {
        ValidatedSymbol {
            symbol_id: id.to_string(),
            archetype: "test".to_string(),
            span: MatchSpan { start: 0, end: 1 },
            matched_text: id.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_always_produces_result() {
        let request = AnalysisRequest::new("", "client-1", "en");
        let result = FallbackInterpreter::new().interpret(&request, &[]);
        assert!(!result.interpretation.is_empty());
        assert_eq!(result.model_used, RULE_BASED_MODEL_ID);
        assert_eq!(result.confidence, RULE_BASED_CONFIDENCE);
    }

    #[test]
    fn test_top_symbol_named_in_interpretation() {
        let request = AnalysisRequest::new("a quiet scene", "client-1", "en");
        let symbols = vec![symbol("river", 0.8), symbol("stone", 0.5)];
        let result = FallbackInterpreter::new().interpret(&request, &symbols);
        assert!(result.interpretation.contains("river"));
        assert!(!result.interpretation.contains("stone"));
    }

    #[test]
    fn test_unidentified_marker_when_no_symbols() {
        let request = AnalysisRequest::new("a quiet scene", "client-1", "en");
        let result = FallbackInterpreter::new().interpret(&request, &[]);
        assert!(result.interpretation.contains("No single symbol"));
        assert!(result.symbols.is_empty());
    }

    #[test]
    fn test_mood_classification_polarity() {
        assert_eq!(
            classify_mood("a happy bright warm morning", "en"),
            Mood::Uplifting
        );
        assert_eq!(
            classify_mood("dark fear chased me while falling", "en"),
            Mood::Troubled
        );
        assert_eq!(classify_mood("a corridor of doors", "en"), Mood::Neutral);
    }

    #[test]
    fn test_mixed_polarity_resolves_by_count() {
        // One positive ("calm") against two negatives
        assert_eq!(classify_mood("calm before the dark fall", "en"), Mood::Troubled);
    }

    #[test]
    fn test_deterministic_for_identical_input() {
        let request = AnalysisRequest::new("dark water everywhere", "client-1", "en");
        let symbols = vec![symbol("water", 0.7)];
        let interpreter = FallbackInterpreter::new();

        let first = interpreter.interpret(&request, &symbols);
        let second = interpreter.interpret(&request, &symbols);
        assert_eq!(first.interpretation, second.interpretation);
        assert_eq!(first.confidence, second.confidence);
    }

    #[test]
    fn test_unknown_locale_uses_english_templates() {
        let request = AnalysisRequest::new("miedo y oscuridad", "client-1", "es");
        let result = FallbackInterpreter::new().interpret(&request, &[]);
        assert!(result.interpretation.contains("No single symbol"));
    }
}
