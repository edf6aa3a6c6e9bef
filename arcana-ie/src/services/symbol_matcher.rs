//! Candidate symbol extraction
//!
//! **[IE-SYM-020]** Matches dictionary trigger patterns against the raw
//! narrative and records every hit with its span and base significance.
//! This stage intentionally over-generates: recall is prioritized over
//! precision, which is restored by contextual validation downstream. No
//! narrative semantics are evaluated here.

use crate::models::{CandidateSymbol, MatchSpan, SymbolDictionary};

/// Candidate symbol matcher
///
/// Stateless; all pattern state lives in the compiled dictionary.
#[derive(Debug, Default)]
pub struct SymbolCandidateMatcher;

impl SymbolCandidateMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Extract candidate symbols from `text`
    ///
    /// Spans are byte offsets into the caller's original text. Entries
    /// without triggers for `locale` fall back to their "en" triggers.
    pub fn match_candidates(
        &self,
        text: &str,
        dictionary: &SymbolDictionary,
        locale: &str,
    ) -> Vec<CandidateSymbol> {
        let mut candidates = Vec::new();

        for symbol in dictionary.symbols() {
            for pattern in symbol.triggers_for(locale) {
                for hit in pattern.find_iter(text) {
                    candidates.push(CandidateSymbol {
                        symbol_id: symbol.entry.id.clone(),
                        archetype: symbol.entry.archetype.clone(),
                        span: MatchSpan {
                            start: hit.start(),
                            end: hit.end(),
                        },
                        matched_text: hit.as_str().to_string(),
                        base_significance: symbol.entry.base_significance,
                    });
                }
            }
        }

        tracing::debug!(
            locale,
            candidates = candidates.len(),
            "Candidate extraction complete"
        );

        candidates
    }
}
