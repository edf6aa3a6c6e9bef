//! Symbol dictionary and candidate/validated symbol models
//!
//! **[IE-SYM-010]** The knowledge base is a read-only mapping from symbol
//! identifier to trigger patterns, base significance, archetype, and
//! contextual rules. The pipeline consumes it as a lookup and never
//! writes to it. Trigger and rule patterns are compiled once at load.

use arcana_common::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Locale used when an entry carries no triggers for the requested one
pub const FALLBACK_LOCALE: &str = "en";

/// Contextual rule attached to a dictionary entry
///
/// Declarative rule data; the evaluator in
/// `services::contextual_validator` is uniform across symbols.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContextRule {
    /// Disqualifies the candidate when the pattern matches the text
    /// surrounding the trigger span
    Exclude { pattern: String },
    /// Raises candidate confidence by `delta` when the pattern matches
    /// the surrounding text
    Reinforce { pattern: String, delta: f32 },
}

/// Raw dictionary entry as stored in the knowledge base TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEntry {
    /// Symbol identifier (e.g. "dwelling")
    pub id: String,
    /// Archetype tag from the knowledge base
    pub archetype: String,
    /// Base significance score (0.0-1.0)
    pub base_significance: f32,
    /// Locale code to trigger word/phrase list
    #[serde(default)]
    pub triggers: HashMap<String, Vec<String>>,
    /// Contextual inclusion/exclusion rules
    #[serde(default)]
    pub rules: Vec<ContextRule>,
}

/// Top-level shape of a dictionary TOML document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DictionaryFile {
    #[serde(default)]
    symbols: Vec<SymbolEntry>,
}

/// Contextual rule with its pattern compiled
#[derive(Debug, Clone)]
pub enum CompiledRule {
    Exclude { pattern: Regex },
    Reinforce { pattern: Regex, delta: f32 },
}

impl CompiledRule {
    /// Source pattern string, for decision records and tracing
    pub fn pattern_str(&self) -> &str {
        match self {
            CompiledRule::Exclude { pattern } => pattern.as_str(),
            CompiledRule::Reinforce { pattern, .. } => pattern.as_str(),
        }
    }
}

/// Dictionary entry with trigger and rule patterns compiled at load
#[derive(Debug, Clone)]
pub struct CompiledSymbol {
    pub entry: SymbolEntry,
    /// Locale code to compiled word-bounded trigger patterns
    triggers: HashMap<String, Vec<Regex>>,
    pub rules: Vec<CompiledRule>,
}

impl CompiledSymbol {
    fn compile(entry: SymbolEntry) -> Result<Self> {
        let mut triggers: HashMap<String, Vec<Regex>> = HashMap::new();
        for (locale, words) in &entry.triggers {
            let mut patterns = Vec::with_capacity(words.len());
            for word in words {
                // Case-insensitive whole-word match so "window" does not
                // fire inside "windowsill"
                let source = format!(r"(?i)\b{}\b", regex::escape(word));
                let pattern = Regex::new(&source).map_err(|e| {
                    Error::Config(format!(
                        "Symbol '{}': invalid trigger '{}': {}",
                        entry.id, word, e
                    ))
                })?;
                patterns.push(pattern);
            }
            triggers.insert(locale.clone(), patterns);
        }

        let mut rules = Vec::with_capacity(entry.rules.len());
        for rule in &entry.rules {
            let compiled = match rule {
                ContextRule::Exclude { pattern } => CompiledRule::Exclude {
                    pattern: compile_rule_pattern(&entry.id, pattern)?,
                },
                ContextRule::Reinforce { pattern, delta } => CompiledRule::Reinforce {
                    pattern: compile_rule_pattern(&entry.id, pattern)?,
                    delta: *delta,
                },
            };
            rules.push(compiled);
        }

        Ok(Self {
            entry,
            triggers,
            rules,
        })
    }

    /// Trigger patterns for a locale, falling back to [`FALLBACK_LOCALE`]
    ///
    /// The fallback is a known precision gap for morphologically rich
    /// locales; downstream provider validation covers it.
    pub fn triggers_for(&self, locale: &str) -> &[Regex] {
        self.triggers
            .get(locale)
            .or_else(|| self.triggers.get(FALLBACK_LOCALE))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn compile_rule_pattern(symbol_id: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        Error::Config(format!(
            "Symbol '{}': invalid rule pattern '{}': {}",
            symbol_id, pattern, e
        ))
    })
}

/// Read-only symbol knowledge base
#[derive(Debug, Clone, Default)]
pub struct SymbolDictionary {
    symbols: Vec<CompiledSymbol>,
}

impl SymbolDictionary {
    /// Build a dictionary from raw entries, compiling all patterns
    ///
    /// # Errors
    /// Returns `Error::Config` on an invalid trigger or rule pattern,
    /// or on duplicate symbol identifiers.
    pub fn from_entries(entries: Vec<SymbolEntry>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.clone()) {
                return Err(Error::Config(format!(
                    "Duplicate symbol id '{}' in dictionary",
                    entry.id
                )));
            }
            if !(0.0..=1.0).contains(&entry.base_significance) {
                return Err(Error::Config(format!(
                    "Symbol '{}': base significance {} out of range",
                    entry.id, entry.base_significance
                )));
            }
        }

        let symbols = entries
            .into_iter()
            .map(CompiledSymbol::compile)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { symbols })
    }

    /// Parse a dictionary from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: DictionaryFile = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse symbol dictionary failed: {}", e)))?;
        Self::from_entries(file.symbols)
    }

    /// Load a dictionary from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read dictionary {} failed: {}", path.display(), e))
        })?;
        let dictionary = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            symbols = dictionary.len(),
            "Symbol dictionary loaded"
        );
        Ok(dictionary)
    }

    pub fn symbols(&self) -> &[CompiledSymbol] {
        &self.symbols
    }

    /// Look up a compiled entry by symbol identifier
    pub fn get(&self, symbol_id: &str) -> Option<&CompiledSymbol> {
        self.symbols.iter().find(|s| s.entry.id == symbol_id)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Byte span of a trigger hit within the narrative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

/// A trigger hit not yet confirmed by context
///
/// The matcher over-generates; candidates include false positives by
/// design, and precision is restored by contextual validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSymbol {
    pub symbol_id: String,
    pub archetype: String,
    pub span: MatchSpan,
    pub matched_text: String,
    pub base_significance: f32,
}

/// Outcome of evaluating one candidate's contextual rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationOutcome {
    Include,
    Exclude,
    Reinforce,
}

/// Per-candidate audit record from contextual validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationDecision {
    pub symbol_id: String,
    pub outcome: ValidationOutcome,
    /// Pattern of the rule that fired, if any
    pub rule: Option<String>,
    pub confidence_delta: f32,
}

/// A candidate confirmed by contextual validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedSymbol {
    pub symbol_id: String,
    pub archetype: String,
    pub span: MatchSpan,
    pub matched_text: String,
    /// Base significance adjusted by rule deltas, clamped to [0.0, 1.0]
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DICTIONARY: &str = r#"
        [[symbols]]
        id = "dwelling"
        archetype = "shelter"
        base_significance = 0.55

        [symbols.triggers]
        en = ["house", "window"]

        [[symbols.rules]]
        kind = "exclude"
        pattern = "(?i)\\b(car|vehicle)\\b"

        [[symbols.rules]]
        kind = "reinforce"
        pattern = "(?i)\\bhome\\b"
        delta = 0.15
    "#;

    #[test]
    fn test_dictionary_parses_and_compiles() {
        let dictionary = SymbolDictionary::from_toml_str(SAMPLE_DICTIONARY).unwrap();
        assert_eq!(dictionary.len(), 1);

        let symbol = dictionary.get("dwelling").unwrap();
        assert_eq!(symbol.entry.archetype, "shelter");
        assert_eq!(symbol.rules.len(), 2);
        assert_eq!(symbol.triggers_for("en").len(), 2);
    }

    #[test]
    fn test_unknown_locale_falls_back_to_en() {
        let dictionary = SymbolDictionary::from_toml_str(SAMPLE_DICTIONARY).unwrap();
        let symbol = dictionary.get("dwelling").unwrap();
        assert_eq!(symbol.triggers_for("de").len(), 2);
    }

    #[test]
    fn test_invalid_rule_pattern_rejected() {
        let entry = SymbolEntry {
            id: "broken".to_string(),
            archetype: "none".to_string(),
            base_significance: 0.5,
            triggers: HashMap::new(),
            rules: vec![ContextRule::Exclude {
                pattern: "(unclosed".to_string(),
            }],
        };
        assert!(SymbolDictionary::from_entries(vec![entry]).is_err());
    }

    #[test]
    fn test_duplicate_symbol_ids_rejected() {
        let entry = SymbolEntry {
            id: "dup".to_string(),
            archetype: "none".to_string(),
            base_significance: 0.5,
            triggers: HashMap::new(),
            rules: Vec::new(),
        };
        let result = SymbolDictionary::from_entries(vec![entry.clone(), entry]);
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_significance_rejected() {
        let entry = SymbolEntry {
            id: "hot".to_string(),
            archetype: "none".to_string(),
            base_significance: 1.5,
            triggers: HashMap::new(),
            rules: Vec::new(),
        };
        assert!(SymbolDictionary::from_entries(vec![entry]).is_err());
    }

    #[test]
    fn test_trigger_is_word_bounded() {
        let dictionary = SymbolDictionary::from_toml_str(SAMPLE_DICTIONARY).unwrap();
        let symbol = dictionary.get("dwelling").unwrap();
        let window = &symbol.triggers_for("en")[1];

        assert!(window.is_match("out the window."));
        assert!(window.is_match("the Window frame"));
        assert!(!window.is_match("the windowsill"));
    }
}
