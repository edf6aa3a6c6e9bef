//! Shared helpers for arcana-ie integration tests

#![allow(dead_code)]

use arcana_ie::config::EngineConfig;
use arcana_ie::models::{ProviderDescriptor, SymbolDictionary};
use arcana_ie::services::ProviderRegistration;
use arcana_ie::types::{
    InterpretationPrompt, InterpretationProvider, ProviderCallError, ProviderOutput,
};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fixed base instant for simulated clocks
pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
}

/// Dictionary used across scenario tests
pub fn test_dictionary() -> SymbolDictionary {
    SymbolDictionary::from_toml_str(
        r#"
        [[symbols]]
        id = "dwelling"
        archetype = "shelter"
        base_significance = 0.55

        [symbols.triggers]
        en = ["window", "house", "door"]

        [[symbols.rules]]
        kind = "exclude"
        pattern = "(?i)\\b(car|truck|vehicle|bus|glovebox)\\b"

        [[symbols.rules]]
        kind = "reinforce"
        pattern = "(?i)\\b(home|family)\\b"
        delta = 0.15

        [[symbols]]
        id = "vehicle"
        archetype = "journey"
        base_significance = 0.5

        [symbols.triggers]
        en = ["car", "truck", "train"]

        [[symbols.rules]]
        kind = "reinforce"
        pattern = "(?i)\\b(rented|drove|road|highway)\\b"
        delta = 0.1

        [[symbols]]
        id = "tracking"
        archetype = "surveillance"
        base_significance = 0.5

        [symbols.triggers]
        en = ["tracker", "trackers"]

        [[symbols.rules]]
        kind = "reinforce"
        pattern = "(?i)\\b(watch\\w*|follow\\w*|monitor\\w*|hidden|removed)\\b"
        delta = 0.2
        "#,
    )
    .unwrap()
}

/// Deterministic provider returning a fixed output
pub struct StaticProvider {
    id: String,
    output: ProviderOutput,
    pub calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(id: &str, output: ProviderOutput) -> Self {
        Self {
            id: id.to_string(),
            output,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl InterpretationProvider for StaticProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn interpret(
        &self,
        _prompt: &InterpretationPrompt,
    ) -> Result<ProviderOutput, ProviderCallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// Provider that always fails at the transport tier
pub struct FailingProvider {
    id: String,
    pub calls: AtomicUsize,
}

impl FailingProvider {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl InterpretationProvider for FailingProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn interpret(
        &self,
        _prompt: &InterpretationPrompt,
    ) -> Result<ProviderOutput, ProviderCallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderCallError::Network("connection refused".to_string()))
    }
}

/// Long interpretation text that trips none of the quality penalties
pub const CLEAN_INTERPRETATION: &str = "The imagery in this narrative points to a slow \
    reorganization of priorities, where familiar worries lose their grip and attention \
    turns toward what has quietly been asking for it over the past weeks.";

pub fn clean_output() -> ProviderOutput {
    ProviderOutput {
        interpretation: CLEAN_INTERPRETATION.to_string(),
        confidence: 0.82,
        sources: vec!["symbol-lore".to_string(), "almanac".to_string()],
    }
}

/// Registration wrapping a provider with a permissive descriptor
pub fn registration(
    provider: Arc<dyn InterpretationProvider>,
    cost_tier: u8,
) -> ProviderRegistration {
    ProviderRegistration {
        descriptor: ProviderDescriptor {
            id: provider.id().to_string(),
            cost_tier,
            timeout_ms: 500,
            max_output_chars: 4_000,
            retry_budget: 0,
            available: true,
        },
        provider,
    }
}

/// Engine configuration tuned for fast tests
pub fn test_config() -> EngineConfig {
    EngineConfig {
        rate_limit_per_client: 100,
        rate_limit_window_seconds: 60,
        overall_deadline_ms: 5_000,
        ..EngineConfig::default()
    }
}
