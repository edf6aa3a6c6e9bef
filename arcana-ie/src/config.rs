//! Configuration resolution for arcana-ie
//!
//! **[IE-CFG-010]** Two-tier resolution with ENV over TOML priority;
//! compiled defaults apply when neither tier provides a value. Provider
//! API keys never live in the TOML file: each provider names the
//! environment variable holding its key.

use crate::models::ProviderDescriptor;
use arcana_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_RATE_LIMIT_PER_CLIENT: &str = "ARCANA_RATE_LIMIT_PER_CLIENT";
pub const ENV_RATE_LIMIT_WINDOW_SECONDS: &str = "ARCANA_RATE_LIMIT_WINDOW_SECONDS";
pub const ENV_RATE_LIMIT_GLOBAL: &str = "ARCANA_RATE_LIMIT_GLOBAL";
pub const ENV_CONFIDENCE_REVIEW_THRESHOLD: &str = "ARCANA_CONFIDENCE_REVIEW_THRESHOLD";
pub const ENV_OVERALL_DEADLINE_MS: &str = "ARCANA_OVERALL_DEADLINE_MS";
pub const ENV_DICTIONARY_PATH: &str = "ARCANA_DICTIONARY_PATH";

/// Configuration file name under the platform config directory
pub const CONFIG_FILE_NAME: &str = "arcana-ie.toml";

/// One provider table from configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Provider identifier, unique within the configuration
    pub id: String,
    /// Completion endpoint URL
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_cost_tier")]
    pub cost_tier: u8,
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
    #[serde(default = "default_available")]
    pub available: bool,
}

impl ProviderSettings {
    /// Static descriptor handed to the cascade
    pub fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            id: self.id.clone(),
            cost_tier: self.cost_tier,
            timeout_ms: self.timeout_ms,
            max_output_chars: self.max_output_chars,
            retry_budget: self.retry_budget,
            available: self.available,
        }
    }
}

fn default_cost_tier() -> u8 {
    1
}
fn default_provider_timeout_ms() -> u64 {
    10_000
}
fn default_max_output_chars() -> usize {
    4_000
}
fn default_retry_budget() -> u32 {
    2
}
fn default_available() -> bool {
    true
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Requests admitted per client per window
    pub rate_limit_per_client: u32,
    /// Sliding window length in seconds
    pub rate_limit_window_seconds: u64,
    /// Optional total-throughput cap across all clients
    pub rate_limit_global: Option<u32>,
    /// Results below this confidence are flagged for human review
    pub confidence_review_threshold: f32,
    /// Hard ceiling on per-request cascade time
    pub overall_deadline_ms: u64,
    /// Symbol dictionary file; empty dictionary when unset
    pub dictionary_path: Option<PathBuf>,
    /// Cascade providers, attempted in ascending cost tier
    pub providers: Vec<ProviderSettings>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_client: 10,
            rate_limit_window_seconds: 60,
            rate_limit_global: None,
            confidence_review_threshold: 0.55,
            overall_deadline_ms: 45_000,
            dictionary_path: None,
            providers: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration with ENV over TOML priority
    ///
    /// `path` is the explicit file location (CLI tier). When absent, the
    /// platform default location is tried; a missing file there means
    /// compiled defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(explicit) => arcana_common::config::read_toml_file(explicit)?,
            None => {
                let default_path = arcana_common::config::default_config_path(CONFIG_FILE_NAME);
                if default_path.exists() {
                    arcana_common::config::read_toml_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;

        tracing::info!(
            rate_limit_per_client = config.rate_limit_per_client,
            window_seconds = config.rate_limit_window_seconds,
            providers = config.providers.len(),
            "Engine configuration resolved"
        );
        Ok(config)
    }

    /// Apply `ARCANA_*` environment overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_parse(ENV_RATE_LIMIT_PER_CLIENT)? {
            self.rate_limit_per_client = value;
        }
        if let Some(value) = env_parse(ENV_RATE_LIMIT_WINDOW_SECONDS)? {
            self.rate_limit_window_seconds = value;
        }
        if let Some(value) = env_parse(ENV_RATE_LIMIT_GLOBAL)? {
            self.rate_limit_global = Some(value);
        }
        if let Some(value) = env_parse(ENV_CONFIDENCE_REVIEW_THRESHOLD)? {
            self.confidence_review_threshold = value;
        }
        if let Some(value) = env_parse(ENV_OVERALL_DEADLINE_MS)? {
            self.overall_deadline_ms = value;
        }
        if let Ok(value) = std::env::var(ENV_DICTIONARY_PATH) {
            if !value.trim().is_empty() {
                self.dictionary_path = Some(PathBuf::from(value));
            }
        }
        Ok(())
    }

    /// Validate resolved values
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit_per_client == 0 {
            return Err(Error::Config(
                "rate_limit_per_client must be at least 1".to_string(),
            ));
        }
        if self.rate_limit_window_seconds == 0 {
            return Err(Error::Config(
                "rate_limit_window_seconds must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_review_threshold)
            || self.confidence_review_threshold == 0.0
        {
            return Err(Error::Config(format!(
                "confidence_review_threshold {} outside (0, 1]",
                self.confidence_review_threshold
            )));
        }
        if self.overall_deadline_ms == 0 {
            return Err(Error::Config(
                "overall_deadline_ms must be at least 1".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for provider in &self.providers {
            if provider.id.trim().is_empty() {
                return Err(Error::Config("provider id must not be empty".to_string()));
            }
            if !seen.insert(provider.id.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate provider id '{}'",
                    provider.id
                )));
            }
            if provider.timeout_ms == 0 {
                return Err(Error::Config(format!(
                    "provider '{}': timeout_ms must be at least 1",
                    provider.id
                )));
            }
        }
        Ok(())
    }

    pub fn overall_deadline(&self) -> Duration {
        Duration::from_millis(self.overall_deadline_ms)
    }
}

/// Parse an optional environment variable, rejecting malformed values
fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map(Some).map_err(|_| {
            Error::Config(format!("Environment variable {} has invalid value '{}'", name, raw))
        }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            ENV_RATE_LIMIT_PER_CLIENT,
            ENV_RATE_LIMIT_WINDOW_SECONDS,
            ENV_RATE_LIMIT_GLOBAL,
            ENV_CONFIDENCE_REVIEW_THRESHOLD,
            ENV_OVERALL_DEADLINE_MS,
            ENV_DICTIONARY_PATH,
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_are_valid() {
        clear_env();
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit_per_client, 10);
        assert_eq!(config.rate_limit_window_seconds, 60);
        assert!(config.rate_limit_global.is_none());
    }

    #[test]
    #[serial]
    fn test_toml_tier_overrides_defaults() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arcana-ie.toml");
        std::fs::write(
            &path,
            r#"
            rate_limit_per_client = 25
            confidence_review_threshold = 0.70

            [[providers]]
            id = "stellar-1"
            endpoint = "https://stellar.example/v1/interpret"
            cost_tier = 2
            "#,
        )
        .unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.rate_limit_per_client, 25);
        assert_eq!(config.confidence_review_threshold, 0.70);
        // Untouched keys keep defaults
        assert_eq!(config.rate_limit_window_seconds, 60);

        let provider = &config.providers[0];
        assert_eq!(provider.cost_tier, 2);
        assert_eq!(provider.timeout_ms, 10_000);
        assert!(provider.available);
    }

    #[test]
    #[serial]
    fn test_env_tier_overrides_toml() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arcana-ie.toml");
        std::fs::write(&path, "rate_limit_per_client = 25").unwrap();

        std::env::set_var(ENV_RATE_LIMIT_PER_CLIENT, "5");
        std::env::set_var(ENV_RATE_LIMIT_GLOBAL, "100");
        let config = EngineConfig::load(Some(&path));
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.rate_limit_per_client, 5);
        assert_eq!(config.rate_limit_global, Some(100));
    }

    #[test]
    #[serial]
    fn test_malformed_env_value_rejected() {
        clear_env();
        std::env::set_var(ENV_RATE_LIMIT_PER_CLIENT, "plenty");
        let result = EngineConfig::load(None);
        clear_env();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_zero_limit_rejected() {
        clear_env();
        let config = EngineConfig {
            rate_limit_per_client: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_review_threshold_bounds() {
        clear_env();
        let config = EngineConfig {
            confidence_review_threshold: 1.3,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_duplicate_provider_ids_rejected() {
        clear_env();
        let provider = ProviderSettings {
            id: "stellar-1".to_string(),
            endpoint: "https://stellar.example".to_string(),
            api_key_env: None,
            cost_tier: 1,
            timeout_ms: 1000,
            max_output_chars: 4000,
            retry_budget: 1,
            available: true,
        };
        let config = EngineConfig {
            providers: vec![provider.clone(), provider],
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_descriptor_mirrors_settings() {
        clear_env();
        let provider = ProviderSettings {
            id: "lunar-2".to_string(),
            endpoint: "https://lunar.example".to_string(),
            api_key_env: Some("LUNAR_KEY".to_string()),
            cost_tier: 3,
            timeout_ms: 2500,
            max_output_chars: 1200,
            retry_budget: 4,
            available: false,
        };
        let descriptor = provider.descriptor();
        assert_eq!(descriptor.id, "lunar-2");
        assert_eq!(descriptor.cost_tier, 3);
        assert_eq!(descriptor.timeout_ms, 2500);
        assert_eq!(descriptor.max_output_chars, 1200);
        assert_eq!(descriptor.retry_budget, 4);
        assert!(!descriptor.available);
    }
}
