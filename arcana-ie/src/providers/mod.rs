//! Interpretation provider implementations
//!
//! Vendor-specific behavior lives here, behind the
//! `InterpretationProvider` trait; the cascade itself stays free of
//! vendor branching.

mod http_provider;

pub use http_provider::HttpInterpretationProvider;

use crate::config::EngineConfig;
use crate::services::ProviderRegistration;
use arcana_common::{Error, Result};
use std::sync::Arc;

/// Build cascade registrations from configuration
///
/// Resolves each provider's API key from the environment variable named
/// in its settings. A missing key marks the provider unavailable rather
/// than failing startup: the cascade degrades instead of the service.
pub fn build_registrations(config: &EngineConfig) -> Result<Vec<ProviderRegistration>> {
    let mut registrations = Vec::with_capacity(config.providers.len());

    for settings in &config.providers {
        let mut descriptor = settings.descriptor();

        let api_key = match &settings.api_key_env {
            Some(var_name) => match std::env::var(var_name) {
                Ok(key) if !key.trim().is_empty() => Some(key),
                _ => {
                    tracing::warn!(
                        provider = %settings.id,
                        env = %var_name,
                        "API key not set, marking provider unavailable"
                    );
                    descriptor.available = false;
                    None
                }
            },
            None => None,
        };

        let provider = HttpInterpretationProvider::new(
            settings.id.clone(),
            settings.endpoint.clone(),
            api_key,
            descriptor.timeout(),
        )
        .map_err(|e| Error::Config(format!("Provider '{}' setup failed: {}", settings.id, e)))?;

        registrations.push(ProviderRegistration {
            descriptor,
            provider: Arc::new(provider),
        });
    }

    Ok(registrations)
}
