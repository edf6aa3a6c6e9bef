//! Generic HTTP interpretation provider
//!
//! **[IE-INT-010]** One implementation covers every configured vendor:
//! a JSON completion endpoint receiving the assembled prompt and
//! answering with interpretation text, confidence, and cited sources.
//! Outbound calls are paced with a minimum interval per provider so a
//! burst of requests does not trip vendor-side throttling.

use crate::models::{ContextHint, ValidatedSymbol};
use crate::types::{
    InterpretationPrompt, InterpretationProvider, ProviderCallError, ProviderOutput,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const USER_AGENT: &str = "Arcana/0.1.0 (https://github.com/arcana/arcana)";
const DEFAULT_PACING_MS: u64 = 250;

/// Minimum-interval pacer for outbound provider calls
struct OutboundPacer {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl OutboundPacer {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the pacing interval
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Provider pacing: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Wire request body sent to a completion endpoint
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    narrative: &'a str,
    locale: &'a str,
    symbols: &'a [ValidatedSymbol],
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a ContextHint>,
}

/// Wire response body from a completion endpoint
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    interpretation: String,
    confidence: f32,
    #[serde(default)]
    sources: Vec<String>,
}

/// HTTP-backed interpretation provider
pub struct HttpInterpretationProvider {
    id: String,
    endpoint: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
    pacer: OutboundPacer,
}

impl HttpInterpretationProvider {
    /// Build a provider client
    ///
    /// `timeout` matches the descriptor's per-call timeout; the cascade
    /// additionally bounds every call, so this is belt over braces at
    /// the transport layer.
    pub fn new(
        id: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderCallError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderCallError::Network(e.to_string()))?;

        Ok(Self {
            id: id.into(),
            endpoint: endpoint.into(),
            api_key,
            http_client,
            pacer: OutboundPacer::new(DEFAULT_PACING_MS),
        })
    }
}

#[async_trait::async_trait]
impl InterpretationProvider for HttpInterpretationProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn interpret(
        &self,
        prompt: &InterpretationPrompt,
    ) -> Result<ProviderOutput, ProviderCallError> {
        self.pacer.wait().await;

        let body = CompletionRequest {
            narrative: &prompt.narrative,
            locale: &prompt.locale,
            symbols: &prompt.symbols,
            context: prompt.context_hint.as_ref(),
        };

        tracing::debug!(
            provider = %self.id,
            endpoint = %self.endpoint,
            symbols = prompt.symbols.len(),
            "Issuing provider call"
        );

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderCallError::Network(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 429 {
            return Err(ProviderCallError::Api(429, "vendor throttled".to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderCallError::Api(status.as_u16(), error_text));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderCallError::Parse(e.to_string()))?;

        tracing::info!(
            provider = %self.id,
            confidence = completion.confidence,
            sources = completion.sources.len(),
            "Provider call completed"
        );

        Ok(ProviderOutput {
            interpretation: completion.interpretation,
            confidence: completion.confidence,
            sources: completion.sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let provider = HttpInterpretationProvider::new(
            "stellar-1",
            "https://stellar.example/v1/interpret",
            Some("key".to_string()),
            Duration::from_secs(10),
        );
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().id(), "stellar-1");
    }

    #[tokio::test]
    async fn test_pacer_enforces_interval() {
        let pacer = OutboundPacer::new(100);
        let start = Instant::now();

        pacer.wait().await;
        let first_elapsed = start.elapsed();

        pacer.wait().await;
        let second_elapsed = start.elapsed();

        assert!(first_elapsed < Duration::from_millis(50));
        assert!(second_elapsed >= Duration::from_millis(90));
    }

    #[test]
    fn test_completion_response_parses_without_sources() {
        let parsed: CompletionResponse =
            serde_json::from_str(r#"{"interpretation": "calm waters", "confidence": 0.7}"#)
                .unwrap();
        assert_eq!(parsed.interpretation, "calm waters");
        assert!(parsed.sources.is_empty());
    }
}
