//! arcana-ie - Interpretation Engine service
//!
//! **Module Identity:**
//! - Name: arcana-ie (Interpretation Engine)
//! - Role: interpretation orchestration for the Arcana content services
//!
//! The HTTP adapter normally drives this crate; the binary processes a
//! single request from the command line, which is what operators use to
//! exercise a deployment's configuration, dictionary, and providers.

use anyhow::Result;
use arcana_common::events::EventBus;
use arcana_ie::models::{ContextHint, SymbolDictionary};
use arcana_ie::{AnalysisRequest, EngineConfig, InterpretationOrchestrator, ProcessOutcome};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "arcana-ie", about = "Arcana interpretation engine")]
struct Args {
    /// Narrative text to interpret; reads stdin when omitted
    #[arg(long)]
    text: Option<String>,

    /// Client identifier for admission control
    #[arg(long, default_value = "local")]
    client_id: String,

    /// Locale for trigger patterns and fallback templates
    #[arg(long, default_value = "en")]
    locale: String,

    /// Auxiliary context label embedded in the interpretation prompt
    #[arg(long)]
    context: Option<String>,

    /// Path to the engine configuration file
    #[arg(long, env = "ARCANA_IE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Starting arcana-ie (Interpretation Engine)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::load(args.config.as_deref())?;

    let dictionary = match &config.dictionary_path {
        Some(path) => SymbolDictionary::load_from_path(path)?,
        None => {
            info!("No dictionary configured, candidate extraction disabled");
            SymbolDictionary::default()
        }
    };

    let event_bus = EventBus::new(100);
    let orchestrator =
        InterpretationOrchestrator::from_config(&config, Arc::new(dictionary), event_bus)?;

    let text = match args.text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let mut request = AnalysisRequest::new(text, args.client_id, args.locale);
    if let Some(label) = args.context {
        request = request.with_context_hint(ContextHint::new(label));
    }

    match orchestrator.process(request).await {
        ProcessOutcome::Completed(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        ProcessOutcome::RateLimited { reset_at } => {
            anyhow::bail!("rate limited, retry at {}", reset_at)
        }
    }
}
