//! Pipeline services
//!
//! Each service owns one stage of the interpretation pipeline; the
//! orchestrator sequences them for a request.

mod contextual_validator;
mod fallback_interpreter;
mod orchestrator;
mod provider_cascade;
mod quality_assessor;
mod rate_limiter;
mod symbol_matcher;

pub use contextual_validator::ContextualValidator;
pub use fallback_interpreter::{
    FallbackInterpreter, Mood, RULE_BASED_CONFIDENCE, RULE_BASED_MODEL_ID, UNIDENTIFIED_SYMBOL,
};
pub use orchestrator::{InterpretationOrchestrator, ProcessOutcome};
pub use provider_cascade::{CascadeOutcome, ProviderCascade, ProviderRegistration};
pub use quality_assessor::{QualityAssessor, CONFIDENCE_CEILING, CONFIDENCE_FLOOR};
pub use rate_limiter::{Admission, RateLimiter};
pub use symbol_matcher::SymbolCandidateMatcher;
