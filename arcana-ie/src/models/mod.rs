//! Data models for the interpretation pipeline

mod request;
mod result;
mod symbols;

pub use request::{AnalysisRequest, ContextHint};
pub use result::{AnalysisResult, AttemptOutcome, ProviderAttempt, ProviderDescriptor};
pub use symbols::{
    CandidateSymbol, CompiledRule, CompiledSymbol, ContextRule, MatchSpan, SymbolDictionary,
    SymbolEntry, ValidatedSymbol, ValidationDecision, ValidationOutcome, FALLBACK_LOCALE,
};
