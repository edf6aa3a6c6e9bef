//! arcana-ie library interface
//!
//! Interpretation Engine for the Arcana content services. Turns a raw
//! narrative (a dream, or a computed chart/transit summary) into a
//! validated, confidence-scored interpretation by coordinating:
//!
//! - per-client sliding-window admission control
//! - candidate symbol extraction over a read-only knowledge base
//! - contextual validation (exclusion/reinforcement rules)
//! - a cascading chain of external text-generation providers
//! - quality assurance with confidence recalibration
//! - a deterministic rule-based fallback that always produces a result
//!
//! The HTTP adapter fronting this crate lives in a separate service;
//! this library exposes [`services::InterpretationOrchestrator::process`]
//! as its single entry point.

pub mod config;
pub mod models;
pub mod providers;
pub mod services;
pub mod types;

pub use crate::config::EngineConfig;
pub use crate::models::{AnalysisRequest, AnalysisResult};
pub use crate::services::{InterpretationOrchestrator, ProcessOutcome};
