//! Shared types for the Arcana service family
//!
//! Provides the common error type, configuration file helpers, and the
//! event bus used by all Arcana services.

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
