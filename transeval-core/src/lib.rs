//! Domain model, constraint normalizer, and hard-check engine shared by every
//! other `transeval` crate.
//!
//! This crate has no knowledge of LLM providers, prompts, or orchestration —
//! it only defines the data that flows between them and the two purely
//! deterministic components of the engine (§4.1, §4.2).

pub mod condition;
pub mod config;
pub mod constraints;
pub mod error;
pub mod hardcheck;
pub mod model;

pub use error::{CoreError, Result};
