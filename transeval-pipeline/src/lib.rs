//! The five pipeline stages (§4.5-§4.9): state builder, translator, verifier,
//! repairer, and judge. Each stage is a small struct that is LLM-backed
//! (through [`component::LlmComponent`], which always talks to an
//! LLM gateway, never a bare provider) or heuristic-only: a struct wrapping a
//! model handle and config, free-function prompt helpers, and a `parse_*`
//! function per response shape.

pub mod component;
pub mod error;
pub mod hashing;
pub mod judge;
pub mod markdown;
pub mod repairer;
pub mod state_builder;
pub mod translator;
pub mod verifier;

pub use component::LlmComponent;
pub use error::{Result, StageError};
pub use judge::Judge;
pub use repairer::Repairer;
pub use state_builder::StateBuilder;
pub use translator::Translator;
pub use verifier::Verifier;
