//! Prompt source resolution and `{{variable}}` templating (§4.4).

pub mod resolve;
pub mod template;

pub use resolve::{resolve, CompiledArtifact, Resolved, ResolvedSource};
pub use template::render;
