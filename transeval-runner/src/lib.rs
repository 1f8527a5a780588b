//! Bounded-concurrency orchestrator, experiment driver, JSONL sink, and
//! store adapter for the transeval execution engine (§4.10, §4.11, §5-§7, §9).

pub mod build;
pub mod error;
pub mod experiment;
pub mod orchestrator;
pub mod sample;
pub mod sink;
pub mod store;

pub use build::{build_gateway, build_pipeline, Pipeline};
pub use error::{Result, RunnerError};
pub use experiment::ExperimentDriver;
pub use orchestrator::Orchestrator;
pub use sample::{expand_scene, from_dataset_record};
pub use sink::spawn_jsonl_writer;
pub use store::{InMemoryStore, StoreSink};
