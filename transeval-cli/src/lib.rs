//! Command-line entry point for the transeval execution engine: config
//! loading, dataset JSONL parsing, and the `run`/`run-one`/`aggregate`/
//! `extract-failures` subcommands (§6.4).

pub mod cli;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod glob_files;
