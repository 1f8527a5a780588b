//! One module per CLI subcommand (§6.4).

pub mod aggregate;
pub mod extract_failures;
pub mod run;
pub mod run_one;
