use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "transeval")]
#[command(about = "Japanese-to-English narrative translation evaluation engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an entire experiment over a dataset JSONL file
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Comma-separated conditions, e.g. "A0,A2" (default: all four)
        #[arg(long)]
        conditions: Option<String>,
        #[arg(long)]
        run_id: Option<String>,
        #[arg(long)]
        overwrite: bool,
    },
    /// Run a single sample through the pipeline
    RunOne {
        #[arg(short, long)]
        config: PathBuf,
        /// Dataset JSONL row; reads stdin when omitted
        #[arg(short, long)]
        sample: Option<PathBuf>,
        #[arg(long, default_value = "a0")]
        condition: ConditionArg,
        #[arg(long, default_value = "text")]
        output_format: OutputFormatArg,
    },
    /// Summarize run JSONL files into per-(run, condition) rows
    Aggregate {
        #[arg(long, required = true, num_args = 1..)]
        runs: Vec<String>,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value = "json")]
        format: AggregateFormatArg,
    },
    /// Copy records needing review, or scoring below a threshold, out of run JSONL files
    ExtractFailures {
        #[arg(long, required = true, num_args = 1..)]
        runs: Vec<String>,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 0.9)]
        threshold: f64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ConditionArg {
    A0,
    A1,
    A2,
    A3,
}

impl From<ConditionArg> for transeval_core::model::Condition {
    fn from(arg: ConditionArg) -> Self {
        match arg {
            ConditionArg::A0 => transeval_core::model::Condition::A0,
            ConditionArg::A1 => transeval_core::model::Condition::A1,
            ConditionArg::A2 => transeval_core::model::Condition::A2,
            ConditionArg::A3 => transeval_core::model::Condition::A3,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormatArg {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum AggregateFormatArg {
    Json,
    Csv,
}
