use clap::Parser;

use transeval_cli::cli::{Cli, Commands};
use transeval_cli::commands::{aggregate, extract_failures, run, run_one};

#[tokio::main]
async fn main() {
    transeval_telemetry::init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run { config, input, output, conditions, run_id, overwrite } => {
            run::execute(run::RunArgs { config, input, output, conditions, run_id, overwrite }).await
        }
        Commands::RunOne { config, sample, condition, output_format } => {
            run_one::execute(run_one::RunOneArgs { config, sample, condition: condition.into(), output_format }).await
        }
        Commands::Aggregate { runs, output, format } => aggregate::execute(aggregate::AggregateArgs { runs, output, format }).await,
        Commands::ExtractFailures { runs, output, threshold } => {
            extract_failures::execute(extract_failures::ExtractFailuresArgs { runs, output, threshold }).await
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
