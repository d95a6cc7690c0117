//! data-agent - natural-language questions to SQL.

use data_agent::cli::{Cli, Command};
use data_agent::config::Config;
use data_agent::error::Result;
use data_agent::logging;
use data_agent::query::QueryPipeline;
use serde::Serialize;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init(cli.log_file.as_deref());

    if let Err(e) = run(&cli).await {
        error!("{}: {}", e.kind(), e);
        print_json(&e.report());
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let pipeline = QueryPipeline::from_config(&config, cli.offline)?;

    let question = cli.command.question();
    let target = cli.command.target();

    match &cli.command {
        Command::Ask { .. } => {
            let result = pipeline.ask(&question, target).await?;
            info!("Returned {} rows", result.rows.len());
            print_json(&result);
        }
        Command::Sql { .. } => {
            let translation = pipeline.translate(&question, target).await?;
            print_json(&translation);
        }
    }

    Ok(())
}

/// Resolves configuration with precedence:
/// 1. CLI flags (highest)
/// 2. Config file
/// 3. Environment variables
fn resolve_config(cli: &Cli) -> Result<Config> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());

    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env_defaults();
    cli.apply_overrides(&mut config);
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}
