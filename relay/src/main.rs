use catalog::types::QueryRecord;
use catalog::{CatalogError, CatalogService};
use clap::{Parser, Subcommand};
use config::{Config, ConfigError};
use observability::ObservabilityError;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod observability;

#[derive(Parser)]
#[command(about = "Fetch a store catalog and match product records against it")]
struct Cli {
    #[arg(long, short, default_value = "relay.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Fetch the full catalog and print it as JSON
    Fetch {
        #[arg(long)]
        page_cap: Option<usize>,
    },
    /// Match a JSON array of {name, sku} records and print the report
    Match {
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(thiserror::Error, Debug)]
enum RelayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Observability(#[from] ObservabilityError),
    #[error("access token variable {0} is not set")]
    MissingToken(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("could not read input: {0}")]
    Input(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "relay failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), RelayError> {
    let config = Config::from_file(&cli.config)?;
    let _guard = observability::init(&config.common.logging, config.common.metrics.as_ref())?;

    let token_env = &config.catalog.source.access_token_env;
    let token = std::env::var(token_env).map_err(|_| RelayError::MissingToken(token_env.clone()))?;
    let service = CatalogService::from_config(&config.catalog, token)?;

    match cli.command {
        CliCommand::Fetch { page_cap } => {
            let catalog = service.fetch_full_catalog(page_cap).await?;
            print_json(&*catalog)
        }
        CliCommand::Match { input } => {
            let data = std::fs::read_to_string(&input)?;
            let queries: Vec<QueryRecord> = serde_json::from_str(&data)?;
            tracing::info!(queries = queries.len(), input = %input.display(), "Matching records");

            let report = service.match_availability(&queries).await?;
            print_json(&report)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), RelayError> {
    serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    println!();
    Ok(())
}
