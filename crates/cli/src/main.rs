//! bulkload - transactional bulk-load throughput benchmark
//!
//! Main entry point for the command line tool.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bulkload_cli::{generate_dataset, run_single, run_sweep, AppContext, SingleLoad};
use bulkload_domain::LoaderKind;
use bulkload_infra::{config, init_logging, run_timestamp};
use clap::{Parser, Subcommand};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "bulkload", version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON); probed in standard locations if omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sweep every configured batch size and transaction count
    Run,
    /// Run a single load test
    Load {
        /// Loader strategy, defaults to `loading.loader_type`
        #[arg(short, long)]
        loader: Option<LoaderKind>,
        /// Statements per batch; the pool loader requires one
        #[arg(short, long)]
        batch_size: Option<usize>,
        /// Concurrent transactions (carousel) or workers (pool)
        #[arg(short, long)]
        transactions: usize,
    },
    /// Generate the synthetic dataset
    Generate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let timestamp = run_timestamp();

    let config = config::load(cli.config).context("failed to load configuration")?;
    let _logging = init_logging(config.project.logs_dir.as_deref(), &timestamp)
        .context("failed to initialise logging")?;
    info!(timestamp = %timestamp, "bulkload starting");

    let outcome = execute(cli.command, config, timestamp).await;
    if let Err(e) = &outcome {
        error!(error = %format!("{e:#}"), "bulkload failed");
    }
    outcome
}

async fn execute(command: Command, config: bulkload_domain::Config, timestamp: String) -> Result<()> {
    match command {
        Command::Generate => {
            let summary = generate_dataset(&config).context("dataset generation failed")?;
            info!(
                entities = summary.entity_count,
                relations = summary.relation_count,
                schema = %summary.schema.display(),
                "Dataset generated"
            );
        }
        Command::Run => {
            let context = AppContext::new(config, timestamp)?;
            let results = run_sweep(&context).await.context("sweep failed")?;
            info!(completed = results.len(), "Sweep finished");
        }
        Command::Load { loader, batch_size, transactions } => {
            let context = AppContext::new(config, timestamp)?;
            let request = SingleLoad { loader, batch_size, transaction_count: transactions };
            run_single(&context, request).await.context("load test failed")?;
        }
    }
    Ok(())
}
