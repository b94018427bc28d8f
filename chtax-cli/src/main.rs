use std::path::PathBuf;

use anyhow::Context;
use chtax_cli::app;
use chtax_cli::input::Household;
use chtax_cli::report::SummaryReport;
use chtax_core::db::StoreConfig;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Swiss tax estimator.
///
/// Reads a household file (answers plus filings), computes every filing
/// against the built-in reference data, stores the results and prints a
/// summary.
#[derive(Debug, Parser)]
#[command(name = "chtax", version, about)]
struct Cli {
    /// Household JSON file.
    household: PathBuf,

    /// TOML file overriding the constants of one tax year.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Snapshot store backend (`memory` or `sqlite`).
    #[arg(long, default_value = "memory")]
    store: String,

    /// Store connection string. For SQLite a file path or `:memory:`.
    #[arg(long, default_value = "chtax.db")]
    db: String,

    /// Print the summary as JSON instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Honours `RUST_LOG`, defaults to `info`, and logs to stderr so the
/// summary on stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let household = Household::load(&cli.household)?;
    let service = app::build_service(cli.config.as_deref())?;

    let store_config = StoreConfig {
        backend: cli.store,
        connection_string: cli.db,
    };
    debug!("opening {} store", store_config.backend);
    let store = app::build_registry()
        .create(&store_config)
        .await
        .context("Failed to open snapshot store")?;

    let summary = app::run(&service, &*store, &household).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", SummaryReport(&summary));
    }

    if summary.failed > 0 {
        info!(failed = summary.failed, "some filings could not be calculated");
    }
    Ok(())
}
