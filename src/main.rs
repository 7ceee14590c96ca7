use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use price_watcher::utils::logging::init_logging;
use price_watcher::{AppConfig, PriceMonitor, WatchScheduler};

#[derive(Parser, Debug)]
#[command(
    name = "price-watcher",
    version,
    about = "Compare competitor prices against our own catalog"
)]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, default_value = "config/default.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every price once, write the snapshot and notify
    Run,
    /// Repeat runs on a cron schedule until Ctrl-C
    Watch {
        /// Six-field cron expression, seconds first
        #[arg(long, default_value = "0 0 * * * *")]
        cron: String,
    },
    /// Load and validate the configuration, then exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    let _guard = init_logging(cli.verbose, config.logging.directory.as_deref());

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let monitor = PriceMonitor::from_config(&config)?;
            let report = monitor.run_once().await?;
            if report.any_undercut {
                info!(undercuts = report.undercut_count, "Competitors undercut our prices");
            }
        }
        Command::Watch { cron } => {
            let monitor = Arc::new(PriceMonitor::from_config(&config)?);
            let mut scheduler = WatchScheduler::new(monitor, &cron).await?;
            scheduler.start().await?;

            info!(cron = %cron, "Watching prices, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            info!("Shutting down...");

            let stats = scheduler.stats().await;
            scheduler.shutdown().await?;
            info!(
                completed = stats.completed_runs,
                failed = stats.failed_runs,
                skipped = stats.skipped_runs,
                "Watch finished"
            );
        }
        Command::CheckConfig => {
            let links: usize = config
                .companies
                .iter()
                .map(|c| c.links.iter().filter(|l| !l.trim().is_empty()).count())
                .sum();
            let webhook = match config.notifications.discord.webhook_url {
                Some(_) => "configured",
                None => "not configured",
            };
            println!("Configuration OK: {}", cli.config.display());
            println!("  catalog models:  {}", config.catalog.len());
            println!("  companies:       {}", config.companies.len());
            println!("  sourced links:   {}", links);
            println!("  snapshot:        {}", config.snapshot.path.display());
            println!("  discord webhook: {}", webhook);
        }
    }

    Ok(())
}
