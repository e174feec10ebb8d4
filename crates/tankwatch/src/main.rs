//! tankwatch - Fuel and water level monitoring

mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tankwatch_core::analytics::efficiency_metrics;
use tankwatch_core::models::SeedData;
use tankwatch_core::{AnalyticsConfig, BulkAggregator, InMemoryHistoryStore, SystemClock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tankwatch",
    version,
    about = "Fuel and water level monitoring",
    long_about = "Trend analysis and depletion forecasts for fuel tanks, water tanks and\n\
                  generators.\n\
                  \n\
                  Examples:\n\
                    tankwatch --data site.json serve              # HTTP API on port 3333\n\
                    tankwatch --data site.json report             # Status, trends and forecasts\n\
                    tankwatch --data site.json trends --period 48 # Trends over 48 hours\n\
                    tankwatch --data site.json summary --limit 20 # Latest readings\n\
                    tankwatch config --write                      # Write default config\n\
                  \n\
                  Environment Variables:\n\
                    TANKWATCH_DATA                   # Seed file path\n\
                    TANKWATCH_CONFIG                 # Config file path\n\
                    TANKWATCH_NO_COLOR               # Disable ANSI colors\n\
                    RUST_LOG                         # Log filter (default: info)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Seed file with tanks, generators and readings (JSON)
    #[arg(long, global = true, env = "TANKWATCH_DATA")]
    data: Option<PathBuf>,

    /// Analytics config (TOML). Default: <config dir>/tankwatch/tankwatch.toml
    #[arg(long, global = true, env = "TANKWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, global = true, env = "TANKWATCH_NO_COLOR")]
    no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Port for web server
        #[arg(long, default_value = "3333")]
        port: u16,
    },
    /// Level trend of every entity
    Trends {
        /// Window in hours (default from config)
        #[arg(long)]
        period: Option<u32>,
    },
    /// Depletion forecast of every entity
    Predict,
    /// Status, trends and forecasts in one report
    Report {
        /// Trend window in hours (default from config)
        #[arg(long)]
        period: Option<u32>,
    },
    /// Latest readings across all entities, newest first
    Summary {
        #[arg(long, default_value = "24")]
        hours: u32,
        #[arg(long, short = 'n', default_value = "50")]
        limit: usize,
    },
    /// Show the effective configuration
    Config {
        /// Write it to the config path
        #[arg(long)]
        write: bool,
    },
}

/// Everything the commands need, built once from the CLI flags
struct Runtime {
    store: Arc<InMemoryHistoryStore>,
    aggregator: BulkAggregator,
}

impl Runtime {
    fn config(&self) -> &AnalyticsConfig {
        self.aggregator.config()
    }

    fn rows(&self) -> Vec<cli::EntityRow> {
        cli::entity_rows(&self.store.tanks(), &self.store.generators(), self.config())
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AnalyticsConfig> {
    let config = AnalyticsConfig::resolve(path).context("Failed to load analytics config")?;
    Ok(config)
}

fn build_runtime(data: Option<&Path>, config: AnalyticsConfig) -> Result<Runtime> {
    let clock = Arc::new(SystemClock);
    let store = Arc::new(InMemoryHistoryStore::new(clock.clone()));

    match data {
        Some(path) => {
            let seed = SeedData::load(path)
                .with_context(|| format!("Failed to load seed data from {}", path.display()))?;
            let kept = store.load_seed(seed);
            let pruned = store.retain(chrono::Duration::days(i64::from(config.retention_days)));
            info!(path = %path.display(), readings = kept.saturating_sub(pruned), "Seed data loaded");
        }
        None => warn!("No --data given, starting with an empty store"),
    }

    let aggregator = BulkAggregator::new(store.clone(), clock, config);
    Ok(Runtime { store, aggregator })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // `config --write` may target a file that does not exist yet
    let config = match (&cli.command, cli.config.as_deref()) {
        (Command::Config { write: true }, Some(path)) if !path.exists() => AnalyticsConfig::default(),
        (_, path) => load_config(path)?,
    };

    if let Command::Config { write } = cli.command {
        return run_config(&config, cli.config.as_deref(), write);
    }

    let runtime = build_runtime(cli.data.as_deref(), config)?;
    let (json, no_color) = (cli.json, cli.no_color);

    match cli.command {
        Command::Serve { port } => run_serve(runtime, port).await?,
        Command::Trends { period } => run_trends(&runtime, period, json, no_color).await?,
        Command::Predict => run_predict(&runtime, json, no_color).await?,
        Command::Report { period } => run_report(&runtime, period, json, no_color).await?,
        Command::Summary { hours, limit } => {
            run_summary(&runtime, hours, limit, json, no_color).await?
        }
        Command::Config { .. } => {}
    }

    Ok(())
}

async fn run_serve(runtime: Runtime, port: u16) -> Result<()> {
    let state = tankwatch_web::AppState::new(runtime.store, runtime.aggregator);
    tankwatch_web::run(state, port).await
}

async fn analyze_all(runtime: &Runtime, period: Option<u32>) -> Result<tankwatch_core::BulkAnalytics> {
    let hours = period.unwrap_or(runtime.config().trend_window_hours);
    runtime
        .aggregator
        .aggregate(&runtime.store.tank_ids(), &runtime.store.generator_ids(), hours)
        .await
        .context("Failed to compute analytics")
}

async fn run_trends(runtime: &Runtime, period: Option<u32>, json: bool, no_color: bool) -> Result<()> {
    let analytics = analyze_all(runtime, period).await?;
    println!("{}", cli::format_trends(&runtime.rows(), &analytics, json, no_color));
    Ok(())
}

async fn run_predict(runtime: &Runtime, json: bool, no_color: bool) -> Result<()> {
    let analytics = analyze_all(runtime, None).await?;
    println!("{}", cli::format_predictions(&runtime.rows(), &analytics, json, no_color));
    Ok(())
}

async fn run_report(runtime: &Runtime, period: Option<u32>, json: bool, no_color: bool) -> Result<()> {
    let analytics = analyze_all(runtime, period).await?;
    let efficiency = efficiency_metrics(
        &runtime.store.tanks(),
        &runtime.store.generators(),
        &analytics.trends,
    );
    println!(
        "{}",
        cli::format_report(&runtime.rows(), &analytics, &efficiency, json, no_color)
    );
    Ok(())
}

async fn run_summary(
    runtime: &Runtime,
    hours: u32,
    limit: usize,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let records = runtime
        .aggregator
        .history_summary(&runtime.store.tank_ids(), &runtime.store.generator_ids(), hours, limit)
        .await
        .context("Failed to read history")?;
    println!("{}", cli::format_summary(&records, json, no_color));
    Ok(())
}

fn run_config(config: &AnalyticsConfig, path: Option<&Path>, write: bool) -> Result<()> {
    if write {
        let path = path
            .map(Path::to_path_buf)
            .or_else(AnalyticsConfig::default_path)
            .context("Could not determine config directory")?;
        config.save(&path)?;
        println!("Config written to {}", path.display());
        return Ok(());
    }

    let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
    println!("{}", rendered);
    Ok(())
}
