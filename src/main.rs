use alerter::{TelegramAlerter, run_alerter_service};
use anyhow::Context;
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use comfy_table::Table;
use configuration::{Config, LoggingConfig};
use core_types::{ConfirmationInputs, CycleInputs, RatioObservation, StrategyId, Trend};
use database::{DbRepository, connect, run_migrations};
use engine::{DecisionEngine, ThresholdCache};
use events::EngineEvent;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// The main entry point for the MarketFlow signal engine.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be populated.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config_from(&cli.config.to_string_lossy())
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(strategy_id) = cli.strategy {
        config.strategy.strategy_id = strategy_id;
    }

    // Keep the guard alive so buffered log lines reach the file on exit.
    let _log_guard = init_tracing(&config.logging)?;

    // Initialize the database connection and run migrations
    let pool = connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;
    let repo = Arc::new(DbRepository::new(pool));

    // Execute the appropriate command
    match cli.command {
        Commands::Cycle(args) => handle_cycle(args, &config, repo).await,
        Commands::Threshold(args) => handle_threshold(args, &config, repo).await,
        Commands::State => handle_state(&config, repo).await,
        Commands::History(args) => handle_history(args, &config, repo).await,
        Commands::Reset => handle_reset(&config, repo).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Ratio-threshold signal engine for a pair of equity ETFs.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides `strategy.strategy_id` from the configuration.
    #[arg(long, global = true, value_enum)]
    strategy: Option<StrategyId>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one decision cycle on the current ratio.
    Cycle(CycleArgs),
    /// Recompute the threshold from aligned price histories and cache it.
    Threshold(ThresholdArgs),
    /// Print the persisted signal state as JSON.
    State,
    /// Show the most recent entries and exits.
    History(HistoryArgs),
    /// Restore the default state (CASH, no reference observation).
    Reset,
}

#[derive(Parser)]
struct CycleArgs {
    /// The current ratio N = A / B.
    #[arg(long)]
    ratio: f64,

    /// The threshold V. Defaults to the cached value if it is fresh.
    #[arg(long)]
    threshold: Option<f64>,

    /// Whether the secondary instrument is in its long-term uptrend.
    #[arg(long, action = ArgAction::Set)]
    trend_ok: bool,

    #[arg(long)]
    qqq_rsi: Option<f64>,
    #[arg(long)]
    spy_rsi: Option<f64>,
    #[arg(long, value_enum)]
    qqq_trend: Option<Trend>,
    #[arg(long, value_enum)]
    spy_trend: Option<Trend>,
    #[arg(long)]
    fear_score: Option<f64>,

    /// Print the outcome as an `EngineEvent` JSON line instead of text.
    #[arg(long)]
    json: bool,
}

impl CycleArgs {
    /// All five readings or nothing; a partial set counts as unavailable.
    fn confirmation(&self) -> Option<ConfirmationInputs> {
        match (
            self.qqq_rsi,
            self.spy_rsi,
            self.qqq_trend,
            self.spy_trend,
            self.fear_score,
        ) {
            (Some(qqq_rsi), Some(spy_rsi), Some(qqq_trend), Some(spy_trend), Some(fear_score)) => {
                Some(ConfirmationInputs {
                    qqq_rsi,
                    spy_rsi,
                    qqq_trend,
                    spy_trend,
                    fear_score,
                })
            }
            (None, None, None, None, None) => None,
            _ => {
                tracing::warn!("Incomplete confirmation readings supplied; ignoring them");
                None
            }
        }
    }
}

#[derive(Parser)]
struct ThresholdArgs {
    /// Closing prices of the numerator instrument, oldest first.
    #[arg(long, value_delimiter = ',', required = true)]
    a: Vec<f64>,

    /// Closing prices of the denominator instrument, aligned with `--a`.
    #[arg(long, value_delimiter = ',', required = true)]
    b: Vec<f64>,
}

#[derive(Parser)]
struct HistoryArgs {
    /// How many signals to show.
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

// ==============================================================================
// Logging
// ==============================================================================

/// Stdout plus a daily rolling file. `RUST_LOG` wins over `logging.level`.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&logging.directory, &logging.file_prefix);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("invalid logging.level")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .context("failed to install the tracing subscriber")?;

    Ok(guard)
}

// ==============================================================================
// Command Handlers
// ==============================================================================

fn build_engine(
    config: &Config,
    repo: Arc<DbRepository>,
) -> anyhow::Result<(DecisionEngine, broadcast::Sender<EngineEvent>)> {
    let strategy = strategies::create_strategy(config.strategy.strategy_id, config)?;
    let (event_tx, _) = broadcast::channel(64);
    let engine = DecisionEngine::new(strategy, repo, event_tx.clone());
    Ok((engine, event_tx))
}

async fn handle_cycle(args: CycleArgs, config: &Config, repo: Arc<DbRepository>) -> anyhow::Result<()> {
    let (engine, event_tx) = build_engine(config, repo.clone())?;
    let mut printer_rx = event_tx.subscribe();

    let alerter_handle = TelegramAlerter::new(&config.telegram)
        .map(|alerter| tokio::spawn(run_alerter_service(alerter, event_tx.subscribe())));
    // From here on the engine owns the only sender.
    drop(event_tx);

    if let Err(e) = engine.start().await {
        engine.report_failure(&e);
        drop(engine);
        finish_alerts(alerter_handle).await;
        return Err(e.into());
    }

    let now = Utc::now();
    let threshold = match args.threshold {
        Some(threshold) => threshold,
        None => {
            let cache = ThresholdCache::from_settings(&config.strategy, repo)?;
            match cache.fresh_threshold(now).await {
                Ok(threshold) => threshold,
                Err(e) => {
                    engine.report_failure(&e);
                    drop(engine);
                    finish_alerts(alerter_handle).await;
                    return Err(e.into());
                }
            }
        }
    };

    let inputs = CycleInputs {
        observation: RatioObservation::new(now, args.ratio, threshold),
        secondary_trend_ok: args.trend_ok,
        confirmation: args.confirmation(),
    };

    let result = engine.run_cycle(&inputs).await;
    if let Err(e) = &result {
        engine.report_failure(e);
    }
    drop(engine);

    if args.json {
        while let Ok(event) = printer_rx.try_recv() {
            if matches!(event, EngineEvent::SignalEmitted(_)) {
                println!("{}", event.to_json()?);
            }
        }
    }
    finish_alerts(alerter_handle).await;

    let outcome = result?;
    if !args.json {
        println!(
            "{} {} -> {} (N = {:.4}, V = {:.4}, crossover {})",
            outcome.record.signal_type,
            outcome.record.from,
            outcome.record.to,
            outcome.record.ratio,
            outcome.record.threshold,
            outcome.crossover,
        );
        println!("{}", outcome.record.reason);
    }
    Ok(())
}

/// Waits for the alerter to drain the channel once every sender is gone.
async fn finish_alerts(handle: Option<tokio::task::JoinHandle<()>>) {
    if let Some(handle) = handle {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Alerter task failed");
        }
    }
}

async fn handle_threshold(
    args: ThresholdArgs,
    config: &Config,
    repo: Arc<DbRepository>,
) -> anyhow::Result<()> {
    let cache = ThresholdCache::from_settings(&config.strategy, repo)?;
    let calculation = cache.refresh_threshold(&args.a, &args.b, Utc::now()).await?;
    println!(
        "V = {:.6} over {} ratios (window {})",
        calculation.v_value,
        calculation.n_values.len(),
        calculation.window
    );
    Ok(())
}

async fn handle_state(config: &Config, repo: Arc<DbRepository>) -> anyhow::Result<()> {
    let (engine, _) = build_engine(config, repo)?;
    let state = engine.current_state().await?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

async fn handle_history(args: HistoryArgs, config: &Config, repo: Arc<DbRepository>) -> anyhow::Result<()> {
    let (engine, _) = build_engine(config, repo)?;
    let signals = engine.recent_signals(args.limit).await?;
    if signals.is_empty() {
        println!("No signals recorded yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Time (UTC)", "Type", "From", "To", "N", "V", "Reason"]);
    for record in signals {
        table.add_row(vec![
            record.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            record.signal_type.to_string(),
            record.from.to_string(),
            record.to.to_string(),
            format!("{:.4}", record.ratio),
            format!("{:.4}", record.threshold),
            record.reason,
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn handle_reset(config: &Config, repo: Arc<DbRepository>) -> anyhow::Result<()> {
    let (engine, _) = build_engine(config, repo)?;
    let state = engine.reset().await?;
    println!("State reset; now holding {}.", state.current_position());
    Ok(())
}
