//! SafeSite CLI
//!
//! Terminal dashboard for the SafeSite detection backend.

use anyhow::Context;
use clap::{Parser, Subcommand};
use safesite::analytics::MAX_HISTORY;
use safesite::config::{generate_default_config, Config, LoggingConfig};
use safesite::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "safesite")]
#[command(author, version, about = "SafeSite live safety dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend URL, overrides the config file
    #[arg(long, global = true)]
    backend_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll live data until interrupted. Press Enter to run a detection pass.
    Watch {
        /// Polling interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Fetch and show one reading
    Once,

    /// Run one detection pass
    Detect,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        command,
        config: config_path,
        backend_url,
    } = Cli::parse();

    match command {
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing config to {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }

        Commands::Watch { interval_ms } => {
            let (config, source, display) = prepare(config_path, backend_url)?;
            let interval = interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.poller.interval());
            watch(&config, source, display, interval).await?;
        }

        Commands::Once => {
            let (config, source, display) = prepare(config_path, backend_url)?;
            let poller =
                LiveDataPoller::new(source, display).failure_policy(config.poller.failure_policy);

            if let Some(reading) = poller.fetch_and_render().await {
                print_safety(&reading);
            }
        }

        Commands::Detect => {
            let (_, source, display) = prepare(config_path, backend_url)?;
            let trigger = DetectionTrigger::new(source, display);
            if let DetectionOutcome::CannotConnect = trigger.trigger().await {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Load config, start logging, and bind the console display
fn prepare(
    config_path: Option<PathBuf>,
    backend_url: Option<String>,
) -> anyhow::Result<(Config, Arc<dyn TelemetrySource>, DisplayContext)> {
    let loaded = match &config_path {
        Some(path) => Config::discover_at(path)?,
        None => Config::discover(),
    };

    // Config warnings are only reported once the subscriber exists
    init_logging(&loaded.config.logging);
    tracing::info!("SafeSite v{}", env!("CARGO_PKG_VERSION"));
    loaded.report();

    let mut config = loaded.config;
    if let Some(url) = backend_url {
        config.backend.url = url;
    }

    let client = BackendClient::new(config.backend.client_config())?;
    tracing::info!(
        backend = %client.config().base_url,
        timeout_ms = client.config().request_timeout_ms,
        "Using detection backend"
    );
    let source: Arc<dyn TelemetrySource> = Arc::new(client);

    let document = ConsoleDocument::new(&config.display);
    let display = DisplayContext::bind(&document, &config.display);

    Ok((config, source, display))
}

async fn watch(
    config: &Config,
    source: Arc<dyn TelemetrySource>,
    display: DisplayContext,
    interval: Duration,
) -> anyhow::Result<()> {
    let history = SharedHistory::new(MAX_HISTORY);
    let alerts = Arc::new(AlertMonitor::new());

    let poller = Arc::new(
        LiveDataPoller::new(Arc::clone(&source), display.clone())
            .failure_policy(config.poller.failure_policy)
            .observer(Arc::new(history.clone()))
            .observer(alerts),
    );
    let trigger = Arc::new(DetectionTrigger::new(source, display));

    let handle = poller.start_polling(interval)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line {
                Ok(Some(_)) => {
                    let _ = trigger.trigger_detached();
                }
                // stdin closed: keep polling until interrupted
                Ok(None) | Err(_) => {
                    tokio::signal::ctrl_c().await?;
                    break;
                }
            },
        }
    }

    handle.stop().await;

    let stats = poller.stats();
    tracing::info!(
        requests = stats.requests,
        successes = stats.successes,
        failures = stats.failures,
        "Polling summary"
    );

    let snapshot = history.snapshot();
    if let Some(latest) = snapshot.latest() {
        println!();
        print_safety(&latest.reading);
    }
    if let Some(score) = snapshot.predicted_score() {
        let risk = RiskLevel::from_score(score as u8);
        println!(
            "🧠 Predicted Safety Score: {:.1} ({} risk, {})",
            score,
            risk,
            risk.advice()
        );
    }

    Ok(())
}

fn print_safety(reading: &SensorReading) {
    let score = safety_score(reading);
    let risk = RiskLevel::from_score(score);
    println!("Site Safety Score: {} ({} risk, {})", score, risk, risk.advice());

    if let Some(alert) = Alert::evaluate(reading) {
        println!("{}", alert.message());
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("safesite={}", config.level)));

    // Readouts go to stdout, logs to stderr
    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
