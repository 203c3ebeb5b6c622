use std::{fs, path::Path};

use clap::Parser;
use harrier::{
    config::load_config,
    core::error::HarrierError,
    server::{serve, AppState},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "harrier",
    about = "User-agent threat scanner with a live dashboard feed"
)]
struct Cli {
    /// Path to config file (TOML). Default: config/harrier.toml
    #[arg(long)]
    config: Option<String>,
    /// Bind address for the HTTP/WS listener
    #[arg(long)]
    bind: Option<String>,
    /// SQLite path for the event log
    #[arg(long)]
    db_path: Option<String>,
    /// Webhook URL for immediate alerts (Slack/Generic)
    #[arg(long)]
    webhook_url: Option<String>,
    /// Baseline risk score for unmatched traffic
    #[arg(long)]
    baseline: Option<u8>,
    /// Increase verbosity (info, debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Optional log file path
    #[arg(long, default_value = "data/harrier.log")]
    log_file: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli)?;

    let mut cfg = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        cfg.bind_addr = bind;
    }
    if let Some(db_path) = cli.db_path {
        cfg.db_path = db_path;
    }
    if let Some(webhook_url) = cli.webhook_url {
        cfg.alerts.webhook_url = Some(webhook_url);
    }
    if let Some(baseline) = cli.baseline {
        cfg.baseline_score = baseline;
    }

    let bind_addr = cfg.bind_addr.clone();
    let state = AppState::new(cfg)?;
    serve(state, &bind_addr).await?;
    Ok(())
}

fn init_tracing(cli: &Cli) -> Result<(), HarrierError> {
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let log_path = Path::new(&cli.log_file);
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).map_err(|e| HarrierError::Config(e.to_string()))?;
    }
    if log_path.exists() {
        if let Ok(meta) = fs::metadata(log_path) {
            if meta.len() > 1_000_000 {
                let rotated = log_path.with_extension("log.1");
                let _ = fs::rename(log_path, rotated);
            }
        }
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| HarrierError::Config(e.to_string()))?;

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(false);

    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| HarrierError::Config(e.to_string()))
}
