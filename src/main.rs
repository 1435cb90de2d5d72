use clap::Parser;
use ropewar::config::MatchConfig;
use ropewar::error::{Result, RopewarError};
use ropewar::referee::GameController;
use ropewar::{events, reporter};
use std::path::PathBuf;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ropewar", about = "Tug-of-war multi-agent simulation")]
struct Cli {
    /// Path to the match configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    config: PathBuf,

    /// Emit one JSON line per match event instead of tables
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let cfg = MatchConfig::load(&cli.config)?;
    cfg.validate()
        .map_err(|errors| RopewarError::Validation(errors.join("; ")))?;
    info!(config = %cli.config.display(), "configuration loaded");

    let (event_tx, event_rx) = events::channel();
    let reporter = tokio::spawn(reporter::run(event_rx, cli.json));

    let controller = GameController::launch(cfg, event_tx)?;
    tokio::select! {
        result = controller.run() => {
            result?;
        }
        _ = signal::ctrl_c() => {
            info!("interrupted, shutting down");
            return Ok(());
        }
    }

    // The event sender went down with the controller; the reporter
    // drains what is left and exits.
    let _ = reporter.await;
    Ok(())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ropewar=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
