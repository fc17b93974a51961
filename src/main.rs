//! phone-lookup: entry point.
//!
//! Loads configuration, initialises structured logging and either runs
//! a single lookup (`lookup`) or serves the dashboard (`serve`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use phone_lookup::config::AppConfig;
use phone_lookup::dashboard::{self, DashboardState};
use phone_lookup::engine::{Orchestrator, Presentation};

#[derive(Parser)]
#[command(name = "phone-lookup", version, about = "Phone number compliance and identity lookup")]
struct Cli {
    /// Path to the TOML config; built-in sources are used if it is missing.
    #[arg(long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Look up one number and print the report.
    Lookup {
        /// Ten digits; separators such as "(555) 123-4567" are accepted.
        number: String,
        /// Print the report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Serve the lookup dashboard.
    Serve {
        /// Overrides `dashboard.port`.
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    let cfg = AppConfig::load_or_default(&cli.config)?;
    let orchestrator = Orchestrator::from_config(&cfg)?;
    info!(
        strategy = %orchestrator.strategy(),
        sources = ?orchestrator.merge_order(),
        max_retries = cfg.retry.max_retries,
        "phone-lookup ready"
    );

    match cli.command {
        Command::Lookup { number, json } => {
            let presentation = Presentation::new();
            match orchestrator.resolve_into(&presentation, &number).await {
                Ok(report) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        print!("{report}");
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    error!(error = %e, "Lookup failed");
                    eprintln!("{e}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Serve { port } => {
            let port = port.unwrap_or(cfg.dashboard.port);
            let state = Arc::new(DashboardState::new(orchestrator));
            dashboard::serve(state, port).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Initialise the `tracing` subscriber. Logs go to stderr so `lookup`
/// output stays pipeable.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("phone_lookup=info"));

    let json_logging = std::env::var("PHONE_LOOKUP_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
