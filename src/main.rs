//! Arduino Mentor - terminal mentoring assistant for Arduino builds
//!
#![doc = "Arduino Mentor - terminal mentoring assistant for Arduino builds"]
#![doc = "Main entry point for the arduino-mentor binary."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arduino_mentor::cli::{Cli, Commands};
use arduino_mentor::commands::{self, Session};
use arduino_mentor::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match &cli.command {
        Commands::Shell => tracing::info!("Starting interactive shell"),
        Commands::Chat { stream, .. } => {
            tracing::info!("Sending a single chat message");
            if *stream {
                tracing::debug!("Streaming reply requested");
            }
        }
        Commands::Prefs { .. } => tracing::info!("Managing preferences"),
        command => tracing::info!("Running {:?}", command),
    }

    let mut session = Session::start(config, cli.name.as_deref(), cli.email.as_deref())?;
    commands::run_command(&mut session, cli.command).await?;
    Ok(())
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins over `--verbose`. Logs go to stderr so they never mix
/// with replies printed on stdout.
fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose {
        "arduino_mentor=debug"
    } else {
        "arduino_mentor=warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
