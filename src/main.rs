//! memchat - chat with your memory backend
//!
#![doc = "memchat - chat with your memory backend"]
#![doc = "Main entry point for the memchat application."]

use anyhow::Result;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use memchat::cli::{Cli, Commands};
use memchat::commands;
use memchat::config::{Config, LoggingConfig, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let config = Config::load(config_path, &cli)?;

    // Initialize tracing (stderr; stdout belongs to the surface protocol)
    init_tracing(&config.logging, cli.verbose);
    match &config.source {
        Some(source) => tracing::debug!("Loaded configuration from {}", source.display()),
        None => tracing::warn!("Config file not found at {}, using defaults", config_path),
    }

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve {
            workspace,
            question,
        } => {
            tracing::info!("Starting chat host on stdio");
            if let Some(q) = &question {
                tracing::debug!("Prefilling question: {}", q);
            }
            commands::serve::run_serve(config, workspace, question).await?;
            Ok(())
        }
        Commands::Ask {
            text,
            file,
            lines,
            json,
        } => {
            tracing::info!("Asking memory backend");
            if let Some(path) = &file {
                tracing::debug!("Attaching context from: {}", path.display());
            }
            commands::ask::run_ask(&config, &text, file.as_deref(), lines.as_deref(), json)
                .await?;
            Ok(())
        }
        Commands::Summarize { json } => {
            tracing::info!("Requesting memory summary");
            commands::ask::run_summarize(&config, json).await?;
            Ok(())
        }
        Commands::Health => {
            tracing::info!("Checking memory backend health");
            commands::health::run_health(&config).await?;
            Ok(())
        }
        Commands::Register { api_key } => {
            tracing::info!("Registering client");
            commands::register::run_register(&config, api_key).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let default_directive = if verbose {
        "memchat=debug".to_string()
    } else {
        logging.level.clone()
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}
