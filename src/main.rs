//! Propsearch - conversational real-estate search
//!
#![doc = "Main entry point for the propsearch binary."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use propsearch::cli::{Cli, Commands};
use propsearch::commands;
use propsearch::config::Config;
use propsearch::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let mut config = Config::load(config_path, &cli)?;

    // Validate configuration; provider settings only matter to model commands
    config.validate()?;
    if cli.command.uses_provider() {
        config.validate_provider()?;
    }

    match cli.command {
        Commands::Chat => {
            commands::chat::run_chat(config).await?;
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::run_server(config).await?;
        }
        Commands::Interpret { query } => {
            commands::interpret::run_interpret(config, &query).await?;
        }
        Commands::Import { file, replace } => {
            let store = commands::open_store(&config)?;
            commands::listings::import_listings(&store, &file, replace)?;
        }
        Commands::Search { filter } => {
            let store = commands::open_store(&config)?;
            commands::listings::search_listings(&store, &filter)?;
        }
    }

    Ok(())
}

/// Initialize tracing
///
/// Logs go to stderr so the chat transcript and JSON output on stdout stay
/// clean. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "propsearch=debug,tower_http=debug"
    } else {
        "propsearch=info,tower_http=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
