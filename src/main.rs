//! Spotify download gateway entry point.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::http::Method;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spotify_dl_gateway::api::{create_router, AppState};
use spotify_dl_gateway::config::Config;
use spotify_dl_gateway::download::{self, IncomingRequest};
use spotify_dl_gateway::error::{Result, ServiceError};
use spotify_dl_gateway::metrics;
use spotify_dl_gateway::upstream::FabdlClient;
use spotify_dl_gateway::utils::shutdown_signal;

/// Spotify track download gateway.
#[derive(Parser, Debug)]
#[command(name = "spotify-dl-gateway")]
#[command(about = "Resolves Spotify track links into MP3 download URLs")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Resolve one track against the configured upstream and print the response.
    Resolve {
        /// Spotify track link.
        #[arg(long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    let config = Config::load();

    // Initialize logging
    let verbose = args.verbose || config.as_ref().is_ok_and(|c| c.verbose);
    let json_logs = config.as_ref().is_ok_and(Config::json_logs);
    let filter = if verbose {
        EnvFilter::new("spotify_dl_gateway=debug,info")
    } else {
        let default_level = config
            .as_ref()
            .map(|c| c.rust_log.clone())
            .unwrap_or_else(|_| "info".to_string());
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::registry()
        .with(json_logs.then(|| fmt::layer().json()))
        .with((!json_logs).then(fmt::layer))
        .with(filter)
        .init();

    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        ServiceError::from(e)
    })?;

    // Handle subcommands
    let result = match args.command {
        Some(Command::CheckConfig) => cmd_check_config(config),
        Some(Command::Resolve { url }) => cmd_resolve(config, url).await,
        Some(Command::Serve { port }) => cmd_serve(config, port.or(args.port)).await,
        None => cmd_serve(config, args.port).await,
    };

    Ok(result?)
}

/// Check configuration validity.
fn cmd_check_config(config: Config) -> Result<()> {
    println!("======================================================================");
    println!("SPOTIFY DL GATEWAY - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(ServiceError::InvalidConfig(e));
        }
    }

    print!("Building upstream client... ");
    match FabdlClient::new(&config) {
        Ok(_) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(e.into());
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Listen: {}:{}", config.bind_addr, config.port);
    println!("  Upstream: {}", config.upstream_base_url);
    println!("  Upstream Timeout: {}ms", config.upstream_timeout_ms);
    println!("  Connect Timeout: {}ms", config.upstream_connect_timeout_ms);
    println!("  User-Agent: {}", config.user_agent);
    println!(
        "  Metrics: {}",
        if config.metrics_enabled { "Enabled" } else { "Disabled" }
    );
    println!("  Log Format: {}", config.log_format);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Resolve a single track and print the JSON envelope.
async fn cmd_resolve(config: Config, url: String) -> Result<()> {
    config.validate().map_err(ServiceError::InvalidConfig)?;

    let client = FabdlClient::new(&config)?;
    let mut query = HashMap::new();
    query.insert("url".to_string(), url);
    let request = IncomingRequest::new(Method::GET, query);

    let response = download::handle(&client, &request).await;
    println!("{}", serde_json::to_string_pretty(&response.envelope())?);

    match response.error_kind() {
        Some(kind) => Err(ServiceError::Unresolved(kind)),
        None => Ok(()),
    }
}

/// Run the HTTP server until a shutdown signal arrives.
async fn cmd_serve(mut config: Config, port_override: Option<u16>) -> Result<()> {
    // Override with CLI args if provided
    if let Some(port) = port_override {
        config.port = port;
    }

    // Validate configuration
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        ServiceError::InvalidConfig(e)
    })?;

    info!("Configuration loaded successfully");
    info!("Upstream: {}", config.upstream_base_url);
    info!("Upstream timeout: {}ms", config.upstream_timeout_ms);

    let client = FabdlClient::new(&config)?;
    let mut app_state = AppState::new(client);

    if config.metrics_enabled {
        match metrics::install_prometheus() {
            Ok(handle) => app_state = app_state.with_metrics(handle),
            Err(e) => warn!("Metrics disabled: {}", e),
        }
    }

    // Start HTTP server
    let addr = SocketAddr::new(config.bind_addr, config.port);
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
