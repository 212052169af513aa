// Copyright (c) 2025 The phenomatch developers
// SPDX-License-Identifier: MIT

//! phenomatch web service
//!
//! REST API for classifying submitted sequences into phenotypes, storing
//! them in a reference corpus, and comparing new batches against it.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::util::SubscriberInitExt;

use phenomatch::service::types::health_check::HealthCheckResult;
use phenomatch::service::{create_app, spawn_health_check_task, ServiceConfig};

#[derive(Parser)]
#[command(name = "phenomatch-web")]
#[command(about = "Phenotype classification and sequence comparison web service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web service
    Serve {
        /// Configuration file path
        #[arg(short, long, default_value = "config/service.toml")]
        config: PathBuf,

        /// Override host address
        #[arg(long)]
        host: Option<String>,

        /// Override port
        #[arg(short, long)]
        port: Option<u16>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(long, default_value = "info")]
        log_level: String,

        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },

    /// Generate a sample configuration file
    Config {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/service.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Check configuration, store and text generator
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "config/service.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            log_level,
            open,
        } => serve_command(config, host, port, log_level, open).await,
        Commands::Config { output, force } => config_command(output, force),
        Commands::Check { config } => check_command(config).await,
    }
}

async fn serve_command(
    config_path: PathBuf,
    host_override: Option<String>,
    port_override: Option<u16>,
    log_level: String,
    open_browser: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(&log_level)?;

    info!("Starting phenomatch web service");

    let mut config = load_or_default_config(&config_path)?;

    if let Some(host) = host_override {
        config.server.host = host;
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e.into());
    }

    info!(
        "Configuration loaded: store={}, text_generation={}",
        config.store.backend.as_str(),
        if config.text_generation.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    let (app, state) = create_app(config.clone()).await?;

    spawn_health_check_task(state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Use localhost for the browser when bound to all interfaces
    let browser_host = if config.server.host == "0.0.0.0" {
        "localhost"
    } else {
        &config.server.host
    };
    let url = format!("http://{}:{}", browser_host, config.server.port);

    info!("phenomatch web service running on {}", url);
    info!("Service info available at {}/api/info", url);
    info!("Health check available at {}/health", url);

    if open_browser {
        if let Err(e) = open::that(format!("{}/api/info", url)) {
            error!("Failed to open browser: {}", e);
        }
    }

    axum::serve(listener, app).await?;

    Ok(())
}

fn config_command(output_path: PathBuf, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if output_path.exists() && !force {
        eprintln!(
            "Configuration file already exists: {}",
            output_path.display()
        );
        eprintln!("Use --force to overwrite");
        std::process::exit(1);
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    ServiceConfig::default().to_file(&output_path)?;

    println!(
        "Sample configuration file created: {}",
        output_path.display()
    );
    println!("Edit the file to configure the store and text generation");

    Ok(())
}

async fn check_command(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("Checking configuration and collaborators...");

    let config = load_or_default_config(&config_path)?;

    match config.validate() {
        Ok(()) => println!("Configuration is valid"),
        Err(e) => {
            println!("Configuration validation failed: {}", e);
            return Err(e.into());
        }
    }

    let (_, state) = match create_app(config).await {
        Ok(app) => app,
        Err(e) => {
            println!("Failed to initialize application: {}", e);
            return Err(e.into());
        }
    };
    println!("Application created successfully");

    println!("\nComponent Status:");
    let store_health = state.store.health_check().await;
    print_status(state.store.backend_name(), &store_health);
    match state.store.count().await {
        Ok(count) => println!("  corpus: {} records", count),
        Err(e) => println!("  corpus: unavailable - {}", e),
    }

    let generator = state.text_generator.as_ref();
    if generator.is_enabled() {
        print_status(generator.name(), &generator.health_check().await);
    } else {
        println!("  -- {}: disabled", generator.name());
    }

    println!("\nHealth check completed");
    Ok(())
}

fn print_status(name: &str, result: &HealthCheckResult) {
    match result {
        HealthCheckResult::Healthy => println!("  OK {}: Available", name),
        HealthCheckResult::Degraded { reason } => println!("  WARN {}: Degraded - {}", name, reason),
        HealthCheckResult::Unhealthy { reason } => println!("  ERROR {}: {}", name, reason),
    }
}

fn load_or_default_config(config_path: &Path) -> Result<ServiceConfig, Box<dyn std::error::Error>> {
    if config_path.exists() {
        info!("Loading configuration from {}", config_path.display());
        Ok(ServiceConfig::from_file(config_path)?)
    } else {
        info!("Configuration file not found, using defaults");
        println!(
            "WARNING: Configuration file not found: {}",
            config_path.display()
        );
        println!("TIP: Run 'phenomatch-web config' to generate a sample configuration file");
        Ok(ServiceConfig::default())
    }
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    info!("Tracing initialized with level: {}", level);

    Ok(())
}
