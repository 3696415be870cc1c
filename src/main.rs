use std::{net::SocketAddr, path::Path, sync::Arc};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use gddo_redirect::{
    adapters::{Fallback, HttpHandler, build_event_sink, build_router},
    config::{
        ServerConfigValidator,
        models::{FallbackConfig, TelemetryConfig},
    },
    core::{RedirectHandler, RedirectSettings},
    tracing_setup,
    utils::GracefulShutdown,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Start the redirect server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config).await,
        Some(Commands::Init { config }) => init_config_command(&config).await,
        Some(Commands::Serve { config }) => serve(&config).await,
        None => serve(&args.config).await,
    }
}

async fn serve(config_path: &str) -> Result<()> {
    use gddo_redirect::config::loader::load_config;

    let config = load_config(config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    ServerConfigValidator::validate(&config)
        .map_err(|e| eyre!("Invalid configuration in {config_path}:\n{e}"))?;

    tracing_setup::init_tracing(&config.logging)
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .context("Failed to parse listen address")?;

    let settings = RedirectSettings::try_from(&config.redirect)
        .context("Failed to build redirect settings")?;
    let (sink, telemetry_task) =
        build_event_sink(&config.telemetry).context("Failed to create telemetry sink")?;
    let fallback =
        Fallback::from_config(&config.fallback).context("Failed to create fallback handler")?;

    let app = build_router(Arc::new(HttpHandler::new(RedirectHandler::new(
        fallback, sink, settings,
    ))));

    let graceful_shutdown = Arc::new(GracefulShutdown::new());
    let signal_handler_shutdown = graceful_shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal_handler_shutdown.run_signal_handler().await {
            tracing::error!("Signal handler error: {}", e);
        }
    });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to address {addr}"))?;

    tracing::info!(
        listen_addr = %addr,
        legacy_host = %config.redirect.legacy_host,
        successor_host = %config.redirect.successor_host,
        fallback = fallback_kind(&config.fallback),
        telemetry = telemetry_kind(&config.telemetry),
        "gddo-redirect server starting"
    );

    let server_shutdown = graceful_shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let reason = server_shutdown.wait_for_shutdown_signal().await;
            tracing::info!("Shutdown signal received: {:?}", reason);
        })
        .await
        .context("Server error")?;

    // The router, and with it every sink handle, is gone once serve returns.
    if let Some(task) = telemetry_task {
        match tokio::time::timeout(graceful_shutdown.drain_timeout(), task).await {
            Ok(Ok(())) => tracing::info!("Pending telemetry flushed"),
            Ok(Err(e)) => tracing::error!("Telemetry task failed: {}", e),
            Err(_) => tracing::warn!("Timed out flushing pending telemetry"),
        }
    }

    tracing::info!("Graceful shutdown completed");
    Ok(())
}

fn fallback_kind(config: &FallbackConfig) -> &'static str {
    match config {
        FallbackConfig::Static { .. } => "static",
        FallbackConfig::Proxy { .. } => "proxy",
    }
}

fn telemetry_kind(config: &TelemetryConfig) -> &'static str {
    match config {
        TelemetryConfig::Disabled => "disabled",
        TelemetryConfig::Log => "log",
        TelemetryConfig::Http { .. } => "http",
    }
}

/// Validate configuration file and exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    use gddo_redirect::config::loader::load_config;

    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    match ServerConfigValidator::validate(&config) {
        Ok(()) => {
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Listen Address: {}", config.listen_addr);
            println!(
                "   • Redirect: {} -> {}",
                config.redirect.legacy_host, config.redirect.successor_host
            );
            println!("   • Toggle Cookie: {}", config.redirect.cookie_name);
            println!("   • Fallback: {}", fallback_kind(&config.fallback));
            println!("   • Telemetry: {}", telemetry_kind(&config.telemetry));
            println!();
            println!("🎉 Configuration is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            println!();
            println!("💡 Common fixes:");
            println!("   • Ensure all URLs start with http:// or https://");
            println!("   • Use a bare host name for successor_host (no scheme or port)");
            println!("   • Verify listen address format (e.g., '127.0.0.1:8080')");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# gddo-redirect configuration

# The address to listen on
listen_addr = "127.0.0.1:8080"

[redirect]
legacy_host = "godoc.org"
successor_host = "pkg.go.dev"
attribution_source = "godoc"
cookie_name = "pkggodev-redirect"
return_marker = "backtogodoc"
exempt_host_prefixes = ["api."]

# Requests that are not redirected are answered here
[fallback]
type = "static"
# type = "proxy"
# target = "http://localhost:3000"
# timeout_secs = 30

# One event per request
[telemetry]
sink = "log"
# sink = "http"
# endpoint = "http://localhost:9000/events"
# buffer_size = 1024
# batch_size = 100
# flush_interval_ms = 1000

[logging]
level = "info"
json = false
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'gddo-redirect serve --config {config_path}' to start the server");
    Ok(())
}
