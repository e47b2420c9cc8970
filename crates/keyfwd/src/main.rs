//! keyfwd entry point.
//!
//! Parses the command line, loads configuration, initialises logging, builds
//! the platform capability for the chosen role, and runs the relay until
//! Ctrl-C or SIGTERM.
//!
//! ```text
//! main()
//!  └─ load_config()             -- TOML file + CLI/env overrides
//!  └─ init_tracing()            -- RUST_LOG, else config log_level
//!  └─ client | server
//!       ├─ KeySource / KeySink  (platform adapter)
//!       └─ host::run_until()    (blocking start() + signal → stop())
//! ```

mod cli;
mod config;
mod host;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keyfwd_client::{ClientRelay, KeySource};
use keyfwd_core::ForwardedKeySet;
use keyfwd_server::{KeySink, ServerRelay};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app_config = config::load_config(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(&app_config.log_level);

    match cli.command {
        Command::Client { .. } => {
            let config = app_config
                .client(cli.client_overrides())
                .context("resolving client configuration")?;
            info!(
                "keyfwd client starting: {}:{} forwarding {} key codes",
                config.hostname,
                config.port,
                config.forwarded_keys.len()
            );
            let source = key_source(config.forwarded_keys.clone())?;
            let relay = Arc::new(ClientRelay::new(config, source));
            host::run_until(Arc::clone(&relay), host::shutdown_signal())
                .await
                .context("client relay failed")?;
            info!("keyfwd client stopped ({:?})", relay.stats());
        }
        Command::Server { .. } => {
            let config = app_config
                .server(cli.server_overrides())
                .context("resolving server configuration")?;
            info!("keyfwd server starting on UDP port {}", config.port);
            let sink = key_sink()?;
            let relay = Arc::new(ServerRelay::new(config, sink));
            host::run_until(relay, host::shutdown_signal())
                .await
                .context("server relay failed")?;
            info!("keyfwd server stopped");
        }
    }
    Ok(())
}

/// Structured logging.  `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(target_os = "windows")]
fn key_source(keys: ForwardedKeySet) -> anyhow::Result<Arc<dyn KeySource>> {
    use keyfwd_client::infrastructure::key_capture::windows::WindowsKeySource;
    Ok(Arc::new(WindowsKeySource::new(keys)))
}

#[cfg(not(target_os = "windows"))]
fn key_source(_keys: ForwardedKeySet) -> anyhow::Result<Arc<dyn KeySource>> {
    Err(keyfwd_client::CaptureError::UnsupportedPlatform(std::env::consts::OS.to_string()).into())
}

#[cfg(target_os = "windows")]
fn key_sink() -> anyhow::Result<Arc<dyn KeySink>> {
    use keyfwd_server::infrastructure::key_emulation::windows::WindowsKeySink;
    Ok(Arc::new(WindowsKeySink::new()))
}

#[cfg(target_os = "linux")]
fn key_sink() -> anyhow::Result<Arc<dyn KeySink>> {
    use keyfwd_server::infrastructure::key_emulation::linux::XTestKeySink;
    let sink = XTestKeySink::new().context("opening the X display for key emulation")?;
    Ok(Arc::new(sink))
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
fn key_sink() -> anyhow::Result<Arc<dyn KeySink>> {
    Err(keyfwd_server::SinkError::UnsupportedPlatform(std::env::consts::OS.to_string()).into())
}
