//! # Tippy - Entry Point
//! src/main.rs
//!
//! Loads the configuration, sets up logging, registers the static-file
//! routes and serves until Ctrl-C (or SIGTERM).

use anyhow::Context;
use tippy::config::Config;
use tippy::handlers::{not_found, serve_resource};
use tippy::server::Server;
use tokio::signal;

fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(config.log_level)
        .init();

    let address = config.address();
    let aliases = config.aliases.clone();

    let mut server = Server::new(config).with_context(|| format!("failed to set up server on {}", address))?;

    let paths: Vec<String> = server.resources().paths().map(str::to_string).collect();
    for path in &paths {
        server.register_handler(&[path.as_str()], serve_resource);
    }

    for group in &aliases {
        let group: Vec<&str> = group.iter().map(String::as_str).collect();
        server.register_handler(&group, serve_resource);
    }

    server.register_fallback(not_found);

    let pool = server.start().context("failed to start server threads")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build signal runtime")?;
    runtime
        .block_on(shutdown_signal())
        .context("failed to wait for shutdown signal")?;

    tracing::info!("shutdown signal received");
    pool.stop();

    Ok(())
}

async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;

        tokio::select! {
            res = signal::ctrl_c() => res,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await
    }
}
