//! tokenmint server entrypoint.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

mod config;
mod server;
mod telemetry;

use config::Cli;
use tokenmint_api::build_app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config().context("invalid configuration")?;

    telemetry::init(config.log_format)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        token_url = %config.token_url,
        "Starting tokenmint"
    );

    let addr = config.bind_addr();
    let grace = config.shutdown_grace();
    let state = server::build_state(config)?;
    let app = build_app(Arc::new(state));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "Listening");

    server::serve(listener, app, grace, server::shutdown_signal()).await
}
