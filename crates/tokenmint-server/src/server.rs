//! Process wiring: state construction, serving and shutdown.

use anyhow::Context;
use axum::Router;
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use tokenmint_api::AppState;
use tokenmint_auth::CredentialStore;
use tokenmint_core::ServerConfig;

/// Load the credential and build the shared state.
///
/// Signs one throwaway assertion so a bad private key stops startup instead
/// of failing every token request.
pub fn build_state(config: ServerConfig) -> anyhow::Result<AppState> {
    let store = CredentialStore::load(config.credential_setting(), &config.service_account_file)
        .context("failed to load service account credential")?;
    let source = store.source().describe();

    let state = AppState::from_config(config, store.into_credential())
        .context("failed to build token client")?;

    state
        .assertions
        .build(&state.credential, Utc::now())
        .with_context(|| format!("credential from {} cannot sign assertions", source))?;

    info!(
        client_email = %state.credential.client_email,
        token_url = %state.assertions.audience(),
        scopes = ?state.assertions.scopes(),
        "Credential self-check passed"
    );
    Ok(state)
}

/// Serve `app` until `shutdown` resolves, then give in-flight requests
/// `grace` to finish before dropping them.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    grace: Duration,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            return joined.context("server task panicked")?.context("server error");
        }
        _ = shutdown => {}
    }

    info!(grace_secs = grace.as_secs(), "Shutdown signal received, draining connections");
    let _ = stop_tx.send(true);

    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => {
            joined.context("server task panicked")?.context("server error")?;
            info!("Server stopped");
        }
        Err(_) => {
            warn!("Grace period elapsed, closing remaining connections");
            server.abort();
        }
    }
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
