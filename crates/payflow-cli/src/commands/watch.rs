//! Watch command - Keep the client running and sync on reconnect
//!
//! Probes the server at the configured interval and drains the mutation
//! queue whenever connectivity returns, until SIGINT/SIGTERM.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::output::get_formatter;
use crate::session::{CliContext, Session};

#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Probe interval in seconds (overrides connectivity.probe_interval_secs)
    #[arg(long)]
    pub interval: Option<u64>,
}

impl WatchCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let interval = Duration::from_secs(
            self.interval
                .unwrap_or(ctx.config.connectivity.probe_interval_secs)
                .max(1),
        );

        let session = Session::open(&ctx.config).await?;
        let cancel = CancellationToken::new();

        let probe = session
            .monitor
            .spawn_probe(session.api.clone(), interval, cancel.clone());
        session.engine.initialize().await;

        formatter.success(&format!(
            "Watching for connectivity changes every {}s (Ctrl+C to stop)",
            interval.as_secs()
        ));

        shutdown_signal(cancel.clone()).await;

        probe.await.ok();
        let pending = session.engine.pending_mutations().await.map(|p| p.len());
        session.close().await;

        match pending {
            Ok(0) => formatter.success("Stopped; no pending changes"),
            Ok(n) => formatter.warn(&format!("Stopped; {} change(s) still pending", n)),
            Err(e) => formatter.error(&format!("Stopped; failed to read queue: {e:#}")),
        }

        Ok(())
    }
}

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}
