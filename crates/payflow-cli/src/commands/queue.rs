//! Queue commands - Inspect and drain pending writes
//!
//! - `payflow queue` lists writes waiting for replay
//! - `payflow flush` replays them now

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::output::get_formatter;
use crate::session::{CliContext, Session};

#[derive(Debug, Args)]
pub struct QueueCommand {}

impl QueueCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let session = Session::open(&ctx.config).await?;

        let result = session.engine.pending_mutations().await;
        session.close().await;
        let pending = result.context("Failed to read mutation queue")?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::to_value(&pending)?);
            return Ok(());
        }

        if pending.is_empty() {
            formatter.success("No pending changes");
            return Ok(());
        }

        formatter.success(&format!("{} pending change(s)", pending.len()));
        for (position, mutation) in pending.iter().enumerate() {
            let queued_at = mutation
                .queued_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string());
            formatter.info(&format!(
                "{:>3}. {:<6} {:<7} {:<40} {}",
                position + 1,
                mutation.kind.to_string(),
                mutation.method.to_string(),
                mutation.url,
                queued_at
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct FlushCommand {}

impl FlushCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let session = Session::open(&ctx.config).await?;

        if !session.engine.is_online() {
            session.close().await;
            formatter.warn("Server unreachable, nothing was replayed");
            return Ok(());
        }

        let result = session.engine.flush_queue().await;
        session.close().await;
        let report = result.context("Failed to flush mutation queue")?;

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            remaining = report.remaining,
            "Flush finished"
        );

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::to_value(&report)?);
        } else if report.attempted == 0 {
            formatter.success("No pending changes");
        } else if report.halted() {
            formatter.warn(&format!(
                "Replayed {} of {} change(s); {} still pending",
                report.succeeded,
                report.succeeded + report.remaining,
                report.remaining
            ));
        } else {
            formatter.success(&format!("Replayed {} change(s)", report.succeeded));
        }

        Ok(())
    }
}
