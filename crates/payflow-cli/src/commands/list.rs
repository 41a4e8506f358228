//! List command - Show the debt list
//!
//! Reads from the server when reachable, otherwise from the local cache,
//! and says which one it used.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use payflow_sync::ListSource;

use crate::output::get_formatter;
use crate::session::{CliContext, Session};

#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show unpaid debts
    #[arg(long)]
    pub unpaid: bool,
}

impl ListCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let session = Session::open(&ctx.config).await?;

        let result = session.engine.fetch_list().await;
        session.close().await;
        let mut outcome = result.context("Failed to load debts")?;

        if self.unpaid {
            outcome.data.retain(|r| !r.paid());
        }

        info!(count = outcome.data.len(), source = %outcome.source, "Listed debts");

        if ctx.format.is_json() {
            let json = serde_json::to_value(&outcome).context("Failed to serialize debt list")?;
            formatter.print_json(&json);
            return Ok(());
        }

        if outcome.source == ListSource::Cache {
            formatter.warn("Server unreachable, showing cached data");
        }
        formatter.success(&format!("{} debts ({})", outcome.data.len(), outcome.source));
        for record in &outcome.data {
            formatter.record(record);
        }

        Ok(())
    }
}
