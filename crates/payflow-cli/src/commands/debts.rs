//! Add, update and delete commands
//!
//! Each write goes to the server first. When the server cannot be reached
//! the change is applied to the local cache, queued, and reported as
//! pending instead of failing.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;
use tracing::info;

use payflow_core::domain::{RecordId, RecordPayload};

use crate::output::get_formatter;
use crate::session::{CliContext, Session};

/// Debt fields accepted by `add` and `update`
#[derive(Debug, Args)]
pub struct DebtFields {
    /// Debtor name
    #[arg(long)]
    pub name: Option<String>,

    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Box (account group) name
    #[arg(long = "box-name")]
    pub box_name: Option<String>,

    /// Amount owed
    #[arg(long)]
    pub amount: Option<String>,

    /// Debt date (ISO 8601)
    #[arg(long)]
    pub date: Option<String>,

    /// Free-form note
    #[arg(long)]
    pub note: Option<String>,

    /// Paid flag
    #[arg(long)]
    pub paid: Option<bool>,

    /// Extra field as KEY=VALUE; VALUE is parsed as JSON when possible
    #[arg(long = "field", value_name = "KEY=VALUE")]
    pub extra: Vec<String>,
}

impl DebtFields {
    /// Builds the request body from the given flags
    pub fn to_payload(&self) -> Result<RecordPayload> {
        let mut payload = RecordPayload::new();

        let strings = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("boxName", &self.box_name),
            ("amount", &self.amount),
            ("date", &self.date),
            ("note", &self.note),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                payload.insert(key, value.clone());
            }
        }

        if let Some(paid) = self.paid {
            payload.insert("paid", paid);
        }

        for pair in &self.extra {
            let (key, raw) = parse_field(pair)?;
            let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::from(raw));
            payload.insert(key, value);
        }

        Ok(payload)
    }
}

fn parse_field(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => bail!("Invalid field '{}', expected KEY=VALUE", pair),
    }
}

fn parse_id(raw: &str) -> Result<RecordId> {
    RecordId::new(raw.to_string()).context("Invalid debt ID")
}

// ============================================================================
// add
// ============================================================================

#[derive(Debug, Args)]
pub struct AddCommand {
    #[command(flatten)]
    pub fields: DebtFields,
}

impl AddCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let payload = self.fields.to_payload()?;
        if payload.is_empty() {
            bail!("No fields given; use --name, --phone, --box-name, --amount, --date");
        }

        let session = Session::open(&ctx.config).await?;
        let result = session.engine.create(payload).await;
        session.close().await;
        let outcome = result.context("Failed to create debt")?;

        info!(queued = outcome.queued, "Create finished");

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::to_value(&outcome)?);
        } else if let Some(temp_id) = &outcome.temp_id {
            formatter.queued("server unreachable, debt saved locally");
            formatter.info(&format!("Temporary ID: {}", temp_id));
        } else {
            let id = outcome
                .data
                .as_ref()
                .and_then(|d| d.get("_id"))
                .and_then(Value::as_str)
                .unwrap_or("-");
            formatter.success(&format!("Debt created ({})", id));
        }

        Ok(())
    }
}

// ============================================================================
// update
// ============================================================================

#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Debt ID
    pub id: String,

    #[command(flatten)]
    pub fields: DebtFields,
}

impl UpdateCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let id = parse_id(&self.id)?;
        let payload = self.fields.to_payload()?;
        if payload.is_empty() {
            bail!("Nothing to update");
        }

        let session = Session::open(&ctx.config).await?;
        let result = session.engine.update(&id, payload).await;
        session.close().await;
        let outcome = result.with_context(|| format!("Failed to update debt {}", id))?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::to_value(&outcome)?);
        } else if outcome.queued {
            formatter.queued(&format!("server unreachable, update to {} saved locally", id));
        } else {
            formatter.success(&format!("Debt {} updated", id));
        }

        Ok(())
    }
}

// ============================================================================
// delete
// ============================================================================

#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Debt ID
    pub id: String,
}

impl DeleteCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let id = parse_id(&self.id)?;

        let session = Session::open(&ctx.config).await?;
        let result = session.engine.delete(&id).await;
        session.close().await;
        let outcome = result.with_context(|| format!("Failed to delete debt {}", id))?;

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::to_value(&outcome)?);
        } else if outcome.queued {
            formatter.queued(&format!("server unreachable, {} removed locally", id));
        } else {
            formatter.success(&format!("Debt {} deleted", id));
        }

        Ok(())
    }
}
