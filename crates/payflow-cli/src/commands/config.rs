//! Config command - View and validate PayFlow configuration
//!
//! Provides the `payflow config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use payflow_core::config::Config;

use crate::output::get_formatter;
use crate::session::CliContext;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Validate => self.execute_validate(ctx),
        }
    }

    fn execute_show(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let config = &ctx.config;
        let base_url = config.effective_base_url();

        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if ctx.format.is_json() {
            let json = serde_json::json!({
                "config_path": ctx.config_path.display().to_string(),
                "effective_base_url": base_url,
                "config": serde_json::to_value(config)
                    .context("Failed to serialize configuration to JSON")?,
            });
            formatter.print_json(&json);
            return Ok(());
        }

        formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
        formatter.info(&format!("Effective API base URL: {}", base_url));
        formatter.info("");

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }

        Ok(())
    }

    fn execute_validate(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let config_path = &ctx.config_path;

        // Load explicitly: a parse error must be reported, not replaced by defaults
        let config = match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                let message = if config_path.exists() {
                    format!("Failed to parse configuration: {:#}", e)
                } else {
                    "Configuration file not found. Using defaults.".to_string()
                };

                if ctx.format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [message],
                    }));
                } else {
                    formatter.error(&message);
                    formatter.info(&format!("File: {}", config_path.display()));
                }
                return Ok(());
            }
        };

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = config.validate();

        if ctx.format.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use std::path::PathBuf;

    fn context(config_path: PathBuf) -> CliContext {
        CliContext {
            format: OutputFormat::Json,
            config: Config::load_or_default(&config_path),
            config_path,
        }
    }

    #[tokio::test]
    async fn test_show_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path().join("missing.yaml"));
        assert!(ConfigCommand::Show.execute(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_reports_without_failing() {
        let dir = tempfile::tempdir().unwrap();

        let valid = dir.path().join("valid.yaml");
        std::fs::write(
            &valid,
            serde_yaml::to_string(&Config::default()).unwrap(),
        )
        .unwrap();
        assert!(ConfigCommand::Validate
            .execute(&context(valid))
            .await
            .is_ok());

        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "api: [unclosed").unwrap();
        assert!(ConfigCommand::Validate
            .execute(&context(broken))
            .await
            .is_ok());

        let missing = dir.path().join("missing.yaml");
        assert!(ConfigCommand::Validate
            .execute(&context(missing))
            .await
            .is_ok());
    }
}
