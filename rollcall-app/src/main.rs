use std::path::PathBuf;

use anyhow::{Context, Result};
use bot::BotSettings;
use chrono::NaiveDate;
use clap::Parser;
use rollcall_common::observability::init_logging;
use rollcall_common::{RollcallError, RunMode};
use rollcall_config::{RollcallConfig, RollcallConfigLoader, parse_day};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
mod bot;

/// Mirror attendance notes from a chat group into Notion.
#[derive(Debug, Parser)]
#[command(name = "rollcall", version)]
struct Cli {
    /// YAML configuration file.
    #[arg(long, env = "ROLLCALL_CONFIG", default_value = "rollcall.yaml")]
    config: PathBuf,

    /// Day to extract (dd.mm.yyyy). Overrides `extraction.target_date`.
    #[arg(long, value_parser = parse_date_arg)]
    date: Option<NaiveDate>,

    /// Scroll step budget per scan. Overrides `extraction.max_steps`.
    #[arg(long)]
    max_steps: Option<usize>,

    /// Run a single scan and exit.
    #[arg(long)]
    once: bool,

    /// Extract and classify, never write to Notion.
    #[arg(long)]
    dry_run: bool,
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_day(raw).ok_or_else(|| format!("expected dd.mm.yyyy, got '{raw}'"))
}

impl Cli {
    fn settings(&self, cfg: &RollcallConfig) -> BotSettings {
        BotSettings {
            target: self.date.or_else(|| cfg.extraction.target_day()),
            max_steps: self.max_steps.unwrap_or(cfg.extraction.max_steps).max(1),
            once: self.once,
            mode: if self.dry_run { RunMode::DryRun } else { RunMode::Live },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = RollcallConfigLoader::new()
        .with_file(&cli.config)
        .load()
        .map_err(|e| RollcallError::Config(e.to_string()))
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let log_path = init_logging(cfg.logging.to_log_config("rollcall"))?;
    info!(
        config = %cli.config.display(),
        log = %log_path.display(),
        version = cfg.version.as_deref().unwrap_or("-"),
        "rollcall.start"
    );

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("rollcall.shutdown.requested");
            on_signal.cancel();
        }
    });

    let settings = cli.settings(&cfg);
    bot::run(cfg, settings, shutdown).await?;
    info!("rollcall.stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RollcallConfig {
        RollcallConfigLoader::new()
            .with_yaml_str(
                r#"
notion:
  token: ntn_abc
  parent_page_id: 1234abcd
whatsapp:
  group: Yoklama
extraction:
  target_date: "27.09.2025"
  max_steps: 30
"#,
            )
            .load()
            .unwrap()
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "rollcall",
            "--date",
            "01/10/2025",
            "--max-steps",
            "5",
            "--dry-run",
            "--once",
        ])
        .unwrap();
        let settings = cli.settings(&config());
        assert_eq!(settings.target, NaiveDate::from_ymd_opt(2025, 10, 1));
        assert_eq!(settings.max_steps, 5);
        assert_eq!(settings.mode, RunMode::DryRun);
        assert!(settings.once);
    }

    #[test]
    fn config_fills_in_missing_flags() {
        let cli = Cli::try_parse_from(["rollcall", "--config", "elsewhere.yaml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("elsewhere.yaml"));
        let settings = cli.settings(&config());
        assert_eq!(settings.target, NaiveDate::from_ymd_opt(2025, 9, 27));
        assert_eq!(settings.max_steps, 30);
        assert_eq!(settings.mode, RunMode::Live);
    }

    #[test]
    fn malformed_date_is_rejected() {
        assert!(Cli::try_parse_from(["rollcall", "--date", "2025-09-27"]).is_err());
    }
}
