//! Tally reconciliation monitor.
//!
//! Ticks every `reconciliation.interval_minutes`: optionally rebuilds every
//! projected balance from the ledger, compares cash/bank sub-ledgers with the
//! GL and, when `reconciliation.auto_fix` is set, overwrites drifted GL
//! balances. Stops on Ctrl-C.

use std::time::Duration;

use anyhow::Context;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

use tally_core::reconciliation::SyncStatus;
use tally_db::{BalanceRepository, LedgerRepository, ReconciliationRepository, connect_with};
use tally_shared::config::ReconciliationConfig;
use tally_shared::{AppConfig, telemetry};

struct Monitor {
    balances: BalanceRepository,
    ledger: LedgerRepository,
    reconciliation: ReconciliationRepository,
    config: ReconciliationConfig,
}

impl Monitor {
    async fn run_once(&self) -> anyhow::Result<()> {
        if self.config.refresh_balances {
            let refreshed = self.balances.refresh_all().await?;
            info!(accounts = refreshed, "Balances refreshed");
        }

        let duplicates = self.ledger.detect_duplicate_postings().await?;
        for duplicate in &duplicates {
            error!(
                source_type = %duplicate.source_type,
                source_id = %duplicate.source_id,
                entries = duplicate.entry_ids.len(),
                "Document has more than one live posting"
            );
        }

        let report = self.reconciliation.check_sync().await?;
        if report.status == SyncStatus::Error {
            error!(
                drifted = report.drifts.len(),
                total_delta = %report.total_abs_delta(),
                "Widespread sub-ledger drift"
            );
        }

        if self.config.auto_fix && !report.is_in_sync() {
            let summary = self.reconciliation.auto_fix(&report).await?;
            if !summary.stale.is_empty() {
                warn!(
                    stale = summary.stale.len(),
                    "Some drifts changed before they could be fixed"
                );
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate()?;
    telemetry::init(&config.logging)?;

    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    let monitor = Monitor {
        balances: BalanceRepository::new(db.clone()),
        ledger: LedgerRepository::new(db.clone()),
        reconciliation: ReconciliationRepository::new(db),
        config: config.reconciliation.clone(),
    };

    let period = Duration::from_secs(config.reconciliation.interval_minutes.saturating_mul(60));
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        interval_minutes = config.reconciliation.interval_minutes,
        auto_fix = config.reconciliation.auto_fix,
        refresh_balances = config.reconciliation.refresh_balances,
        "Reconciliation monitor started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = monitor.run_once().await {
                    error!(error = %e, "Reconciliation cycle failed");
                }
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for shutdown signal")?;
                info!("Shutting down reconciliation monitor");
                break;
            }
        }
    }

    Ok(())
}
