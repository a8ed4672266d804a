// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `medvault tick`: run passes once, outside the interval loop.

use std::sync::Arc;

use medvault_config::MedvaultConfig;
use medvault_core::{Clock, MedvaultError, PluginAdapter, SystemClock};
use medvault_engine::{PassKind, PassReport, build_scheduler};
use medvault_notify::build_notifier;
use medvault_storage::SqliteStore;
use tracing::warn;

use crate::serve::init_tracing;

pub async fn run_tick(
    config: MedvaultConfig,
    kinds: &[PassKind],
    json: bool,
) -> Result<(), MedvaultError> {
    init_tracing(&config.service.log_level);

    let store = Arc::new(SqliteStore::open(&config.storage).await?);
    let notifier = build_notifier(&config.notifier)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let scheduler = build_scheduler(&config, store.clone(), notifier.clone(), clock);

    let mut outcome = Ok(());
    for kind in kinds {
        match scheduler.run_once(*kind).await {
            Ok(Some(report)) => print_report(&report, json)?,
            Ok(None) => println!("{kind} pass skipped: a previous pass is still running"),
            Err(e) => {
                outcome = Err(e);
                break;
            }
        }
    }

    if let Err(e) = notifier.shutdown().await {
        warn!(error = %e, "notifier shutdown failed");
    }
    if let Err(e) = store.shutdown().await {
        warn!(error = %e, "store shutdown failed");
    }
    outcome
}

fn print_report(report: &PassReport, json: bool) -> Result<(), MedvaultError> {
    if json {
        let rendered = serde_json::to_string_pretty(report)
            .map_err(|e| MedvaultError::Internal(format!("could not render report: {e}")))?;
        println!("{rendered}");
    } else {
        println!("{report}");
    }
    Ok(())
}
