//! One scan-and-diff cycle.
//!
//! The loop that repeats cycles lives in the binary; everything here runs
//! once per call, so tests drive it without timers.

use super::detector::{KnownCoins, ResetPolicy};
use super::scanner::{RiskScanner, RiskyContract, ScanStatus};
use crate::exchange::ExchangeApi;
use crate::notify::{Alert, Notifier};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// What one cycle hands to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub risky: Vec<RiskyContract>,
    pub whitelist_resolved: bool,
    /// Symbols that entered the risky set this cycle (sorted)
    pub newly_risky: Vec<String>,
    pub scanned_at: DateTime<Utc>,
    #[serde(skip)]
    pub status: ScanStatus,
}

impl CycleReport {
    /// Why the data is degraded or missing, if it is.
    pub fn problem(&self) -> Option<String> {
        match &self.status {
            ScanStatus::Complete => None,
            ScanStatus::Degraded(reason) => {
                Some(format!("whitelist unresolved, showing unfiltered data ({})", reason))
            }
            ScanStatus::Failed(reason) => Some(format!("no data this cycle ({})", reason)),
        }
    }
}

/// Runs scans, tracks changes between them, and raises alerts.
pub struct Monitor {
    scanner: RiskScanner,
    notifier: Option<Arc<dyn Notifier>>,
    reset_policy: ResetPolicy,
}

impl Monitor {
    pub fn new(scanner: RiskScanner, reset_policy: ResetPolicy) -> Self {
        Self {
            scanner,
            notifier: None,
            reset_policy,
        }
    }

    /// Deliver newly-risky alerts through `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn scanner(&self) -> &RiskScanner {
        &self.scanner
    }

    /// One-shot scan with no change detection and no alert.
    #[instrument(skip(self, client))]
    pub async fn scan_once(&self, client: &dyn ExchangeApi) -> CycleReport {
        let outcome = self.scanner.scan(client).await;
        CycleReport {
            whitelist_resolved: outcome.whitelist_resolved(),
            risky: outcome.risky,
            newly_risky: Vec::new(),
            scanned_at: Utc::now(),
            status: outcome.status,
        }
    }

    /// Scan, diff against `known`, alert on new entrants, and return the
    /// report together with the state for the next cycle.
    #[instrument(skip(self, client, known))]
    pub async fn run_cycle(
        &self,
        client: &dyn ExchangeApi,
        known: KnownCoins,
    ) -> (CycleReport, KnownCoins) {
        let outcome = self.scanner.scan(client).await;
        let transition = known.advance(&outcome, self.reset_policy);

        if !transition.newly_risky.is_empty() {
            info!(
                newly_risky = ?transition.newly_risky,
                "New high-risk contracts detected"
            );
            self.notify(Alert::newly_risky(&transition.newly_risky, Local::now()))
                .await;
        }

        let report = CycleReport {
            whitelist_resolved: outcome.whitelist_resolved(),
            risky: outcome.risky,
            newly_risky: transition.newly_risky.into_iter().collect(),
            scanned_at: Utc::now(),
            status: outcome.status,
        };

        (report, transition.known)
    }

    async fn notify(&self, alert: Alert) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        if let Err(e) = notifier.send(&alert).await {
            warn!("Failed to deliver alert: {}", e);
        }
    }
}
