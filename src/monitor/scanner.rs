//! Leverage risk scanner.

use super::resolver::{TradableUniverse, UniverseResolver};
use crate::exchange::{ExchangeApi, ExchangeError, LeverageBracket};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, instrument, trace, warn};

/// A contract whose max initial leverage is below the risk threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskyContract {
    pub symbol: String,
    /// Initial leverage of the first (most permissive notional) bracket
    pub leverage: u32,
    /// Notional cap of that bracket
    pub notional_cap: Decimal,
}

/// How much of a scan could be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    /// Both the whitelist and the leverage brackets were fetched
    Complete,
    /// Brackets fetched but the whitelist was not; results are unfiltered
    /// and may include delisted contracts
    Degraded(ExchangeError),
    /// Leverage brackets could not be fetched; no data this cycle
    Failed(ExchangeError),
}

/// Result of a single scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub risky: Vec<RiskyContract>,
    pub status: ScanStatus,
}

impl ScanOutcome {
    /// Whether the risky list was filtered through a live whitelist.
    pub fn whitelist_resolved(&self) -> bool {
        matches!(self.status, ScanStatus::Complete)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ScanStatus::Failed(_))
    }

    /// Symbols of the risky contracts.
    pub fn symbols(&self) -> BTreeSet<String> {
        self.risky.iter().map(|c| c.symbol.clone()).collect()
    }
}

/// Reasons a bracket record is not reported as risky.
#[derive(Debug, Clone, Copy)]
enum SkipReason {
    QuoteMismatch,
    NotTradable,
    NoBrackets,
    Safe,
}

/// Classifies contracts by max leverage against a fixed threshold.
#[derive(Debug, Clone)]
pub struct RiskScanner {
    resolver: UniverseResolver,
    risk_threshold: u32,
}

impl RiskScanner {
    pub fn new(quote_asset: impl Into<String>, risk_threshold: u32) -> Self {
        Self {
            resolver: UniverseResolver::new(quote_asset),
            risk_threshold,
        }
    }

    pub fn risk_threshold(&self) -> u32 {
        self.risk_threshold
    }

    /// Whether a max leverage value counts as risky (strictly below threshold).
    pub fn is_risky(&self, max_leverage: u32) -> bool {
        max_leverage < self.risk_threshold
    }

    /// Run one scan: fetch brackets, resolve the whitelist, filter, classify.
    ///
    /// Never fails. A bracket fetch failure yields an empty, `Failed` outcome;
    /// a whitelist failure yields an unfiltered, `Degraded` outcome.
    #[instrument(skip(self, client))]
    pub async fn scan(&self, client: &dyn ExchangeApi) -> ScanOutcome {
        let brackets = match client.get_leverage_brackets().await {
            Ok(brackets) => brackets,
            Err(e) => {
                warn!("Failed to fetch leverage brackets: {}", e);
                return ScanOutcome {
                    risky: Vec::new(),
                    status: ScanStatus::Failed(e),
                };
            }
        };

        let universe = self.resolver.resolve(client).await;
        let risky = self.classify(&brackets, &universe);

        let status = match universe.failure() {
            None => ScanStatus::Complete,
            Some(reason) => ScanStatus::Degraded(reason.clone()),
        };

        ScanOutcome { risky, status }
    }

    /// Filter bracket records through the universe and keep the risky ones.
    pub fn classify(
        &self,
        brackets: &[LeverageBracket],
        universe: &TradableUniverse,
    ) -> Vec<RiskyContract> {
        let mut skipped_quote = 0usize;
        let mut skipped_inactive = 0usize;
        let mut skipped_malformed = 0usize;
        let mut safe = 0usize;

        let risky: Vec<RiskyContract> = brackets
            .iter()
            .filter_map(|record| match self.classify_record(record, universe) {
                Ok(contract) => Some(contract),
                Err(reason) => {
                    match reason {
                        SkipReason::QuoteMismatch => skipped_quote += 1,
                        SkipReason::NotTradable => skipped_inactive += 1,
                        SkipReason::NoBrackets => skipped_malformed += 1,
                        SkipReason::Safe => safe += 1,
                    }
                    None
                }
            })
            .collect();

        info!(
            total = brackets.len(),
            risky = risky.len(),
            safe,
            skipped_quote,
            skipped_inactive,
            skipped_malformed,
            whitelist_resolved = universe.is_resolved(),
            threshold = self.risk_threshold,
            "Leverage scan complete"
        );

        risky
    }

    fn classify_record(
        &self,
        record: &LeverageBracket,
        universe: &TradableUniverse,
    ) -> Result<RiskyContract, SkipReason> {
        let symbol = &record.symbol;

        if !symbol.ends_with(self.resolver.quote_asset()) {
            return Err(SkipReason::QuoteMismatch);
        }

        if !universe.admits(symbol) {
            trace!(symbol = %symbol, "Skipping contract outside tradable universe");
            return Err(SkipReason::NotTradable);
        }

        let Some(tier) = record.first_tier() else {
            return Err(SkipReason::NoBrackets);
        };

        if !self.is_risky(tier.initial_leverage) {
            return Err(SkipReason::Safe);
        }

        Ok(RiskyContract {
            symbol: symbol.clone(),
            leverage: tier.initial_leverage,
            notional_cap: tier.notional_cap,
        })
    }
}
