//! Change detection between consecutive scans.
//!
//! The detector only ever compares against the previous cycle's risky set.
//! A contract that leaves the risky set and later returns alerts again.

use super::scanner::ScanOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What a failed scan (no leverage data) does to the known set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Failed cycles are not observations: keep the previous set, alert nothing.
    #[default]
    HoldOnFailure,
    /// Every cycle overwrites the known set, so a failure empties it and the
    /// next successful scan re-alerts everything still risky.
    Overwrite,
}

/// The risky symbols seen on the previous cycle.
///
/// Starts uninitialized, which is different from an empty set: the first
/// observation never alerts, but an observation after an empty one does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownCoins {
    symbols: Option<BTreeSet<String>>,
}

/// Result of feeding one scan into the detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State to carry into the next cycle
    pub known: KnownCoins,
    /// Symbols risky now that were not risky last cycle
    pub newly_risky: BTreeSet<String>,
}

impl KnownCoins {
    /// State before any cycle has run.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    /// State as if the previous cycle observed exactly `symbols`.
    pub fn observed<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: Some(symbols.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.symbols.is_some()
    }

    pub fn symbols(&self) -> Option<&BTreeSet<String>> {
        self.symbols.as_ref()
    }

    /// Diff a scan against this state and produce the next state.
    pub fn advance(self, outcome: &ScanOutcome, policy: ResetPolicy) -> Transition {
        if outcome.is_failed() && policy == ResetPolicy::HoldOnFailure {
            return Transition {
                known: self,
                newly_risky: BTreeSet::new(),
            };
        }

        let current = outcome.symbols();
        let newly_risky = match &self.symbols {
            None => BTreeSet::new(),
            Some(previous) => current.difference(previous).cloned().collect(),
        };

        Transition {
            known: KnownCoins {
                symbols: Some(current),
            },
            newly_risky,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::ExchangeError;
    use crate::monitor::scanner::{RiskyContract, ScanStatus};
    use rust_decimal::Decimal;

    fn outcome(contracts: &[(&str, u32)]) -> ScanOutcome {
        ScanOutcome {
            risky: contracts
                .iter()
                .map(|(symbol, leverage)| RiskyContract {
                    symbol: symbol.to_string(),
                    leverage: *leverage,
                    notional_cap: Decimal::ZERO,
                })
                .collect(),
            status: ScanStatus::Complete,
        }
    }

    fn failed() -> ScanOutcome {
        ScanOutcome {
            risky: Vec::new(),
            status: ScanStatus::Failed(ExchangeError::Timeout),
        }
    }

    fn set(symbols: &[&str]) -> BTreeSet<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_cycle_suppresses_alert() {
        let step = KnownCoins::uninitialized()
            .advance(&outcome(&[("BTCUSDT", 10)]), ResetPolicy::HoldOnFailure);

        assert!(step.newly_risky.is_empty());
        assert_eq!(step.known.symbols(), Some(&set(&["BTCUSDT"])));
    }

    #[test]
    fn test_detects_new_entrant_only() {
        let step = KnownCoins::observed(["BTCUSDT"]).advance(
            &outcome(&[("BTCUSDT", 10), ("ETHUSDT", 15)]),
            ResetPolicy::HoldOnFailure,
        );

        assert_eq!(step.newly_risky, set(&["ETHUSDT"]));
        assert_eq!(step.known.symbols(), Some(&set(&["BTCUSDT", "ETHUSDT"])));
    }

    #[test]
    fn test_unchanged_state_is_idempotent() {
        let scan = outcome(&[("BTCUSDT", 10), ("ETHUSDT", 15)]);

        let first = KnownCoins::uninitialized().advance(&scan, ResetPolicy::HoldOnFailure);
        let second = first.known.advance(&scan, ResetPolicy::HoldOnFailure);

        assert!(second.newly_risky.is_empty());
    }

    #[test]
    fn test_state_is_replaced_not_accumulated() {
        let step = KnownCoins::observed(["BTCUSDT", "ETHUSDT"])
            .advance(&outcome(&[("SOLUSDT", 8)]), ResetPolicy::HoldOnFailure);

        assert_eq!(step.newly_risky, set(&["SOLUSDT"]));
        assert_eq!(step.known.symbols(), Some(&set(&["SOLUSDT"])));
    }

    #[test]
    fn test_reset_and_reappear_alerts_again() {
        let empty = KnownCoins::observed(["BTCUSDT"])
            .advance(&outcome(&[]), ResetPolicy::HoldOnFailure);
        assert!(empty.newly_risky.is_empty());
        assert_eq!(empty.known.symbols(), Some(&BTreeSet::new()));
        assert!(empty.known.is_initialized());

        let back = empty
            .known
            .advance(&outcome(&[("BTCUSDT", 10)]), ResetPolicy::HoldOnFailure);
        assert_eq!(back.newly_risky, set(&["BTCUSDT"]));
    }

    #[test]
    fn test_hold_on_failure_keeps_previous_state() {
        let known = KnownCoins::observed(["BTCUSDT", "ETHUSDT"]);

        let step = known.clone().advance(&failed(), ResetPolicy::HoldOnFailure);
        assert_eq!(step.known, known);
        assert!(step.newly_risky.is_empty());

        let recovered = step.known.advance(
            &outcome(&[("BTCUSDT", 10), ("ETHUSDT", 15)]),
            ResetPolicy::HoldOnFailure,
        );
        assert!(recovered.newly_risky.is_empty());
    }

    #[test]
    fn test_overwrite_policy_realerts_after_failure() {
        let step = KnownCoins::observed(["BTCUSDT", "ETHUSDT"])
            .advance(&failed(), ResetPolicy::Overwrite);
        assert!(step.newly_risky.is_empty());
        assert_eq!(step.known.symbols(), Some(&BTreeSet::new()));

        let recovered = step.known.advance(
            &outcome(&[("BTCUSDT", 10), ("ETHUSDT", 15)]),
            ResetPolicy::Overwrite,
        );
        assert_eq!(recovered.newly_risky, set(&["BTCUSDT", "ETHUSDT"]));
    }

    #[test]
    fn test_failure_on_first_cycle_leaves_state_uninitialized() {
        let step = KnownCoins::uninitialized().advance(&failed(), ResetPolicy::HoldOnFailure);
        assert!(!step.known.is_initialized());
    }

    #[test]
    fn test_degraded_scan_counts_as_observation() {
        let degraded = ScanOutcome {
            status: ScanStatus::Degraded(ExchangeError::Timeout),
            ..outcome(&[("BTCUSDT", 10), ("LUNAUSDT", 2)])
        };

        let step = KnownCoins::observed(["BTCUSDT"]).advance(&degraded, ResetPolicy::HoldOnFailure);

        assert_eq!(step.newly_risky, set(&["LUNAUSDT"]));
    }
}
