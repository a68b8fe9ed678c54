//! Tradable symbol whitelist.

use crate::exchange::{ExchangeApi, ExchangeError};
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// The set of contracts trading right now, or the reason it is unknown.
///
/// An unresolved universe is empty but must never be read as "nothing is
/// tradable": [`admits`](Self::admits) lets every symbol through instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradableUniverse {
    symbols: HashSet<String>,
    failure: Option<ExchangeError>,
}

impl TradableUniverse {
    pub fn resolved(symbols: HashSet<String>) -> Self {
        Self {
            symbols,
            failure: None,
        }
    }

    pub fn unresolved(reason: ExchangeError) -> Self {
        Self {
            symbols: HashSet::new(),
            failure: Some(reason),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.failure.is_none()
    }

    /// Why resolution failed, if it did.
    pub fn failure(&self) -> Option<&ExchangeError> {
        self.failure.as_ref()
    }

    pub fn symbols(&self) -> &HashSet<String> {
        &self.symbols
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    /// Whether a symbol passes the delisted/inactive filter.
    ///
    /// Fails open: with no whitelist, everything is admitted.
    pub fn admits(&self, symbol: &str) -> bool {
        !self.is_resolved() || self.contains(symbol)
    }
}

/// Resolves the live symbol universe from exchangeInfo.
#[derive(Debug, Clone)]
pub struct UniverseResolver {
    quote_asset: String,
}

impl UniverseResolver {
    pub fn new(quote_asset: impl Into<String>) -> Self {
        Self {
            quote_asset: quote_asset.into(),
        }
    }

    pub fn quote_asset(&self) -> &str {
        &self.quote_asset
    }

    /// Fetch the whitelist. Never fails; errors become an unresolved universe.
    #[instrument(skip(self, client))]
    pub async fn resolve(&self, client: &dyn ExchangeApi) -> TradableUniverse {
        match client.get_futures_exchange_info().await {
            Ok(info) => {
                let symbols: HashSet<String> = info
                    .symbols
                    .into_iter()
                    .filter(|s| s.is_trading() && s.symbol.ends_with(&self.quote_asset))
                    .map(|s| s.symbol)
                    .collect();
                debug!(tradable = symbols.len(), "Resolved tradable universe");
                TradableUniverse::resolved(symbols)
            }
            Err(e) => {
                warn!("Failed to resolve tradable universe: {}", e);
                TradableUniverse::unresolved(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::StaticExchange;

    #[tokio::test]
    async fn test_resolve_keeps_trading_usdt_symbols() {
        let exchange = StaticExchange::new().with_symbols(&[
            ("BTCUSDT", "TRADING"),
            ("ETHUSDT", "TRADING"),
            ("LUNAUSDT", "SETTLING"),
            ("BTCUSDC", "TRADING"),
            ("OLDUSDT", "PENDING_TRADING"),
        ]);

        let universe = UniverseResolver::new("USDT").resolve(&exchange).await;

        assert!(universe.is_resolved());
        assert_eq!(universe.symbols().len(), 2);
        assert!(universe.contains("BTCUSDT"));
        assert!(universe.contains("ETHUSDT"));
        assert!(!universe.contains("LUNAUSDT"));
        assert!(!universe.contains("BTCUSDC"));
    }

    #[tokio::test]
    async fn test_resolve_failure_is_unresolved_not_empty() {
        let mut exchange = StaticExchange::new();
        exchange.fail_symbols(ExchangeError::Timeout);

        let universe = UniverseResolver::new("USDT").resolve(&exchange).await;

        assert!(!universe.is_resolved());
        assert!(universe.symbols().is_empty());
        assert_eq!(universe.failure(), Some(&ExchangeError::Timeout));
        // Unknown universe admits everything
        assert!(universe.admits("ANYUSDT"));
    }

    #[tokio::test]
    async fn test_resolved_empty_universe_admits_nothing() {
        let exchange = StaticExchange::new().with_symbols(&[]);

        let universe = UniverseResolver::new("USDT").resolve(&exchange).await;

        assert!(universe.is_resolved());
        assert!(!universe.admits("BTCUSDT"));
    }

    #[tokio::test]
    async fn test_resolve_is_not_cached() {
        let exchange = StaticExchange::new().with_symbols(&[("BTCUSDT", "TRADING")]);
        let resolver = UniverseResolver::new("USDT");

        let first = resolver.resolve(&exchange).await;
        let second = resolver.resolve(&exchange).await;

        assert_eq!(first, second);
        assert_eq!(exchange.info_calls(), 2);
    }
}
