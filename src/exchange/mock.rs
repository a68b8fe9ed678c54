//! In-memory exchange for driving scans without network access.

use super::error::ExchangeError;
use super::traits::ExchangeApi;
use super::types::*;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};

/// Exchange stub that serves canned responses.
///
/// Each endpoint returns a clone of its configured result on every call, so
/// a test can flip a response between cycles with the setters.
#[derive(Debug)]
pub struct StaticExchange {
    exchange_info: Result<FuturesExchangeInfo, ExchangeError>,
    brackets: Result<Vec<LeverageBracket>, ExchangeError>,
    info_calls: AtomicU64,
    bracket_calls: AtomicU64,
}

impl Default for StaticExchange {
    fn default() -> Self {
        Self {
            exchange_info: Ok(FuturesExchangeInfo {
                symbols: Vec::new(),
            }),
            brackets: Ok(Vec::new()),
            info_calls: AtomicU64::new(0),
            bracket_calls: AtomicU64::new(0),
        }
    }
}

impl StaticExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve these symbols from exchangeInfo as `(symbol, status)`.
    pub fn with_symbols(mut self, symbols: &[(&str, &str)]) -> Self {
        self.set_symbols(symbols);
        self
    }

    /// Serve these `(symbol, first-tier leverage)` pairs from leverageBracket.
    pub fn with_leverage(mut self, leverage: &[(&str, u32)]) -> Self {
        self.set_leverage(leverage);
        self
    }

    pub fn set_symbols(&mut self, symbols: &[(&str, &str)]) {
        self.exchange_info = Ok(FuturesExchangeInfo {
            symbols: symbols
                .iter()
                .map(|(symbol, status)| symbol_info(symbol, status))
                .collect(),
        });
    }

    pub fn set_leverage(&mut self, leverage: &[(&str, u32)]) {
        self.brackets = Ok(leverage
            .iter()
            .map(|(symbol, lev)| bracket(symbol, *lev))
            .collect());
    }

    /// Make exchangeInfo fail with `err`.
    pub fn fail_symbols(&mut self, err: ExchangeError) {
        self.exchange_info = Err(err);
    }

    /// Make leverageBracket fail with `err`.
    pub fn fail_leverage(&mut self, err: ExchangeError) {
        self.brackets = Err(err);
    }

    /// Number of exchangeInfo requests served.
    pub fn info_calls(&self) -> u64 {
        self.info_calls.load(Ordering::Relaxed)
    }

    /// Number of leverageBracket requests served.
    pub fn bracket_calls(&self) -> u64 {
        self.bracket_calls.load(Ordering::Relaxed)
    }
}

fn symbol_info(symbol: &str, status: &str) -> FuturesSymbolInfo {
    FuturesSymbolInfo {
        symbol: symbol.to_string(),
        status: status.to_string(),
    }
}

fn bracket(symbol: &str, initial_leverage: u32) -> LeverageBracket {
    LeverageBracket {
        symbol: symbol.to_string(),
        brackets: vec![NotionalBracket {
            initial_leverage,
            notional_cap: Decimal::from(5_000),
        }],
    }
}

#[async_trait]
impl ExchangeApi for StaticExchange {
    async fn get_futures_exchange_info(&self) -> Result<FuturesExchangeInfo, ExchangeError> {
        self.info_calls.fetch_add(1, Ordering::Relaxed);
        self.exchange_info.clone()
    }

    async fn get_leverage_brackets(&self) -> Result<Vec<LeverageBracket>, ExchangeError> {
        self.bracket_calls.fetch_add(1, Ordering::Relaxed);
        self.brackets.clone()
    }
}
