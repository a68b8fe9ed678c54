//! The exchange seam used by the scanner.
//!
//! The live implementation is [`BinanceClient`](super::BinanceClient); tests
//! drive the scanner with the in-memory `StaticExchange`.

use async_trait::async_trait;

use super::error::ExchangeError;
use super::types::{FuturesExchangeInfo, LeverageBracket};

/// Read access to the two endpoints a risk scan needs.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Exchange-wide instrument metadata (public, short timeout).
    async fn get_futures_exchange_info(&self) -> Result<FuturesExchangeInfo, ExchangeError>;

    /// Per-symbol leverage brackets (signed, longer timeout).
    async fn get_leverage_brackets(&self) -> Result<Vec<LeverageBracket>, ExchangeError>;
}
