//! Binance USDⓈ-M Futures integration.
//!
//! Provides the two reads a risk scan needs:
//! - Instrument metadata (`exchangeInfo`) for the tradable whitelist
//! - Signed leverage brackets (`leverageBracket`) for max leverage per symbol

mod client;
mod error;
#[cfg(test)]
mod mock;
mod traits;
mod types;

pub use client::{build_query, sign_query, BinanceClient};
pub use error::ExchangeError;
#[cfg(test)]
pub use mock::StaticExchange;
pub use traits::ExchangeApi;
pub use types::*;
