//! # Leverage Sentinel
//!
//! Watches Binance USDⓈ-M Futures for contracts whose maximum initial
//! leverage has dropped below a threshold, and alerts when a contract newly
//! enters that high-risk set.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `exchange`: Binance REST client, request signing and wire types
//! - `monitor`: Whitelist resolution, risk scan, and change detection
//! - `notify`: Webhook alert delivery

pub mod config;
pub mod exchange;
pub mod monitor;
pub mod notify;

pub use config::Config;
