//! Binance Futures REST API client.

use crate::config::BinanceConfig;
use crate::exchange::error::ExchangeError;
use crate::exchange::traits::ExchangeApi;
use crate::exchange::types::*;
use anyhow::{Context, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, instrument};

const FUTURES_BASE_URL: &str = "https://fapi.binance.com";
const FUTURES_TESTNET_URL: &str = "https://testnet.binancefuture.com";

const DEFAULT_UNIVERSE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_BRACKET_TIMEOUT: Duration = Duration::from_secs(10);

/// Compute the hex-encoded HMAC-SHA256 of `query` keyed with `secret`.
///
/// Binance verifies this over the exact query string bytes, so the caller
/// must sign the same string it sends.
pub fn sign_query(secret: &str, query: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Serialize parameters in the given order as `k=v&k=v`, URL-encoding values.
pub fn build_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Binance USDⓈ-M futures client for the whitelist and leverage endpoints.
#[derive(Clone)]
pub struct BinanceClient {
    http: Client,
    api_key: String,
    secret_key: String,
    base_url: String,
    recv_window_ms: Option<u64>,
    universe_timeout: Duration,
    bracket_timeout: Duration,
}

impl BinanceClient {
    /// Create a new Binance client from configuration.
    pub fn new(config: &BinanceConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = match &config.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if config.testnet => FUTURES_TESTNET_URL.to_string(),
            None => FUTURES_BASE_URL.to_string(),
        };

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
            base_url,
            recv_window_ms: config.recv_window_ms,
            universe_timeout: DEFAULT_UNIVERSE_TIMEOUT,
            bracket_timeout: DEFAULT_BRACKET_TIMEOUT,
        })
    }

    /// Override the per-request timeouts.
    pub fn with_timeouts(mut self, universe: Duration, bracket: Duration) -> Self {
        self.universe_timeout = universe;
        self.bracket_timeout = bracket;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get current timestamp in milliseconds.
    fn timestamp() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Build the signed query string for an authenticated GET.
    ///
    /// `timestamp` is always first, `signature` always last.
    fn signed_query(&self, mut params: Vec<(&str, String)>, timestamp: i64) -> String {
        params.insert(0, ("timestamp", timestamp.to_string()));
        if let Some(window) = self.recv_window_ms {
            params.push(("recvWindow", window.to_string()));
        }

        let query = build_query(&params);
        let signature = sign_query(&self.secret_key, &query);
        format!("{}&signature={}", query, signature)
    }

    /// Send a request and decode a JSON body, classifying every failure.
    async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ExchangeError> {
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ExchangeError::Decode(e.to_string()))
    }

    // ==================== Market Data (Public) ====================

    /// Get futures exchange information (symbols and their trading status).
    #[instrument(skip(self))]
    pub async fn get_futures_exchange_info(&self) -> Result<FuturesExchangeInfo, ExchangeError> {
        let url = format!("{}/fapi/v1/exchangeInfo", self.base_url);
        let info: FuturesExchangeInfo =
            Self::fetch(self.http.get(&url).timeout(self.universe_timeout)).await?;

        debug!(symbols = info.symbols.len(), "Fetched futures exchange info");
        Ok(info)
    }

    // ==================== Account (Authenticated) ====================

    /// Get leverage brackets for every symbol.
    #[instrument(skip(self))]
    pub async fn get_leverage_brackets(&self) -> Result<Vec<LeverageBracket>, ExchangeError> {
        let query = self.signed_query(Vec::new(), Self::timestamp());
        let url = format!("{}/fapi/v1/leverageBracket?{}", self.base_url, query);

        let brackets: Vec<LeverageBracket> = Self::fetch(
            self.http
                .get(&url)
                .header("X-MBX-APIKEY", &self.api_key)
                .timeout(self.bracket_timeout),
        )
        .await?;

        debug!(symbols = brackets.len(), "Fetched leverage brackets");
        Ok(brackets)
    }
}

#[async_trait]
impl ExchangeApi for BinanceClient {
    async fn get_futures_exchange_info(&self) -> Result<FuturesExchangeInfo, ExchangeError> {
        BinanceClient::get_futures_exchange_info(self).await
    }

    async fn get_leverage_brackets(&self) -> Result<Vec<LeverageBracket>, ExchangeError> {
        BinanceClient::get_leverage_brackets(self).await
    }
}
