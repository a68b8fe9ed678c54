//! Configuration management for the leverage sentinel.
//!
//! Loads settings from environment variables and config files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::monitor::ResetPolicy;

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Binance API credentials
    #[serde(default)]
    pub binance: BinanceConfig,
    /// Scan and change detection parameters
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Webhook notification settings
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinanceConfig {
    /// API key for authentication
    #[serde(default)]
    pub api_key: String,
    /// Secret key for signing requests
    #[serde(default)]
    pub secret_key: String,
    /// Use testnet instead of production
    #[serde(default)]
    pub testnet: bool,
    /// Overrides the futures REST base URL (takes precedence over `testnet`)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Optional `recvWindow` sent with signed requests
    #[serde(default)]
    pub recv_window_ms: Option<u64>,
}

impl BinanceConfig {
    /// Whether both halves of the signing credentials are present.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.secret_key.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Contracts whose max initial leverage is strictly below this are risky
    #[serde(default = "default_risk_threshold")]
    pub risk_threshold: u32,
    /// Quote currency of the monitored contracts
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,
    /// Delay between the end of one cycle and the start of the next
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Timeout for the exchangeInfo whitelist request
    #[serde(default = "default_universe_timeout")]
    pub universe_timeout_secs: u64,
    /// Timeout for the signed leverageBracket request
    #[serde(default = "default_bracket_timeout")]
    pub bracket_timeout_secs: u64,
    /// What a failed scan does to the known risky set
    #[serde(default)]
    pub reset_policy: ResetPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// DingTalk-compatible robot webhook; alerts are disabled when unset
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// First line of every alert (DingTalk keyword filters match on it)
    #[serde(default = "default_alert_title")]
    pub title: String,
    /// Webhook request timeout
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_risk_threshold() -> u32 {
    20
}

fn default_quote_asset() -> String {
    "USDT".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_universe_timeout() -> u64 {
    5
}

fn default_bracket_timeout() -> u64 {
    10
}

fn default_alert_title() -> String {
    "🚨 [Binance Risk Alert]".to_string()
}

fn default_notify_timeout() -> u64 {
    10
}

impl Config {
    /// Load configuration from environment variables and config files.
    ///
    /// `file` is a config file stem (e.g. `sentinel` for `sentinel.toml`).
    pub fn load(file: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("SENTINEL")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.apply_env_fallbacks(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Fill unset credentials from the conventional unprefixed variables.
    fn apply_env_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.binance.api_key.is_empty() {
            if let Some(key) = lookup("BINANCE_API_KEY") {
                self.binance.api_key = key;
            }
        }
        if self.binance.secret_key.is_empty() {
            if let Some(secret) = lookup("BINANCE_SECRET_KEY") {
                self.binance.secret_key = secret;
            }
        }
        if self.notify.webhook_url.is_none() {
            self.notify.webhook_url = lookup("DINGTALK_WEBHOOK_URL").filter(|url| !url.is_empty());
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.monitor.risk_threshold >= 1,
            "risk_threshold must be at least 1"
        );

        anyhow::ensure!(
            !self.monitor.quote_asset.is_empty(),
            "quote_asset must not be empty"
        );

        anyhow::ensure!(
            self.monitor.poll_interval_secs >= 1,
            "poll_interval_secs must be at least 1"
        );

        anyhow::ensure!(
            self.monitor.universe_timeout_secs >= 1 && self.notify.timeout_secs >= 1,
            "timeouts must be at least 1 second"
        );

        anyhow::ensure!(
            self.monitor.bracket_timeout_secs > self.monitor.universe_timeout_secs,
            "bracket_timeout_secs must be longer than universe_timeout_secs"
        );

        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            risk_threshold: default_risk_threshold(),
            quote_asset: default_quote_asset(),
            poll_interval_secs: default_poll_interval(),
            universe_timeout_secs: default_universe_timeout(),
            bracket_timeout_secs: default_bracket_timeout(),
            reset_policy: ResetPolicy::default(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            title: default_alert_title(),
            timeout_secs: default_notify_timeout(),
        }
    }
}
