//! Type definitions for Binance API responses.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Exchange information for futures.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesExchangeInfo {
    pub symbols: Vec<FuturesSymbolInfo>,
}

/// Symbol information for futures.
///
/// Only the fields the whitelist reads; the rest of the exchangeInfo
/// payload is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesSymbolInfo {
    pub symbol: String,
    pub status: String,
}

impl FuturesSymbolInfo {
    /// Whether the contract is open for trading right now.
    pub fn is_trading(&self) -> bool {
        self.status == "TRADING"
    }
}

// ==================== Leverage Bracket Types ====================

/// Leverage bracket information for a symbol.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageBracket {
    pub symbol: String,
    pub brackets: Vec<NotionalBracket>,
}

impl LeverageBracket {
    /// The first (smallest notional, highest leverage) tier.
    pub fn first_tier(&self) -> Option<&NotionalBracket> {
        self.brackets.first()
    }
}

/// One notional tier of a leverage bracket.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotionalBracket {
    /// Initial leverage for this bracket
    pub initial_leverage: u32,
    /// Maximum notional value for this bracket
    #[serde(default)]
    pub notional_cap: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_leverage_brackets() {
        let body = r#"[
            {
                "symbol": "ETHUSDT",
                "notionalCoef": 1.50,
                "brackets": [
                    {"bracket": 1, "initialLeverage": 75, "notionalCap": 10000,
                     "notionalFloor": 0, "maintMarginRatio": 0.0065, "cum": 0},
                    {"bracket": 2, "initialLeverage": 50, "notionalCap": 50000,
                     "notionalFloor": 10000, "maintMarginRatio": 0.01, "cum": 35}
                ]
            }
        ]"#;

        let parsed: Vec<LeverageBracket> = serde_json::from_str(body).unwrap();
        let tier = parsed[0].first_tier().unwrap();

        assert_eq!(parsed[0].symbol, "ETHUSDT");
        assert_eq!(tier.initial_leverage, 75);
        assert_eq!(tier.notional_cap, dec!(10000));
    }

    #[test]
    fn test_parse_exchange_info_ignores_extra_fields() {
        let body = r#"{
            "timezone": "UTC",
            "symbols": [
                {"symbol": "BTCUSDT", "status": "TRADING", "contractType": "PERPETUAL",
                 "baseAsset": "BTC", "quoteAsset": "USDT", "filters": []},
                {"symbol": "OLDUSDT", "status": "SETTLING"}
            ]
        }"#;

        let info: FuturesExchangeInfo = serde_json::from_str(body).unwrap();

        assert_eq!(info.symbols.len(), 2);
        assert!(info.symbols[0].is_trading());
        assert!(!info.symbols[1].is_trading());
        assert_eq!(info.symbols[0].symbol, "BTCUSDT");
    }
}
