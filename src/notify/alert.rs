//! Alert message formatting.

use chrono::{DateTime, Local};
use std::collections::BTreeSet;

/// A message to deliver through a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    symbols: Vec<String>,
    body: String,
    raised_at: DateTime<Local>,
}

impl Alert {
    /// Alert for contracts that just became high-risk.
    pub fn newly_risky(symbols: &BTreeSet<String>, raised_at: DateTime<Local>) -> Self {
        let symbols: Vec<String> = symbols.iter().cloned().collect();
        let body = format!("New high-risk contracts: {}", symbols.join(", "));
        Self {
            symbols,
            body,
            raised_at,
        }
    }

    /// Connectivity check message for the `test-webhook` command.
    pub fn test_message(raised_at: DateTime<Local>) -> Self {
        Self {
            symbols: Vec::new(),
            body: "Test message: webhook configured, sentinel is running.".to_string(),
            raised_at,
        }
    }

    /// Symbols the alert is about, sorted.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Full text content: title, body, then local `HH:MM:SS`.
    pub fn render(&self, title: &str) -> String {
        format!(
            "{}\n{}\n⏰ Time: {}",
            title,
            self.body,
            self.raised_at.format("%H:%M:%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap()
    }

    #[test]
    fn test_newly_risky_lists_symbols_sorted() {
        let symbols: BTreeSet<String> = ["ETHUSDT", "ALPACAUSDT"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let alert = Alert::newly_risky(&symbols, at());

        assert_eq!(alert.symbols(), ["ALPACAUSDT", "ETHUSDT"]);
        assert_eq!(alert.body(), "New high-risk contracts: ALPACAUSDT, ETHUSDT");
    }

    #[test]
    fn test_render_includes_title_and_time() {
        let symbols: BTreeSet<String> = std::iter::once("ETHUSDT".to_string()).collect();

        let text = Alert::newly_risky(&symbols, at()).render("[Risk]");

        assert_eq!(text, "[Risk]\nNew high-risk contracts: ETHUSDT\n⏰ Time: 09:05:07");
    }
}
