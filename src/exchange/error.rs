//! Errors raised by exchange requests.

use thiserror::Error;

/// Why a request to the exchange produced no usable data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// The request did not complete within its timeout
    #[error("request timed out")]
    Timeout,
    /// Connection, TLS or other transport failure
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-2xx response (bad signature, invalid key, server error, ...)
    #[error("exchange returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// Response body was not the expected JSON shape
    #[error("malformed payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ExchangeError {
    /// The request URL is dropped: for signed requests it carries the
    /// timestamp and signature, which must not reach the logs.
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            ExchangeError::Timeout
        } else if err.is_decode() {
            ExchangeError::Decode(err.to_string())
        } else {
            ExchangeError::Transport(err.to_string())
        }
    }
}
