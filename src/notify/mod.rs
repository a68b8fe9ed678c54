//! Outbound alert delivery.
//!
//! Delivery is best effort: callers log a [`NotifyError`] and carry on, it
//! never feeds back into change detection.

mod alert;
mod webhook;

use async_trait::async_trait;
use thiserror::Error;

pub use alert::Alert;
pub use webhook::WebhookNotifier;

/// Why an alert was not delivered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("webhook transport error: {0}")]
    Transport(String),
    #[error("webhook returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The robot accepted the request but refused the message (e.g. keyword filter)
    #[error("webhook rejected message ({code}): {message}")]
    Rejected { code: i64, message: String },
}

/// A destination for alerts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError>;
}
