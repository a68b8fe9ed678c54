//! Leverage risk monitoring.
//!
//! Contains the core logic for:
//! - Resolving the tradable symbol whitelist
//! - Classifying contracts by max leverage
//! - Detecting contracts that newly became high-risk
//! - Running a full scan-and-diff cycle and rendering its report

mod cycle;
mod detector;
pub mod report;
mod resolver;
mod scanner;

pub use cycle::{CycleReport, Monitor};
pub use detector::{KnownCoins, ResetPolicy, Transition};
pub use resolver::{TradableUniverse, UniverseResolver};
pub use scanner::{RiskScanner, RiskyContract, ScanOutcome, ScanStatus};
