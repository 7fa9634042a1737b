//! Error types for report handling.

use rust_decimal::Decimal;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while building reports or checking their totals.
///
/// Traversal and aggregation never fail: malformed report shapes degrade to
/// empty line-item lists and absent aggregates.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The report body is not valid JSON.
    #[error("report is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A tolerance below zero can never be satisfied.
    #[error("deviation must not be negative: {0}")]
    NegativeDeviation(Decimal),
}
