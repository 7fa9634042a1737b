//! Summing line items and comparing the result with server totals.
//!
//! Cost and storage sums use [`Decimal`] so that adding hundreds of daily
//! rows does not drift. Numbers are parsed from their JSON text, never through
//! an `f64`.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::warn;

use crate::error::ReportError;
use crate::line_items::LineItem;

/// Parse a JSON number or numeric string as an exact decimal.
///
/// Returns `None` for `null`, other JSON types, and text that is not a
/// decimal number.
#[must_use]
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };

    let parsed = Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text));
    match parsed {
        Ok(decimal) => Some(decimal),
        Err(err) => {
            warn!(value = %text, error = %err, "Unparseable decimal in report");
            None
        }
    }
}

/// Parse a JSON number or numeric string as an integer count.
///
/// Integral decimals such as `3.0` are accepted; fractional counts are
/// logged and rejected.
#[must_use]
pub fn count_from_json(value: &Value) -> Option<i64> {
    if let Some(count) = value.as_i64() {
        return Some(count);
    }

    let decimal = decimal_from_json(value)?;
    if decimal.fract().is_zero() {
        if let Some(count) = decimal.to_i64() {
            return Some(count);
        }
    }

    warn!(value = %decimal, "Non-integral instance count in report");
    None
}

/// Sum the `total` field of every item.
///
/// Missing or null totals count as zero. An empty slice yields `None` so that
/// "nothing to sum" stays distinguishable from a zero sum.
#[must_use]
pub fn sum_totals(items: &[LineItem]) -> Option<Decimal> {
    if items.is_empty() {
        return None;
    }

    Some(items.iter().fold(Decimal::ZERO, |acc, item| {
        acc.saturating_add(item.total().unwrap_or(Decimal::ZERO))
    }))
}

/// Sum the `count` field of every item, with the same empty-slice rule as
/// [`sum_totals`].
#[must_use]
pub fn sum_counts(items: &[LineItem]) -> Option<i64> {
    if items.is_empty() {
        return None;
    }

    Some(
        items
            .iter()
            .fold(0_i64, |acc, item| acc.saturating_add(item.count().unwrap_or(0))),
    )
}

/// Allowed absolute difference between a server total and a computed one.
///
/// The server rounds its own totals, so an exact comparison of decimal sums
/// would fail spuriously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deviation(Decimal);

impl Deviation {
    /// Tolerance of one unit (dollar, GB-month, ...).
    pub const DEFAULT: Self = Self(Decimal::ONE);

    /// Exact comparison.
    pub const EXACT: Self = Self(Decimal::ZERO);

    /// Create a tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NegativeDeviation`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, ReportError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ReportError::NegativeDeviation(amount));
        }
        Ok(Self(amount))
    }

    /// The tolerance as a decimal.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Whether `expected - d <= computed <= expected + d`.
    #[must_use]
    pub fn admits(self, expected: Decimal, computed: Decimal) -> bool {
        expected.saturating_sub(self.0) <= computed && computed <= expected.saturating_add(self.0)
    }
}

impl Default for Deviation {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Deviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "±{}", self.0)
    }
}

/// Outcome of comparing a report's line items with its summary block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalCheck {
    /// The computed aggregate is within tolerance of the server total.
    Matched {
        /// `total.value` or `total.count` from the server.
        expected: Decimal,
        /// Sum over the line items.
        computed: Decimal,
    },
    /// The computed aggregate is outside the tolerance.
    Mismatch {
        /// `total.value` or `total.count` from the server.
        expected: Decimal,
        /// Sum over the line items.
        computed: Decimal,
        /// Tolerance that was applied.
        deviation: Deviation,
    },
    /// The report holds no line items, so there is nothing to compare.
    NoLineItems,
    /// Line items exist but the server sent no total to compare against.
    MissingServerTotal {
        /// Sum over the line items.
        computed: Decimal,
    },
}

impl TotalCheck {
    /// Compare a computed aggregate with the server's value.
    #[must_use]
    pub fn evaluate(
        expected: Option<Decimal>,
        computed: Option<Decimal>,
        deviation: Deviation,
    ) -> Self {
        match (expected, computed) {
            (_, None) => Self::NoLineItems,
            (None, Some(computed)) => Self::MissingServerTotal { computed },
            (Some(expected), Some(computed)) if deviation.admits(expected, computed) => {
                Self::Matched { expected, computed }
            }
            (Some(expected), Some(computed)) => Self::Mismatch {
                expected,
                computed,
                deviation,
            },
        }
    }

    /// Whether the report passes validation. A report without line items
    /// passes: the server then reports a null total as well.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Matched { .. } | Self::NoLineItems)
    }
}

impl fmt::Display for TotalCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched { expected, computed } => {
                write!(f, "matched: server {expected}, line items {computed}")
            }
            Self::Mismatch {
                expected,
                computed,
                deviation,
            } => write!(
                f,
                "mismatch: server {expected}, line items {computed} (allowed {deviation})"
            ),
            Self::NoLineItems => write!(f, "no line items"),
            Self::MissingServerTotal { computed } => {
                write!(f, "server sent no total, line items {computed}")
            }
        }
    }
}
