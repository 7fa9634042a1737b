//! Koku report payloads.
//!
//! Report endpoints answer with a JSON document shaped like:
//!
//! ```json
//! {
//!   "group_by": {"account": ["*"]},
//!   "filter": {"resolution": "daily", "time_scope_value": "-10"},
//!   "data": [
//!     {"date": "2018-07-01", "accounts": [
//!       {"account": "9999", "values": [
//!         {"date": "2018-07-01", "account": "9999", "units": "USD", "total": 15.21}
//!       ]}
//!     ]}
//!   ],
//!   "total": {"value": 15.21, "units": "USD"}
//! }
//! ```
//!
//! The nesting inside `data` depends on the requested `group_by` dimensions,
//! so the payload is kept as a [`serde_json::Value`] instead of a fixed struct.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::{count_from_json, decimal_from_json};
use crate::error::ReportError;

/// The reporting endpoints served by Koku.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Cost report; line items carry a decimal `total` cost.
    Cost,
    /// Storage inventory report; line items carry a decimal `total` usage.
    Storage,
    /// Instance-type inventory report; line items carry an integer `count`.
    Instance,
}

impl ReportKind {
    /// All report kinds, in the order the check command runs them.
    pub const ALL: [Self; 3] = [Self::Cost, Self::Storage, Self::Instance];

    /// Endpoint path relative to the API root (`api/v1/`).
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Cost => "reports/costs/",
            Self::Storage => "reports/inventory/storage/",
            Self::Instance => "reports/inventory/instance-type/",
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cost => "cost",
            Self::Storage => "storage",
            Self::Instance => "instance",
        }
    }

    /// Whether the report is validated by summing `count` instead of `total`.
    #[must_use]
    pub const fn counts_instances(self) -> bool {
        matches!(self, Self::Instance)
    }
}

/// A decoded report document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report(Value);

impl Report {
    /// Wrap an already decoded JSON document.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// Decode a report from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Parse`] if the bytes are not valid JSON.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ReportError> {
        Ok(Self(serde_json::from_slice(bytes)?))
    }

    /// Filter parameters echoed back by the server.
    #[must_use]
    pub fn filter(&self) -> Option<&Value> {
        self.field("filter")
    }

    /// `order_by` parameters echoed back by the server.
    #[must_use]
    pub fn order_by(&self) -> Option<&Value> {
        self.field("order_by")
    }

    /// `group_by` parameters echoed back by the server.
    #[must_use]
    pub fn group_by(&self) -> Option<&Value> {
        self.field("group_by")
    }

    /// The server's summary block.
    #[must_use]
    pub fn total(&self) -> Option<&Value> {
        self.field("total")
    }

    /// The nested report rows.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.field("data")
    }

    /// `total.value` as an exact decimal.
    #[must_use]
    pub fn total_value(&self) -> Option<Decimal> {
        self.total()?.get("value").and_then(decimal_from_json)
    }

    /// `total.count` as an integer.
    #[must_use]
    pub fn total_count(&self) -> Option<i64> {
        self.total()?.get("count").and_then(count_from_json)
    }

    /// Borrow the whole document.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the report, returning the JSON document.
    #[must_use]
    pub fn into_inner(self) -> Value {
        self.0
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }
}

impl From<Value> for Report {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl FromStr for Report {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(serde_json::from_str(s)?))
    }
}
