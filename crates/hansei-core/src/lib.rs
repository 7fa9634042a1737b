//! Core report handling for hansei, the Koku functional-test client.
//!
//! This crate has no network code. It provides:
//!
//! - **Reports**: [`Report`], [`ReportKind`] and the [`ReportQuery`] builder
//! - **Line items**: [`line_items`] flattens arbitrarily nested report data
//! - **Aggregation**: exact [`Decimal`](rust_decimal::Decimal) sums,
//!   [`Deviation`] tolerances and [`TotalCheck`] outcomes
//! - **Sessions**: [`ReportAggregator`] memoizes line items per fetched report
//! - **Identifiers**: `CustomerId`, `UserId`, `ProviderId`, `PreferenceId`
//!
//! # Example
//!
//! ```
//! use hansei_core::{Deviation, Report, ReportAggregator};
//!
//! let report: Report = r#"{
//!     "data": [{"date": "2018-07-01", "values": [{"total": 10.5}, {"total": null}]}],
//!     "total": {"value": 10.5}
//! }"#.parse()?;
//!
//! let aggregator = ReportAggregator::with_report(report);
//! assert_eq!(aggregator.line_items().len(), 2);
//! assert!(aggregator.check_total(Deviation::DEFAULT).is_ok());
//! # Ok::<(), hansei_core::ReportError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod aggregate;
pub mod aggregator;
pub mod error;
pub mod ids;
pub mod line_items;
pub mod query;
pub mod report;

pub use aggregate::{count_from_json, decimal_from_json, sum_counts, sum_totals, Deviation, TotalCheck};
pub use aggregator::ReportAggregator;
pub use error::{ReportError, Result};
pub use ids::{CustomerId, IdError, PreferenceId, ProviderId, UserId};
pub use line_items::{is_empty_node, line_items, LineItem};
pub use query::{OrderDirection, ReportQuery};
pub use report::{Report, ReportKind};
