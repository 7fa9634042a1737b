//! Report sessions: fetch a report and validate its totals.

use async_trait::async_trait;
use hansei_core::{
    Deviation, LineItem, Report, ReportAggregator, ReportKind, ReportQuery, TotalCheck,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::client::KokuClient;
use crate::error::ClientError;

/// Source of report documents.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET` the report endpoint at `path` with the given query pairs.
    async fn get_report(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Report, ClientError>;
}

#[async_trait]
impl Transport for KokuClient {
    async fn get_report(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Report, ClientError> {
        let value: Value = self.get_json(path, query).await?;
        Ok(Report::new(value))
    }
}

/// One report endpoint and the last report fetched from it.
///
/// Line items are derived from the stored report on first use and cached
/// until the next [`get`](Self::get).
#[derive(Debug)]
pub struct ReportSession<T = KokuClient> {
    transport: T,
    kind: ReportKind,
    aggregator: ReportAggregator,
}

impl<T: Transport> ReportSession<T> {
    /// A session for `kind` with no report fetched yet.
    #[must_use]
    pub fn new(transport: T, kind: ReportKind) -> Self {
        Self {
            transport,
            kind,
            aggregator: ReportAggregator::new(),
        }
    }

    /// Session on the cost report.
    #[must_use]
    pub fn cost(transport: T) -> Self {
        Self::new(transport, ReportKind::Cost)
    }

    /// Session on the storage inventory report.
    #[must_use]
    pub fn storage(transport: T) -> Self {
        Self::new(transport, ReportKind::Storage)
    }

    /// Session on the instance-type inventory report.
    #[must_use]
    pub fn instance(transport: T) -> Self {
        Self::new(transport, ReportKind::Instance)
    }

    /// Which endpoint this session reads.
    #[must_use]
    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    /// The transport used for requests.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the report for `query` and make it current.
    ///
    /// Cached line items are dropped before the request. If the request
    /// fails the previous report stays stored.
    ///
    /// # Errors
    ///
    /// Returns the transport error for failed requests and error statuses.
    #[instrument(skip(self, query), fields(kind = self.kind.as_str(), query = %query))]
    pub async fn get(&mut self, query: &ReportQuery) -> Result<&Report, ClientError> {
        self.aggregator.invalidate();
        let report = self
            .transport
            .get_report(self.kind.path(), &query.to_query_pairs())
            .await?;
        debug!("Fetched report");
        Ok(self.aggregator.replace(report))
    }

    /// The last fetched report.
    #[must_use]
    pub fn report(&self) -> Option<&Report> {
        self.aggregator.report()
    }

    /// The underlying aggregator.
    #[must_use]
    pub fn aggregator(&self) -> &ReportAggregator {
        &self.aggregator
    }

    /// `filter` of the last report.
    #[must_use]
    pub fn filter(&self) -> Option<&Value> {
        self.aggregator.filter()
    }

    /// `order_by` of the last report.
    #[must_use]
    pub fn order_by(&self) -> Option<&Value> {
        self.aggregator.order_by()
    }

    /// `group_by` of the last report.
    #[must_use]
    pub fn group_by(&self) -> Option<&Value> {
        self.aggregator.group_by()
    }

    /// `total` of the last report.
    #[must_use]
    pub fn total(&self) -> Option<&Value> {
        self.aggregator.total()
    }

    /// `data` of the last report.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.aggregator.data()
    }

    /// Line items of the last report.
    #[must_use]
    pub fn line_items(&self) -> &[LineItem] {
        self.aggregator.line_items()
    }

    /// Summed `total` of the line items.
    #[must_use]
    pub fn total_cost_or_usage(&self) -> Option<Decimal> {
        self.aggregator.total_cost_or_usage()
    }

    /// Summed `count` of the line items.
    #[must_use]
    pub fn total_count(&self) -> Option<i64> {
        self.aggregator.total_count()
    }

    /// Validate the last report: instance reports compare counts exactly,
    /// the others compare totals within `deviation`.
    #[must_use]
    pub fn check(&self, deviation: Deviation) -> TotalCheck {
        if self.kind.counts_instances() {
            self.aggregator.check_count()
        } else {
            self.aggregator.check_total(deviation)
        }
    }
}
