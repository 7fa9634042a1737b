//! Per-session report state with memoized line items.

use std::cell::OnceCell;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::aggregate::{sum_counts, sum_totals, Deviation, TotalCheck};
use crate::line_items::{is_empty_node, line_items, LineItem};
use crate::report::Report;

/// Holds the most recently fetched report and the line items derived from it.
///
/// The flattened line items are computed on first use and kept until the
/// report is replaced. One aggregator belongs to one report session; it is
/// deliberately not `Sync`.
#[derive(Debug, Default)]
pub struct ReportAggregator {
    report: Option<Report>,
    line_items: OnceCell<Vec<LineItem>>,
}

impl ReportAggregator {
    /// An aggregator with no report yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An aggregator already holding `report`.
    #[must_use]
    pub fn with_report(report: Report) -> Self {
        Self {
            report: Some(report),
            line_items: OnceCell::new(),
        }
    }

    /// Store a newly fetched report, dropping everything derived from the
    /// previous one.
    pub fn replace(&mut self, report: Report) -> &Report {
        self.invalidate();
        self.report.insert(report)
    }

    /// Forget memoized line items. The current report, if any, is kept.
    pub fn invalidate(&mut self) {
        if self.line_items.take().is_some() {
            debug!("Cleared cached report line items");
        }
    }

    /// The last stored report.
    #[must_use]
    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// See [`Report::filter`].
    #[must_use]
    pub fn filter(&self) -> Option<&Value> {
        self.report.as_ref()?.filter()
    }

    /// See [`Report::order_by`].
    #[must_use]
    pub fn order_by(&self) -> Option<&Value> {
        self.report.as_ref()?.order_by()
    }

    /// See [`Report::group_by`].
    #[must_use]
    pub fn group_by(&self) -> Option<&Value> {
        self.report.as_ref()?.group_by()
    }

    /// See [`Report::total`].
    #[must_use]
    pub fn total(&self) -> Option<&Value> {
        self.report.as_ref()?.total()
    }

    /// See [`Report::data`].
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.report.as_ref()?.data()
    }

    /// Line items of the stored report, flattened once and then cached.
    ///
    /// Empty when no report has been stored.
    #[must_use]
    pub fn line_items(&self) -> &[LineItem] {
        self.line_items.get_or_init(|| {
            let items = self.data().map(line_items).unwrap_or_default();
            debug!(count = items.len(), "Flattened report line items");
            items
        })
    }

    /// Sum of the line items' `total` (cost or storage usage).
    ///
    /// `None` when no report is stored, when `data` is empty, or when `data`
    /// holds no line items at all.
    #[must_use]
    pub fn total_cost_or_usage(&self) -> Option<Decimal> {
        self.populated_data()?;
        sum_totals(self.line_items())
    }

    /// Sum of the line items' `count` (instance reports), with the same
    /// `None` rules as [`total_cost_or_usage`](Self::total_cost_or_usage).
    #[must_use]
    pub fn total_count(&self) -> Option<i64> {
        self.populated_data()?;
        sum_counts(self.line_items())
    }

    /// Compare [`total_cost_or_usage`](Self::total_cost_or_usage) with the
    /// server's `total.value`.
    #[must_use]
    pub fn check_total(&self, deviation: Deviation) -> TotalCheck {
        let expected = self.report.as_ref().and_then(Report::total_value);
        TotalCheck::evaluate(expected, self.total_cost_or_usage(), deviation)
    }

    /// Compare [`total_count`](Self::total_count) with the server's
    /// `total.count`. Counts must match exactly.
    #[must_use]
    pub fn check_count(&self) -> TotalCheck {
        let expected = self
            .report
            .as_ref()
            .and_then(Report::total_count)
            .map(Decimal::from);
        let computed = self.total_count().map(Decimal::from);
        TotalCheck::evaluate(expected, computed, Deviation::EXACT)
    }

    fn populated_data(&self) -> Option<&Value> {
        self.data().filter(|data| !is_empty_node(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn aggregator(value: Value) -> ReportAggregator {
        ReportAggregator::with_report(Report::new(value))
    }

    #[test]
    fn nothing_fetched() {
        let agg = ReportAggregator::new();
        assert!(agg.report().is_none());
        assert!(agg.filter().is_none());
        assert!(agg.order_by().is_none());
        assert!(agg.group_by().is_none());
        assert!(agg.total().is_none());
        assert!(agg.data().is_none());
        assert!(agg.line_items().is_empty());
        assert_eq!(agg.total_cost_or_usage(), None);
        assert_eq!(agg.total_count(), None);
        assert_eq!(agg.check_total(Deviation::DEFAULT), TotalCheck::NoLineItems);
    }

    #[test]
    fn empty_or_absent_data_has_no_aggregate() {
        for report in [json!({"data": []}), json!({"total": {"value": 0}}), json!({"data": null})] {
            let agg = aggregator(report);
            assert_eq!(agg.total_cost_or_usage(), None);
            assert_eq!(agg.total_count(), None);
            assert!(agg.line_items().is_empty());
        }
    }

    #[test]
    fn data_without_values_has_no_aggregate() {
        let agg = aggregator(json!({
            "data": [{"date": "2020-01-01"}],
            "total": {"value": 0}
        }));

        assert!(agg.line_items().is_empty());
        assert_eq!(agg.total_cost_or_usage(), None);
        assert!(agg.check_total(Deviation::DEFAULT).is_ok());
    }

    #[test]
    fn grouping_order_does_not_change_totals() {
        let by_account_then_service = aggregator(json!({
            "group_by": {"account": ["*"], "service": ["*"]},
            "data": [{"date": "2018-07", "accounts": [
                {"account": "a1", "services": [
                    {"service": "EC2", "values": [{"account": "a1", "service": "EC2", "total": 10.25}]},
                    {"service": "S3", "values": [{"account": "a1", "service": "S3", "total": 1.75}]}
                ]},
                {"account": "a2", "services": [
                    {"service": "EC2", "values": [{"account": "a2", "service": "EC2", "total": 4}]}
                ]}
            ]}]
        }));
        let by_service_then_account = aggregator(json!({
            "group_by": {"service": ["*"], "account": ["*"]},
            "data": [{"date": "2018-07", "services": [
                {"service": "EC2", "accounts": [
                    {"account": "a1", "values": [{"account": "a1", "service": "EC2", "total": 10.25}]},
                    {"account": "a2", "values": [{"account": "a2", "service": "EC2", "total": 4}]}
                ]},
                {"service": "S3", "accounts": [
                    {"account": "a1", "values": [{"account": "a1", "service": "S3", "total": 1.75}]}
                ]}
            ]}]
        }));

        let key = |item: &LineItem| {
            format!(
                "{}/{}",
                item.get("account").and_then(Value::as_str).unwrap_or_default(),
                item.get("service").and_then(Value::as_str).unwrap_or_default()
            )
        };
        let mut left: Vec<String> = by_account_then_service.line_items().iter().map(key).collect();
        let mut right: Vec<String> = by_service_then_account.line_items().iter().map(key).collect();
        left.sort();
        right.sort();

        assert_eq!(left, right);
        assert_eq!(by_account_then_service.total_cost_or_usage(), Some(dec!(16)));
        assert_eq!(
            by_account_then_service.total_cost_or_usage(),
            by_service_then_account.total_cost_or_usage()
        );
    }

    #[test]
    fn null_totals_are_zero_but_present() {
        let agg = aggregator(json!({
            "data": [{"values": [{"total": 10}, {"total": null}, {"total": 5}]}]
        }));

        assert_eq!(agg.line_items().len(), 3);
        assert_eq!(agg.total_cost_or_usage(), Some(dec!(15)));
    }

    #[test]
    fn line_items_are_memoized() {
        let agg = aggregator(json!({"data": [{"values": [{"total": 1}]}]}));

        let first = agg.line_items();
        let second = agg.line_items();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn replace_clears_memoized_items() {
        let mut agg = aggregator(json!({"data": [{"values": [{"total": 1}, {"total": 2}]}]}));
        assert_eq!(agg.line_items().len(), 2);

        agg.replace(Report::new(json!({"data": [{"values": [{"total": 40}]}]})));

        assert_eq!(agg.line_items().len(), 1);
        assert_eq!(agg.total_cost_or_usage(), Some(dec!(40)));
    }

    #[test]
    fn instance_count_matches_server_count() {
        let agg = aggregator(json!({
            "data": [{"date": "2018-07", "instance_types": [
                {"instance_type": "t2.micro", "values": [{"count": 3, "total": 72.0}]},
                {"instance_type": "m4.large", "values": [{"count": 2, "total": 48.0}]}
            ]}],
            "total": {"value": 120.0, "count": 5}
        }));

        assert_eq!(agg.total_count(), Some(5));
        assert!(matches!(agg.check_count(), TotalCheck::Matched { .. }));
        assert!(agg.check_total(Deviation::DEFAULT).is_ok());
    }

    #[test]
    fn count_off_by_one_is_a_mismatch() {
        let agg = aggregator(json!({
            "data": [{"values": [{"count": 3}]}],
            "total": {"count": 4}
        }));

        assert!(matches!(agg.check_count(), TotalCheck::Mismatch { .. }));
    }

    #[test]
    fn cost_outside_tolerance_is_a_mismatch() {
        let agg = aggregator(json!({
            "data": [{"values": [{"total": 97.00}]}],
            "total": {"value": 100.50}
        }));

        assert_eq!(
            agg.check_total(Deviation::DEFAULT),
            TotalCheck::Mismatch {
                expected: dec!(100.50),
                computed: dec!(97.00),
                deviation: Deviation::DEFAULT,
            }
        );
    }

    #[test]
    fn items_without_server_total() {
        let agg = aggregator(json!({"data": [{"values": [{"total": 2}]}]}));
        assert_eq!(
            agg.check_total(Deviation::DEFAULT),
            TotalCheck::MissingServerTotal { computed: dec!(2) }
        );
    }
}
