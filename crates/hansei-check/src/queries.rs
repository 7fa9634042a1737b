//! The report query matrix.

use hansei_core::ReportQuery;

/// A report query with a short identifier for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuery {
    /// Identifier, e.g. `account_last_10_day`.
    pub name: &'static str,
    /// Query sent to the report endpoint.
    pub query: ReportQuery,
}

struct TimeScope {
    resolution: &'static str,
    value: i32,
    units: &'static str,
}

const fn scope(resolution: &'static str, value: i32, units: &'static str) -> Option<TimeScope> {
    Some(TimeScope {
        resolution,
        value,
        units,
    })
}

const ACCOUNT: &[&str] = &["account"];
const ACCOUNT_SERVICE: &[&str] = &["account", "service"];
const SERVICE_ACCOUNT: &[&str] = &["service", "account"];

#[allow(clippy::type_complexity)]
const MATRIX: &[(&str, Option<TimeScope>, &[&str])] = &[
    ("default", None, &[]),
    ("account_last_10_day", scope("daily", -10, "day"), ACCOUNT),
    ("account_last_30_day", scope("daily", -30, "day"), ACCOUNT),
    ("account_last_month", scope("monthly", -1, "month"), ACCOUNT),
    ("account_two_months_ago", scope("monthly", -2, "month"), ACCOUNT),
    ("account_last_month-daily", scope("daily", -1, "month"), ACCOUNT),
    ("account_two_months_ago-daily", scope("daily", -2, "month"), ACCOUNT),
    ("account_service_last_10_day", scope("daily", -10, "day"), ACCOUNT_SERVICE),
    ("account_service_last_30_day", scope("daily", -30, "day"), ACCOUNT_SERVICE),
    ("account_service_last_month", scope("monthly", -1, "month"), ACCOUNT_SERVICE),
    ("account_service_two_months_ago", scope("monthly", -2, "month"), ACCOUNT_SERVICE),
    ("service_account_last_month", scope("monthly", -1, "month"), SERVICE_ACCOUNT),
    ("service_account_two_months_ago", scope("monthly", -2, "month"), SERVICE_ACCOUNT),
    ("account_service_last_month-daily", scope("daily", -1, "month"), ACCOUNT_SERVICE),
    ("account_service_two_months_ago-daily", scope("daily", -2, "month"), ACCOUNT_SERVICE),
];

/// Every query run against each report kind, in order.
pub fn report_matrix() -> Vec<NamedQuery> {
    MATRIX
        .iter()
        .map(|(name, time_scope, dimensions)| {
            let mut query = ReportQuery::new();
            if let Some(ts) = time_scope {
                query = query
                    .filter("resolution", ts.resolution)
                    .filter("time_scope_value", ts.value)
                    .filter("time_scope_units", ts.units);
            }
            for dimension in *dimensions {
                query = query.group_by(*dimension, "*");
            }
            NamedQuery { name: *name, query }
        })
        .collect()
}
