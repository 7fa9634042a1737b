//! Report query parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sort direction for `order_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl OrderDirection {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter, ordering and grouping for a report request.
///
/// ```
/// use hansei_core::{OrderDirection, ReportQuery};
///
/// let query = ReportQuery::new()
///     .filter("resolution", "daily")
///     .filter("time_scope_value", -10)
///     .group_by("account", "*")
///     .group_by("service", "*")
///     .order_by("cost", OrderDirection::Desc);
///
/// assert_eq!(
///     query.to_query_pairs()[0],
///     ("order_by[cost]".to_string(), "desc".to_string())
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportQuery {
    filter: Vec<(String, String)>,
    order_by: Option<(String, OrderDirection)>,
    group_by: Vec<(String, String)>,
}

impl ReportQuery {
    /// An empty query: the server's default report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `filter[key]=value`. Setting a key twice replaces the earlier value.
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.filter.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.filter.push((key, value)),
        }
        self
    }

    /// Set `order_by[field]=direction`.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Append `group_by[dimension]=value`.
    ///
    /// Grouping order decides how the server nests `data`; it does not change
    /// the totals. The same dimension may be given more than once.
    #[must_use]
    pub fn group_by(mut self, dimension: impl Into<String>, value: impl Into<String>) -> Self {
        self.group_by.push((dimension.into(), value.into()));
        self
    }

    /// Whether no parameter has been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filter.is_empty() && self.order_by.is_none() && self.group_by.is_empty()
    }

    /// Group-by pairs in the order they were added.
    #[must_use]
    pub fn group_by_pairs(&self) -> &[(String, String)] {
        &self.group_by
    }

    /// Encode as `key=value` pairs: `order_by`, then every `group_by` in
    /// insertion order, then the filters.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filter.len() + self.group_by.len() + 1);

        if let Some((field, direction)) = &self.order_by {
            pairs.push((format!("order_by[{field}]"), direction.as_str().to_string()));
        }

        pairs.extend(
            self.group_by
                .iter()
                .map(|(dimension, value)| (format!("group_by[{dimension}]"), value.clone())),
        );

        pairs.extend(
            self.filter
                .iter()
                .map(|(key, value)| (format!("filter[{key}]"), value.clone())),
        );

        pairs
    }
}

impl fmt::Display for ReportQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("default");
        }

        let mut first = true;
        for (key, value) in self.to_query_pairs() {
            if !first {
                f.write_str("&")?;
            }
            first = false;
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
