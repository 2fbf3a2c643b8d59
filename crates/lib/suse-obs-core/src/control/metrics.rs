use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::{Duration, SecondsFormat};
use suse_obs_model::schema::{MAX_LABELED_METRICS, PLACEHOLDER, RESERVED_METRIC_NAME_LABEL};
use suse_obs_model::{MetricSeries, RangeQuery, TimeRange};
use tracing::warn;

use super::{ControlError, ObservabilityControl};
use crate::backend::MetricSource;
use crate::params::{ParamError, search_pattern};
use crate::render::{Bounded, MarkdownTable};

/// Metric names matching a search, with label keys for the first batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricListing {
    pub pattern: String,
    pub total_matches: usize,
    /// `None` when the label lookup for that metric failed.
    pub metrics: Vec<(String, Option<Vec<String>>)>,
}

impl MetricListing {
    #[must_use]
    pub fn render(&self) -> String {
        if self.total_matches == 0 {
            return format!("No metrics found matching pattern: {}", self.pattern);
        }

        let mut table = MarkdownTable::new(["Metric Name", "Label Keys"]);
        for (name, labels) in &self.metrics {
            let labels = match labels {
                Some(labels) if !labels.is_empty() => labels.join(", "),
                _ => PLACEHOLDER.to_string(),
            };
            table.push_row(vec![name.clone(), labels]);
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "Found {} metric(s) matching pattern '{}':\n",
            self.total_matches, self.pattern
        );
        table.write_to(&mut out);
        let hidden = self.total_matches.saturating_sub(self.metrics.len());
        if hidden > 0 {
            let _ = write!(
                out,
                "\nShowing the first {} of {} matching metrics ({hidden} more not shown). Refine the search pattern to narrow the results.\n",
                self.metrics.len(),
                self.total_matches
            );
        }
        out
    }
}

/// Label keys of a metric as shown in listings: sorted, without `__name__`.
#[must_use]
pub fn display_label_keys(keys: Vec<String>) -> Vec<String> {
    keys.into_iter()
        .filter(|key| key != RESERVED_METRIC_NAME_LABEL)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sorted union of the label keys of all series, without `__name__`.
#[must_use]
pub fn unify_label_keys(series: &[MetricSeries]) -> Vec<String> {
    series
        .iter()
        .flat_map(|series| series.labels.keys())
        .filter(|key| key.as_str() != RESERVED_METRIC_NAME_LABEL)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Range query result projected onto one column schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    pub query: String,
    pub columns: Vec<String>,
    pub series: Vec<MetricSeries>,
}

impl SeriesTable {
    #[must_use]
    pub fn new(query: impl Into<String>, series: Vec<MetricSeries>) -> Self {
        Self {
            query: query.into(),
            columns: unify_label_keys(&series),
            series,
        }
    }

    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.series.iter().map(|series| series.samples.len()).sum()
    }

    #[must_use]
    pub fn render(&self) -> String {
        if self.series.is_empty() {
            return "no data found".to_string();
        }

        let mut table = MarkdownTable::new(
            ["Timestamp", "Value"]
                .into_iter()
                .map(str::to_string)
                .chain(self.columns.iter().cloned()),
        );
        for series in &self.series {
            for sample in &series.samples {
                let mut cells = Vec::with_capacity(self.columns.len() + 2);
                cells.push(sample.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true));
                cells.push(format!("{:.4}", sample.value));
                cells.extend(self.columns.iter().map(|key| {
                    series
                        .labels
                        .get(key)
                        .cloned()
                        .unwrap_or_else(|| PLACEHOLDER.to_string())
                }));
                table.push_row(cells);
            }
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "Found {} series with {} sample(s) for query: {}\n",
            self.series.len(),
            self.sample_count(),
            self.query
        );
        table.write_to(&mut out);
        out
    }
}

impl<B: MetricSource> ObservabilityControl<B> {
    /// Searches metric names of the last hour and looks up label keys for
    /// the first matches.
    ///
    /// # Errors
    /// Returns `ControlError::Param` for an invalid pattern and
    /// `ControlError::Backend` if the name listing fails.
    pub async fn list_metrics(&self, pattern: &str) -> Result<MetricListing, ControlError> {
        let regex = search_pattern(pattern)?;
        let range = TimeRange::last(Duration::hours(1));
        let names = self
            .backend
            .metric_names(range)
            .await
            .map_err(ControlError::backend("list metrics"))?;

        let matches: Vec<String> = names
            .into_iter()
            .filter(|name| regex.is_match(name))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let bounded = Bounded::new(&matches, MAX_LABELED_METRICS);
        let mut metrics = Vec::with_capacity(bounded.shown.len());
        for name in bounded.shown {
            let labels = match self.backend.metric_label_keys(name, range).await {
                Ok(keys) => Some(display_label_keys(keys)),
                Err(err) => {
                    warn!(metric = %name, error = %err, "label lookup failed");
                    None
                }
            };
            metrics.push((name.clone(), labels));
        }

        Ok(MetricListing {
            pattern: pattern.to_string(),
            total_matches: bounded.total,
            metrics,
        })
    }

    /// Runs a range query and projects the series onto one column schema.
    ///
    /// # Errors
    /// Returns `ControlError::Param` for a blank query and
    /// `ControlError::Backend` if the query fails.
    pub async fn get_metrics(&self, query: RangeQuery) -> Result<SeriesTable, ControlError> {
        if query.query.trim().is_empty() {
            return Err(ParamError::MissingParameter("query").into());
        }
        let series = self
            .backend
            .query_range(&query)
            .await
            .map_err(ControlError::backend(format!("query range metric `{}`", query.query)))?;
        Ok(SeriesTable::new(query.query, series))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::DateTime;
    use suse_obs_model::Sample;

    use super::*;

    fn series(labels: &[(&str, &str)], values: &[(i64, f64)]) -> MetricSeries {
        MetricSeries {
            labels: labels
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect::<BTreeMap<_, _>>(),
            samples: values
                .iter()
                .map(|(secs, value)| Sample {
                    timestamp: DateTime::from_timestamp(*secs, 0).expect("valid timestamp"),
                    value: *value,
                })
                .collect(),
        }
    }

    #[test]
    fn label_union_is_sorted_and_skips_metric_name() {
        let input = vec![
            series(&[("__name__", "up"), ("pod", "a"), ("namespace", "prod")], &[]),
            series(&[("__name__", "up"), ("container", "app")], &[]),
        ];
        assert_eq!(unify_label_keys(&input), vec!["container", "namespace", "pod"]);
    }

    #[test]
    fn rows_follow_series_then_sample_order_with_placeholders() {
        let table = SeriesTable::new(
            "up",
            vec![
                series(&[("pod", "b")], &[(1_700_000_060, 2.0), (1_700_000_000, 1.5)]),
                series(&[("namespace", "prod")], &[(1_700_000_000, 0.123_456)]),
            ],
        );

        assert_eq!(table.columns, vec!["namespace", "pod"]);
        assert_eq!(
            table.render(),
            "Found 2 series with 3 sample(s) for query: up\n\n\
             | Timestamp | Value | namespace | pod |\n\
             |---|---|---|---|\n\
             | 2023-11-14T22:14:20Z | 2.0000 | - | b |\n\
             | 2023-11-14T22:13:20Z | 1.5000 | - | b |\n\
             | 2023-11-14T22:13:20Z | 0.1235 | prod | - |\n"
        );
    }

    #[test]
    fn no_series_renders_no_data() {
        assert_eq!(SeriesTable::new("up", Vec::new()).render(), "no data found");
    }

    #[test]
    fn listing_notes_truncation() {
        let listing = MetricListing {
            pattern: "cpu".to_string(),
            total_matches: 3,
            metrics: vec![
                ("cpu_usage".to_string(), Some(vec!["pod".to_string()])),
                ("cpu_limit".to_string(), None),
            ],
        };
        let rendered = listing.render();
        assert!(rendered.starts_with("Found 3 metric(s) matching pattern 'cpu':\n\n"));
        assert!(rendered.contains("| cpu_usage | pod |"));
        assert!(rendered.contains("| cpu_limit | - |"));
        assert!(rendered.contains("Showing the first 2 of 3 matching metrics (1 more not shown)"));
    }

    #[test]
    fn display_label_keys_drop_reserved_key() {
        let keys = vec!["pod".to_string(), "__name__".to_string(), "container".to_string()];
        assert_eq!(display_label_keys(keys), vec!["container", "pod"]);
    }
}
