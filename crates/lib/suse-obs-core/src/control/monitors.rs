//! Monitor listing joined with per-monitor check states.
//!
//! The join runs as a pipeline: monitors from the overview are filtered by
//! their counter for the requested state, each survivor gets one bounded
//! check-state lookup, and the result is expanded into capped table rows.

use std::collections::HashSet;
use std::fmt::Write as _;

use suse_obs_model::schema::{
    CHECK_STATE_PAGE_SIZE,
    MAX_AFFECTED_COMPONENTS,
    MAX_DESCRIPTION_CHARS,
    PLACEHOLDER,
};
use suse_obs_model::{AffectedEntity, HealthState, MonitorDefinition, MonitorOverview};
use tracing::{debug, warn};

use super::{ControlError, ObservabilityControl};
use crate::backend::{MonitorSource, Page};
use crate::render::{Bounded, MarkdownTable, or_placeholder, truncate_chars};

/// Outcome of the check-state lookup for one monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorDetail {
    /// The lookup failed or came back empty.
    Unavailable,
    Affected(Vec<AffectedEntity>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorRow {
    pub monitor: String,
    pub description: String,
    pub affected_count: u64,
    pub affected: String,
}

/// Monitors with a non-zero counter for `state`, paired with that counter.
pub fn qualifying_monitors(
    overview: Vec<MonitorOverview>,
    state: HealthState,
) -> impl Iterator<Item = (MonitorDefinition, u64)> {
    overview.into_iter().filter_map(move |entry| {
        let count = entry.runtime_metrics.count_for(state);
        (count > 0).then_some((entry.monitor, count))
    })
}

/// Expands one monitor into its table rows.
#[must_use]
pub fn expand_rows(monitor: &MonitorDefinition, count: u64, detail: &MonitorDetail) -> Vec<MonitorRow> {
    let description = monitor.description.clone().unwrap_or_default();
    let row = |description: String, affected: String| MonitorRow {
        monitor: monitor.name.clone(),
        description,
        affected_count: count,
        affected,
    };

    let affected = match detail {
        MonitorDetail::Affected(affected) if !affected.is_empty() => affected,
        _ => return vec![row(description, PLACEHOLDER.to_string())],
    };

    let bounded = Bounded::new(affected, MAX_AFFECTED_COMPONENTS);
    let mut rows: Vec<MonitorRow> = bounded
        .shown
        .iter()
        .map(|entity| row(description.clone(), entity.to_string()))
        .collect();
    if let Some(continuation) = bounded.continuation() {
        rows.push(row(PLACEHOLDER.to_string(), continuation));
    }
    rows
}

/// Rows of a monitor listing for one health state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorReport {
    pub state: HealthState,
    pub rows: Vec<MonitorRow>,
}

impl MonitorReport {
    /// Number of distinct monitors among the rows.
    #[must_use]
    pub fn monitor_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.monitor.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    #[must_use]
    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return format!("No monitors in {} state found.", self.state);
        }

        let mut table = MarkdownTable::new([
            "Monitor Name",
            "Description",
            "Affected Count",
            "Affected Component",
        ]);
        for row in &self.rows {
            table.push_row(vec![
                row.monitor.clone(),
                truncate_chars(or_placeholder(&row.description), MAX_DESCRIPTION_CHARS),
                row.affected_count.to_string(),
                row.affected.clone(),
            ]);
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "Found {} monitor(s) in {} state:\n",
            self.monitor_count(),
            self.state
        );
        table.write_to(&mut out);
        out
    }
}

impl<B: MonitorSource> ObservabilityControl<B> {
    /// Lists monitors with components in `state`, with up to five affected
    /// components each.
    ///
    /// # Errors
    /// Returns `ControlError::Backend` if the monitor overview cannot be read.
    /// Check-state lookups never fail the listing.
    pub async fn get_monitors(&self, state: HealthState) -> Result<MonitorReport, ControlError> {
        let overview = self
            .backend
            .monitors_overview()
            .await
            .map_err(ControlError::backend("get monitors overview"))?;

        let mut rows = Vec::new();
        for (monitor, count) in qualifying_monitors(overview, state) {
            let detail = self.monitor_detail(&monitor, state).await;
            rows.extend(expand_rows(&monitor, count, &detail));
        }
        Ok(MonitorReport { state, rows })
    }

    async fn monitor_detail(&self, monitor: &MonitorDefinition, state: HealthState) -> MonitorDetail {
        let page = Page::first(CHECK_STATE_PAGE_SIZE);
        match self
            .backend
            .monitor_check_states(monitor.id, state, page)
            .await
        {
            Ok(states) if states.is_empty() => {
                debug!(monitor = %monitor.name, "no check states");
                MonitorDetail::Unavailable
            }
            Ok(states) => MonitorDetail::Affected(states.iter().map(AffectedEntity::from).collect()),
            Err(err) => {
                warn!(monitor = %monitor.name, error = %err, "check state lookup failed");
                MonitorDetail::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use suse_obs_model::{ElementRef, RuntimeMetrics};

    use super::*;

    fn monitor(id: i64, name: &str, description: Option<&str>) -> MonitorDefinition {
        MonitorDefinition {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            identifier: None,
        }
    }

    fn affected(n: i64) -> Vec<AffectedEntity> {
        (1..=n)
            .map(|id| AffectedEntity {
                name: format!("pod-{id}"),
                reference: ElementRef::Id(id),
            })
            .collect()
    }

    #[test]
    fn zero_counters_are_skipped() {
        let overview = vec![
            MonitorOverview {
                monitor: monitor(1, "cpu", None),
                runtime_metrics: RuntimeMetrics {
                    critical_count: 2,
                    ..RuntimeMetrics::default()
                },
            },
            MonitorOverview {
                monitor: monitor(2, "memory", None),
                runtime_metrics: RuntimeMetrics {
                    deviating_count: 4,
                    ..RuntimeMetrics::default()
                },
            },
        ];

        let critical: Vec<_> = qualifying_monitors(overview.clone(), HealthState::Critical).collect();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].0.name, "cpu");
        assert_eq!(critical[0].1, 2);

        assert_eq!(qualifying_monitors(overview, HealthState::Unknown).count(), 0);
    }

    #[test]
    fn unavailable_detail_yields_single_placeholder_row() {
        let rows = expand_rows(&monitor(1, "cpu", Some("CPU high")), 3, &MonitorDetail::Unavailable);
        assert_eq!(
            rows,
            vec![MonitorRow {
                monitor: "cpu".to_string(),
                description: "CPU high".to_string(),
                affected_count: 3,
                affected: "-".to_string(),
            }]
        );

        let empty = expand_rows(&monitor(1, "cpu", None), 3, &MonitorDetail::Affected(Vec::new()));
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].affected, "-");
    }

    #[test]
    fn affected_entities_are_capped_with_one_continuation_row() {
        let rows = expand_rows(
            &monitor(1, "latency", Some("p99 too high")),
            7,
            &MonitorDetail::Affected(affected(8)),
        );

        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].affected, "pod-1 (ID:1)");
        assert_eq!(rows[4].affected, "pod-5 (ID:5)");
        assert_eq!(rows[5].description, "-");
        assert_eq!(rows[5].affected, "... and 3 more");
        assert!(rows.iter().all(|row| row.affected_count == 7));
    }

    #[test]
    fn exactly_five_entities_need_no_continuation() {
        let rows = expand_rows(&monitor(1, "latency", None), 5, &MonitorDetail::Affected(affected(5)));
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|row| !row.affected.starts_with("...")));
    }

    #[test]
    fn report_counts_distinct_monitors_and_truncates_descriptions() {
        let long = "d".repeat(80);
        let mut rows = expand_rows(
            &monitor(1, "latency", Some(&long)),
            7,
            &MonitorDetail::Affected(affected(6)),
        );
        rows.extend(expand_rows(&monitor(2, "errors", None), 1, &MonitorDetail::Unavailable));
        let report = MonitorReport {
            state: HealthState::Deviating,
            rows,
        };

        assert_eq!(report.monitor_count(), 2);
        let rendered = report.render();
        assert!(rendered.starts_with("Found 2 monitor(s) in DEVIATING state:\n\n"));
        assert!(rendered.contains(&format!("| latency | {}... | 7 | pod-1 (ID:1) |", "d".repeat(47))));
        assert!(rendered.contains("| latency | - | 7 | ... and 1 more |"));
        assert!(rendered.contains("| errors | - | 1 | - |"));
    }

    #[test]
    fn empty_report_renders_state_message() {
        let report = MonitorReport {
            state: HealthState::Unknown,
            rows: Vec::new(),
        };
        assert_eq!(report.render(), "No monitors in UNKNOWN state found.");
    }
}
